//! Bottom sheet snap state machine.
//!
//! The legal snap set depends on whether a gym is selected. The "fully open" position is
//! always the last entry of the current legal set, so layouts with two or three snap
//! points behave the same way.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use crate::permission::PermissionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SheetSnapState {
    Collapsed,
    Half,
    Full,
}

/// What the sheet body shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentMode {
    /// Saved/nearby lists, or the selected gym's summary header.
    List,
    /// Skeleton placeholder shown while the detail view is about to appear.
    Loading,
    Detail,
}

/// Which list the sheet shows when no gym is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListTab {
    #[default]
    Saved,
    Nearby,
}

/// Snap points with and without a selection, each ordered from lowest to highest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapLayout {
    pub unselected: Vec<SheetSnapState>,
    pub selected: Vec<SheetSnapState>,
}

impl Default for SnapLayout {
    fn default() -> Self {
        Self {
            unselected: vec![
                SheetSnapState::Collapsed,
                SheetSnapState::Half,
                SheetSnapState::Full,
            ],
            selected: vec![SheetSnapState::Collapsed, SheetSnapState::Full],
        }
    }
}

#[derive(Debug)]
pub struct SheetController {
    layout: SnapLayout,
    has_selection: bool,
    snap: SheetSnapState,
    reveal_delay: Duration,
    reveal_at: Option<Instant>,
    tab: ListTab,
}

impl SheetController {
    /// `layout` is expected to be validated (see [`crate::config::FinderConfig::validate`]).
    pub fn new(layout: SnapLayout, reveal_delay: Duration) -> Self {
        Self {
            layout,
            has_selection: false,
            snap: SheetSnapState::Collapsed,
            reveal_delay,
            reveal_at: None,
            tab: ListTab::default(),
        }
    }

    pub fn snap(&self) -> SheetSnapState {
        self.snap
    }

    pub fn legal_snaps(&self) -> &[SheetSnapState] {
        if self.has_selection {
            &self.layout.selected
        } else {
            &self.layout.unselected
        }
    }

    /// Index of the current snap inside the legal set.
    pub fn index(&self) -> usize {
        self.legal_snaps()
            .iter()
            .position(|s| *s == self.snap)
            .unwrap_or(0)
    }

    fn full_index(&self) -> usize {
        self.legal_snaps().len().saturating_sub(1)
    }

    pub fn active_tab(&self) -> ListTab {
        self.tab
    }

    pub fn set_active_tab(&mut self, tab: ListTab) {
        self.tab = tab;
    }

    /// Recomputes the legal set and clamps the current snap into it.
    ///
    /// Gaining a selection keeps `Collapsed`/`Full` and demotes `Half` to the nearest lower
    /// legal point. Losing it returns the sheet to collapsed list mode.
    pub fn on_selection_changed(&mut self, has_selection: bool) {
        self.has_selection = has_selection;

        if !has_selection {
            self.snap = SheetSnapState::Collapsed;
            self.reveal_at = None;
            debug!("sheet reset to collapsed list");
            return;
        }

        if !self.legal_snaps().contains(&self.snap) {
            let current = self.snap;
            self.snap = self
                .legal_snaps()
                .iter()
                .copied()
                .filter(|s| *s <= current)
                .max()
                .unwrap_or(SheetSnapState::Collapsed);
            debug!(from = ?current, to = ?self.snap, "sheet snap clamped");
        }

        if self.index() == self.full_index() && self.index() > 0 && self.reveal_at.is_none() {
            self.schedule_reveal();
        }
    }

    /// Handles a snap reported by the sheet view. Out-of-range indices clamp to full.
    pub fn on_index_changed(&mut self, index: usize) {
        let index = index.min(self.full_index());
        self.snap = self.legal_snaps().get(index).copied().unwrap_or(SheetSnapState::Collapsed);

        if self.has_selection && index == self.full_index() && index > 0 {
            if self.reveal_at.is_none() {
                self.schedule_reveal();
            }
        } else {
            self.reveal_at = None;
        }
    }

    /// Back button: drop to the lowest snap point.
    pub fn collapse(&mut self) {
        self.on_index_changed(0);
    }

    fn schedule_reveal(&mut self) {
        self.reveal_at = Some(Instant::now() + self.reveal_delay);
        debug!(delay_ms = self.reveal_delay.as_millis() as u64, "detail reveal scheduled");
    }

    pub fn content_mode(&self) -> ContentMode {
        match self.reveal_at {
            Some(at) if self.has_selection => {
                if Instant::now() >= at {
                    ContentMode::Detail
                } else {
                    ContentMode::Loading
                }
            }
            _ => ContentMode::List,
        }
    }

    /// Waits until a pending detail reveal is due. Returns `false` if none is pending.
    pub async fn detail_ready(&self) -> bool {
        match self.reveal_at {
            Some(at) if self.has_selection => {
                tokio::time::sleep_until(at).await;
                true
            }
            _ => false,
        }
    }

    /// The "my location" button is only shown over a collapsed sheet, with permission.
    pub fn shows_recenter_affordance(&self, permission: PermissionState) -> bool {
        self.snap == SheetSnapState::Collapsed && permission == PermissionState::Granted
    }
}
