//! The gym finder screen service.
//!
//! One `FinderScreen` is created per mounted map screen and handed by reference to every UI
//! subtree that needs the position, the selection or the sheet. It is the only writer of
//! those cells.
//!
//! Location failures are kept as state (`location_error`) next to a retry action; remote
//! failures are logged, returned, and also kept as a user-facing `notice`.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::FinderConfig;
use crate::directory::GymDirectory;
use crate::error::{ConfigError, LocationAcquisitionError, RemoteError};
use crate::geo::Coordinate;
use crate::gym::Gym;
use crate::permission::{PermissionGate, PermissionState};
use crate::platform::{LocationServices, RemediationPrompt};
use crate::remote::DataStore;
use crate::selection::{SelectTicket, SelectionChange, SelectionState};
use crate::sheet::{ContentMode, ListTab, SheetController, SheetSnapState};
use crate::tracker::{LocationTracker, TrackerState};
use crate::viewport::{ViewportController, ViewportStream};

/// Outcome of starting a selection by id.
#[derive(Debug)]
pub enum SelectStart {
    /// The gym was cached and is now selected.
    Done(SelectionChange),
    /// The gym has to be fetched; resolve it, then pass it to
    /// [`FinderScreen::complete_select`].
    Pending(PendingSelect),
}

/// A selection waiting on a remote read. Holds no borrow of the screen.
pub struct PendingSelect {
    ticket: SelectTicket,
    gym_id: i64,
    store: Arc<dyn DataStore>,
}

impl std::fmt::Debug for PendingSelect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSelect")
            .field("ticket", &self.ticket)
            .field("gym_id", &self.gym_id)
            .finish()
    }
}

impl PendingSelect {
    pub fn gym_id(&self) -> i64 {
        self.gym_id
    }

    pub async fn resolve(self) -> (SelectTicket, Result<Gym, RemoteError>) {
        let result = GymDirectory::fetch_from(self.store.as_ref(), self.gym_id).await;
        (self.ticket, result)
    }
}

#[derive(Debug)]
pub struct FinderScreen {
    config: FinderConfig,
    gate: PermissionGate,
    tracker: LocationTracker,
    viewport: ViewportController,
    viewport_stream: Option<ViewportStream>,
    selection: SelectionState,
    sheet: SheetController,
    directory: GymDirectory,
    location_error: Option<LocationAcquisitionError>,
    notice: Option<String>,
}

impl FinderScreen {
    pub fn new(
        config: FinderConfig,
        services: Arc<dyn LocationServices>,
        prompt: Arc<dyn RemediationPrompt>,
        store: Arc<dyn DataStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let (viewport, stream) = ViewportController::new(&config);
        Ok(Self {
            gate: PermissionGate::new(Arc::clone(&services), prompt),
            tracker: LocationTracker::new(services, config.tracking),
            viewport,
            viewport_stream: Some(stream),
            selection: SelectionState::new(),
            sheet: SheetController::new(config.sheet.clone(), config.detail_reveal_delay()),
            directory: GymDirectory::new(store, &config),
            location_error: None,
            notice: None,
            config,
        })
    }

    // --- lifecycle -------------------------------------------------------

    /// Screen mount: runs the location init sequence once.
    pub async fn mount(&mut self) -> Result<Coordinate, LocationAcquisitionError> {
        self.initialize_location().await
    }

    /// Retry tap: re-runs the whole sequence from the service check.
    pub async fn retry_location(&mut self) -> Result<Coordinate, LocationAcquisitionError> {
        info!("retrying location initialization");
        self.initialize_location().await
    }

    /// Screen unmount: cancels the position subscription.
    pub fn unmount(&mut self) {
        self.tracker.stop();
    }

    async fn initialize_location(&mut self) -> Result<Coordinate, LocationAcquisitionError> {
        self.location_error = None;
        let result = self.acquire_location().await;
        if let Err(e) = result {
            warn!(error = %e, "location unavailable");
            self.location_error = Some(e);
        }
        result
    }

    async fn acquire_location(&mut self) -> Result<Coordinate, LocationAcquisitionError> {
        if !self.gate.check_service_enabled().await {
            self.tracker.reset();
            return Err(LocationAcquisitionError::ServicesDisabled);
        }

        if self.gate.request_permission().await != PermissionState::Granted {
            self.tracker.reset();
            return Err(LocationAcquisitionError::PermissionDenied);
        }

        let first_fix = self.tracker.position().is_none();
        let fix = self.tracker.start().await?;
        if first_fix && self.config.recenter_on_first_fix {
            self.viewport.recenter_default(fix);
        }
        Ok(fix)
    }

    // --- actions ---------------------------------------------------------

    /// "My location" tap. No-op (and `false`) until a position is known.
    pub fn recenter_to_me(&self) -> bool {
        self.viewport.recenter_to(self.tracker.position())
    }

    /// Selects a gym by id (search result or marker tap), fetching it if needed.
    pub async fn select(&mut self, gym_id: i64) -> Result<Option<SelectionChange>, RemoteError> {
        match self.begin_select(gym_id) {
            SelectStart::Done(change) => Ok(Some(change)),
            SelectStart::Pending(pending) => {
                let (ticket, result) = pending.resolve().await;
                self.complete_select(ticket, result)
            }
        }
    }

    /// First half of a selection by id. Invalidates any selection still in flight.
    pub fn begin_select(&mut self, gym_id: i64) -> SelectStart {
        let ticket = self.selection.begin_select();
        if let Some(gym) = self.directory.find(gym_id).cloned() {
            let change = self
                .selection
                .commit(ticket, gym)
                .unwrap_or(SelectionChange::Unchanged);
            self.apply_selection(change);
            return SelectStart::Done(change);
        }

        debug!(gym_id, "selection waiting on remote read");
        SelectStart::Pending(PendingSelect {
            ticket,
            gym_id,
            store: self.directory.store(),
        })
    }

    /// Second half of a selection by id. Returns `Ok(None)` when a newer selection or a
    /// clear superseded this one.
    pub fn complete_select(
        &mut self,
        ticket: SelectTicket,
        result: Result<Gym, RemoteError>,
    ) -> Result<Option<SelectionChange>, RemoteError> {
        let gym = match result {
            Ok(gym) => gym,
            Err(e) => {
                self.notice = Some(e.to_string());
                return Err(e);
            }
        };
        self.directory.remember(gym.clone());

        let change = self.selection.commit(ticket, gym);
        if let Some(change) = change {
            self.apply_selection(change);
        }
        Ok(change)
    }

    /// Programmatic restore of a known gym.
    pub fn select_gym(&mut self, gym: Gym) -> SelectionChange {
        let change = self.selection.select(gym);
        self.apply_selection(change);
        change
    }

    fn apply_selection(&mut self, change: SelectionChange) {
        if !change.is_change() {
            return;
        }
        if let Some(gym) = self.selection.selected() {
            self.viewport.recenter_default(gym.coordinate());
        }
        self.sheet.on_selection_changed(true);
    }

    /// Back navigation: deselects and returns the sheet to its collapsed list.
    pub fn clear(&mut self) {
        if self.selection.clear() {
            self.sheet.on_selection_changed(false);
            debug!("selection cleared");
        }
    }

    /// Snap reported by the sheet view after a drag or programmatic snap.
    pub fn on_sheet_index_changed(&mut self, index: usize) {
        self.sheet.on_index_changed(index);
    }

    pub fn set_active_tab(&mut self, tab: ListTab) {
        self.sheet.set_active_tab(tab);
    }

    pub fn open_settings(&self) {
        self.gate.open_settings();
    }

    /// Reloads the full gym list used for markers and search.
    pub async fn refresh_gyms(&mut self) -> Result<usize, RemoteError> {
        let result = self.directory.refresh_all().await;
        self.record_notice(&result);
        result
    }

    /// Reloads the nearby list around the current position. `Ok(None)` without a fix.
    pub async fn refresh_nearby(&mut self) -> Result<Option<usize>, RemoteError> {
        let Some(position) = self.tracker.position() else {
            debug!("skipping nearby refresh; no position yet");
            return Ok(None);
        };
        let result = self.directory.refresh_nearby(position).await;
        self.record_notice(&result);
        result.map(Some)
    }

    /// Refreshes the nearby list only when it is stale.
    pub async fn refresh_nearby_if_due(&mut self) -> Result<Option<usize>, RemoteError> {
        if !self.directory.nearby_refresh_due() {
            return Ok(None);
        }
        self.refresh_nearby().await
    }

    fn record_notice<T>(&mut self, result: &Result<T, RemoteError>) {
        if let Err(e) = result {
            self.notice = Some(e.to_string());
        }
    }

    // --- observed state --------------------------------------------------

    pub fn position(&self) -> Option<Coordinate> {
        self.tracker.position()
    }

    /// Where the map starts before any camera command: the fix, or a fixed city center.
    pub fn camera_center(&self) -> Coordinate {
        self.tracker.position().unwrap_or(crate::FALLBACK_CENTER)
    }

    pub fn position_updates(&self) -> watch::Receiver<Option<Coordinate>> {
        self.tracker.subscribe()
    }

    pub fn tracker_state(&self) -> TrackerState {
        self.tracker.state()
    }

    pub fn permission(&self) -> PermissionState {
        self.gate.state()
    }

    pub fn location_error(&self) -> Option<LocationAcquisitionError> {
        self.location_error
    }

    /// The stream of camera commands. Can be taken once, by the map view.
    pub fn take_viewport_stream(&mut self) -> Option<ViewportStream> {
        self.viewport_stream.take()
    }

    pub fn selected(&self) -> Option<&Gym> {
        self.selection.selected()
    }

    pub fn sheet_state(&self) -> SheetSnapState {
        self.sheet.snap()
    }

    pub fn sheet_index(&self) -> usize {
        self.sheet.index()
    }

    pub fn legal_snaps(&self) -> &[SheetSnapState] {
        self.sheet.legal_snaps()
    }

    pub fn content_mode(&self) -> ContentMode {
        self.sheet.content_mode()
    }

    pub async fn detail_ready(&self) -> bool {
        self.sheet.detail_ready().await
    }

    pub fn active_tab(&self) -> ListTab {
        self.sheet.active_tab()
    }

    pub fn shows_recenter_affordance(&self) -> bool {
        self.sheet.shows_recenter_affordance(self.gate.state())
    }

    pub fn gyms(&self) -> &[Gym] {
        self.directory.all()
    }

    pub fn nearby_gyms(&self) -> &[Gym] {
        self.directory.nearby()
    }

    /// Search box results over the loaded gyms; feed a tapped result to [`Self::select`].
    pub fn search(&self, term: &str) -> Vec<&Gym> {
        self.directory.search(term)
    }

    /// Last remote failure, for a toast or banner.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}
