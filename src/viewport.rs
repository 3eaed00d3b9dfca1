//! Map camera commands.
//!
//! The controller only emits on discrete events (a selection, a "my location" tap, an
//! explicit screen call). It never follows location ticks on its own.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::FinderConfig;
use crate::geo::{Coordinate, ViewportTarget};

/// Receiving end handed to the native map view.
pub type ViewportStream = mpsc::UnboundedReceiver<ViewportTarget>;

#[derive(Debug)]
pub struct ViewportController {
    tx: mpsc::UnboundedSender<ViewportTarget>,
    zoom: f64,
    duration_ms: u64,
}

impl ViewportController {
    pub fn new(config: &FinderConfig) -> (Self, ViewportStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            tx,
            zoom: config.recenter_zoom,
            duration_ms: config.recenter_duration_ms,
        };
        (controller, rx)
    }

    /// Emits one fly-to command. Returns the target that was sent.
    pub fn recenter_on(
        &self,
        coordinate: Coordinate,
        zoom_level: f64,
        transition_duration_ms: u64,
    ) -> Option<ViewportTarget> {
        if !coordinate.is_valid() || !zoom_level.is_finite() {
            warn!(?coordinate, zoom_level, "refusing to recenter on invalid target");
            return None;
        }
        let target = ViewportTarget {
            coordinate,
            zoom_level,
            transition_duration_ms,
        };
        if self.tx.send(target).is_err() {
            // The map view went away; nothing left to animate.
            debug!("viewport stream closed; dropping target");
        }
        Some(target)
    }

    /// Recenter with the configured zoom and transition.
    pub fn recenter_default(&self, coordinate: Coordinate) -> Option<ViewportTarget> {
        self.recenter_on(coordinate, self.zoom, self.duration_ms)
    }

    /// "My location" tap. Without a known position this is a logged no-op.
    pub fn recenter_to(&self, position: Option<Coordinate>) -> bool {
        match position {
            Some(coordinate) => self.recenter_default(coordinate).is_some(),
            None => {
                warn!("recenter requested before any position was acquired");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recenter_emits_one_target_with_defaults() {
        let (controller, mut rx) = ViewportController::new(&FinderConfig::default());
        let jeju = Coordinate::new(33.35, 126.48).unwrap();

        assert!(controller.recenter_to(Some(jeju)));
        let target = rx.try_recv().unwrap();
        assert_eq!(
            target,
            ViewportTarget {
                coordinate: jeju,
                zoom_level: 16.0,
                transition_duration_ms: 800,
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn recenter_without_position_is_noop() {
        let (controller, mut rx) = ViewportController::new(&FinderConfig::default());
        assert!(!controller.recenter_to(None));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn invalid_target_is_rejected() {
        let (controller, mut rx) = ViewportController::new(&FinderConfig::default());
        let here = Coordinate::new(37.0, 127.0).unwrap();
        assert!(controller.recenter_on(here, f64::NAN, 800).is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_stream_does_not_panic() {
        let (controller, rx) = ViewportController::new(&FinderConfig::default());
        drop(rx);
        let here = Coordinate::new(37.0, 127.0).unwrap();
        assert!(controller.recenter_default(here).is_some());
    }
}
