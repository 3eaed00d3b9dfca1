//! Device position tracking.
//!
//! `Idle -> Acquiring -> {Tracking, Failed}`; `stop()` returns to `Idle` from anywhere.
//! The latest position lives in a `watch` cell: the platform callback overwrites it and
//! readers only ever see the most recent value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::LocationAcquisitionError;
use crate::geo::Coordinate;
use crate::platform::{LocationServices, PositionCallback, PositionSubscription, TrackingOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerState {
    Idle,
    Acquiring,
    Tracking,
    Failed,
}

struct ActiveSubscription {
    handle: Box<dyn PositionSubscription>,
    /// Cleared on cancel so late platform deliveries are ignored.
    live: Arc<AtomicBool>,
}

pub struct LocationTracker {
    services: Arc<dyn LocationServices>,
    options: TrackingOptions,
    state: TrackerState,
    position: Arc<watch::Sender<Option<Coordinate>>>,
    subscription: Option<ActiveSubscription>,
    error: Option<LocationAcquisitionError>,
}

impl std::fmt::Debug for LocationTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationTracker")
            .field("state", &self.state)
            .field("position", &*self.position.borrow())
            .field("subscribed", &self.subscription.is_some())
            .field("error", &self.error)
            .finish()
    }
}

impl LocationTracker {
    pub fn new(services: Arc<dyn LocationServices>, options: TrackingOptions) -> Self {
        let (position, _) = watch::channel(None);
        Self {
            services,
            options,
            state: TrackerState::Idle,
            position: Arc::new(position),
            subscription: None,
            error: None,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn error(&self) -> Option<LocationAcquisitionError> {
        self.error
    }

    /// Latest known position, if any fix has arrived.
    pub fn position(&self) -> Option<Coordinate> {
        *self.position.borrow()
    }

    /// Receiver that observes every overwrite of the position cell.
    pub fn subscribe(&self) -> watch::Receiver<Option<Coordinate>> {
        self.position.subscribe()
    }

    /// Takes one high-accuracy fix, then opens the continuous subscription.
    ///
    /// A running subscription is cancelled first. On failure the tracker moves to
    /// `Failed`; retrying means calling `start()` again.
    pub async fn start(&mut self) -> Result<Coordinate, LocationAcquisitionError> {
        self.cancel_subscription();
        self.error = None;
        self.state = TrackerState::Acquiring;
        debug!("acquiring initial position fix");

        let fix = match self.services.current_position(self.options.accuracy).await {
            Ok(fix) if fix.is_valid() => fix,
            Ok(fix) => {
                error!(?fix, "platform returned an invalid coordinate");
                return Err(self.fail());
            }
            Err(e) => {
                error!(error = %e, "failed to acquire position fix");
                return Err(self.fail());
            }
        };
        self.position.send_replace(Some(fix));

        let live = Arc::new(AtomicBool::new(true));
        let callback = self.delivery_callback(Arc::clone(&live));
        match self.services.watch_position(self.options, callback).await {
            Ok(handle) => {
                self.subscription = Some(ActiveSubscription { handle, live });
            }
            Err(e) => {
                live.store(false, Ordering::SeqCst);
                error!(error = %e, "failed to open position subscription");
                return Err(self.fail());
            }
        }

        self.state = TrackerState::Tracking;
        info!(
            latitude = fix.latitude,
            longitude = fix.longitude,
            "location tracking started"
        );
        Ok(fix)
    }

    /// Cancels the subscription and returns to `Idle`. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.state == TrackerState::Idle && self.subscription.is_none() {
            return;
        }
        self.cancel_subscription();
        self.error = None;
        self.state = TrackerState::Idle;
        debug!("location tracking stopped");
    }

    /// Stops tracking and forgets the last known position. Used when location access is
    /// lost, so nothing keeps exposing a stale fix.
    pub fn reset(&mut self) {
        self.stop();
        if self.position.send_replace(None).is_some() {
            debug!("last known position cleared");
        }
    }

    fn fail(&mut self) -> LocationAcquisitionError {
        let err = LocationAcquisitionError::PositionUnavailable;
        self.state = TrackerState::Failed;
        self.error = Some(err);
        err
    }

    fn cancel_subscription(&mut self) {
        if let Some(mut active) = self.subscription.take() {
            active.live.store(false, Ordering::SeqCst);
            active.handle.remove();
        }
    }

    fn delivery_callback(&self, live: Arc<AtomicBool>) -> PositionCallback {
        let cell = Arc::clone(&self.position);
        let min_distance_m = self.options.min_distance_m;

        Arc::new(move |update: Coordinate| {
            if !live.load(Ordering::SeqCst) {
                return;
            }
            if !update.is_valid() {
                warn!(?update, "dropping invalid position update");
                return;
            }
            cell.send_if_modified(|current| match current {
                Some(prev) if prev.distance_m(&update) < min_distance_m => false,
                _ => {
                    *current = Some(update);
                    true
                }
            });
        })
    }
}

impl Drop for LocationTracker {
    fn drop(&mut self) {
        self.cancel_subscription();
    }
}
