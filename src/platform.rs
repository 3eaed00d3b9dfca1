//! Contracts for the device collaborators: OS location services and the remediation
//! dialog. Hosts implement these over the native SDKs; tests use scripted fakes.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Requested accuracy for a fix or a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    Balanced,
    #[default]
    High,
}

/// Rate limits handed to the platform's position subscription.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingOptions {
    pub accuracy: Accuracy,
    /// Minimum movement between two deliveries, in meters.
    pub min_distance_m: f64,
    /// Minimum time between two deliveries, in milliseconds.
    pub min_interval_ms: u64,
}

impl Default for TrackingOptions {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::High,
            min_distance_m: crate::DEFAULT_MIN_DISTANCE_M,
            min_interval_ms: crate::DEFAULT_MIN_INTERVAL_MS,
        }
    }
}

/// Raw answer of the OS permission dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The user dismissed the dialog without choosing.
    Undetermined,
}

/// Callback the platform invokes on its own thread/loop for each position update.
pub type PositionCallback = Arc<dyn Fn(Coordinate) + Send + Sync>;

/// A live platform position subscription.
pub trait PositionSubscription: Send {
    /// Stops deliveries. Called at most once by the tracker.
    fn remove(&mut self);
}

/// OS location services.
///
/// Errors are opaque strings: the core only distinguishes "it worked" from "it did not".
#[async_trait]
pub trait LocationServices: Send + Sync {
    async fn is_enabled(&self) -> Result<bool, String>;

    async fn request_permission(&self) -> Result<PermissionStatus, String>;

    /// One-shot fix. Times out according to the platform default.
    async fn current_position(&self, accuracy: Accuracy) -> Result<Coordinate, String>;

    async fn watch_position(
        &self,
        options: TrackingOptions,
        callback: PositionCallback,
    ) -> Result<Box<dyn PositionSubscription>, String>;

    /// Opens the system settings screen. Fire-and-forget.
    fn open_settings(&self);
}

/// Why the "open settings / cancel" dialog is being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationReason {
    ServicesDisabled,
    PermissionDenied,
}

/// Presents the remediation dialog. Never awaited: the choice is handled by the UI,
/// which calls [`crate::permission::PermissionGate::open_settings`] if the user asks.
pub trait RemediationPrompt: Send + Sync {
    fn present(&self, reason: RemediationReason);
}
