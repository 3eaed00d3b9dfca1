//! Climbing gym finder: shared map/location core.
//!
//! This crate defines:
//! - [`FinderScreen`]: the per-screen service that owns the device position, the selected
//!   gym and the bottom sheet, and turns user actions into map camera commands.
//! - [`LocationServices`] / [`RemediationPrompt`]: the device contracts the host app
//!   implements over the native SDKs.
//! - [`DataStore`], [`IdentityService`], [`BlobStorage`]: the hosted back-end contracts.
//! - [`SavedGyms`]: a local (Sled) store of bookmarked gyms and visits.
//! - [`AccountService`]: sign-in, onboarding routing and avatar upload.
//!
//! Nothing here renders UI or talks to a network directly; every collaborator is injected.

pub mod account;
pub mod config;
pub mod directory;
pub mod error;
pub mod geo;
pub mod gym;
pub mod permission;
pub mod platform;
pub mod remote;
pub mod saved;
pub mod screen;
pub mod selection;
pub mod sheet;
pub mod tracker;
pub mod viewport;

#[cfg(test)]
mod testing;

// Re-export for hosts that open the local store themselves.
pub use sled;

pub use account::{AccountService, OnboardingStep, TermsAgreement};
pub use config::FinderConfig;
pub use directory::GymDirectory;
pub use error::{ConfigError, LocationAcquisitionError, RemoteError, StoreError};
pub use geo::{Coordinate, ViewportTarget};
pub use gym::{Amenity, Gym};
pub use permission::{PermissionGate, PermissionState};
pub use platform::{
    Accuracy, LocationServices, PermissionStatus, PositionCallback, PositionSubscription,
    RemediationPrompt, RemediationReason, TrackingOptions,
};
pub use remote::{BlobStorage, DataStore, Filter, IdentityProvider, IdentityService, Session, User};
pub use saved::{SavedGym, SavedGyms, Visit};
pub use screen::{FinderScreen, PendingSelect, SelectStart};
pub use selection::{SelectionChange, SelectionState};
pub use sheet::{ContentMode, ListTab, SheetController, SheetSnapState, SnapLayout};
pub use tracker::{LocationTracker, TrackerState};
pub use viewport::{ViewportController, ViewportStream};

/// Camera zoom used for every recenter.
pub const DEFAULT_RECENTER_ZOOM: f64 = 16.0;

/// Camera transition length for every recenter, in milliseconds.
pub const DEFAULT_RECENTER_DURATION_MS: u64 = 800;

/// Skeleton placeholder time before the detail view appears. Builds have shipped both 150
/// and 500; hosts override it through [`FinderConfig`].
pub const DEFAULT_DETAIL_REVEAL_DELAY_MS: u64 = 150;

/// Smallest movement, in meters, that produces a new position update.
pub const DEFAULT_MIN_DISTANCE_M: f64 = 1.0;

/// Minimum time between position updates, in milliseconds.
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 5_000;

/// Radius for the "nearby" list, in meters.
pub const DEFAULT_NEARBY_RADIUS_M: f64 = 2_000.0;

/// Age after which the nearby list is refetched.
pub const DEFAULT_NEARBY_REFRESH_SECS: u64 = 5 * 60;

/// Camera center before any fix arrives (Seoul City Hall).
pub const FALLBACK_CENTER: Coordinate = Coordinate {
    latitude: 37.5665,
    longitude: 126.978,
};
