//! Error types.
//!
//! Location errors are state the UI renders next to a retry button. Remote and store
//! errors are returned to the caller after being logged at the call site.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why the device position could not be obtained. Every variant is user-recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LocationAcquisitionError {
    #[error("location services are turned off")]
    ServicesDisabled,
    #[error("location permission was denied")]
    PermissionDenied,
    #[error("the current position could not be determined")]
    PositionUnavailable,
}

/// Failure talking to the identity service, the data store or blob storage.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote request failed: {0}")]
    Request(String),
    #[error("failed to decode remote record: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{table} record {id} not found")]
    NotFound { table: String, id: String },
    #[error("no authenticated session")]
    NoSession,
}

/// Failure in the local saved-gym store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("local store error: {0}")]
    Db(#[from] sled::Error),
    #[error("failed to encode local record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
