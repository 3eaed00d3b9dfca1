//! Tunables for the finder core.
//!
//! Every field has a default, so a host can ship an empty `{}` config and override only
//! what its screen layout needs.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::platform::TrackingOptions;
use crate::sheet::{SheetSnapState, SnapLayout};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    pub recenter_zoom: f64,
    pub recenter_duration_ms: u64,
    /// Delay between the sheet reaching full height and the detail view replacing the
    /// skeleton placeholder.
    pub detail_reveal_delay_ms: u64,
    pub tracking: TrackingOptions,
    pub nearby_radius_m: f64,
    pub nearby_refresh_interval_secs: u64,
    /// Issue one recenter on the first fix after mount.
    pub recenter_on_first_fix: bool,
    pub sheet: SnapLayout,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            recenter_zoom: crate::DEFAULT_RECENTER_ZOOM,
            recenter_duration_ms: crate::DEFAULT_RECENTER_DURATION_MS,
            detail_reveal_delay_ms: crate::DEFAULT_DETAIL_REVEAL_DELAY_MS,
            tracking: TrackingOptions::default(),
            nearby_radius_m: crate::DEFAULT_NEARBY_RADIUS_M,
            nearby_refresh_interval_secs: crate::DEFAULT_NEARBY_REFRESH_SECS,
            recenter_on_first_fix: false,
            sheet: SnapLayout::default(),
        }
    }
}

impl FinderConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn detail_reveal_delay(&self) -> Duration {
        Duration::from_millis(self.detail_reveal_delay_ms)
    }

    pub fn nearby_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.nearby_refresh_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.recenter_zoom.is_finite() || self.recenter_zoom <= 0.0 {
            return Err(invalid("recenter_zoom", "must be a positive number"));
        }
        if !self.nearby_radius_m.is_finite() || self.nearby_radius_m <= 0.0 {
            return Err(invalid("nearby_radius_m", "must be a positive number"));
        }
        if !self.tracking.min_distance_m.is_finite() || self.tracking.min_distance_m < 0.0 {
            return Err(invalid(
                "tracking.min_distance_m",
                "must be a non-negative number",
            ));
        }
        validate_snaps("sheet.unselected", &self.sheet.unselected)?;
        validate_snaps("sheet.selected", &self.sheet.selected)?;
        if self.sheet.selected.contains(&SheetSnapState::Half) {
            return Err(invalid(
                "sheet.selected",
                "half height is not allowed while a gym is selected",
            ));
        }
        Ok(())
    }
}

fn validate_snaps(field: &'static str, snaps: &[SheetSnapState]) -> Result<(), ConfigError> {
    if snaps.first() != Some(&SheetSnapState::Collapsed) {
        return Err(invalid(field, "must start with Collapsed"));
    }
    if !snaps.windows(2).all(|w| w[0] < w[1]) {
        return Err(invalid(field, "must be strictly ascending"));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
