//! Location service and permission gate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::platform::{LocationServices, PermissionStatus, RemediationPrompt, RemediationReason};

/// App-level view of the location permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

/// Checks that location services are on and that the app may use them, prompting the user
/// to fix either condition. Never returns an error: OS failures count as "not allowed".
pub struct PermissionGate {
    services: Arc<dyn LocationServices>,
    prompt: Arc<dyn RemediationPrompt>,
    state: PermissionState,
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate")
            .field("state", &self.state)
            .finish()
    }
}

impl PermissionGate {
    pub fn new(services: Arc<dyn LocationServices>, prompt: Arc<dyn RemediationPrompt>) -> Self {
        Self {
            services,
            prompt,
            state: PermissionState::Unknown,
        }
    }

    pub fn state(&self) -> PermissionState {
        self.state
    }

    /// Returns whether device location services are on. When they are off the remediation
    /// dialog is shown and `false` is returned right away; there is no automatic re-check.
    pub async fn check_service_enabled(&self) -> bool {
        let enabled = match self.services.is_enabled().await {
            Ok(enabled) => enabled,
            Err(e) => {
                error!(error = %e, "location service check failed");
                false
            }
        };

        if !enabled {
            info!("location services disabled; offering settings");
            self.prompt.present(RemediationReason::ServicesDisabled);
        }
        enabled
    }

    /// Runs one permission request cycle and resolves the state to `Granted` or `Denied`.
    pub async fn request_permission(&mut self) -> PermissionState {
        let state = match self.services.request_permission().await {
            Ok(PermissionStatus::Granted) => PermissionState::Granted,
            Ok(status) => {
                debug!(?status, "location permission not granted");
                PermissionState::Denied
            }
            Err(e) => {
                error!(error = %e, "location permission request failed");
                PermissionState::Denied
            }
        };

        if state == PermissionState::Denied {
            self.prompt.present(RemediationReason::PermissionDenied);
        }

        info!(?state, "location permission resolved");
        self.state = state;
        state
    }

    pub fn open_settings(&self) {
        self.services.open_settings();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLocationServices, RecordingPrompt};

    fn gate(services: &Arc<FakeLocationServices>) -> (PermissionGate, Arc<RecordingPrompt>) {
        let prompt = Arc::new(RecordingPrompt::default());
        (PermissionGate::new(services.clone(), prompt.clone()), prompt)
    }

    #[tokio::test]
    async fn disabled_services_prompt_and_return_false() {
        let services = Arc::new(FakeLocationServices::default());
        services.set_enabled(false);
        let (gate, prompt) = gate(&services);

        assert!(!gate.check_service_enabled().await);
        assert_eq!(prompt.reasons(), vec![RemediationReason::ServicesDisabled]);
    }

    #[tokio::test]
    async fn service_check_error_counts_as_disabled() {
        let services = Arc::new(FakeLocationServices::default());
        services.fail_enabled_check();
        let (gate, prompt) = gate(&services);

        assert!(!gate.check_service_enabled().await);
        assert_eq!(prompt.reasons().len(), 1);
    }

    #[tokio::test]
    async fn granted_permission_does_not_prompt() {
        let services = Arc::new(FakeLocationServices::default());
        let (mut gate, prompt) = gate(&services);

        assert_eq!(gate.state(), PermissionState::Unknown);
        assert_eq!(gate.request_permission().await, PermissionState::Granted);
        assert_eq!(gate.state(), PermissionState::Granted);
        assert!(prompt.reasons().is_empty());
    }

    #[tokio::test]
    async fn denied_or_failed_permission_prompts() {
        let services = Arc::new(FakeLocationServices::default());
        services.set_permission(Ok(PermissionStatus::Undetermined));
        let (mut gate, prompt) = gate(&services);
        assert_eq!(gate.request_permission().await, PermissionState::Denied);

        services.set_permission(Err("dialog crashed".to_string()));
        assert_eq!(gate.request_permission().await, PermissionState::Denied);

        assert_eq!(
            prompt.reasons(),
            vec![
                RemediationReason::PermissionDenied,
                RemediationReason::PermissionDenied
            ]
        );
    }

    #[tokio::test]
    async fn open_settings_reaches_platform() {
        let services = Arc::new(FakeLocationServices::default());
        let (gate, _) = gate(&services);
        gate.open_settings();
        assert_eq!(services.settings_opened(), 1);
    }
}
