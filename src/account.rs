//! Sign-in, onboarding routing and avatar upload over the hosted back end.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::RemoteError;
use crate::remote::{BlobStorage, DataStore, Filter, IdentityProvider, IdentityService, Session};

pub const USER_TABLE: &str = "User";
pub const TERMS_TABLE: &str = "TermsAgreement";
pub const AVATAR_BUCKET: &str = "avatars";

/// First screen to show after launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnboardingStep {
    Login,
    Terms,
    Profile,
    Home,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFlags {
    #[serde(default)]
    pub terms_agreed: bool,
    #[serde(default)]
    pub profile_complete: bool,
}

/// Consent checkboxes from the terms screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermsAgreement {
    pub service: bool,
    pub privacy: bool,
    pub marketing: bool,
}

impl TermsAgreement {
    pub fn all(agree: bool) -> Self {
        Self {
            service: agree,
            privacy: agree,
            marketing: agree,
        }
    }

    /// Service and privacy terms are mandatory; marketing is optional.
    pub fn is_sufficient(&self) -> bool {
        self.service && self.privacy
    }
}

pub struct AccountService {
    identity: Arc<dyn IdentityService>,
    store: Arc<dyn DataStore>,
    blobs: Arc<dyn BlobStorage>,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}

impl AccountService {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        store: Arc<dyn DataStore>,
        blobs: Arc<dyn BlobStorage>,
    ) -> Self {
        Self {
            identity,
            store,
            blobs,
        }
    }

    pub async fn sign_in(
        &self,
        provider: IdentityProvider,
        id_token: &str,
    ) -> Result<Session, RemoteError> {
        let session = self
            .identity
            .sign_in(provider, id_token)
            .await
            .inspect_err(|e| error!(error = %e, ?provider, "sign-in failed"))?;
        info!(user_id = %session.user.id, ?provider, "signed in");
        Ok(session)
    }

    pub async fn sign_out(&self) -> Result<(), RemoteError> {
        self.identity
            .sign_out()
            .await
            .inspect_err(|e| error!(error = %e, "sign-out failed"))
    }

    async fn require_session(&self) -> Result<Session, RemoteError> {
        self.identity
            .session()
            .await
            .inspect_err(|e| error!(error = %e, "failed to read session"))?
            .ok_or(RemoteError::NoSession)
    }

    /// Decides where the app starts. Any failure sends the user back to login.
    pub async fn resolve_start_step(&self) -> OnboardingStep {
        let session = match self.identity.session().await {
            Ok(Some(session)) => session,
            Ok(None) => return OnboardingStep::Login,
            Err(e) => {
                error!(error = %e, "failed to read session");
                return OnboardingStep::Login;
            }
        };

        let filter = Filter::all().equals("id", session.user.id.as_str());
        let rows = match self.store.read(USER_TABLE, &filter).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "failed to read profile");
                return OnboardingStep::Login;
            }
        };

        let flags = rows
            .into_iter()
            .next()
            .map(serde_json::from_value::<ProfileFlags>);
        match flags {
            None => OnboardingStep::Terms,
            Some(Err(e)) => {
                warn!(error = %e, "unreadable profile row; restarting onboarding");
                OnboardingStep::Terms
            }
            Some(Ok(flags)) if !flags.terms_agreed => OnboardingStep::Terms,
            Some(Ok(flags)) if !flags.profile_complete => OnboardingStep::Profile,
            Some(Ok(_)) => OnboardingStep::Home,
        }
    }

    /// Creates the user row (nickname defaults to the e-mail local part) and records the
    /// consent choices.
    pub async fn accept_terms(&self, terms: TermsAgreement) -> Result<(), RemoteError> {
        if !terms.is_sufficient() {
            return Err(RemoteError::Request(
                "service and privacy terms must be accepted".to_string(),
            ));
        }
        let session = self.require_session().await?;
        let user = &session.user;
        let nickname = user
            .email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|nick| !nick.is_empty());

        self.store
            .upsert(
                USER_TABLE,
                json!({
                    "id": user.id,
                    "email": user.email,
                    "nickname": nickname,
                    "terms_agreed": true,
                }),
            )
            .await
            .inspect_err(|e| error!(error = %e, "failed to upsert user"))?;

        self.store
            .upsert(
                TERMS_TABLE,
                json!({
                    "id": user.id,
                    "user_id": user.id,
                    "service": terms.service,
                    "privacy": terms.privacy,
                    "marketing": terms.marketing,
                }),
            )
            .await
            .inspect_err(|e| error!(error = %e, "failed to upsert terms agreement"))?;

        info!(user_id = %user.id, "terms accepted");
        Ok(())
    }

    /// Finishes onboarding: stores the chosen nickname (and avatar, when one was uploaded)
    /// and marks the profile complete.
    pub async fn complete_profile(
        &self,
        nickname: &str,
        avatar_url: Option<&str>,
    ) -> Result<(), RemoteError> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(RemoteError::Request("nickname must not be empty".to_string()));
        }
        let session = self.require_session().await?;
        let user = &session.user;

        let mut record = json!({
            "id": user.id,
            "email": user.email,
            "nickname": nickname,
            "profile_complete": true,
        });
        if let (Some(url), Some(fields)) = (avatar_url, record.as_object_mut()) {
            fields.insert("avatar_url".to_string(), json!(url));
        }

        self.store
            .upsert(USER_TABLE, record)
            .await
            .inspect_err(|e| error!(error = %e, "failed to save profile"))?;

        info!(user_id = %user.id, nickname, "profile completed");
        Ok(())
    }

    /// Uploads an avatar image and points the profile at it. Returns the public URL.
    ///
    /// `file_ext` comes from the picked file name; it is lowercased and defaults to `jpeg`.
    pub async fn upload_avatar(
        &self,
        bytes: Vec<u8>,
        file_ext: Option<&str>,
        uploaded_at_ms: u64,
    ) -> Result<String, RemoteError> {
        let session = self.require_session().await?;
        let ext = file_ext
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "jpeg".to_string());
        let content_type = match ext.as_str() {
            "png" => "image/png",
            "webp" => "image/webp",
            "heic" => "image/heic",
            _ => "image/jpeg",
        };
        let path = format!("{uploaded_at_ms}.{ext}");

        let stored = self
            .blobs
            .upload(AVATAR_BUCKET, &path, bytes, content_type)
            .await
            .inspect_err(|e| error!(error = %e, "avatar upload failed"))?;

        self.store
            .upsert(
                USER_TABLE,
                json!({ "id": session.user.id, "avatar_url": stored }),
            )
            .await
            .inspect_err(|e| error!(error = %e, "failed to save avatar path"))?;

        Ok(self.blobs.public_url(AVATAR_BUCKET, &stored))
    }
}
