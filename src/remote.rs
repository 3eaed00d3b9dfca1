//! Contracts for the hosted back end: identity, relational data store and blob storage.
//!
//! Records cross this boundary as JSON values; typed decoding happens in the modules that
//! own each table.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::error::RemoteError;

/// Equality filter over record columns. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub eq: Vec<(String, Value)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn equals(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.eq.push((column.into(), value.into()));
        self
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.eq
            .iter()
            .all(|(column, expected)| record.get(column) == Some(expected))
    }
}

#[async_trait]
pub trait DataStore: Send + Sync {
    async fn read(&self, table: &str, filter: &Filter) -> Result<Vec<Value>, RemoteError>;

    async fn upsert(&self, table: &str, record: Value) -> Result<(), RemoteError>;

    /// Remote procedure call; the result shape is function-specific.
    async fn rpc(&self, function: &str, params: Value) -> Result<Value, RemoteError>;
}

/// Federated identity providers the app signs in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityProvider {
    Google,
    Apple,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub access_token: String,
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Exchanges a provider-issued ID token for a session.
    async fn sign_in(
        &self,
        provider: IdentityProvider,
        id_token: &str,
    ) -> Result<Session, RemoteError>;

    async fn session(&self) -> Result<Option<Session>, RemoteError>;

    async fn sign_out(&self) -> Result<(), RemoteError>;

    /// Observes sign-in, sign-out and token refreshes.
    fn on_session_change(&self) -> watch::Receiver<Option<Session>>;
}

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stores `bytes` under `path` inside `bucket` and returns the stored path.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, RemoteError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_matches_all_columns() {
        let row = json!({ "id": 42, "name": "Boulder Lab" });
        assert!(Filter::all().matches(&row));
        assert!(Filter::all().equals("id", 42).matches(&row));
        assert!(!Filter::all().equals("id", 42).equals("name", "Other").matches(&row));
        assert!(!Filter::all().equals("missing", true).matches(&row));
    }
}
