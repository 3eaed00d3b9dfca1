//! Hand-written fakes for the collaborator traits.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::watch;

use crate::error::RemoteError;
use crate::geo::Coordinate;
use crate::gym::Gym;
use crate::platform::{
    Accuracy, LocationServices, PermissionStatus, PositionCallback, PositionSubscription,
    RemediationPrompt, RemediationReason, TrackingOptions,
};
use crate::remote::{BlobStorage, DataStore, Filter, IdentityProvider, IdentityService, Session, User};

pub fn gym(id: i64, latitude: f64, longitude: f64) -> Gym {
    serde_json::from_value(gym_row(id, latitude, longitude)).unwrap()
}

pub fn gym_row(id: i64, latitude: f64, longitude: f64) -> Value {
    json!({
        "id": id,
        "name": format!("Gym {id}"),
        "address": "Seoul",
        "latitude": latitude,
        "longitude": longitude,
    })
}

// ---------------------------------------------------------------------------
// Location services

struct Watcher {
    id: u64,
    callback: PositionCallback,
    active: bool,
}

struct LocationInner {
    enabled: Result<bool, String>,
    permission: Result<PermissionStatus, String>,
    fix: Result<Coordinate, String>,
    watch_error: Option<String>,
    watchers: Vec<Watcher>,
    next_watch_id: u64,
    last_options: Option<TrackingOptions>,
    fix_requests: usize,
    permission_requests: usize,
    settings_opened: usize,
    removed: usize,
}

pub struct FakeLocationServices {
    inner: Arc<Mutex<LocationInner>>,
}

impl Default for FakeLocationServices {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(LocationInner {
                enabled: Ok(true),
                permission: Ok(PermissionStatus::Granted),
                fix: Ok(Coordinate {
                    latitude: 37.5665,
                    longitude: 126.978,
                }),
                watch_error: None,
                watchers: Vec::new(),
                next_watch_id: 0,
                last_options: None,
                fix_requests: 0,
                permission_requests: 0,
                settings_opened: 0,
                removed: 0,
            })),
        }
    }
}

impl FakeLocationServices {
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.lock().unwrap().enabled = Ok(enabled);
    }

    pub fn fail_enabled_check(&self) {
        self.inner.lock().unwrap().enabled = Err("service query failed".to_string());
    }

    pub fn set_permission(&self, permission: Result<PermissionStatus, String>) {
        self.inner.lock().unwrap().permission = permission;
    }

    pub fn set_fix(&self, fix: Result<Coordinate, String>) {
        self.inner.lock().unwrap().fix = fix;
    }

    pub fn fail_watch(&self, reason: &str) {
        self.inner.lock().unwrap().watch_error = Some(reason.to_string());
    }

    /// Delivers an update to the active subscriptions, like the platform would.
    pub fn emit(&self, update: Coordinate) {
        let callbacks: Vec<PositionCallback> = {
            let inner = self.inner.lock().unwrap();
            inner
                .watchers
                .iter()
                .filter(|w| w.active)
                .map(|w| w.callback.clone())
                .collect()
        };
        for callback in callbacks {
            callback(update);
        }
    }

    /// Delivers to every callback ever registered, including removed ones.
    pub fn emit_to_all(&self, update: Coordinate) {
        let callbacks: Vec<PositionCallback> = {
            let inner = self.inner.lock().unwrap();
            inner.watchers.iter().map(|w| w.callback.clone()).collect()
        };
        for callback in callbacks {
            callback(update);
        }
    }

    pub fn active_subscriptions(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .watchers
            .iter()
            .filter(|w| w.active)
            .count()
    }

    pub fn removed_subscriptions(&self) -> usize {
        self.inner.lock().unwrap().removed
    }

    pub fn last_watch_options(&self) -> Option<TrackingOptions> {
        self.inner.lock().unwrap().last_options
    }

    pub fn fix_requests(&self) -> usize {
        self.inner.lock().unwrap().fix_requests
    }

    pub fn permission_requests(&self) -> usize {
        self.inner.lock().unwrap().permission_requests
    }

    pub fn settings_opened(&self) -> usize {
        self.inner.lock().unwrap().settings_opened
    }
}

struct FakeSubscription {
    id: u64,
    inner: Arc<Mutex<LocationInner>>,
}

impl PositionSubscription for FakeSubscription {
    fn remove(&mut self) {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        let id = self.id;
        if let Some(w) = inner.watchers.iter_mut().find(|w| w.id == id && w.active) {
            w.active = false;
            inner.removed += 1;
        }
    }
}

#[async_trait]
impl LocationServices for FakeLocationServices {
    async fn is_enabled(&self) -> Result<bool, String> {
        self.inner.lock().unwrap().enabled.clone()
    }

    async fn request_permission(&self) -> Result<PermissionStatus, String> {
        let mut inner = self.inner.lock().unwrap();
        inner.permission_requests += 1;
        inner.permission.clone()
    }

    async fn current_position(&self, _accuracy: Accuracy) -> Result<Coordinate, String> {
        let mut inner = self.inner.lock().unwrap();
        inner.fix_requests += 1;
        inner.fix.clone()
    }

    async fn watch_position(
        &self,
        options: TrackingOptions,
        callback: PositionCallback,
    ) -> Result<Box<dyn PositionSubscription>, String> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(reason) = inner.watch_error.clone() {
            return Err(reason);
        }
        inner.next_watch_id += 1;
        let id = inner.next_watch_id;
        inner.last_options = Some(options);
        inner.watchers.push(Watcher {
            id,
            callback,
            active: true,
        });
        Ok(Box::new(FakeSubscription {
            id,
            inner: self.inner.clone(),
        }))
    }

    fn open_settings(&self) {
        self.inner.lock().unwrap().settings_opened += 1;
    }
}

#[derive(Default)]
pub struct RecordingPrompt {
    reasons: Mutex<Vec<RemediationReason>>,
}

impl RecordingPrompt {
    pub fn reasons(&self) -> Vec<RemediationReason> {
        self.reasons.lock().unwrap().clone()
    }
}

impl RemediationPrompt for RecordingPrompt {
    fn present(&self, reason: RemediationReason) {
        self.reasons.lock().unwrap().push(reason);
    }
}

// ---------------------------------------------------------------------------
// Back end

#[derive(Default)]
struct StoreInner {
    tables: HashMap<String, Vec<Value>>,
    rpc_results: HashMap<String, Value>,
    last_rpc: Option<(String, Value)>,
    failing: bool,
    reads: usize,
}

#[derive(Default)]
pub struct MemoryDataStore {
    inner: Mutex<StoreInner>,
}

impl MemoryDataStore {
    pub fn insert(&self, table: &str, row: Value) {
        self.inner
            .lock()
            .unwrap()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.inner
            .lock()
            .unwrap()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().unwrap().failing = failing;
    }

    pub fn set_rpc_result(&self, function: &str, result: Value) {
        self.inner
            .lock()
            .unwrap()
            .rpc_results
            .insert(function.to_string(), result);
    }

    pub fn last_rpc(&self) -> Option<(String, Value)> {
        self.inner.lock().unwrap().last_rpc.clone()
    }

    pub fn reads(&self) -> usize {
        self.inner.lock().unwrap().reads
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn read(&self, table: &str, filter: &Filter) -> Result<Vec<Value>, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing {
            return Err(RemoteError::Request("store offline".to_string()));
        }
        inner.reads += 1;
        Ok(inner
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    /// Merges into the row with the same `id`, or appends.
    async fn upsert(&self, table: &str, record: Value) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing {
            return Err(RemoteError::Request("store offline".to_string()));
        }
        let rows = inner.tables.entry(table.to_string()).or_default();
        let existing = rows
            .iter()
            .position(|row| row.get("id").is_some() && row.get("id") == record.get("id"));
        match existing {
            Some(i) => match (&mut rows[i], record) {
                (Value::Object(row), Value::Object(fields)) => row.extend(fields),
                (row, record) => *row = record,
            },
            None => rows.push(record),
        }
        Ok(())
    }

    async fn rpc(&self, function: &str, params: Value) -> Result<Value, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing {
            return Err(RemoteError::Request("store offline".to_string()));
        }
        inner.last_rpc = Some((function.to_string(), params));
        Ok(inner.rpc_results.get(function).cloned().unwrap_or(Value::Null))
    }
}

pub struct FakeIdentity {
    session: watch::Sender<Option<Session>>,
    email: Mutex<Option<String>>,
}

impl Default for FakeIdentity {
    fn default() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            session,
            email: Mutex::new(None),
        }
    }
}

impl FakeIdentity {
    pub fn set_email(&self, email: Option<&str>) {
        *self.email.lock().unwrap() = email.map(str::to_string);
    }
}

#[async_trait]
impl IdentityService for FakeIdentity {
    async fn sign_in(
        &self,
        _provider: IdentityProvider,
        id_token: &str,
    ) -> Result<Session, RemoteError> {
        if id_token.is_empty() {
            return Err(RemoteError::Request("empty id token".to_string()));
        }
        let session = Session {
            user: User {
                id: "user-1".to_string(),
                email: self.email.lock().unwrap().clone(),
            },
            access_token: format!("access-{id_token}"),
        };
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn session(&self) -> Result<Option<Session>, RemoteError> {
        Ok(self.session.borrow().clone())
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        self.session.send_replace(None);
        Ok(())
    }

    fn on_session_change(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}

#[derive(Default)]
pub struct MemoryBlobStorage {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryBlobStorage {
    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .map(|(_, content_type)| content_type.clone())
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn upload(
        &self,
        _bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, RemoteError> {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(path.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://blobs.test/{bucket}/{path}")
    }
}
