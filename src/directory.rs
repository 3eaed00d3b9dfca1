//! Cached gym lists backed by the remote data store.
//!
//! A failed refresh is logged and returned, and leaves the previously cached lists as they
//! were.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::FinderConfig;
use crate::error::RemoteError;
use crate::geo::Coordinate;
use crate::gym::{Gym, GYM_TABLE};
use crate::remote::{DataStore, Filter};

/// Server-side function returning gyms within a radius of a point.
pub const NEARBY_RPC: &str = "get_nearby_centers";

pub struct GymDirectory {
    store: Arc<dyn DataStore>,
    radius_m: f64,
    refresh_interval: Duration,
    all: Vec<Gym>,
    nearby: Vec<Gym>,
    nearby_fetched_at: Option<Instant>,
}

impl std::fmt::Debug for GymDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GymDirectory")
            .field("radius_m", &self.radius_m)
            .field("all_len", &self.all.len())
            .field("nearby_len", &self.nearby.len())
            .finish()
    }
}

impl GymDirectory {
    pub fn new(store: Arc<dyn DataStore>, config: &FinderConfig) -> Self {
        Self {
            store,
            radius_m: config.nearby_radius_m,
            refresh_interval: config.nearby_refresh_interval(),
            all: Vec::new(),
            nearby: Vec::new(),
            nearby_fetched_at: None,
        }
    }

    pub fn all(&self) -> &[Gym] {
        &self.all
    }

    /// Gyms around the last refresh position, nearest first.
    pub fn nearby(&self) -> &[Gym] {
        &self.nearby
    }

    pub fn find(&self, id: i64) -> Option<&Gym> {
        self.all
            .iter()
            .chain(self.nearby.iter())
            .find(|gym| gym.id == id)
    }

    /// Gyms whose name contains `term`, ignoring case. A blank term matches nothing.
    pub fn search(&self, term: &str) -> Vec<&Gym> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }
        self.all
            .iter()
            .filter(|gym| gym.name.to_lowercase().contains(&term))
            .collect()
    }

    /// Reloads every gym (map markers, search).
    pub async fn refresh_all(&mut self) -> Result<usize, RemoteError> {
        let rows = self
            .store
            .read(GYM_TABLE, &Filter::all())
            .await
            .inspect_err(|e| error!(error = %e, "failed to fetch gyms"))?;
        let gyms = decode_rows(rows).inspect_err(|e| error!(error = %e, "bad gym row"))?;

        info!(count = gyms.len(), "gym list refreshed");
        self.all = gyms;
        Ok(self.all.len())
    }

    /// Reloads gyms within the configured radius of `position`.
    pub async fn refresh_nearby(&mut self, position: Coordinate) -> Result<usize, RemoteError> {
        let params = json!({
            "lat": position.latitude,
            "lon": position.longitude,
            "radius": self.radius_m,
        });
        let result = self
            .store
            .rpc(NEARBY_RPC, params)
            .await
            .inspect_err(|e| error!(error = %e, "failed to fetch nearby gyms"))?;

        let mut gyms = match result {
            Value::Null => Vec::new(),
            value => serde_json::from_value::<Vec<Gym>>(value)
                .inspect_err(|e| error!(error = %e, "bad nearby gym payload"))?,
        };
        gyms.sort_by(|a, b| {
            let da = position.distance_m(&a.coordinate());
            let db = position.distance_m(&b.coordinate());
            da.total_cmp(&db)
        });

        info!(count = gyms.len(), radius_m = self.radius_m, "nearby gyms refreshed");
        self.nearby = gyms;
        self.nearby_fetched_at = Some(Instant::now());
        Ok(self.nearby.len())
    }

    /// Whether the nearby list has never been fetched or is older than the refresh
    /// interval.
    pub fn nearby_refresh_due(&self) -> bool {
        self.nearby_fetched_at
            .map_or(true, |at| at.elapsed() >= self.refresh_interval)
    }

    /// Returns the gym with `id`, from cache when possible, else from the data store.
    pub async fn fetch(&mut self, id: i64) -> Result<Gym, RemoteError> {
        if let Some(gym) = self.find(id) {
            return Ok(gym.clone());
        }
        let gym = Self::fetch_from(self.store.as_ref(), id).await?;
        self.remember(gym.clone());
        Ok(gym)
    }

    /// Handle for lookups that must not hold a borrow of the directory while in flight.
    pub fn store(&self) -> Arc<dyn DataStore> {
        Arc::clone(&self.store)
    }

    /// Reads one gym row straight from the data store.
    pub async fn fetch_from(store: &dyn DataStore, id: i64) -> Result<Gym, RemoteError> {
        debug!(gym_id = id, "reading gym from store");
        let rows = store
            .read(GYM_TABLE, &Filter::all().equals("id", id))
            .await
            .inspect_err(|e| error!(error = %e, gym_id = id, "failed to fetch gym"))?;

        decode_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::NotFound {
                table: GYM_TABLE.to_string(),
                id: id.to_string(),
            })
    }

    /// Adds a gym fetched out of band to the full list.
    pub fn remember(&mut self, gym: Gym) {
        if self.find(gym.id).is_none() {
            self.all.push(gym);
        }
    }
}

fn decode_rows(rows: Vec<Value>) -> Result<Vec<Gym>, RemoteError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(RemoteError::from))
        .collect()
}
