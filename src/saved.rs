//! Local saved-gym list and visit log (Sled).
//!
//! Saved gyms live in one tree keyed by zero-padded gym id. Visits live in another keyed by
//! `{timestamp:020}_{id}` so range scans by time are plain lexicographic iteration.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::gym::Gym;

/// Default on-disk location of the local store.
pub const SAVED_STORE_PATH: &str = "climbmap_local";

const SAVED_TREE: &str = "saved_gyms";
const VISITS_TREE: &str = "visits";

const SECONDS_PER_DAY: u64 = 86_400;

/// A bookmarked gym, as shown in the "saved" tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGym {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub saved_at: u64,
    /// Filled in when listing; not persisted.
    #[serde(skip)]
    pub visit_count: u64,
}

/// One check-in at a gym.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub gym_id: i64,
    /// Unix seconds.
    pub timestamp: u64,
}

pub struct SavedGyms {
    db: sled::Db,
}

impl std::fmt::Debug for SavedGyms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SavedGyms").finish_non_exhaustive()
    }
}

impl SavedGyms {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, StoreError> {
        Ok(Self {
            db: sled::open(path)?,
        })
    }

    /// Wraps an already-open handle (tests use a temporary DB).
    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    fn saved_key(id: i64) -> String {
        // Offset keeps negative ids sorting before positive ones.
        format!("{:020}", (id as i128 - i64::MIN as i128))
    }

    pub fn save(&self, gym: &Gym, saved_at: u64) -> Result<(), StoreError> {
        let tree = self.db.open_tree(SAVED_TREE)?;
        let record = SavedGym {
            id: gym.id,
            name: gym.name.clone(),
            address: gym.address.clone(),
            saved_at,
            visit_count: 0,
        };
        tree.insert(Self::saved_key(gym.id).as_bytes(), serde_json::to_vec(&record)?)?;
        tree.flush()?;
        debug!(gym_id = gym.id, "gym saved");
        Ok(())
    }

    /// Returns whether the gym was saved.
    pub fn unsave(&self, id: i64) -> Result<bool, StoreError> {
        let tree = self.db.open_tree(SAVED_TREE)?;
        let removed = tree.remove(Self::saved_key(id).as_bytes())?.is_some();
        tree.flush()?;
        Ok(removed)
    }

    pub fn is_saved(&self, id: i64) -> Result<bool, StoreError> {
        let tree = self.db.open_tree(SAVED_TREE)?;
        Ok(tree.contains_key(Self::saved_key(id).as_bytes())?)
    }

    /// Saved gyms ordered by id, each with its visit count.
    pub fn list(&self) -> Result<Vec<SavedGym>, StoreError> {
        let tree = self.db.open_tree(SAVED_TREE)?;
        let visits = self.visits_since(0)?;

        let mut out = Vec::new();
        for entry in tree.iter() {
            let (_, value) = entry?;
            let Ok(mut saved) = serde_json::from_slice::<SavedGym>(&value) else {
                continue;
            };
            saved.visit_count = visits.iter().filter(|v| v.gym_id == saved.id).count() as u64;
            out.push(saved);
        }
        Ok(out)
    }

    pub fn record_visit(&self, gym_id: i64, timestamp: u64) -> Result<(), StoreError> {
        let tree = self.db.open_tree(VISITS_TREE)?;
        let id = self.db.generate_id()?;
        let key = format!("{timestamp:020}_{id}");
        let value = serde_json::to_vec(&Visit { gym_id, timestamp })?;

        tree.insert(key.as_bytes(), value)?;
        tree.flush()?;
        debug!(gym_id, timestamp, "visit recorded");
        Ok(())
    }

    pub fn visit_count(&self, gym_id: i64) -> Result<u64, StoreError> {
        Ok(self
            .visits_since(0)?
            .iter()
            .filter(|v| v.gym_id == gym_id)
            .count() as u64)
    }

    /// Visits at or after `start_ts` (unix seconds), oldest first.
    pub fn visits_since(&self, start_ts: u64) -> Result<Vec<Visit>, StoreError> {
        let tree = self.db.open_tree(VISITS_TREE)?;
        let start = format!("{start_ts:020}");

        Ok(tree
            .range(start.as_bytes()..)
            .filter_map(|res| res.ok())
            .filter_map(|(_, v)| serde_json::from_slice::<Visit>(&v).ok())
            .collect())
    }

    /// Distinct UTC day numbers (days since the epoch) with at least one visit in
    /// `[from_ts, to_ts)`. Feeds the activity calendar.
    pub fn visit_days(&self, from_ts: u64, to_ts: u64) -> Result<Vec<u64>, StoreError> {
        let mut days: Vec<u64> = self
            .visits_since(from_ts)?
            .into_iter()
            .take_while(|v| v.timestamp < to_ts)
            .map(|v| v.timestamp / SECONDS_PER_DAY)
            .collect();
        days.dedup();
        Ok(days)
    }
}
