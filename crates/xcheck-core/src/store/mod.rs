//! Persisted campaign-action state.
//!
//! Reconciliation only needs a keyed upsert, so storage sits behind
//! [`ActionStore`]. Three backends ship with the crate: redb, sqlite and an
//! in-memory map.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, XcheckError};
use crate::types::ActionKind;

pub mod redb_store;
pub mod sqlite_store;

pub use redb_store::RedbActionStore;
pub use sqlite_store::SqliteActionStore;

/// Unique key of a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionKey {
    pub user_id: String,
    pub campaign_id: String,
    pub action_type: ActionKind,
}

impl ActionKey {
    pub fn new(
        user_id: impl Into<String>,
        campaign_id: impl Into<String>,
        action_type: ActionKind,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            campaign_id: campaign_id.into(),
            action_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedActionRecord {
    pub user_id: String,
    pub campaign_id: String,
    pub action_type: ActionKind,
    pub completed: bool,
    pub checked_at: DateTime<Utc>,
}

pub trait ActionStore {
    /// Insert the record for `key`, or overwrite `completed` and `checked_at`
    /// if it already exists. Must be atomic.
    fn upsert(&self, key: &ActionKey, completed: bool, checked_at: DateTime<Utc>) -> Result<()>;

    fn get(&self, key: &ActionKey) -> Result<Option<PersistedActionRecord>>;

    /// All records of one user in one campaign, ordered by action type.
    fn list(&self, user_id: &str, campaign_id: &str) -> Result<Vec<PersistedActionRecord>>;
}

// ---------------------------------------------------------------------------
// MemoryActionStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryActionStore {
    rows: Mutex<BTreeMap<ActionKey, PersistedActionRecord>>,
}

impl MemoryActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<ActionKey, PersistedActionRecord>>> {
        self.rows
            .lock()
            .map_err(|e| XcheckError::Store(e.to_string()))
    }
}

impl ActionStore for MemoryActionStore {
    fn upsert(&self, key: &ActionKey, completed: bool, checked_at: DateTime<Utc>) -> Result<()> {
        let mut rows = self.lock()?;
        rows.insert(
            key.clone(),
            PersistedActionRecord {
                user_id: key.user_id.clone(),
                campaign_id: key.campaign_id.clone(),
                action_type: key.action_type,
                completed,
                checked_at,
            },
        );
        Ok(())
    }

    fn get(&self, key: &ActionKey) -> Result<Option<PersistedActionRecord>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn list(&self, user_id: &str, campaign_id: &str) -> Result<Vec<PersistedActionRecord>> {
        Ok(self
            .lock()?
            .values()
            .filter(|r| r.user_id == user_id && r.campaign_id == campaign_id)
            .cloned()
            .collect())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_upsert_creates_then_overwrites() {
        conformance::upsert_creates_then_overwrites(&MemoryActionStore::new());
    }

    #[test]
    fn memory_upsert_is_idempotent() {
        conformance::upsert_is_idempotent(&MemoryActionStore::new());
    }

    #[test]
    fn memory_list_is_scoped() {
        conformance::list_is_scoped_to_user_and_campaign(&MemoryActionStore::new());
    }

    #[test]
    fn memory_keeps_timestamps() {
        let store = MemoryActionStore::new();
        conformance::sub_second_timestamps_survive(&store);
        assert_eq!(store.len().unwrap(), 1);
    }
}
