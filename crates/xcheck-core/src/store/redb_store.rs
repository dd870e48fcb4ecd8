//! Campaign-action records in a redb file.
//!
//! # Table design
//!
//! A single `CAMPAIGN_ACTIONS` table with a composite key:
//! ```text
//! [ user_id bytes | 0x00 | campaign_id bytes | 0x00 | action kind index (1 byte) ]
//! ```
//!
//! All records of one (user, campaign) pair share a byte prefix, so `list`
//! is a single range scan, and the trailing kind byte keeps them in
//! `ActionKind` order. Ids must not contain NUL.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, TableDefinition};

use crate::error::{Result, XcheckError};

use super::{ActionKey, ActionStore, PersistedActionRecord};

// ---------------------------------------------------------------------------
// Table definition
// ---------------------------------------------------------------------------

/// Value: JSON-encoded `PersistedActionRecord`
const CAMPAIGN_ACTIONS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("campaign_actions");

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

fn pair_prefix(user_id: &str, campaign_id: &str) -> Result<Vec<u8>> {
    if user_id.contains('\0') || campaign_id.contains('\0') {
        return Err(XcheckError::Store(
            "user_id and campaign_id must not contain NUL".to_string(),
        ));
    }
    let mut key = Vec::with_capacity(user_id.len() + campaign_id.len() + 3);
    key.extend_from_slice(user_id.as_bytes());
    key.push(0);
    key.extend_from_slice(campaign_id.as_bytes());
    key.push(0);
    Ok(key)
}

fn record_key(key: &ActionKey) -> Result<Vec<u8>> {
    let mut bytes = pair_prefix(&key.user_id, &key.campaign_id)?;
    bytes.push(key.action_type.index() as u8);
    Ok(bytes)
}

fn store_err(e: impl std::fmt::Display) -> XcheckError {
    XcheckError::Store(e.to_string())
}

// ---------------------------------------------------------------------------
// RedbActionStore
// ---------------------------------------------------------------------------

pub struct RedbActionStore {
    db: Database,
}

impl RedbActionStore {
    /// Open or create the redb database at `path`.
    ///
    /// Creates the `CAMPAIGN_ACTIONS` table if it doesn't already exist.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(store_err)?;
        // Ensure the table exists before any reads
        let wt = db.begin_write().map_err(store_err)?;
        wt.open_table(CAMPAIGN_ACTIONS).map_err(store_err)?;
        wt.commit().map_err(store_err)?;
        Ok(Self { db })
    }
}

impl ActionStore for RedbActionStore {
    /// A single write transaction; redb's insert replaces any existing value
    /// for the key, which gives the upsert.
    fn upsert(&self, key: &ActionKey, completed: bool, checked_at: DateTime<Utc>) -> Result<()> {
        let k = record_key(key)?;
        let record = PersistedActionRecord {
            user_id: key.user_id.clone(),
            campaign_id: key.campaign_id.clone(),
            action_type: key.action_type,
            completed,
            checked_at,
        };
        let value = serde_json::to_vec(&record)?;

        let wt = self.db.begin_write().map_err(store_err)?;
        {
            let mut table = wt.open_table(CAMPAIGN_ACTIONS).map_err(store_err)?;
            table
                .insert(k.as_slice(), value.as_slice())
                .map_err(store_err)?;
        }
        wt.commit().map_err(store_err)?;
        Ok(())
    }

    fn get(&self, key: &ActionKey) -> Result<Option<PersistedActionRecord>> {
        let k = record_key(key)?;
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(CAMPAIGN_ACTIONS).map_err(store_err)?;
        match table.get(k.as_slice()).map_err(store_err)? {
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
            None => Ok(None),
        }
    }

    fn list(&self, user_id: &str, campaign_id: &str) -> Result<Vec<PersistedActionRecord>> {
        let lower = pair_prefix(user_id, campaign_id)?;
        let mut upper = lower.clone();
        upper.push(0xff);

        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(CAMPAIGN_ACTIONS).map_err(store_err)?;

        let mut result = Vec::new();
        for entry in table
            .range(lower.as_slice()..=upper.as_slice())
            .map_err(store_err)?
        {
            let (_, v) = entry.map_err(store_err)?;
            let record: PersistedActionRecord = serde_json::from_slice(v.value())?;
            result.push(record);
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;
    use crate::types::ActionKind;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, RedbActionStore) {
        let dir = TempDir::new().unwrap();
        let db = RedbActionStore::open(&dir.path().join("actions.redb")).unwrap();
        (dir, db)
    }

    #[test]
    fn upsert_creates_then_overwrites() {
        let (_dir, db) = open_tmp();
        conformance::upsert_creates_then_overwrites(&db);
    }

    #[test]
    fn upsert_is_idempotent() {
        let (_dir, db) = open_tmp();
        conformance::upsert_is_idempotent(&db);
    }

    #[test]
    fn list_is_scoped_to_user_and_campaign() {
        let (_dir, db) = open_tmp();
        conformance::list_is_scoped_to_user_and_campaign(&db);
    }

    #[test]
    fn timestamps_round_trip() {
        let (_dir, db) = open_tmp();
        conformance::sub_second_timestamps_survive(&db);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actions.redb");
        let key = ActionKey::new("42", "7", ActionKind::Comment);
        {
            let db = RedbActionStore::open(&path).unwrap();
            db.upsert(&key, true, Utc::now()).unwrap();
        }
        let db = RedbActionStore::open(&path).unwrap();
        assert!(db.get(&key).unwrap().unwrap().completed);
    }

    #[test]
    fn nul_in_id_is_rejected() {
        let (_dir, db) = open_tmp();
        let key = ActionKey::new("a\0b", "c", ActionKind::Like);
        assert!(matches!(
            db.upsert(&key, true, Utc::now()),
            Err(XcheckError::Store(_))
        ));
    }

    #[test]
    fn empty_db_lists_nothing() {
        let (_dir, db) = open_tmp();
        assert!(db.list("u", "c").unwrap().is_empty());
    }
}
