//! Campaign-action records in a SQLite table.
//!
//! Uniqueness is enforced by the schema; the upsert is one
//! `INSERT ... ON CONFLICT DO UPDATE` statement.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, XcheckError};

use super::{ActionKey, ActionStore, PersistedActionRecord};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS user_campaign_actions (
    user_id      TEXT    NOT NULL,
    campaign_id  TEXT    NOT NULL,
    action_type  TEXT    NOT NULL,
    completed    INTEGER NOT NULL,
    checked_at   TEXT    NOT NULL,
    UNIQUE (user_id, campaign_id, action_type)
);
";

const UPSERT: &str = "
INSERT INTO user_campaign_actions (user_id, campaign_id, action_type, completed, checked_at)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT (user_id, campaign_id, action_type)
DO UPDATE SET completed = excluded.completed, checked_at = excluded.checked_at
";

type RawRow = (String, String, String, bool, String);

pub struct SqliteActionStore {
    conn: Connection,
}

impl SqliteActionStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn into_record(raw: RawRow) -> Result<PersistedActionRecord> {
    let (user_id, campaign_id, action_type, completed, checked_at) = raw;
    let checked_at = DateTime::parse_from_rfc3339(&checked_at)
        .map_err(|e| XcheckError::Store(format!("bad checked_at '{checked_at}': {e}")))?
        .with_timezone(&Utc);
    Ok(PersistedActionRecord {
        user_id,
        campaign_id,
        action_type: action_type.parse()?,
        completed,
        checked_at,
    })
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

impl ActionStore for SqliteActionStore {
    fn upsert(&self, key: &ActionKey, completed: bool, checked_at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            UPSERT,
            params![
                key.user_id,
                key.campaign_id,
                key.action_type.as_str(),
                completed,
                format_ts(checked_at),
            ],
        )?;
        Ok(())
    }

    fn get(&self, key: &ActionKey) -> Result<Option<PersistedActionRecord>> {
        let raw = self
            .conn
            .query_row(
                "SELECT user_id, campaign_id, action_type, completed, checked_at
                 FROM user_campaign_actions
                 WHERE user_id = ?1 AND campaign_id = ?2 AND action_type = ?3",
                params![key.user_id, key.campaign_id, key.action_type.as_str()],
                read_row,
            )
            .optional()?;
        raw.map(into_record).transpose()
    }

    fn list(&self, user_id: &str, campaign_id: &str) -> Result<Vec<PersistedActionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, campaign_id, action_type, completed, checked_at
             FROM user_campaign_actions
             WHERE user_id = ?1 AND campaign_id = ?2",
        )?;
        let raws = stmt
            .query_map(params![user_id, campaign_id], read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut records = raws
            .into_iter()
            .map(into_record)
            .collect::<Result<Vec<_>>>()?;
        records.sort_by_key(|r| r.action_type);
        Ok(records)
    }
}
