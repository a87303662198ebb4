// SQLite persistence layer for crash recovery.
//
// The current draft id lives in the `draft_state` key-value table; the
// latest snapshot of each draft lives in `snapshots`, keyed by draft id.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::draft::snapshot::DraftSnapshot;

/// SQLite-backed autosave of the draft state.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS draft_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS snapshots (
                draft_id    TEXT PRIMARY KEY,
                taken_count INTEGER NOT NULL,
                snapshot    TEXT NOT NULL,
                updated_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection. A poisoned lock still holds a usable
    /// connection, so it is recovered rather than propagated.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Key-value state
    // ------------------------------------------------------------------

    /// Persist an arbitrary JSON value under `key`, replacing any previous one.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO draft_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT value FROM draft_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query draft state")?;

        json_str
            .map(|s| serde_json::from_str(&s).context("failed to deserialize state value"))
            .transpose()
    }

    // ------------------------------------------------------------------
    // Draft ID management
    // ------------------------------------------------------------------

    /// Key used in the draft_state table to store the current draft ID.
    const DRAFT_ID_KEY: &'static str = "current_draft_id";

    /// The stored draft ID, if a draft has been started.
    pub fn get_draft_id(&self) -> Result<Option<String>> {
        let value = self.load_state(Self::DRAFT_ID_KEY)?;
        Ok(value.and_then(|v| v.as_str().map(|s| s.to_string())))
    }

    pub fn set_draft_id(&self, draft_id: &str) -> Result<()> {
        self.save_state(
            Self::DRAFT_ID_KEY,
            &serde_json::Value::String(draft_id.to_string()),
        )
    }

    /// Generate a new draft ID from the current UTC time.
    ///
    /// Format: `draft_YYYYMMDD_HHMMSS_SSS` (e.g. `draft_20260907_191503_042`).
    pub fn generate_draft_id() -> String {
        let now = chrono::Utc::now();
        now.format("draft_%Y%m%d_%H%M%S_%3f").to_string()
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Store the latest snapshot for `draft_id`, replacing the previous one.
    pub fn save_snapshot(&self, draft_id: &str, snapshot: &DraftSnapshot) -> Result<()> {
        let json_str = snapshot
            .to_json_string()
            .context("failed to serialize draft snapshot")?;
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO snapshots (draft_id, taken_count, snapshot)
             VALUES (?1, ?2, ?3)",
            params![draft_id, snapshot.taken.len() as i64, json_str],
        )
        .context("failed to save draft snapshot")?;
        Ok(())
    }

    /// Load the latest snapshot for `draft_id`.
    pub fn load_snapshot(&self, draft_id: &str) -> Result<Option<DraftSnapshot>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT snapshot FROM snapshots WHERE draft_id = ?1",
                params![draft_id],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query draft snapshot")?;

        json_str
            .map(|s| DraftSnapshot::from_json_str(&s).context("failed to parse stored snapshot"))
            .transpose()
    }

    /// Returns `true` if a snapshot with at least one pick exists for `draft_id`.
    pub fn has_draft_in_progress(&self, draft_id: &str) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM snapshots WHERE draft_id = ?1 AND taken_count > 0)",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to check snapshot existence")?;
        Ok(exists)
    }

    /// Delete every snapshot and all key-value state in one transaction.
    pub fn clear_draft(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM snapshots", [])
            .context("failed to delete snapshots")?;
        tx.execute("DELETE FROM draft_state", [])
            .context("failed to delete draft state")?;
        tx.commit().context("failed to commit clear_draft")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
