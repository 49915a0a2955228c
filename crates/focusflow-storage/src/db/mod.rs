//! Database operations split into domain-specific modules.
//!
//! The key-value areas live here; settings, session and rule operations are
//! implemented on `Database` in the submodules.

mod rules;
mod session;
mod settings;


use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::{
    path::PathBuf,
    sync::{Mutex, MutexGuard},
};

use crate::migrations;
use crate::models::StorageArea;

pub use session::SESSION_KEY;
pub use settings::SETTINGS_KEY;

/// Database connection wrapper
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation, connection opening, or schema initialization fails
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = db_path.unwrap_or_else(Self::default_db_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(&path).context("Failed to open database connection")?;
        migrations::init_schema(&conn)?;

        log::info!("Database initialized at: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    ///
    /// Returns an error if schema initialization fails
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        migrations::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get default database path
    #[must_use]
    pub fn default_db_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("focusflow");
        path.push("focusflow.db");
        path
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }

    // ==================== Key-Value Methods ====================

    /// Read a stored value.
    ///
    /// A row whose text is not valid JSON is reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn get_value(&self, area: StorageArea, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .conn()?
            .query_row(
                "SELECT value FROM kv_store WHERE area = ?1 AND key = ?2",
                params![area.as_str(), key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(raw.and_then(|text| match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Stored value {area}/{key} is not valid JSON: {e}");
                None
            }
        }))
    }

    /// Write a value, bumping its revision
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database write fails
    pub fn set_value(&self, area: StorageArea, key: &str, value: &Value) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.conn()?.execute(
            "INSERT INTO kv_store (area, key, value, revision) VALUES (?1, ?2, ?3, 1)
             ON CONFLICT(area, key) DO UPDATE SET
                value = ?3,
                revision = revision + 1",
            params![area.as_str(), key, text],
        )?;
        Ok(())
    }

    /// Whether a value has ever been written for this key
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn has_value(&self, area: StorageArea, key: &str) -> Result<bool> {
        Ok(self.revision(area, key)? > 0)
    }

    /// Write counter for a key, zero if it was never written.
    ///
    /// Other processes compare revisions to notice changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn revision(&self, area: StorageArea, key: &str) -> Result<i64> {
        let revision: Option<i64> = self
            .conn()?
            .query_row(
                "SELECT revision FROM kv_store WHERE area = ?1 AND key = ?2",
                params![area.as_str(), key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(revision.unwrap_or(0))
    }
}
