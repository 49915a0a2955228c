use anyhow::Result;

use super::Database;
use crate::models::{SessionPatch, SessionState, StorageArea};

pub const SESSION_KEY: &str = "session";

impl Database {
    // ==================== Session Methods ====================

    /// Get session state, filling absent fields from defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn get_session(&self) -> Result<SessionState> {
        Ok(self
            .get_value(StorageArea::Local, SESSION_KEY)?
            .map_or_else(SessionState::default, |value| {
                SessionState::from_stored(&value)
            }))
    }

    /// Merge `patch` over the current session state and persist the result
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails
    pub fn set_session(&self, patch: SessionPatch) -> Result<SessionState> {
        let merged = self.get_session()?.merged(patch);
        self.set_value(
            StorageArea::Local,
            SESSION_KEY,
            &serde_json::to_value(&merged)?,
        )?;
        Ok(merged)
    }

    /// Reset to the inactive default
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails
    pub fn clear_session(&self) -> Result<()> {
        self.set_value(
            StorageArea::Local,
            SESSION_KEY,
            &serde_json::to_value(SessionState::default())?,
        )
    }
}
