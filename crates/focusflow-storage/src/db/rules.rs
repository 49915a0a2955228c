use anyhow::Result;
use rusqlite::params;

use super::Database;
use crate::models::BlockRule;

impl Database {
    // ==================== Dynamic Rule Methods ====================

    /// All installed rules, ordered by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn dynamic_rules(&self) -> Result<Vec<BlockRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, priority, url_filter, redirect_url, main_frame_only
             FROM dynamic_rules ORDER BY id",
        )?;

        let rules = stmt
            .query_map([], |row| {
                Ok(BlockRule {
                    id: row.get(0)?,
                    priority: row.get(1)?,
                    url_filter: row.get(2)?,
                    redirect_url: row.get(3)?,
                    main_frame_only: row.get::<_, i32>(4)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rules)
    }

    /// Remove `remove_ids` and insert `add_rules` in one transaction.
    ///
    /// Adding an id that is still installed fails and leaves the table untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails; nothing is applied in that case
    pub fn replace_dynamic_rules(&self, remove_ids: &[u32], add_rules: &[BlockRule]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for id in remove_ids {
            tx.execute("DELETE FROM dynamic_rules WHERE id = ?1", params![id])?;
        }

        for rule in add_rules {
            tx.execute(
                "INSERT INTO dynamic_rules (id, priority, url_filter, redirect_url, main_frame_only)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    rule.id,
                    rule.priority,
                    rule.url_filter,
                    rule.redirect_url,
                    i32::from(rule.main_frame_only),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}
