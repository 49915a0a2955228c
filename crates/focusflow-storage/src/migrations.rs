use anyhow::Result;
use rusqlite::Connection;

/// Initialize database schema
///
/// # Errors
///
/// Returns an error if database table creation or index creation fails
pub fn init_schema(conn: &Connection) -> Result<()> {
    // Key-value store - one row per (area, key), JSON value, bumped revision on every write
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            area TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            revision INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (area, key)
        )",
        [],
    )?;

    // Dynamic rules table - redirect rules currently installed in the rule engine
    conn.execute(
        "CREATE TABLE IF NOT EXISTS dynamic_rules (
            id INTEGER PRIMARY KEY,
            priority INTEGER NOT NULL DEFAULT 1,
            url_filter TEXT NOT NULL,
            redirect_url TEXT NOT NULL,
            main_frame_only INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;

    // Older databases predate revision tracking
    let revision_exists: i32 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info('kv_store') WHERE name='revision'",
        [],
        |row| row.get(0),
    )?;
    if revision_exists == 0 {
        conn.execute(
            "ALTER TABLE kv_store ADD COLUMN revision INTEGER NOT NULL DEFAULT 1",
            [],
        )?;
        log::info!("Added revision column to kv_store table");
    }

    Ok(())
}
