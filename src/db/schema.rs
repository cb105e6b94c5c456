// Database schema: the entity directory tables.
//
// A `schema_version` table records which migrations have run; everything
// else is created idempotently on every startup.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Known users: display name plus the engine's last cached score
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,               -- platform user id
            name TEXT NOT NULL DEFAULT '',
            score REAL,                        -- crime coefficient, NULL until scored
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Known channels, same shape as users
        CREATE TABLE IF NOT EXISTS channels (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            score REAL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_users_score ON users(score);
        CREATE INDEX IF NOT EXISTS idx_channels_score ON channels(score);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (1)",
        [],
    )
    .context("Failed to record schema version")?;

    Ok(())
}

/// Count the number of user-created tables (excluding SQLite internals).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
