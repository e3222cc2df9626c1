//! User store schema.

use crate::error::DbResult;
use rusqlite::Connection;

/// Current schema version for migrations.
pub const SCHEMA_VERSION: u32 = 1;

/// Initializes the database schema.
///
/// Each user is one JSON document keyed by its opaque id; `email` is
/// duplicated into its own column so field lookups can use an index.
///
/// # Errors
///
/// Returns `DbError::Sqlite` if schema creation fails.
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            document TEXT NOT NULL,
            updated_at TEXT NOT NULL
        ) WITHOUT ROWID;

        CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        ) WITHOUT ROWID;
        "#,
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}
