//! `SQLite` PRAGMA configuration for the user store.

use crate::error::DbResult;
use rusqlite::Connection;

/// Executes a single PRAGMA that may return a row.
fn exec_stmt(conn: &Connection, sql: &str) -> rusqlite::Result<()> {
    conn.prepare(sql)?.query([])?.next()?;
    Ok(())
}

/// Applies connection settings.
///
/// - WAL journal with `synchronous = NORMAL`
/// - 2s busy timeout (`update` retries once after it expires)
///
/// # Errors
///
/// Returns `DbError::Sqlite` if any PRAGMA statement fails.
pub fn apply_pragmas(conn: &Connection) -> DbResult<()> {
    exec_stmt(conn, "PRAGMA journal_mode = WAL")?;
    exec_stmt(conn, "PRAGMA synchronous = NORMAL")?;
    exec_stmt(conn, "PRAGMA busy_timeout = 2000")?;
    exec_stmt(conn, "PRAGMA temp_store = MEMORY")?;
    Ok(())
}
