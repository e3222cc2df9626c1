//! User store: the document collaborator the search service persists into.
//!
//! `UserStore` is the seam; `Database` implements it over `SQLite`
//! with connection pooling.

mod pragmas;
mod schema;

pub use pragmas::apply_pragmas;
pub use schema::{init_schema, SCHEMA_VERSION};

use crate::error::{DbError, DbResult};
use crate::types::UserId;
use crate::user::User;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

/// Document-store operations over user records.
///
/// Implementations are blocking; async callers go through `spawn_blocking`.
pub trait UserStore: Send + Sync {
    /// Inserts a new user. An empty id is replaced by a generated one.
    ///
    /// Returns the stored id.
    fn add(&self, user: &User) -> DbResult<UserId>;

    /// Overwrites an existing user document.
    fn update(&self, user: &User) -> DbResult<()>;

    fn get_by_id(&self, id: &UserId) -> DbResult<Option<User>>;

    /// Returns every user whose `field` equals `value`.
    fn get_all_by_field(&self, field: &str, value: &str) -> DbResult<Vec<User>>;

    /// Deletes a user. Returns `true` if a row was removed.
    fn delete(&self, id: &UserId) -> DbResult<bool>;
}

/// Database handle with connection pooling.
///
/// Uses r2d2 because `rusqlite::Connection` is NOT Sync.
/// The pool manages thread-safe access to `SQLite` connections.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Opens or creates a database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Pool` if connection pool creation fails.
    /// Returns `DbError::Sqlite` if schema initialization fails.
    pub fn open(path: &Path) -> DbResult<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(4).min_idle(Some(1)).build(manager)?;

        {
            let conn = pool.get()?;
            apply_pragmas(&conn)?;
            init_schema(&conn)?;
        }

        Ok(Self { pool })
    }

    /// Creates an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns `DbError::Pool` if connection pool creation fails.
    /// Returns `DbError::Sqlite` if schema initialization fails.
    pub fn in_memory() -> DbResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;

        {
            let conn = pool.get()?;
            apply_pragmas(&conn)?;
            init_schema(&conn)?;
        }

        Ok(Self { pool })
    }

    /// Gets a connection from the pool.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Pool` if no connection is available within the timeout.
    pub fn conn(&self) -> DbResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(DbError::from)
    }

    /// Number of stored users.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Pool` if no connection is available.
    /// Returns `DbError::Sqlite` if the query fails.
    pub fn user_count(&self) -> DbResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn update_once(&self, id: &UserId, email: &str, document: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            r"
            UPDATE users
            SET email = ?2, document = ?3, updated_at = datetime('now')
            WHERE id = ?1
            ",
            rusqlite::params![id.as_str(), email, document],
        )?;

        if changed == 0 {
            return Err(DbError::UserNotFound {
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

fn decode_user(document: &str) -> DbResult<User> {
    serde_json::from_str(document).map_err(DbError::from)
}

impl UserStore for Database {
    fn add(&self, user: &User) -> DbResult<UserId> {
        let conn = self.conn()?;
        let id = if user.id.is_empty() {
            let generated: String =
                conn.query_row("SELECT lower(hex(randomblob(10)))", [], |row| row.get(0))?;
            UserId::new(generated)
        } else {
            user.id.clone()
        };

        let mut stored = user.clone();
        stored.id = id.clone();
        let document = serde_json::to_string(&stored)?;

        conn.execute(
            r"
            INSERT INTO users (id, email, document, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ",
            rusqlite::params![id.as_str(), &stored.email, document],
        )?;

        tracing::debug!(user = %id, "Added user");
        Ok(id)
    }

    fn update(&self, user: &User) -> DbResult<()> {
        let document = serde_json::to_string(user)?;

        match self.update_once(&user.id, &user.email, &document) {
            Err(e) if e.is_transient() => {
                tracing::warn!(user = %user.id, error = %e, "User store busy, retrying update once");
                self.update_once(&user.id, &user.email, &document)
            }
            other => other,
        }
    }

    fn get_by_id(&self, id: &UserId) -> DbResult<Option<User>> {
        let conn = self.conn()?;
        let result = conn.query_row(
            "SELECT document FROM users WHERE id = ?1",
            rusqlite::params![id.as_str()],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(document) => decode_user(&document).map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DbError::Sqlite(e)),
        }
    }

    fn get_all_by_field(&self, field: &str, value: &str) -> DbResult<Vec<User>> {
        let sql = match field {
            "email" => "SELECT document FROM users WHERE email = ?1 ORDER BY id",
            "id" => "SELECT document FROM users WHERE id = ?1",
            other => return Err(DbError::UnsupportedField(other.to_string())),
        };

        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(sql)?;
        let documents = stmt
            .query_map(rusqlite::params![value], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        documents.iter().map(|d| decode_user(d)).collect()
    }

    fn delete(&self, id: &UserId) -> DbResult<bool> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM users WHERE id = ?1",
            rusqlite::params![id.as_str()],
        )?;
        Ok(removed > 0)
    }
}

// Compile-time assertions for thread safety.
#[cfg(test)]
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<Database>();
};
