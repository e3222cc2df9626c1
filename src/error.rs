//! Error types for foodsearch.
//!
//! Uses thiserror for ergonomic error handling with proper
//! error chain propagation.

use thiserror::Error;

/// Top-level crate error.
#[derive(Error, Debug)]
pub enum FoodSearchError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Nutrition API error: {0}")]
    Nutrition(#[from] NutritionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// User-store errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Failed to encode user record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("User not found: {id}")]
    UserNotFound { id: String },

    #[error("Unsupported lookup field: {0}")]
    UnsupportedField(String),
}

/// Remote nutrition API errors.
#[derive(Error, Debug)]
pub enum NutritionError {
    /// Transport could not complete, or the server answered with a non-success status.
    #[error("Nutrition API unavailable: {0}")]
    RemoteUnavailable(String),

    /// The response body did not have the expected shape.
    #[error("Malformed nutrition API response: {0}")]
    MalformedResponse(String),

    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),
}

/// Search operation errors.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search term is empty")]
    EmptyTerm,

    #[error("Search {token} was superseded by a newer search")]
    Superseded { token: u64 },

    #[error(transparent)]
    Nutrition(#[from] NutritionError),

    #[error("User store error: {0}")]
    Store(#[from] DbError),

    #[error("Background task failed: {0}")]
    Join(String),
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, FoodSearchError>;

/// Result type alias for user-store operations.
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Result type alias for nutrition API calls.
pub type NutritionResult<T> = std::result::Result<T, NutritionError>;

/// Result type alias for search operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

// Error code implementations for machine-readable error responses
impl FoodSearchError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database(e) => e.code(),
            Self::Search(e) => e.code(),
            Self::Nutrition(e) => e.code(),
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl DbError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "SQLITE_ERROR",
            Self::Pool(_) => "POOL_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::UserNotFound { .. } => "USER_NOT_FOUND",
            Self::UnsupportedField(_) => "UNSUPPORTED_FIELD",
        }
    }

    /// Whether the failure is the transient busy/locked state worth one retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

impl NutritionError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::RemoteUnavailable(_) => "REMOTE_UNAVAILABLE",
            Self::MalformedResponse(_) => "MALFORMED_RESPONSE",
            Self::ClientSetup(_) => "CLIENT_SETUP",
        }
    }
}

impl SearchError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyTerm => "EMPTY_TERM",
            Self::Superseded { .. } => "SUPERSEDED",
            Self::Nutrition(e) => e.code(),
            Self::Store(e) => e.code(),
            Self::Join(_) => "TASK_FAILED",
        }
    }
}

impl From<reqwest::Error> for NutritionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::ClientSetup(err.to_string())
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::RemoteUnavailable(err.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for SearchError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Join(err.to_string())
    }
}
