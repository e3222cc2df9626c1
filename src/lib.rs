//! foodsearch: Food search, filtering, and per-user search history.
//!
//! This library provides a nutrition-aware food search pipeline:
//! - Term lookup against an Edamam-compatible food database
//! - Per-measure nutrient resolution with bounded concurrency
//! - Declarative filtering on type, calories, fat, sugar, and diet
//! - A bounded, persisted search history per user
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               CLI (clap)                    │
//! │     search, suggest, history, user          │
//! └─────────────────┬───────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────┐
//! │             Commands                         │
//! │   execute_* → serializable outputs          │
//! └─────────────────┬───────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────┐
//! │          FoodSearchService                   │
//! │   UserSession (single writer per user)      │
//! └───────┬─────────┬─────────┬─────────────────┘
//!         │         │         │
//!    ┌────▼───┐ ┌───▼───┐ ┌───▼────┐
//!    │ Result │ │Filter │ │History │
//!    │ Parser │ │Engine │ │ (5)    │
//!    └────┬───┘ └───────┘ └───┬────┘
//!         │                   │
//!    ┌────▼──────────┐   ┌────▼─────────────────┐
//!    │ NutritionApi  │   │  UserStore (SQLite)  │
//!    │  (reqwest)    │   │ (r2d2 pool)          │
//!    └───────────────┘   └──────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod fmt;
pub mod food;
pub mod services;
pub mod types;
pub mod user;

pub use config::{ApiConfig, SearchConfig};
pub use error::{FoodSearchError, Result};
pub use food::{FoodItem, FoodRecord, IngredientRecord, MealRecord, ResultKind};
pub use types::{FoodId, SearchToken, UserId};
pub use user::User;

use std::path::PathBuf;

/// Default location of the user store.
///
/// The path is `~/.cache/foodsearch/users.db`, falling back to `/tmp`
/// when the platform has no cache directory.
#[must_use]
pub fn default_db_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("foodsearch")
        .join("users.db")
}
