//! Core services for food search, filtering, and search history.

pub mod client;
mod filter;
mod history;
pub mod parser;
mod searcher;

pub use client::{EdamamClient, NutritionApi, RawNutrientResult, RawParseResult, RejectedHint};
pub use filter::{
    DietaryFlags, FilterConfiguration, FilterEngine, NutrientRange, RangeParam,
};
pub use history::SearchHistory;
pub use parser::{ParseReport, ResultParser, SkippedRecord};
pub use searcher::{FoodSearchService, SearchOutcome, UserSession};
