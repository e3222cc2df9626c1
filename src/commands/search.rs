//! Search, suggestion and food-detail commands.

use crate::error::SearchError;
use crate::food::{FoodItem, FoodRecord, IngredientRecord};
use crate::services::{FilterConfiguration, FoodSearchService, SkippedRecord, UserSession};
use crate::types::FoodId;
use serde::{Deserialize, Serialize};

/// Input for the search command.
#[derive(Debug, Deserialize)]
pub struct SearchInput {
    /// Search term
    pub term: String,
    /// Filter applied to this and later searches; `None` keeps the active one
    #[serde(default)]
    pub filter: Option<FilterConfiguration>,
}

/// Output for the search command.
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub term: String,
    /// Matching records in API order
    pub results: Vec<FoodResultItem>,
    pub total_returned: usize,
    /// Records built before filtering
    pub candidates: usize,
    /// Records dropped because their nutrient lookup failed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedItem>,
    /// Set when the nutrition API failed; `results` is then empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// One search result, flattened for display.
#[derive(Debug, Serialize)]
pub struct FoodResultItem {
    /// "ingredient" or "meal"
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
    pub food_id: String,
    pub measure_uri: String,
    pub weight: f64,
    pub calories: f64,
    pub fat: f64,
    pub carbs: f64,
    pub sugar: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub health_labels: Vec<String>,
    /// Meal breakdown
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ingredients: Vec<String>,
}

impl From<&FoodRecord> for FoodResultItem {
    fn from(record: &FoodRecord) -> Self {
        let (kind, measure, ingredients) = match record {
            FoodRecord::Ingredient(r) => ("ingredient", Some(r.measure().to_string()), Vec::new()),
            FoodRecord::Meal(r) => ("meal", None, r.breakdown().to_vec()),
        };
        Self {
            kind,
            name: record.name().to_string(),
            measure,
            food_id: record.source_id().to_string(),
            measure_uri: record.measure_uri().to_string(),
            weight: record.weight(),
            calories: record.calorie_count(),
            fat: record.fat(),
            carbs: record.carbs(),
            sugar: record.sugar(),
            health_labels: record.health_labels().iter().cloned().collect(),
            ingredients,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SkippedItem {
    pub food_id: String,
    pub measure_uri: String,
    pub reason: String,
}

impl From<SkippedRecord> for SkippedItem {
    fn from(skipped: SkippedRecord) -> Self {
        Self {
            food_id: skipped.food_id.to_string(),
            measure_uri: skipped.measure_uri,
            reason: skipped.reason,
        }
    }
}

/// Machine-readable failure attached to an otherwise empty output.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
}

/// Executes the search command.
///
/// Nutrition API failures produce an empty result list with `error` set
/// rather than an `Err`.
///
/// # Errors
///
/// Returns an error string for a blank term, a superseded search, or a
/// user-store failure.
pub async fn execute_search(
    service: &FoodSearchService,
    session: &UserSession,
    input: SearchInput,
) -> Result<SearchOutput, String> {
    if let Some(filter) = input.filter {
        service.set_filter_configuration(filter);
    }

    match service.search(session, &input.term).await {
        Ok(outcome) => {
            let results: Vec<FoodResultItem> =
                outcome.records.iter().map(FoodResultItem::from).collect();
            Ok(SearchOutput {
                term: input.term,
                total_returned: results.len(),
                results,
                candidates: outcome.candidates,
                skipped: outcome.skipped.into_iter().map(SkippedItem::from).collect(),
                error: None,
            })
        }
        Err(SearchError::Nutrition(e)) => {
            tracing::warn!(term = %input.term, error = %e, "Search failed upstream");
            Ok(SearchOutput {
                term: input.term,
                results: Vec::new(),
                total_returned: 0,
                candidates: 0,
                skipped: Vec::new(),
                error: Some(ErrorInfo {
                    code: e.code(),
                    message: e.to_string(),
                }),
            })
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Input for the suggest command.
#[derive(Debug, Default, Deserialize)]
pub struct SuggestInput {
    /// Partial term; blank returns the search history
    #[serde(default)]
    pub term: String,
}

/// Output for the suggest command.
#[derive(Debug, Serialize)]
pub struct SuggestOutput {
    pub suggestions: Vec<String>,
    /// "history" or "remote"
    pub source: &'static str,
}

/// Executes the suggest command.
///
/// # Errors
///
/// Returns an error string if the autocomplete call fails.
pub async fn execute_suggest(
    service: &FoodSearchService,
    session: &UserSession,
    input: SuggestInput,
) -> Result<SuggestOutput, String> {
    let source = if input.term.trim().is_empty() {
        "history"
    } else {
        "remote"
    };
    let suggestions = service
        .suggest(session, &input.term)
        .await
        .map_err(|e| e.to_string())?;

    Ok(SuggestOutput {
        suggestions,
        source,
    })
}

/// Input for the detail command.
#[derive(Debug, Deserialize)]
pub struct DetailInput {
    pub food_id: String,
    pub measure_uri: String,
    /// Measure label shown in the result list
    pub measure: String,
    #[serde(default)]
    pub name: String,
}

/// Executes the detail command, re-fetching one ingredient.
///
/// # Errors
///
/// Returns an error string if the nutrient lookup fails.
pub async fn execute_detail(
    service: &FoodSearchService,
    input: DetailInput,
) -> Result<FoodResultItem, String> {
    let record: IngredientRecord = service
        .food_detail(
            &FoodId::new(input.food_id),
            &input.measure_uri,
            &input.measure,
            &input.name,
        )
        .await
        .map_err(|e| e.to_string())?;

    Ok(FoodResultItem::from(&FoodRecord::from(record)))
}
