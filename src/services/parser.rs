//! Turns parser-endpoint hints into `FoodRecord`s.
//!
//! The API is two-phase: the parser response only names foods and their
//! measures, so every record needs one nutrient lookup. Lookups run with
//! bounded concurrency through `buffered`, which yields results in
//! submission order, so the output follows hint order and, within a
//! food, measure order.

use crate::error::NutritionResult;
use crate::food::{FoodRecord, IngredientRecord, MealRecord, NutrientTotals};
use crate::services::client::{Hint, NutritionApi, RawNutrientResult, RawParseResult};
use crate::types::FoodId;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

/// Measure label at which ingredient measures stop being surfaced.
///
/// The API lists unit measures (whole, serving, slice...) before the mass
/// units (Gram, Ounce, Kilogram...); those repeat the same food.
pub const BASE_UNIT_MEASURE: &str = "Gram";

/// Hint categories the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    GenericFood,
    GenericMeal,
    Other,
}

impl Category {
    /// Classifies an API category string (`Generic foods`, `Generic meals`, ...).
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        let lower = raw.trim().to_ascii_lowercase();
        match lower.trim_end_matches('s') {
            "generic food" => Self::GenericFood,
            "generic meal" => Self::GenericMeal,
            _ => Self::Other,
        }
    }
}

/// A hint or measure that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub food_id: FoodId,
    pub measure_uri: String,
    pub reason: String,
}

/// Records built from one parser response, plus what was dropped.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    pub records: Vec<FoodRecord>,
    pub skipped: Vec<SkippedRecord>,
    /// Nutrient lookups issued while parsing
    pub lookups: usize,
}

/// One nutrient lookup and the record it will produce.
enum Job {
    Ingredient {
        name: String,
        food_id: FoodId,
        measure_label: String,
        measure_uri: String,
    },
    Meal {
        name: String,
        food_id: FoodId,
        measure_uri: String,
    },
}

impl Job {
    fn food_id(&self) -> &FoodId {
        match self {
            Self::Ingredient { food_id, .. } | Self::Meal { food_id, .. } => food_id,
        }
    }

    fn measure_uri(&self) -> &str {
        match self {
            Self::Ingredient { measure_uri, .. } | Self::Meal { measure_uri, .. } => measure_uri,
        }
    }
}

/// Resolves parser hints into records through the nutrition API.
pub struct ResultParser {
    api: Arc<dyn NutritionApi>,
    concurrency: usize,
}

impl ResultParser {
    #[must_use]
    pub fn new(api: Arc<dyn NutritionApi>, concurrency: usize) -> Self {
        Self {
            api,
            concurrency: concurrency.max(1),
        }
    }

    /// Builds records for every usable hint.
    ///
    /// An empty hint list returns immediately without any lookup. An
    /// unreadable hint, or a failed or malformed lookup, skips that one
    /// record and parsing continues.
    pub async fn parse(&self, raw: RawParseResult) -> ParseReport {
        if raw.is_empty() {
            return ParseReport::default();
        }

        let mut report = ParseReport::default();
        for rejected in raw.rejected {
            tracing::warn!(food = %rejected.food_id, reason = %rejected.reason, "Skipping hint");
            report.skipped.push(SkippedRecord {
                food_id: rejected.food_id,
                measure_uri: String::new(),
                reason: rejected.reason,
            });
        }

        let mut jobs = Vec::new();
        for hint in raw.hints {
            plan_hint(hint, &mut jobs, &mut report.skipped);
        }
        report.lookups = jobs.len();

        let outcomes: Vec<Result<FoodRecord, SkippedRecord>> = stream::iter(jobs)
            .map(|job| self.resolve(job))
            .buffered(self.concurrency)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                Ok(record) => report.records.push(record),
                Err(skipped) => {
                    tracing::warn!(
                        food = %skipped.food_id,
                        measure_uri = %skipped.measure_uri,
                        reason = %skipped.reason,
                        "Skipping record"
                    );
                    report.skipped.push(skipped);
                }
            }
        }

        tracing::debug!(
            records = report.records.len(),
            skipped = report.skipped.len(),
            lookups = report.lookups,
            "Parsed hints"
        );
        report
    }

    /// Fetches one ingredient record for a known food and measure.
    ///
    /// # Errors
    ///
    /// Propagates the lookup's `NutritionError`.
    pub async fn ingredient(
        &self,
        name: &str,
        food_id: &FoodId,
        measure_uri: &str,
        fallback_measure: &str,
    ) -> NutritionResult<IngredientRecord> {
        let raw = self.api.lookup_nutrients(measure_uri, food_id).await?;
        Ok(build_ingredient(name, food_id.clone(), fallback_measure, measure_uri, raw))
    }

    async fn resolve(&self, job: Job) -> Result<FoodRecord, SkippedRecord> {
        let raw = match self.api.lookup_nutrients(job.measure_uri(), job.food_id()).await {
            Ok(raw) => raw,
            Err(e) => {
                return Err(SkippedRecord {
                    food_id: job.food_id().clone(),
                    measure_uri: job.measure_uri().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        Ok(match job {
            Job::Ingredient {
                name,
                food_id,
                measure_label,
                measure_uri,
            } => build_ingredient(&name, food_id, &measure_label, &measure_uri, raw).into(),
            Job::Meal {
                name,
                food_id,
                measure_uri,
            } => build_meal(name, food_id, measure_uri, raw).into(),
        })
    }
}

/// Expands one hint into lookup jobs, in measure order.
fn plan_hint(hint: Hint, jobs: &mut Vec<Job>, skipped: &mut Vec<SkippedRecord>) {
    let Hint { food, measures } = hint;

    match Category::classify(&food.category) {
        Category::GenericFood => {
            for measure in measures
                .into_iter()
                .take_while(|m| m.label != BASE_UNIT_MEASURE)
            {
                if measure.uri.is_empty() {
                    skipped.push(SkippedRecord {
                        food_id: food.food_id.clone(),
                        measure_uri: String::new(),
                        reason: format!("measure '{}' has no URI", measure.label),
                    });
                    continue;
                }
                jobs.push(Job::Ingredient {
                    name: food.label.clone(),
                    food_id: food.food_id.clone(),
                    measure_label: measure.label,
                    measure_uri: measure.uri,
                });
            }
        }
        Category::GenericMeal => match measures.into_iter().next() {
            Some(measure) if !measure.uri.is_empty() => jobs.push(Job::Meal {
                name: food.label,
                food_id: food.food_id,
                measure_uri: measure.uri,
            }),
            _ => skipped.push(SkippedRecord {
                food_id: food.food_id,
                measure_uri: String::new(),
                reason: "meal has no usable measure".to_string(),
            }),
        },
        Category::Other => {
            tracing::trace!(food = %food.food_id, category = %food.category, "Ignoring hint");
        }
    }
}

fn totals(raw: &RawNutrientResult) -> NutrientTotals {
    NutrientTotals {
        weight: raw.total_weight.max(0.0),
        calories: raw.calories.max(0.0),
        fat: raw.fat(),
        carbs: raw.carbs(),
        sugar: raw.sugar(),
    }
}

fn build_ingredient(
    name: &str,
    food_id: FoodId,
    fallback_measure: &str,
    measure_uri: &str,
    raw: RawNutrientResult,
) -> IngredientRecord {
    let measure = raw
        .parsed()
        .and_then(|p| p.measure.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback_measure.to_string());
    let nutrients = totals(&raw);

    IngredientRecord::new(name, measure, food_id, measure_uri, nutrients, raw.health_labels)
}

fn build_meal(name: String, food_id: FoodId, measure_uri: String, raw: RawNutrientResult) -> MealRecord {
    let ingredients = raw
        .parsed()
        .and_then(|p| p.food_contents_label.as_deref())
        .map(split_contents)
        .unwrap_or_default();
    let nutrients = totals(&raw);

    MealRecord::new(name, food_id, measure_uri, nutrients, raw.health_labels, ingredients)
}

/// Splits a `;`-delimited contents label into trimmed, non-empty names.
fn split_contents(label: &str) -> Vec<String> {
    label
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_classification() {
        assert_eq!(Category::classify("Generic foods"), Category::GenericFood);
        assert_eq!(Category::classify("generic food"), Category::GenericFood);
        assert_eq!(Category::classify("Generic meals"), Category::GenericMeal);
        assert_eq!(Category::classify("generic meal"), Category::GenericMeal);
        assert_eq!(Category::classify("Packaged foods"), Category::Other);
        assert_eq!(Category::classify(""), Category::Other);
    }

    #[test]
    fn test_split_contents() {
        assert_eq!(
            split_contents("pasta; beef ;;cheese; pasta"),
            ["pasta", "beef", "cheese", "pasta"]
        );
        assert!(split_contents(" ; ").is_empty());
    }

    #[test]
    fn test_plan_stops_at_gram() {
        let raw: RawParseResult = serde_json::from_str(
            r#"{"hints": [{
                "food": {"foodId": "f1", "label": "Egg", "category": "Generic foods"},
                "measures": [
                    {"label": "Whole", "uri": "u#whole"},
                    {"label": "Serving", "uri": "u#serving"},
                    {"label": "Gram", "uri": "u#gram"},
                    {"label": "Cup", "uri": "u#cup"}
                ]
            }]}"#,
        )
        .unwrap();

        let mut jobs = Vec::new();
        let mut skipped = Vec::new();
        for hint in raw.hints {
            plan_hint(hint, &mut jobs, &mut skipped);
        }
        let uris: Vec<&str> = jobs.iter().map(Job::measure_uri).collect();
        assert_eq!(uris, ["u#whole", "u#serving"]);
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_plan_meal_uses_first_measure_only() {
        let raw: RawParseResult = serde_json::from_str(
            r#"{"hints": [
                {"food": {"foodId": "m1", "label": "Stew", "category": "Generic meals"},
                 "measures": [{"label": "Serving", "uri": "u#serving"}, {"label": "Bowl", "uri": "u#bowl"}]},
                {"food": {"foodId": "m2", "label": "Soup", "category": "Generic meals"}, "measures": []},
                {"food": {"foodId": "p1", "label": "Cola", "category": "Packaged foods"},
                 "measures": [{"label": "Can", "uri": "u#can"}]}
            ]}"#,
        )
        .unwrap();

        let mut jobs = Vec::new();
        let mut skipped = Vec::new();
        for hint in raw.hints {
            plan_hint(hint, &mut jobs, &mut skipped);
        }
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].measure_uri(), "u#serving");
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].food_id.as_str(), "m2");
    }

    #[test]
    fn test_ingredient_measure_falls_back_to_hint_label() {
        let raw: RawNutrientResult =
            serde_json::from_str(r#"{"totalWeight": 50.0, "calories": 72.0}"#).unwrap();
        let record = build_ingredient("Egg", FoodId::from("f1"), "Whole", "u#whole", raw);
        assert_eq!(record.measure(), "Whole");
    }
}
