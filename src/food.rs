//! Food and meal records produced by a search.
//!
//! Records are built once per API response item and never mutated.
//! `FoodRecord` is the tagged union handed to callers; the shared
//! capability set lives on the `FoodItem` trait.

use crate::types::FoodId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Nutrient totals for one measure of a food, in grams (calories in kcal).
///
/// Nutrients the API does not report are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientTotals {
    pub weight: f64,
    pub calories: f64,
    pub fat: f64,
    pub carbs: f64,
    pub sugar: f64,
}

/// Capabilities shared by every search result.
pub trait FoodItem {
    fn name(&self) -> &str;
    fn source_id(&self) -> &FoodId;
    fn measure_uri(&self) -> &str;
    fn nutrients(&self) -> &NutrientTotals;
    fn health_labels(&self) -> &BTreeSet<String>;

    fn weight(&self) -> f64 {
        self.nutrients().weight
    }

    fn calories(&self) -> f64 {
        self.nutrients().calories
    }

    fn fat(&self) -> f64 {
        self.nutrients().fat
    }

    fn carbs(&self) -> f64 {
        self.nutrients().carbs
    }

    fn sugar(&self) -> f64 {
        self.nutrients().sugar
    }

    /// Exact, case-sensitive tag test. A missing tag means "not asserted".
    fn has_label(&self, tag: &str) -> bool {
        self.health_labels().contains(tag)
    }
}

/// A single food priced at one measure (e.g. "whole", "serving").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientRecord {
    name: String,
    measure: String,
    source_id: FoodId,
    measure_uri: String,
    #[serde(flatten)]
    nutrients: NutrientTotals,
    health_labels: BTreeSet<String>,
}

impl IngredientRecord {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        measure: impl Into<String>,
        source_id: FoodId,
        measure_uri: impl Into<String>,
        nutrients: NutrientTotals,
        health_labels: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            name: name.into(),
            measure: measure.into(),
            source_id,
            measure_uri: measure_uri.into(),
            nutrients,
            health_labels: health_labels.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn measure(&self) -> &str {
        &self.measure
    }
}

// Identity ignores health labels, measure URI and sugar.
impl PartialEq for IngredientRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.measure == other.measure
            && self.nutrients.weight == other.nutrients.weight
            && self.nutrients.calories == other.nutrients.calories
            && self.nutrients.fat == other.nutrients.fat
            && self.nutrients.carbs == other.nutrients.carbs
            && self.source_id == other.source_id
    }
}

impl FoodItem for IngredientRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_id(&self) -> &FoodId {
        &self.source_id
    }

    fn measure_uri(&self) -> &str {
        &self.measure_uri
    }

    fn nutrients(&self) -> &NutrientTotals {
        &self.nutrients
    }

    fn health_labels(&self) -> &BTreeSet<String> {
        &self.health_labels
    }
}

/// A prepared meal with its ingredient breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    name: String,
    source_id: FoodId,
    measure_uri: String,
    #[serde(flatten)]
    nutrients: NutrientTotals,
    health_labels: BTreeSet<String>,
    ingredients: Vec<String>,
}

impl MealRecord {
    /// Builds a meal; `ingredients` is deduplicated keeping first-seen order.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        source_id: FoodId,
        measure_uri: impl Into<String>,
        nutrients: NutrientTotals,
        health_labels: impl IntoIterator<Item = String>,
        ingredients: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut seen = Vec::new();
        for ingredient in ingredients {
            if !seen.contains(&ingredient) {
                seen.push(ingredient);
            }
        }

        Self {
            name: name.into(),
            source_id,
            measure_uri: measure_uri.into(),
            nutrients,
            health_labels: health_labels.into_iter().collect(),
            ingredients: seen,
        }
    }

    /// Distinct ingredient names in the order the API listed them.
    #[must_use]
    pub fn breakdown(&self) -> &[String] {
        &self.ingredients
    }
}

impl FoodItem for MealRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_id(&self) -> &FoodId {
        &self.source_id
    }

    fn measure_uri(&self) -> &str {
        &self.measure_uri
    }

    fn nutrients(&self) -> &NutrientTotals {
        &self.nutrients
    }

    fn health_labels(&self) -> &BTreeSet<String> {
        &self.health_labels
    }
}

/// One search result: either a single ingredient or a meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FoodRecord {
    Ingredient(IngredientRecord),
    Meal(MealRecord),
}

impl FoodRecord {
    #[must_use]
    pub fn kind(&self) -> ResultKind {
        match self {
            Self::Ingredient(_) => ResultKind::Ingredients,
            Self::Meal(_) => ResultKind::Meals,
        }
    }

    #[must_use]
    pub fn as_ingredient(&self) -> Option<&IngredientRecord> {
        match self {
            Self::Ingredient(record) => Some(record),
            Self::Meal(_) => None,
        }
    }

    #[must_use]
    pub fn as_meal(&self) -> Option<&MealRecord> {
        match self {
            Self::Meal(record) => Some(record),
            Self::Ingredient(_) => None,
        }
    }

    /// Calories for the priced measure, as shown by the food viewer.
    #[must_use]
    pub fn calorie_count(&self) -> f64 {
        self.calories()
    }

    fn item(&self) -> &dyn FoodItem {
        match self {
            Self::Ingredient(record) => record,
            Self::Meal(record) => record,
        }
    }
}

impl FoodItem for FoodRecord {
    fn name(&self) -> &str {
        self.item().name()
    }

    fn source_id(&self) -> &FoodId {
        self.item().source_id()
    }

    fn measure_uri(&self) -> &str {
        self.item().measure_uri()
    }

    fn nutrients(&self) -> &NutrientTotals {
        self.item().nutrients()
    }

    fn health_labels(&self) -> &BTreeSet<String> {
        self.item().health_labels()
    }
}

impl From<IngredientRecord> for FoodRecord {
    fn from(record: IngredientRecord) -> Self {
        Self::Ingredient(record)
    }
}

impl From<MealRecord> for FoodRecord {
    fn from(record: MealRecord) -> Self {
        Self::Meal(record)
    }
}

/// Which record variant a search should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    #[default]
    Ingredients,
    Meals,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingredients => write!(f, "ingredients"),
            Self::Meals => write!(f, "meals"),
        }
    }
}

impl std::str::FromStr for ResultKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ingredients" | "ingredient" | "food" | "foods" => Ok(Self::Ingredients),
            "meals" | "meal" => Ok(Self::Meals),
            other => Err(format!(
                "Invalid result kind: '{}'. Valid kinds: ingredients, meals",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pepperoni(labels: &[&str]) -> IngredientRecord {
        IngredientRecord::new(
            "Pepperoni",
            "whole",
            FoodId::from("food_pepperoni"),
            "http://www.edamam.com/ontologies/edamam.owl#Measure_unit",
            NutrientTotals {
                weight: 2.0,
                calories: 9.0,
                fat: 0.87,
                carbs: 0.0,
                sugar: 0.0,
            },
            labels.iter().map(|s| s.to_string()),
        )
    }

    #[test]
    fn test_ingredient_equality_ignores_labels_and_uri() {
        let a = pepperoni(&["DAIRY_FREE"]);
        let b = IngredientRecord::new(
            "Pepperoni",
            "whole",
            FoodId::from("food_pepperoni"),
            "some-other-uri",
            NutrientTotals {
                sugar: 3.0,
                ..*a.nutrients()
            },
            Vec::new(),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_ingredient_equality_respects_measure() {
        let a = pepperoni(&[]);
        let b = IngredientRecord::new(
            "Pepperoni",
            "serving",
            FoodId::from("food_pepperoni"),
            "",
            *a.nutrients(),
            Vec::new(),
        );
        assert_ne!(a, b);
    }

    #[test]
    fn test_meal_breakdown_deduplicates_in_order() {
        let meal = MealRecord::new(
            "Lasagna",
            FoodId::from("food_lasagna"),
            "uri",
            NutrientTotals::default(),
            Vec::new(),
            ["pasta", "beef", "pasta", "cheese", "beef"].map(String::from),
        );
        assert_eq!(meal.breakdown(), ["pasta", "beef", "cheese"]);
    }

    #[test]
    fn test_record_delegates_capabilities() {
        let record = FoodRecord::from(pepperoni(&["VEGAN"]));
        assert_eq!(record.kind(), ResultKind::Ingredients);
        assert_eq!(record.name(), "Pepperoni");
        assert!((record.calorie_count() - 9.0).abs() < f64::EPSILON);
        assert!(record.has_label("VEGAN"));
        assert!(!record.has_label("vegan"));
        assert!(record.as_meal().is_none());
    }

    #[test]
    fn test_result_kind_parse() {
        assert_eq!("Meals".parse::<ResultKind>().unwrap(), ResultKind::Meals);
        assert_eq!(
            "ingredient".parse::<ResultKind>().unwrap(),
            ResultKind::Ingredients
        );
        assert!("drinks".parse::<ResultKind>().is_err());
    }

    #[test]
    fn test_record_serializes_with_type_tag() {
        let json = serde_json::to_value(FoodRecord::from(pepperoni(&[]))).unwrap();
        assert_eq!(json["type"], "ingredient");
        assert_eq!(json["measure"], "whole");
        assert_eq!(json["calories"], 9.0);
    }
}
