//! Declarative result filtering.
//!
//! A `FilterConfiguration` combines a record-type selector, optional
//! numeric bounds on calories/fat/sugar, and dietary flags that each
//! require one health label. `FilterEngine::apply` keeps the records that
//! satisfy every active predicate, in their original order.

use crate::food::{FoodItem, FoodRecord, ResultKind};
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags::bitflags! {
    /// Dietary and allergy requirements.
    ///
    /// Each flag, when set, requires the matching health label (see
    /// `DietaryFlags::labels`). Unset flags impose nothing.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DietaryFlags: u32 {
        const ALCOHOL_FREE = 1 << 0;
        const CELERY_FREE = 1 << 1;
        const CRUSTACEAN_FREE = 1 << 2;
        const DAIRY_FREE = 1 << 3;
        const EGG_FREE = 1 << 4;
        const FISH_FREE = 1 << 5;
        const GLUTEN_FREE = 1 << 6;
        const KETO = 1 << 7;
        const KOSHER = 1 << 8;
        const LUPINE_FREE = 1 << 9;
        const MUSTARD_FREE = 1 << 10;
        const PALEO = 1 << 11;
        const PEANUT_FREE = 1 << 12;
        const PORK_FREE = 1 << 13;
        const RED_MEAT_FREE = 1 << 14;
        const SESAME_FREE = 1 << 15;
        const SOY_FREE = 1 << 16;
        const TREE_NUT_FREE = 1 << 17;
        const VEGAN = 1 << 18;
        const PESCATARIAN = 1 << 19;
        const VEGETARIAN = 1 << 20;
        const WHEAT_FREE = 1 << 21;
    }
}

/// Health label the API attaches for each flag. Matching is exact and case-sensitive.
const DIETARY_LABELS: [(DietaryFlags, &str); 22] = [
    (DietaryFlags::ALCOHOL_FREE, "ALCOHOL_FREE"),
    (DietaryFlags::CELERY_FREE, "CELERY_FREE"),
    (DietaryFlags::CRUSTACEAN_FREE, "CRUSTACEAN_FREE"),
    (DietaryFlags::DAIRY_FREE, "DAIRY_FREE"),
    (DietaryFlags::EGG_FREE, "EGG_FREE"),
    (DietaryFlags::FISH_FREE, "FISH_FREE"),
    (DietaryFlags::GLUTEN_FREE, "GLUTEN_FREE"),
    (DietaryFlags::KETO, "KETO"),
    (DietaryFlags::KOSHER, "KOSHER"),
    (DietaryFlags::LUPINE_FREE, "LUPINE_FREE"),
    (DietaryFlags::MUSTARD_FREE, "MUSTARD_FREE"),
    (DietaryFlags::PALEO, "PALEO"),
    (DietaryFlags::PEANUT_FREE, "PEANUT_FREE"),
    (DietaryFlags::PORK_FREE, "PORK_FREE"),
    (DietaryFlags::RED_MEAT_FREE, "RED_MEAT_FREE"),
    (DietaryFlags::SESAME_FREE, "SESAME_FREE"),
    (DietaryFlags::SOY_FREE, "SOY_FREE"),
    (DietaryFlags::TREE_NUT_FREE, "TREE_NUT_FREE"),
    (DietaryFlags::VEGAN, "VEGAN"),
    (DietaryFlags::PESCATARIAN, "PESCATARIAN"),
    (DietaryFlags::VEGETARIAN, "VEGETARIAN"),
    (DietaryFlags::WHEAT_FREE, "WHEAT_FREE"),
];

impl DietaryFlags {
    /// Health labels required by the set flags, in declaration order.
    pub fn labels(self) -> impl Iterator<Item = &'static str> {
        DIETARY_LABELS
            .iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, label)| *label)
    }

    /// Parses a user-facing flag name such as `dairy-free` or `VEGAN`.
    #[must_use]
    pub fn parse_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::from_name(&normalized)
    }
}

/// Optional inclusive bounds on one nutrient. Unset sides are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl NutrientRange {
    /// No bounds on either side.
    pub const ANY: Self = Self {
        min: None,
        max: None,
    };

    #[must_use]
    pub const fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    /// Renders the bound in the parser endpoint's `MIN-MAX` / `MIN+` / `MAX` syntax.
    #[must_use]
    pub fn query_value(&self) -> Option<String> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some(format!("{min}-{max}")),
            (Some(min), None) => Some(format!("{min}+")),
            (None, Some(max)) => Some(format!("{max}")),
            (None, None) => None,
        }
    }
}

impl fmt::Display for NutrientRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "{min}..={max}"),
            (Some(min), None) => write!(f, ">={min}"),
            (None, Some(max)) => write!(f, "<={max}"),
            (None, None) => write!(f, "any"),
        }
    }
}

/// One extra query parameter for the parser endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeParam {
    pub key: &'static str,
    pub value: String,
}

/// Constraints applied to every search result list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfiguration {
    pub kind: ResultKind,
    pub calories: NutrientRange,
    pub fat: NutrientRange,
    pub sugar: NutrientRange,
    pub dietary: DietaryFlags,
}

impl FilterConfiguration {
    /// Ingredients only, no other constraints.
    #[must_use]
    pub fn ingredients() -> Self {
        Self::default()
    }

    /// Meals only, no other constraints.
    #[must_use]
    pub fn meals() -> Self {
        Self {
            kind: ResultKind::Meals,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_calories(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.calories = NutrientRange::new(min, max);
        self
    }

    #[must_use]
    pub fn with_fat(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.fat = NutrientRange::new(min, max);
        self
    }

    #[must_use]
    pub fn with_sugar(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.sugar = NutrientRange::new(min, max);
        self
    }

    #[must_use]
    pub fn require(mut self, flags: DietaryFlags) -> Self {
        self.dietary |= flags;
        self
    }

    /// Remote query parameters for the configured bounds. Unset bounds are omitted.
    #[must_use]
    pub fn range_params(&self) -> Vec<RangeParam> {
        [
            ("calories", self.calories),
            ("nutrients[FAT]", self.fat),
            ("nutrients[SUGAR]", self.sugar),
        ]
        .into_iter()
        .filter_map(|(key, range)| range.query_value().map(|value| RangeParam { key, value }))
        .collect()
    }
}

/// Stateless predicate evaluation over search results.
pub struct FilterEngine;

impl FilterEngine {
    /// Whether one record passes every active predicate.
    #[must_use]
    pub fn matches(record: &FoodRecord, config: &FilterConfiguration) -> bool {
        record.kind() == config.kind
            && config.calories.contains(record.calories())
            && config.fat.contains(record.fat())
            && config.sugar.contains(record.sugar())
            && config.dietary.labels().all(|label| record.has_label(label))
    }

    /// Keeps matching records, preserving order.
    #[must_use]
    pub fn apply(mut records: Vec<FoodRecord>, config: &FilterConfiguration) -> Vec<FoodRecord> {
        records.retain(|record| Self::matches(record, config));
        records
    }
}
