//! User record owned by the user store.
//!
//! Holds profile and progress fields, the eaten-food log, and the
//! user's search history.

use crate::food::{FoodItem, FoodRecord};
use crate::services::SearchHistory;
use crate::types::{FoodId, UserId};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A food the user reported eating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EatenFood {
    pub name: String,
    pub food_id: FoodId,
    pub measure_uri: String,
    pub calories: f64,
    /// Unix seconds
    pub eaten_at: u64,
}

/// A registered user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Metres
    pub height: f64,
    /// Kilograms
    pub weight: f64,
    pub bmi: f64,
    pub prestige: f64,
    pub level: f64,
    pub exp: f64,
    pub calories_eaten: f64,
    pub calories_goal: f64,
    /// Unix seconds
    pub last_logged_in: u64,
    pub searches: SearchHistory,
    pub has_eaten: Vec<EatenFood>,
}

impl User {
    /// Creates a user with an empty history and log.
    #[must_use]
    pub fn new(
        id: impl Into<UserId>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            level: 1.0,
            last_logged_in: now_secs(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_body(mut self, height: f64, weight: f64) -> Self {
        self.height = height;
        self.weight = weight;
        self.bmi = if height > 0.0 {
            weight / (height * height)
        } else {
            0.0
        };
        self
    }

    #[must_use]
    pub fn with_calorie_goal(mut self, goal: f64) -> Self {
        self.calories_goal = goal;
        self
    }

    /// Appends a food to the log and counts its calories.
    pub fn log_food(&mut self, record: &FoodRecord) {
        self.has_eaten.push(EatenFood {
            name: record.name().to_string(),
            food_id: record.source_id().clone(),
            measure_uri: record.measure_uri().to_string(),
            calories: record.calories(),
            eaten_at: now_secs(),
        });
        self.calories_eaten += record.calories();
    }

    /// Removes a logged food by position, returning it.
    pub fn remove_eaten(&mut self, index: usize) -> Option<EatenFood> {
        if index >= self.has_eaten.len() {
            return None;
        }
        let removed = self.has_eaten.remove(index);
        self.calories_eaten = (self.calories_eaten - removed.calories).max(0.0);
        Some(removed)
    }

    /// Calories left before the goal is reached (negative once exceeded).
    #[must_use]
    pub fn remaining_calories(&self) -> f64 {
        self.calories_goal - self.calories_eaten
    }

    pub fn add_exp(&mut self, amount: f64) {
        self.exp += amount;
    }

    pub fn add_level(&mut self, amount: f64) {
        self.level += amount;
    }

    pub fn add_prestige(&mut self, amount: f64) {
        self.prestige += amount;
    }

    pub fn touch_login(&mut self) {
        self.last_logged_in = now_secs();
    }
}

// Identity and profile fields only; logs, history and timestamps are ignored.
impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.email == other.email
            && self.first_name == other.first_name
            && self.last_name == other.last_name
            && self.height == other.height
            && self.weight == other.weight
            && self.prestige == other.prestige
            && self.level == other.level
            && self.exp == other.exp
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food::{IngredientRecord, NutrientTotals};

    fn apple() -> FoodRecord {
        IngredientRecord::new(
            "Apple",
            "whole",
            FoodId::from("food_apple"),
            "uri#whole",
            NutrientTotals {
                weight: 182.0,
                calories: 94.6,
                fat: 0.3,
                carbs: 25.1,
                sugar: 18.9,
            },
            vec!["VEGAN".to_string()],
        )
        .into()
    }

    #[test]
    fn test_log_food_tracks_calories() {
        let mut user = User::new("u1", "john@smith.com", "John", "Smith").with_calorie_goal(2000.0);
        user.log_food(&apple());
        user.log_food(&apple());

        assert_eq!(user.has_eaten.len(), 2);
        assert!((user.calories_eaten - 189.2).abs() < 1e-9);
        assert!((user.remaining_calories() - 1810.8).abs() < 1e-9);

        let removed = user.remove_eaten(0).unwrap();
        assert_eq!(removed.name, "Apple");
        assert!((user.calories_eaten - 94.6).abs() < 1e-9);
        assert!(user.remove_eaten(5).is_none());
    }

    #[test]
    fn test_equality_ignores_history() {
        let a = User::new("u1", "john@smith.com", "John", "Smith");
        let mut b = a.clone();
        b.searches.add("beef");
        b.log_food(&apple());
        assert_eq!(a, b);

        b.add_exp(10.0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_bmi_from_body() {
        let user = User::new("u1", "e", "f", "l").with_body(2.0, 80.0);
        assert!((user.bmi - 20.0).abs() < f64::EPSILON);
        let user = User::new("u2", "e", "f", "l").with_body(0.0, 80.0);
        assert_eq!(user.bmi, 0.0);
    }

    #[test]
    fn test_round_trips_through_json() {
        let mut user = User::new("u1", "john@smith.com", "John", "Smith");
        user.searches.add("Test Search");
        let json = serde_json::to_string(&user).unwrap();
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
        assert_eq!(back.searches.terms(), ["Test Search"]);
    }
}
