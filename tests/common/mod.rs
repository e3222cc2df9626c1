//! Common test utilities for foodsearch integration tests.
//!
//! Provides `FakeApi`, a scripted in-process `NutritionApi` with call
//! counters, and `TestEnv`, which wires it to an in-memory user store,
//! a search service and a signed-in session.

#![allow(dead_code)] // Test utilities may not all be used in every test file

use async_trait::async_trait;
use foodsearch::db::{Database, UserStore};
use foodsearch::error::{NutritionError, NutritionResult};
use foodsearch::services::{
    FoodSearchService, NutritionApi, RangeParam, RawNutrientResult, RawParseResult, UserSession,
};
use foodsearch::{FoodId, SearchConfig, User, UserId};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A canned API answer.
#[derive(Clone)]
pub enum Scripted<T> {
    Ok(T),
    Unavailable,
    Malformed,
}

impl<T: Clone> Scripted<T> {
    fn resolve(&self) -> NutritionResult<T> {
        match self {
            Self::Ok(value) => Ok(value.clone()),
            Self::Unavailable => Err(NutritionError::RemoteUnavailable(
                "connection refused".to_string(),
            )),
            Self::Malformed => Err(NutritionError::MalformedResponse(
                "missing field `hints`".to_string(),
            )),
        }
    }
}

/// Scripted nutrition API.
///
/// Unknown terms answer with an empty hint list; unknown measure URIs
/// answer `RemoteUnavailable`.
#[derive(Default)]
pub struct FakeApi {
    terms: HashMap<String, Scripted<RawParseResult>>,
    nutrients: HashMap<String, Scripted<RawNutrientResult>>,
    suggestions: Vec<String>,
    delays: HashMap<String, Duration>,
    nutrient_delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub term_calls: AtomicUsize,
    pub nutrient_calls: AtomicUsize,
    pub autocomplete_calls: AtomicUsize,
    pub last_ranges: Mutex<Vec<RangeParam>>,
    pub nutrient_order: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// API preloaded with the pepperoni, beef stew and egg fixtures.
    pub fn standard() -> Self {
        Self::new()
            .with_term("pepperoni", pepperoni_hints())
            .with_nutrients(PEPPERONI_WHOLE, pepperoni_whole())
            .with_nutrients(PEPPERONI_SERVING, pepperoni_serving())
            .with_term("beef stew", beef_stew_hints())
            .with_nutrients(STEW_SERVING, beef_stew_serving())
            .with_term("egg", egg_hints())
            .with_nutrients(EGG_WHOLE, egg_whole())
            .with_nutrients(EGG_SALAD_SERVING, egg_salad_serving())
            .with_suggestions(&["\"pepper\"", "\"pepperoni\"", "\"pepperoni pizza\""])
    }

    pub fn with_term(mut self, term: &str, hints: RawParseResult) -> Self {
        self.terms.insert(term.to_string(), Scripted::Ok(hints));
        self
    }

    pub fn with_term_failure(mut self, term: &str, failure: Scripted<RawParseResult>) -> Self {
        self.terms.insert(term.to_string(), failure);
        self
    }

    pub fn with_nutrients(mut self, measure_uri: &str, result: RawNutrientResult) -> Self {
        self.nutrients
            .insert(measure_uri.to_string(), Scripted::Ok(result));
        self
    }

    pub fn with_nutrient_failure(
        mut self,
        measure_uri: &str,
        failure: Scripted<RawNutrientResult>,
    ) -> Self {
        self.nutrients.insert(measure_uri.to_string(), failure);
        self
    }

    pub fn with_suggestions(mut self, raw: &[&str]) -> Self {
        self.suggestions = raw.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Delays the parser answer for `term`.
    pub fn with_delay(mut self, term: &str, delay: Duration) -> Self {
        self.delays.insert(term.to_string(), delay);
        self
    }

    /// Delays every nutrient answer, so overlapping lookups are observable.
    pub fn with_nutrient_delay(mut self, delay: Duration) -> Self {
        self.nutrient_delay = Some(delay);
        self
    }

    pub fn term_calls(&self) -> usize {
        self.term_calls.load(Ordering::SeqCst)
    }

    pub fn nutrient_calls(&self) -> usize {
        self.nutrient_calls.load(Ordering::SeqCst)
    }

    pub fn autocomplete_calls(&self) -> usize {
        self.autocomplete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NutritionApi for FakeApi {
    async fn lookup_by_term(
        &self,
        term: &str,
        ranges: &[RangeParam],
    ) -> NutritionResult<RawParseResult> {
        self.term_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_ranges.lock().unwrap() = ranges.to_vec();

        if let Some(delay) = self.delays.get(term) {
            tokio::time::sleep(*delay).await;
        }

        match self.terms.get(term) {
            Some(scripted) => scripted.resolve(),
            None => Ok(RawParseResult::default()),
        }
    }

    async fn lookup_nutrients(
        &self,
        measure_uri: &str,
        _food_id: &FoodId,
    ) -> NutritionResult<RawNutrientResult> {
        self.nutrient_calls.fetch_add(1, Ordering::SeqCst);
        self.nutrient_order
            .lock()
            .unwrap()
            .push(measure_uri.to_string());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.nutrient_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.nutrients.get(measure_uri) {
            Some(scripted) => scripted.resolve(),
            None => Err(NutritionError::RemoteUnavailable(format!(
                "no fixture for {measure_uri}"
            ))),
        }
    }

    async fn autocomplete(&self, _term: &str) -> NutritionResult<Vec<String>> {
        self.autocomplete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(foodsearch::services::client::clean_suggestions(
            self.suggestions.clone(),
        ))
    }
}

// ── fixtures ────────────────────────────────────────────────────────────────

pub const PEPPERONI_WHOLE: &str = "http://www.edamam.com/ontologies/edamam.owl#Measure_unit";
pub const PEPPERONI_SERVING: &str = "http://www.edamam.com/ontologies/edamam.owl#Measure_serving";
pub const STEW_SERVING: &str = "http://www.edamam.com/ontologies/edamam.owl#Measure_stew_serving";
pub const EGG_WHOLE: &str = "http://www.edamam.com/ontologies/edamam.owl#Measure_egg_unit";
pub const EGG_SALAD_SERVING: &str =
    "http://www.edamam.com/ontologies/edamam.owl#Measure_egg_salad_serving";

fn parse_hints(value: serde_json::Value) -> RawParseResult {
    RawParseResult::from_json(&value.to_string()).unwrap()
}

fn nutrient_result(value: serde_json::Value) -> RawNutrientResult {
    serde_json::from_value(value).unwrap()
}

pub fn pepperoni_hints() -> RawParseResult {
    parse_hints(json!({
        "text": "pepperoni",
        "hints": [{
            "food": {
                "foodId": "food_pepperoni",
                "label": "Pepperoni",
                "category": "Generic foods"
            },
            "measures": [
                {"label": "Whole", "uri": PEPPERONI_WHOLE},
                {"label": "Serving", "uri": PEPPERONI_SERVING},
                {"label": "Gram", "uri": "http://www.edamam.com/ontologies/edamam.owl#Measure_gram"},
                {"label": "Ounce", "uri": "http://www.edamam.com/ontologies/edamam.owl#Measure_ounce"}
            ]
        }]
    }))
}

pub fn pepperoni_whole() -> RawNutrientResult {
    nutrient_result(json!({
        "totalWeight": 2.0,
        "calories": 9.0,
        "totalNutrients": {"FAT": {"label": "Fat", "quantity": 0.87, "unit": "g"}},
        "healthLabels": ["GLUTEN_FREE", "EGG_FREE", "PEANUT_FREE"],
        "ingredients": [{"parsed": [{"measure": "whole", "foodId": "food_pepperoni"}]}]
    }))
}

pub fn pepperoni_serving() -> RawNutrientResult {
    nutrient_result(json!({
        "totalWeight": 28.0,
        "calories": 141.0,
        "totalNutrients": {
            "FAT": {"quantity": 12.4},
            "CHOCDF": {"quantity": 0.3},
            "SUGAR": {"quantity": 0.1}
        },
        "healthLabels": ["GLUTEN_FREE", "EGG_FREE", "PEANUT_FREE"],
        "ingredients": [{"parsed": [{"measure": "serving", "foodId": "food_pepperoni"}]}]
    }))
}

pub fn beef_stew_hints() -> RawParseResult {
    parse_hints(json!({
        "hints": [{
            "food": {
                "foodId": "food_beef_stew",
                "label": "Beef Stew",
                "category": "Generic meals"
            },
            "measures": [
                {"label": "Serving", "uri": STEW_SERVING},
                {"label": "Bowl", "uri": "http://www.edamam.com/ontologies/edamam.owl#Measure_bowl"}
            ]
        }]
    }))
}

pub fn beef_stew_serving() -> RawNutrientResult {
    nutrient_result(json!({
        "totalWeight": 250.0,
        "calories": 320.0,
        "totalNutrients": {
            "FAT": {"quantity": 14.0},
            "CHOCDF": {"quantity": 20.0},
            "SUGAR": {"quantity": 4.0}
        },
        "healthLabels": ["DAIRY_FREE", "EGG_FREE"],
        "ingredients": [{"parsed": [{
            "measure": "serving",
            "foodContentsLabel": "beef; carrot; potato; beef; onion"
        }]}]
    }))
}

/// Mixed response: an ingredient, a packaged food (ignored) and a meal.
pub fn egg_hints() -> RawParseResult {
    parse_hints(json!({
        "hints": [
            {
                "food": {"foodId": "food_egg", "label": "Egg", "category": "Generic foods"},
                "measures": [
                    {"label": "Whole", "uri": EGG_WHOLE},
                    {"label": "Gram", "uri": "http://www.edamam.com/ontologies/edamam.owl#Measure_gram"}
                ]
            },
            {
                "food": {"foodId": "food_egg_beaters", "label": "Egg Beaters", "category": "Packaged foods"},
                "measures": [{"label": "Serving", "uri": "packaged#serving"}]
            },
            {
                "food": {"foodId": "food_egg_salad", "label": "Egg Salad", "category": "Generic meals"},
                "measures": [{"label": "Serving", "uri": EGG_SALAD_SERVING}]
            }
        ]
    }))
}

pub fn egg_whole() -> RawNutrientResult {
    nutrient_result(json!({
        "totalWeight": 50.0,
        "calories": 71.5,
        "totalNutrients": {
            "FAT": {"quantity": 4.8},
            "CHOCDF": {"quantity": 0.4},
            "SUGAR": {"quantity": 0.2}
        },
        "healthLabels": ["VEGETARIAN", "DAIRY_FREE", "GLUTEN_FREE"],
        "ingredients": [{"parsed": [{"measure": "whole"}]}]
    }))
}

pub fn egg_salad_serving() -> RawNutrientResult {
    nutrient_result(json!({
        "totalWeight": 120.0,
        "calories": 280.0,
        "totalNutrients": {
            "FAT": {"quantity": 24.0},
            "CHOCDF": {"quantity": 2.0},
            "SUGAR": {"quantity": 1.5}
        },
        "healthLabels": ["VEGETARIAN", "GLUTEN_FREE"],
        "ingredients": [{"parsed": [{"foodContentsLabel": "egg;mayonnaise;celery;egg"}]}]
    }))
}

// ── environment ─────────────────────────────────────────────────────────────

/// A complete test environment with all services wired together.
pub struct TestEnv {
    pub api: Arc<FakeApi>,
    pub db: Arc<Database>,
    pub service: FoodSearchService,
    pub session: UserSession,
}

impl TestEnv {
    /// Creates an environment over `FakeApi::standard()`.
    pub fn new() -> Self {
        Self::with_api(FakeApi::standard())
    }

    pub fn with_api(api: FakeApi) -> Self {
        Self::with_api_and_config(api, SearchConfig::default())
    }

    pub fn with_api_and_config(api: FakeApi, config: SearchConfig) -> Self {
        let api = Arc::new(api);
        let db = Arc::new(Database::in_memory().expect("Failed to create in-memory database"));

        let user = john();
        db.add(&user).expect("Failed to add test user");

        let service = FoodSearchService::with_config(
            Arc::clone(&api) as Arc<dyn NutritionApi>,
            Arc::clone(&db) as Arc<dyn UserStore>,
            config,
        );

        Self {
            api,
            db,
            service,
            session: UserSession::new(user),
        }
    }

    /// Search history as persisted in the user store.
    pub fn stored_history(&self) -> Vec<String> {
        self.db
            .get_by_id(&UserId::new("john"))
            .expect("Failed to read user")
            .expect("Test user missing")
            .searches
            .terms()
            .to_vec()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// The signed-in test user.
pub fn john() -> User {
    User::new("john", "john@smith.com", "John", "Smith").with_calorie_goal(2000.0)
}
