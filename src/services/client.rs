//! Typed access to the remote nutrition API.
//!
//! Three endpoints are consumed: the bulk parser (term → hints), the
//! nutrient detail lookup (one food at one measure), and autocomplete.
//! This layer only translates HTTP/JSON into typed values; it holds no
//! state and applies no business rules.

use crate::config::ApiConfig;
use crate::error::{NutritionError, NutritionResult};
use crate::services::filter::RangeParam;
use crate::types::FoodId;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Nutrient key for total fat.
pub const NUTRIENT_FAT: &str = "FAT";
/// Nutrient key for total carbohydrate.
pub const NUTRIENT_CARBS: &str = "CHOCDF";
/// Nutrient key for total sugars.
pub const NUTRIENT_SUGAR: &str = "SUGAR";

/// Parser endpoint response: candidate foods for a term.
///
/// Only the envelope is strict. Each hint is decoded on its own, and one
/// that does not fit `Hint` lands in `rejected` instead of failing the
/// whole response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "WireParseResult")]
pub struct RawParseResult {
    pub hints: Vec<Hint>,
    pub rejected: Vec<RejectedHint>,
}

/// A hint entry that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedHint {
    /// `food.foodId` when the entry had one, otherwise empty
    pub food_id: FoodId,
    pub reason: String,
}

#[derive(Deserialize)]
struct WireParseResult {
    hints: Vec<serde_json::Value>,
}

impl From<WireParseResult> for RawParseResult {
    fn from(wire: WireParseResult) -> Self {
        let mut result = Self::default();
        for value in wire.hints {
            let food_id = value
                .pointer("/food/foodId")
                .and_then(serde_json::Value::as_str)
                .map(FoodId::from)
                .unwrap_or_default();
            match serde_json::from_value::<Hint>(value) {
                Ok(hint) => result.hints.push(hint),
                Err(e) => result.rejected.push(RejectedHint {
                    food_id,
                    reason: format!("unreadable hint: {e}"),
                }),
            }
        }
        result
    }
}

impl RawParseResult {
    /// Decodes a parser response body.
    ///
    /// # Errors
    ///
    /// Returns `NutritionError::MalformedResponse` if the body is not JSON or lacks `hints`.
    pub fn from_json(body: &str) -> NutritionResult<Self> {
        serde_json::from_str(body).map_err(|e| NutritionError::MalformedResponse(e.to_string()))
    }

    /// True when the response carried no hint entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hints.is_empty() && self.rejected.is_empty()
    }
}

/// One candidate food or meal.
#[derive(Debug, Clone, Deserialize)]
pub struct Hint {
    pub food: HintFood,
    #[serde(default)]
    pub measures: Vec<Measure>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HintFood {
    #[serde(rename = "foodId")]
    pub food_id: FoodId,
    pub label: String,
    #[serde(default)]
    pub category: String,
}

/// A unit the API can price nutritionally.
#[derive(Debug, Clone, Deserialize)]
pub struct Measure {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub uri: String,
}

/// Nutrient endpoint response for a single ingredient at one measure.
#[derive(Debug, Clone, Deserialize)]
pub struct RawNutrientResult {
    #[serde(rename = "totalWeight")]
    pub total_weight: f64,
    pub calories: f64,
    #[serde(rename = "totalNutrients", default)]
    pub total_nutrients: HashMap<String, NutrientQuantity>,
    #[serde(rename = "healthLabels", default)]
    pub health_labels: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<NutrientIngredient>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NutrientQuantity {
    #[serde(default)]
    pub quantity: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NutrientIngredient {
    #[serde(default)]
    pub parsed: Vec<ParsedIngredient>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedIngredient {
    #[serde(default)]
    pub measure: Option<String>,
    #[serde(rename = "foodContentsLabel", default)]
    pub food_contents_label: Option<String>,
}

impl RawNutrientResult {
    /// Total of a nutrient by API key; unreported nutrients are 0.0.
    #[must_use]
    pub fn nutrient(&self, key: &str) -> f64 {
        self.total_nutrients
            .get(key)
            .map_or(0.0, |n| n.quantity.max(0.0))
    }

    #[must_use]
    pub fn fat(&self) -> f64 {
        self.nutrient(NUTRIENT_FAT)
    }

    #[must_use]
    pub fn carbs(&self) -> f64 {
        self.nutrient(NUTRIENT_CARBS)
    }

    #[must_use]
    pub fn sugar(&self) -> f64 {
        self.nutrient(NUTRIENT_SUGAR)
    }

    /// First parsed ingredient detail, if the API returned one.
    #[must_use]
    pub fn parsed(&self) -> Option<&ParsedIngredient> {
        self.ingredients.first().and_then(|i| i.parsed.first())
    }
}

/// The remote nutrition lookups the search pipeline depends on.
#[async_trait]
pub trait NutritionApi: Send + Sync {
    /// Candidate foods for a term. `ranges` narrows the remote query; pass `&[]` for none.
    async fn lookup_by_term(
        &self,
        term: &str,
        ranges: &[RangeParam],
    ) -> NutritionResult<RawParseResult>;

    /// Nutrient totals for one unit of `measure_uri` of `food_id`.
    async fn lookup_nutrients(
        &self,
        measure_uri: &str,
        food_id: &FoodId,
    ) -> NutritionResult<RawNutrientResult>;

    /// Completion suggestions, in server order.
    async fn autocomplete(&self, term: &str) -> NutritionResult<Vec<String>>;
}

/// `NutritionApi` over HTTP against Edamam-compatible endpoints.
pub struct EdamamClient {
    http: Client,
    config: ApiConfig,
}

impl EdamamClient {
    /// Builds a client with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns `NutritionError::ClientSetup` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> NutritionResult<Self> {
        let http = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Endpoint URL with credentials appended.
    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}?app_id={}&app_key={}",
            self.config.base_url,
            path,
            urlencoding::encode(&self.config.app_id),
            urlencoding::encode(&self.config.app_key),
        )
    }

    fn parser_url(&self, term: &str, ranges: &[RangeParam]) -> String {
        let mut url = self.endpoint("/api/food-database/v2/parser");
        let _ = write!(url, "&ingr={}&nutrition-type=cooking", escape_term(term));
        for range in ranges {
            let _ = write!(
                url,
                "&{}={}",
                urlencoding::encode(range.key),
                urlencoding::encode(&range.value)
            );
        }
        url
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> NutritionResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(NutritionError::RemoteUnavailable(format!(
                "{what} returned HTTP {status}"
            )));
        }

        // Body read failures are transport errors, JSON failures are decode errors
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl NutritionApi for EdamamClient {
    async fn lookup_by_term(
        &self,
        term: &str,
        ranges: &[RangeParam],
    ) -> NutritionResult<RawParseResult> {
        tracing::debug!(term, ranges = ranges.len(), "Parser lookup");
        let response = self
            .http
            .get(self.parser_url(term, ranges))
            .send()
            .await?;

        Self::read_json(response, "parser").await
    }

    async fn lookup_nutrients(
        &self,
        measure_uri: &str,
        food_id: &FoodId,
    ) -> NutritionResult<RawNutrientResult> {
        tracing::debug!(food = %food_id, measure_uri, "Nutrient lookup");
        let body = serde_json::json!({
            "ingredients": [{
                "quantity": 1,
                "measureURI": measure_uri,
                "foodId": food_id,
            }]
        });

        let response = self
            .http
            .post(self.endpoint("/api/food-database/v2/nutrients"))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        Self::read_json(response, "nutrients").await
    }

    async fn autocomplete(&self, term: &str) -> NutritionResult<Vec<String>> {
        tracing::debug!(term, "Autocomplete lookup");
        let url = format!("{}&q={}", self.endpoint("/auto-complete"), escape_term(term));
        let response = self
            .http
            .get(url)
            .send()
            .await?;

        let raw: Vec<String> = Self::read_json(response, "auto-complete").await?;
        Ok(clean_suggestions(raw))
    }
}

/// Percent-encodes a search term for a query string (spaces become `%20`).
#[must_use]
pub fn escape_term(term: &str) -> String {
    urlencoding::encode(term).into_owned()
}

/// Strips surrounding quotes and whitespace, dropping blanks. Order is kept.
#[must_use]
pub fn clean_suggestions(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|s| s.trim().trim_matches('"').trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Compile-time assertions for thread safety.
#[cfg(test)]
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<EdamamClient>();
    assert_send_sync::<RawParseResult>();
    assert_send_sync::<RawNutrientResult>();
};
