//! Food search orchestration.
//!
//! `FoodSearchService` ties the nutrition client, result parser and filter
//! engine together and keeps the signed-in user's search history in step
//! with the user store. The signed-in user travels as an explicit
//! `UserSession` rather than process-wide state.

use crate::config::SearchConfig;
use crate::db::UserStore;
use crate::error::{DbError, SearchError, SearchResult};
use crate::food::{FoodRecord, IngredientRecord};
use crate::services::client::NutritionApi;
use crate::services::filter::{FilterConfiguration, FilterEngine};
use crate::services::parser::{ResultParser, SkippedRecord};
use crate::types::{FoodId, SearchToken, UserId};
use crate::user::User;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// The signed-in user a search runs on behalf of.
///
/// The async mutex makes this session the single writer for the user:
/// it is held across each history mutation and its persistence write, so
/// concurrent searches cannot lose each other's updates.
pub struct UserSession {
    id: UserId,
    user: Mutex<User>,
}

impl UserSession {
    #[must_use]
    pub fn new(user: User) -> Self {
        Self {
            id: user.id.clone(),
            user: Mutex::new(user),
        }
    }

    /// Loads a session for a stored user.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Store` with `DbError::UserNotFound` if no such user exists.
    pub async fn load(store: Arc<dyn UserStore>, id: UserId) -> SearchResult<Self> {
        let lookup = id.clone();
        let user = tokio::task::spawn_blocking(move || store.get_by_id(&lookup))
            .await??
            .ok_or_else(|| DbError::UserNotFound { id: id.to_string() })?;
        Ok(Self::new(user))
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.id
    }

    /// Copy of the user as it currently stands.
    pub async fn snapshot(&self) -> User {
        self.user.lock().await.clone()
    }

    /// Search history, oldest first.
    pub async fn history(&self) -> Vec<String> {
        self.user.lock().await.searches.terms().to_vec()
    }
}

/// Results of one completed search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub token: SearchToken,
    /// Records that passed the filter, in API order
    pub records: Vec<FoodRecord>,
    /// Records built before filtering
    pub candidates: usize,
    /// Nutrient lookups issued
    pub lookups: usize,
    pub skipped: Vec<SkippedRecord>,
}

/// Search, suggestion and history operations for a user session.
///
/// Thread-safe (Send + Sync):
/// - Active filter in a `RwLock`, copied out at the start of each search
/// - Latest search token in an `AtomicU64`
/// - User-store calls run on the blocking pool
pub struct FoodSearchService {
    api: Arc<dyn NutritionApi>,
    store: Arc<dyn UserStore>,
    parser: ResultParser,
    filter: RwLock<FilterConfiguration>,
    latest_token: AtomicU64,
}

impl FoodSearchService {
    /// Creates a service with the default filter and search configuration.
    #[must_use]
    pub fn new(api: Arc<dyn NutritionApi>, store: Arc<dyn UserStore>) -> Self {
        Self::with_config(api, store, SearchConfig::default())
    }

    #[must_use]
    pub fn with_config(
        api: Arc<dyn NutritionApi>,
        store: Arc<dyn UserStore>,
        config: SearchConfig,
    ) -> Self {
        let parser = ResultParser::new(Arc::clone(&api), config.lookup_concurrency());
        Self {
            api,
            store,
            parser,
            filter: RwLock::new(FilterConfiguration::default()),
            latest_token: AtomicU64::new(0),
        }
    }

    /// Replaces the filter used by subsequent searches.
    ///
    /// Searches already running keep the configuration they started with.
    pub fn set_filter_configuration(&self, config: FilterConfiguration) {
        let mut active = self.filter.write().unwrap_or_else(|e| e.into_inner());
        *active = config;
    }

    #[must_use]
    pub fn filter_configuration(&self) -> FilterConfiguration {
        *self.filter.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether `token` belongs to the most recently started search.
    #[must_use]
    pub fn is_current(&self, token: SearchToken) -> bool {
        self.latest_token.load(Ordering::SeqCst) == token.as_u64()
    }

    /// Runs a filtered search and records the term in the user's history.
    ///
    /// The history write and the remote lookups proceed side by side. A
    /// history persistence failure is logged and does not fail the search.
    ///
    /// # Errors
    ///
    /// - `SearchError::EmptyTerm` for a blank term (nothing is recorded)
    /// - `SearchError::Nutrition` if the parser lookup fails or is malformed
    /// - `SearchError::Superseded` if a newer search started before this one finished
    pub async fn search(&self, session: &UserSession, term: &str) -> SearchResult<SearchOutcome> {
        let term = term.trim();
        if term.is_empty() {
            return Err(SearchError::EmptyTerm);
        }

        let token = SearchToken::new(self.latest_token.fetch_add(1, Ordering::SeqCst) + 1);
        let config = self.filter_configuration();

        let (recorded, fetched) = tokio::join!(
            self.update_user(session, |user| user.searches.add(term)),
            self.fetch_candidates(term, &config),
        );

        if let Err(e) = recorded {
            tracing::warn!(user = %session.user_id(), error = %e, "Failed to persist search history");
        }
        let report = fetched?;

        if !self.is_current(token) {
            tracing::debug!(%token, term, "Dropping superseded search results");
            return Err(SearchError::Superseded {
                token: token.as_u64(),
            });
        }

        let candidates = report.records.len();
        let records = FilterEngine::apply(report.records, &config);

        tracing::info!(
            %token,
            term,
            candidates,
            returned = records.len(),
            skipped = report.skipped.len(),
            "Search complete"
        );

        Ok(SearchOutcome {
            token,
            records,
            candidates,
            lookups: report.lookups,
            skipped: report.skipped,
        })
    }

    /// Suggestions for the search box.
    ///
    /// A blank term returns the user's history (most recent last) without a
    /// remote call; otherwise the autocomplete endpoint answers.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Nutrition` if the autocomplete call fails.
    pub async fn suggest(&self, session: &UserSession, term: &str) -> SearchResult<Vec<String>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(session.history().await);
        }
        Ok(self.api.autocomplete(term).await?)
    }

    /// Removes one term from the user's history and persists the user.
    ///
    /// Returns `true` if the term was present.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Store` if the user record cannot be written.
    pub async fn remove_search_term(&self, session: &UserSession, term: &str) -> SearchResult<bool> {
        self.update_user(session, |user| user.searches.remove(term))
            .await
    }

    /// Empties the user's history and persists the user.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Store` if the user record cannot be written.
    pub async fn clear_search_history(&self, session: &UserSession) -> SearchResult<()> {
        self.update_user(session, |user| user.searches.clear()).await
    }

    /// Adds a result to the user's food log and persists the user.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Store` if the user record cannot be written.
    pub async fn log_food(&self, session: &UserSession, record: &FoodRecord) -> SearchResult<f64> {
        self.update_user(session, |user| {
            user.log_food(record);
            user.remaining_calories()
        })
        .await
    }

    /// Re-fetches one ingredient for a known food and measure.
    ///
    /// `measure_label` names the measure when the nutrient response does
    /// not echo one back.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Nutrition` if the nutrient lookup fails.
    pub async fn food_detail(
        &self,
        food_id: &FoodId,
        measure_uri: &str,
        measure_label: &str,
        name: &str,
    ) -> SearchResult<IngredientRecord> {
        Ok(self
            .parser
            .ingredient(name, food_id, measure_uri, measure_label)
            .await?)
    }

    async fn fetch_candidates(
        &self,
        term: &str,
        config: &FilterConfiguration,
    ) -> SearchResult<crate::services::parser::ParseReport> {
        let raw = self.api.lookup_by_term(term, &config.range_params()).await?;
        Ok(self.parser.parse(raw).await)
    }

    /// Applies `mutate` to a copy of the session's user and writes it back.
    ///
    /// The session lock is held until the write finishes. The session only
    /// takes the new state once the store accepted it.
    async fn update_user<F, T>(&self, session: &UserSession, mutate: F) -> SearchResult<T>
    where
        F: FnOnce(&mut User) -> T,
    {
        let mut user = session.user.lock().await;
        let mut draft = user.clone();
        let out = mutate(&mut draft);

        let store = Arc::clone(&self.store);
        let draft = tokio::task::spawn_blocking(move || store.update(&draft).map(|()| draft)).await??;
        *user = draft;

        Ok(out)
    }
}

// Compile-time assertions for thread safety.
#[cfg(test)]
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<FoodSearchService>();
    assert_send_sync::<UserSession>();
    assert_send_sync::<SearchOutcome>();
};
