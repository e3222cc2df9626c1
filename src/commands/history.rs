//! Search-history and user-account commands.

use crate::db::UserStore;
use crate::services::{FoodSearchService, UserSession};
use crate::types::UserId;
use crate::user::User;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What to do with the search history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase", tag = "action", content = "term")]
pub enum HistoryAction {
    List,
    Remove(String),
    Clear,
}

/// Output for the history command.
#[derive(Debug, Serialize)]
pub struct HistoryOutput {
    /// History after the action, oldest first
    pub terms: Vec<String>,
    /// For `remove`: whether the term was present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
}

/// Executes the history command.
///
/// # Errors
///
/// Returns an error string if the updated user cannot be persisted.
pub async fn execute_history(
    service: &FoodSearchService,
    session: &UserSession,
    action: HistoryAction,
) -> Result<HistoryOutput, String> {
    let removed = match action {
        HistoryAction::List => None,
        HistoryAction::Remove(term) => Some(
            service
                .remove_search_term(session, &term)
                .await
                .map_err(|e| e.to_string())?,
        ),
        HistoryAction::Clear => {
            service
                .clear_search_history(session)
                .await
                .map_err(|e| e.to_string())?;
            None
        }
    };

    Ok(HistoryOutput {
        terms: session.history().await,
        removed,
    })
}

/// Input for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    /// Blank to have the store generate one
    #[serde(default)]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub calorie_goal: f64,
}

/// Output describing a stored user.
#[derive(Debug, Serialize)]
pub struct UserOutput {
    pub id: String,
    pub email: String,
    pub name: String,
    pub level: f64,
    pub calories_eaten: f64,
    pub calories_goal: f64,
    pub remaining_calories: f64,
    pub foods_logged: usize,
    pub searches: Vec<String>,
}

impl From<&User> for UserOutput {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            name: format!("{} {}", user.first_name, user.last_name)
                .trim()
                .to_string(),
            level: user.level,
            calories_eaten: user.calories_eaten,
            calories_goal: user.calories_goal,
            remaining_calories: user.remaining_calories(),
            foods_logged: user.has_eaten.len(),
            searches: user.searches.terms().to_vec(),
        }
    }
}

/// Creates and stores a user.
///
/// # Errors
///
/// Returns an error string if a user with this email already exists or the
/// insert fails.
pub async fn execute_create_user(
    store: Arc<dyn UserStore>,
    input: CreateUserInput,
) -> Result<UserOutput, String> {
    let user = User::new(input.id, input.email, input.first_name, input.last_name)
        .with_calorie_goal(input.calorie_goal);

    let stored = tokio::task::spawn_blocking(move || -> Result<User, String> {
        let existing = store
            .get_all_by_field("email", &user.email)
            .map_err(|e| e.to_string())?;
        if !existing.is_empty() {
            return Err(format!("A user with email '{}' already exists", user.email));
        }
        let id = store.add(&user).map_err(|e| e.to_string())?;
        Ok(User { id, ..user })
    })
    .await
    .map_err(|e| e.to_string())??;

    Ok(UserOutput::from(&stored))
}

/// Describes the session's user.
pub async fn execute_show_user(session: &UserSession) -> UserOutput {
    UserOutput::from(&session.snapshot().await)
}

/// Loads the session for `id`.
///
/// # Errors
///
/// Returns an error string if the user does not exist.
pub async fn open_session(store: Arc<dyn UserStore>, id: &str) -> Result<UserSession, String> {
    UserSession::load(store, UserId::new(id))
        .await
        .map_err(|e| e.to_string())
}
