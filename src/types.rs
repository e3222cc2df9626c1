//! Type-safe newtypes for foodsearch.
//!
//! These newtypes provide compile-time safety and semantic clarity
//! for core domain concepts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a user document in the user store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Nutrition API identifier of a food or meal (e.g. `food_a1gb9ubb72c7snbuxr3weagwv0dd`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct FoodId(String);

impl FoodId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FoodId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Monotonically increasing ticket handed to each search.
///
/// Only the search holding the latest token may deliver results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchToken(u64);

impl SearchToken {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SearchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = self.0;
        write!(f, "search#{token}")
    }
}

// Compile-time assertions for thread safety.
#[cfg(test)]
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<UserId>();
    assert_send_sync::<FoodId>();
    assert_send_sync::<SearchToken>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_serializes_transparently() {
        let id = UserId::new("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
        let back: UserId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_search_token_ordering() {
        assert!(SearchToken::new(2) > SearchToken::new(1));
        assert_eq!(SearchToken::new(9).to_string(), "search#9");
    }

    #[test]
    fn test_food_id_display() {
        let id = FoodId::from("food_bpumdjzb5rtqaeabb0kr1bxbjxzf");
        assert_eq!(id.to_string(), "food_bpumdjzb5rtqaeabb0kr1bxbjxzf");
    }
}
