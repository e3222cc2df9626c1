//! Bounded, deduplicated list of a user's recent search terms.

use crate::config::HISTORY_CAPACITY;
use serde::{Deserialize, Deserializer, Serialize};

/// Most-recent-last list of up to `HISTORY_CAPACITY` distinct terms.
///
/// Persistence is the owner's job: the user record that embeds this
/// history is written back after every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SearchHistory {
    terms: Vec<String>,
}

impl SearchHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a term. Duplicates are ignored; when full, the oldest term is evicted.
    ///
    /// Returns `true` if the history changed.
    pub fn add(&mut self, term: &str) -> bool {
        if self.contains(term) {
            return false;
        }
        if self.terms.len() >= HISTORY_CAPACITY {
            self.terms.remove(0);
        }
        self.terms.push(term.to_string());
        true
    }

    /// Removes a term if present. Returns `true` if it was removed.
    pub fn remove(&mut self, term: &str) -> bool {
        match self.terms.iter().position(|t| t == term) {
            Some(index) => {
                self.terms.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.terms.clear();
    }

    #[must_use]
    pub fn contains(&self, term: &str) -> bool {
        self.terms.iter().any(|t| t == term)
    }

    /// Terms in insertion order, oldest first.
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

// Stored histories are replayed through `add` so a hand-edited or legacy
// record can never break the size and uniqueness invariants.
impl<'de> Deserialize<'de> for SearchHistory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        Ok(raw.iter().map(String::as_str).collect())
    }
}

impl<'a> FromIterator<&'a str> for SearchHistory {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut history = Self::new();
        for term in iter {
            history.add(term);
        }
        history
    }
}
