//! Condition vocabulary for direct and fuzzy name matching.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use remedia_contracts::error::{RemediaError, RemediaResult};

const TABLE: &str = "vocabulary";

pub const DEFAULT_VOCABULARY_TOML: &str = include_str!("../../tables/vocabulary.toml");

/// Two ordered term lists. Within each list the first substring hit wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Diseases a user may name outright. A hit outranks keyword scoring.
    pub named_conditions: Vec<String>,
    /// Symptom words, only consulted when keyword scoring found nothing.
    #[serde(default)]
    pub symptom_terms: Vec<String>,
}

impl Vocabulary {
    pub fn embedded() -> RemediaResult<Self> {
        Self::from_toml_str(DEFAULT_VOCABULARY_TOML)
    }

    /// Terms are lower-cased on load; blank terms are rejected.
    pub fn from_toml_str(s: &str) -> RemediaResult<Self> {
        let mut vocab: Vocabulary = toml::from_str(s)
            .map_err(|e| RemediaError::table(TABLE, format!("failed to parse TOML: {}", e)))?;

        for term in vocab
            .named_conditions
            .iter_mut()
            .chain(vocab.symptom_terms.iter_mut())
        {
            *term = term.trim().to_lowercase();
            if term.is_empty() {
                return Err(RemediaError::table(TABLE, "blank vocabulary term"));
            }
        }

        debug!(
            named = vocab.named_conditions.len(),
            symptoms = vocab.symptom_terms.len(),
            "vocabulary loaded"
        );
        Ok(vocab)
    }

    pub fn from_file(path: &Path) -> RemediaResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RemediaError::table(
                TABLE,
                format!("failed to read '{}': {}", path.display(), e),
            )
        })?;
        Self::from_toml_str(&contents)
    }

    /// Named conditions first, then symptom terms.
    pub fn all_terms(&self) -> impl Iterator<Item = &str> {
        self.named_conditions
            .iter()
            .chain(self.symptom_terms.iter())
            .map(String::as_str)
    }
}

/// First term of `terms` that occurs in `cleaned`.
pub(crate) fn first_substring_hit<'a>(cleaned: &str, terms: &'a [String]) -> Option<&'a str> {
    terms
        .iter()
        .find(|term| cleaned.contains(term.as_str()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_vocabulary_orders_longer_phrases_first() {
        let vocab = Vocabulary::embedded().unwrap();
        let asthma = vocab.named_conditions.iter().position(|t| t == "asthma").unwrap();
        let bronchial = vocab
            .named_conditions
            .iter()
            .position(|t| t == "bronchial asthma")
            .unwrap();
        assert!(bronchial < asthma);
        assert_eq!(
            first_substring_hit("chronic bronchial asthma", &vocab.named_conditions),
            Some("bronchial asthma")
        );
    }

    #[test]
    fn terms_are_lowercased_on_load() {
        let vocab = Vocabulary::from_toml_str("named_conditions = [\" Gout \"]").unwrap();
        assert_eq!(vocab.named_conditions, vec!["gout"]);
        assert!(vocab.symptom_terms.is_empty());
    }

    #[test]
    fn blank_term_is_rejected() {
        assert!(Vocabulary::from_toml_str("named_conditions = [\"  \"]").is_err());
    }
}
