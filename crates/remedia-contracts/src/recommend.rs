//! Ranked herbal and pharmaceutical recommendations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::safety::{AllergyRecord, InteractionRecord, SafetyReport};

/// Placeholder for a free-text metadata field the source left empty.
pub const MISSING_FIELD: &str = "—";

/// Placeholder for an enumerated metadata field (availability, type) the
/// source left empty.
pub const UNKNOWN_FIELD: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Herbal,
    Pharmaceutical,
}

/// An herb offered by a herb source for some condition, before ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HerbEntry {
    pub name: String,
    /// Relevance to the condition, in `[0, 1]`.
    pub relevance: f64,
    #[serde(default)]
    pub benefits: Option<String>,
    #[serde(default)]
    pub active_compounds: Option<String>,
    #[serde(default)]
    pub usage: Option<String>,
}

/// A drug offered by a drug source for some condition, before ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugEntry {
    pub name: String,
    #[serde(default)]
    pub brand_names: Vec<String>,
    #[serde(default, rename = "type")]
    pub drug_type: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub side_effects: Option<String>,
}

/// One ranked suggestion.
///
/// `rank_score` is in `[0, 1]` and each list is ordered by it, descending:
/// relevance for herbs, an availability score for drugs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub name: String,
    pub rank_score: f64,
    pub metadata: BTreeMap<String, String>,
}

impl Recommendation {
    /// Metadata lookup that never fails; absent keys read as `MISSING_FIELD`.
    pub fn field(&self, key: &str) -> &str {
        self.metadata
            .get(key)
            .map(String::as_str)
            .unwrap_or(MISSING_FIELD)
    }
}

/// The aggregator's output for one consultation.
///
/// On emergency both lists are empty and `emergency_message` is set. In every
/// other case the safety findings are copied here verbatim so the
/// presentation layer never has to consult the report separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub condition: String,
    pub confidence: f64,
    pub herbal: Vec<Recommendation>,
    pub pharmaceutical: Vec<Recommendation>,
    pub emergency_message: Option<String>,
    pub low_confidence_warning: Option<String>,
    pub drug_interactions: Vec<InteractionRecord>,
    pub allergy_warnings: Vec<AllergyRecord>,
    pub disclaimer: String,
}

impl RecommendationSet {
    /// An empty set that carries every finding from `safety`.
    pub fn from_safety(condition: impl Into<String>, confidence: f64, safety: &SafetyReport) -> Self {
        Self {
            condition: condition.into(),
            confidence,
            herbal: Vec::new(),
            pharmaceutical: Vec::new(),
            emergency_message: safety.emergency_message.clone(),
            low_confidence_warning: safety.low_confidence_warning.clone(),
            drug_interactions: safety.drug_interactions.iter().cloned().collect(),
            allergy_warnings: safety.allergy_warnings.iter().cloned().collect(),
            disclaimer: safety.disclaimer.clone(),
        }
    }

    pub fn is_emergency(&self) -> bool {
        self.emergency_message.is_some()
    }

    /// Names of every recommended item, herbs first.
    pub fn names(&self) -> Vec<String> {
        self.herbal
            .iter()
            .chain(self.pharmaceutical.iter())
            .map(|r| r.name.clone())
            .collect()
    }
}
