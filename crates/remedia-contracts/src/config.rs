//! Configuration schema.
//!
//! Every threshold the pipeline uses lives here as a named field with its
//! production default, so a TOML file only needs to list what it overrides.
//! Loading is done by `remedia_core::config`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Thresholds for the inference coordinator and its strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Keyword score that maps to confidence 1.0 before capping.
    pub score_ceiling: f64,
    /// Upper bound on keyword-derived confidence.
    pub max_keyword_confidence: f64,
    /// Confidence reported for a direct vocabulary hit.
    pub direct_match_confidence: f64,
    /// A fuzzy similarity must be strictly above this to count.
    pub fuzzy_threshold: f64,
    /// Similarity assigned when one token contains the other.
    pub containment_similarity: f64,
    /// Tokens shorter than this never qualify for containment.
    pub containment_min_len: usize,
    /// Confidence reported for a context-pattern result.
    pub pattern_confidence: f64,
    /// A pattern overrides a statistical result below this confidence.
    pub statistical_override_threshold: f64,
    /// Confidence reported when nothing matched at all.
    pub general_condition_confidence: f64,
    /// How many runner-up classes to keep from the statistical model.
    pub max_alternates: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            score_ceiling: 10.0,
            max_keyword_confidence: 0.95,
            direct_match_confidence: 0.95,
            fuzzy_threshold: 0.7,
            containment_similarity: 0.95,
            containment_min_len: 4,
            pattern_confidence: 0.75,
            statistical_override_threshold: 0.7,
            general_condition_confidence: 0.50,
            max_alternates: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Confidence strictly below this produces an advisory warning.
    pub low_confidence_threshold: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: 0.45,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// Maximum entries in each recommendation list.
    pub top_n: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

/// Optional overrides for the embedded data tables.
///
/// `None` means "use the table compiled into the crate", except for
/// `model`, which has no embedded default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablePaths {
    pub keywords: Option<PathBuf>,
    pub patterns: Option<PathBuf>,
    pub vocabulary: Option<PathBuf>,
    pub model: Option<PathBuf>,
    pub interactions: Option<PathBuf>,
    pub allergies: Option<PathBuf>,
    pub herbs: Option<PathBuf>,
    pub drugs: Option<PathBuf>,
    /// Where the JSON-lines consultation journal is appended.
    pub journal: Option<PathBuf>,
}

/// Top-level configuration document.
///
/// ```toml
/// [inference]
/// fuzzy_threshold = 0.75
///
/// [safety]
/// low_confidence_threshold = 0.5
///
/// [tables]
/// model = "data/symptom_model.json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediaConfig {
    pub inference: InferenceConfig,
    pub safety: SafetyConfig,
    pub recommend: RecommendConfig,
    pub tables: TablePaths,
}
