//! Condition inference result types.
//!
//! A `ConditionCandidate` is a scored guess from one inference strategy.
//! The coordinator folds all candidates into one `InferenceResult` per query.

use serde::{Deserialize, Serialize};

use crate::error::{RemediaError, RemediaResult};

/// Which strategy produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Keyword,
    Pattern,
    Classifier,
    DirectMatch,
    FuzzyMatch,
}

/// Which strategy decided the final condition.
///
/// `Default` marks the two evidence-free terminal states
/// ("No Condition Detected" and "General Condition").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceSource {
    Keyword,
    Pattern,
    Classifier,
    DirectMatch,
    FuzzyMatch,
    Default,
}

impl From<CandidateSource> for InferenceSource {
    fn from(source: CandidateSource) -> Self {
        match source {
            CandidateSource::Keyword => Self::Keyword,
            CandidateSource::Pattern => Self::Pattern,
            CandidateSource::Classifier => Self::Classifier,
            CandidateSource::DirectMatch => Self::DirectMatch,
            CandidateSource::FuzzyMatch => Self::FuzzyMatch,
        }
    }
}

impl std::fmt::Display for InferenceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Keyword => "keyword",
            Self::Pattern => "pattern",
            Self::Classifier => "classifier",
            Self::DirectMatch => "direct-match",
            Self::FuzzyMatch => "fuzzy-match",
            Self::Default => "default",
        };
        f.write_str(label)
    }
}

/// A scored condition guess. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionCandidate {
    pub name: String,
    /// Raw strategy score: accumulated weight, match count, or probability.
    pub score: f64,
    pub source: CandidateSource,
}

impl ConditionCandidate {
    pub fn new(name: impl Into<String>, score: f64, source: CandidateSource) -> Self {
        Self {
            name: name.into(),
            score,
            source,
        }
    }
}

/// The outcome of inferring a condition from one free-text query.
///
/// Built once by the coordinator and read-only afterwards. `query` keeps the
/// raw text so the safety gate can run its emergency scan against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub query: String,
    pub condition: String,
    /// Always within `[0.0, 1.0]`.
    pub confidence: f64,
    pub source: InferenceSource,
    /// Runner-up candidates, descending by score, never naming `condition`.
    pub alternates: Vec<ConditionCandidate>,
    /// Name of the context pattern that produced the result, if any.
    pub pattern_detected: Option<String>,
    /// Clarifying questions to put to the user. Only set for pattern results.
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

impl InferenceResult {
    /// Reported for empty or whitespace-only input.
    pub const NO_CONDITION: &'static str = "No Condition Detected";

    /// Reported when no strategy produced any evidence.
    pub const GENERAL_CONDITION: &'static str = "General Condition";

    pub fn no_condition(query: impl Into<String>) -> Self {
        Self::terminal(query, Self::NO_CONDITION, 0.0)
    }

    pub fn general_condition(query: impl Into<String>, confidence: f64) -> Self {
        Self::terminal(query, Self::GENERAL_CONDITION, confidence)
    }

    fn terminal(query: impl Into<String>, condition: &str, confidence: f64) -> Self {
        Self {
            query: query.into(),
            condition: condition.to_string(),
            confidence,
            source: InferenceSource::Default,
            alternates: Vec::new(),
            pattern_detected: None,
            follow_up_questions: Vec::new(),
        }
    }

    /// True for the two evidence-free terminal states.
    pub fn is_default(&self) -> bool {
        self.source == InferenceSource::Default
    }

    /// Check the structural invariants of this result.
    ///
    /// A failure here is a defect in whichever component built the result,
    /// never a property of the user's input.
    pub fn validate(&self) -> RemediaResult<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(RemediaError::InvariantViolation {
                reason: format!(
                    "confidence {} for '{}' is outside [0, 1]",
                    self.confidence, self.condition
                ),
            });
        }

        if let Some(dup) = self.alternates.iter().find(|c| c.name == self.condition) {
            return Err(RemediaError::InvariantViolation {
                reason: format!("alternate '{}' repeats the selected condition", dup.name),
            });
        }

        let sorted = self
            .alternates
            .windows(2)
            .all(|pair| pair[0].score >= pair[1].score);
        if !sorted {
            return Err(RemediaError::InvariantViolation {
                reason: format!(
                    "alternates for '{}' are not sorted by descending score",
                    self.condition
                ),
            });
        }

        Ok(())
    }
}
