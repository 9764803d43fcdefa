//! Seam traits for the Remedia consultation pipeline.
//!
//! The four pipeline stages, in the order the `Consultant` calls them:
//!
//! - `Inferencer`          maps free text to one condition
//! - `Recommender`         names candidate drugs, later ranks suggestions
//! - `SafetyScreen`        gates the result (emergency, confidence, drugs)
//! - `ConsultationJournal` records the finished consultation
//!
//! plus the pluggable collaborators those stages are built from
//! (`SimilarityMetric`, `TextModel`, `HerbSource`, `DrugSource`).
//!
//! Every implementation is loaded once and shared read-only, hence the
//! `Send + Sync` bounds.

use std::collections::BTreeSet;

use remedia_contracts::{
    consultation::ConsultationSummary,
    error::RemediaResult,
    inference::InferenceResult,
    recommend::{DrugEntry, HerbEntry, RecommendationSet},
    safety::SafetyReport,
};

/// Sparse feature vector: `(feature index, value)` pairs.
pub type SparseVector = Vec<(usize, f64)>;

/// Maps free text to the single most likely condition.
///
/// Never fails: empty input and input without evidence both map to
/// terminal results rather than errors.
pub trait Inferencer: Send + Sync {
    fn infer(&self, text: &str) -> InferenceResult;
}

/// The mandatory safety layer between inference and recommendation.
pub trait SafetyScreen: Send + Sync {
    /// Inspect `result` and the drugs about to be suggested.
    ///
    /// The emergency scan runs against `result.query` before anything else;
    /// an emergency report carries no drug findings.
    fn check_safety(
        &self,
        result: &InferenceResult,
        candidate_drugs: &[String],
        user_allergens: Option<&BTreeSet<String>>,
    ) -> SafetyReport;
}

/// Produces ranked herbal and pharmaceutical suggestions.
pub trait Recommender: Send + Sync {
    /// The drug names `recommend` would list for `result`, in rank order.
    ///
    /// Called before the safety check so interactions and allergies can be
    /// screened against exactly what the user will see.
    fn candidate_drugs(&self, result: &InferenceResult) -> Vec<String>;

    /// Build the final suggestion lists. Must return empty lists when
    /// `safety.is_emergency` is set.
    fn recommend(&self, result: &InferenceResult, safety: &SafetyReport) -> RecommendationSet;
}

/// Append-only sink for finished consultations.
///
/// A failed append is surfaced to the caller: a consultation that cannot be
/// recorded is reported as an error.
pub trait ConsultationJournal: Send + Sync {
    fn append(&self, summary: &ConsultationSummary) -> RemediaResult<()>;
}

/// String similarity in `[0, 1]`, 1.0 meaning identical.
pub trait SimilarityMetric: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// A pre-fit statistical text classifier.
pub trait TextModel: Send + Sync {
    /// Class labels, index-aligned with `predict_proba` output.
    fn classes(&self) -> &[String];

    /// Vectorize already-cleaned text.
    fn transform(&self, text: &str) -> SparseVector;

    /// Per-class probabilities for a feature vector.
    fn predict_proba(&self, features: &SparseVector) -> Vec<f64>;
}

/// Read-only herb knowledge.
pub trait HerbSource: Send + Sync {
    /// Herbs relevant to `condition`, in source declaration order.
    fn herbs_for(&self, condition: &str) -> Vec<HerbEntry>;
}

/// Read-only drug knowledge.
pub trait DrugSource: Send + Sync {
    /// Drugs indicated for `condition`, in source declaration order.
    fn drugs_for(&self, condition: &str) -> Vec<DrugEntry>;
}
