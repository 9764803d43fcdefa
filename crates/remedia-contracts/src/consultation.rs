//! One end-to-end consultation: inference, safety findings, recommendations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{inference::InferenceResult, recommend::RecommendationSet, safety::SafetyReport};

/// Unique identifier for a single consultation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsultationId(pub uuid::Uuid);

impl ConsultationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConsultationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConsultationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything produced for one user query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: ConsultationId,
    pub inference: InferenceResult,
    pub safety: SafetyReport,
    pub recommendations: RecommendationSet,
    pub timestamp: DateTime<Utc>,
}

impl Consultation {
    /// The flattened record kept in the consultation journal.
    pub fn summary(&self) -> ConsultationSummary {
        ConsultationSummary {
            consultation_id: self.id.to_string(),
            query: self.inference.query.clone(),
            condition: self.inference.condition.clone(),
            confidence: self.inference.confidence,
            source: self.inference.source.to_string(),
            is_emergency: self.safety.is_emergency,
            recommended: self.recommendations.names(),
            interaction_count: self.safety.drug_interactions.len(),
            allergy_count: self.safety.allergy_warnings.len(),
            timestamp: self.timestamp,
        }
    }
}

/// Journal-friendly projection of a `Consultation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationSummary {
    pub consultation_id: String,
    pub query: String,
    pub condition: String,
    pub confidence: f64,
    pub source: String,
    pub is_emergency: bool,
    pub recommended: Vec<String>,
    pub interaction_count: usize,
    pub allergy_count: usize,
    pub timestamp: DateTime<Utc>,
}
