//! The consultation pipeline.
//!
//! Stages run in a fixed order for every query:
//!
//!   Infer → Candidate drugs → Safety gate → Recommend → Journal
//!
//! The recommender only ever sees a `SafetyReport` that has already been
//! produced for the exact drugs it proposed, and an emergency report forces
//! empty recommendation lists.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{debug, info, warn};

use remedia_contracts::{
    consultation::{Consultation, ConsultationId},
    error::{RemediaError, RemediaResult},
};

use crate::traits::{ConsultationJournal, Inferencer, Recommender, SafetyScreen};

/// Drives one consultation per call. Holds no per-query state, so a single
/// instance can serve every request.
pub struct Consultant {
    inferencer: Box<dyn Inferencer>,
    safety: Box<dyn SafetyScreen>,
    recommender: Box<dyn Recommender>,
    journal: Box<dyn ConsultationJournal>,
}

impl Consultant {
    pub fn new(
        inferencer: Box<dyn Inferencer>,
        safety: Box<dyn SafetyScreen>,
        recommender: Box<dyn Recommender>,
        journal: Box<dyn ConsultationJournal>,
    ) -> Self {
        Self {
            inferencer,
            safety,
            recommender,
            journal,
        }
    }

    /// Run the full pipeline for one free-text query.
    ///
    /// # Errors
    ///
    /// `InvariantViolation` if a stage produced a structurally invalid
    /// result, `JournalWriteFailed` if the consultation could not be
    /// recorded. Emergencies and low confidence are not errors; they are
    /// reported inside the returned `Consultation`.
    pub fn consult(
        &self,
        text: &str,
        allergens: Option<&BTreeSet<String>>,
    ) -> RemediaResult<Consultation> {
        let id = ConsultationId::new();
        debug!(consultation_id = %id, chars = text.len(), "consultation starting");

        // ── Stage 1: Inference ───────────────────────────────────────────────
        let inference = self.inferencer.infer(text);
        inference.validate()?;
        debug!(
            consultation_id = %id,
            condition = %inference.condition,
            confidence = inference.confidence,
            source = %inference.source,
            "condition inferred"
        );

        // ── Stage 2: Candidate drugs to screen ───────────────────────────────
        let candidate_drugs = self.recommender.candidate_drugs(&inference);

        // ── Stage 3: Safety gate ─────────────────────────────────────────────
        let safety = self
            .safety
            .check_safety(&inference, &candidate_drugs, allergens);
        safety.validate()?;

        if safety.is_emergency {
            warn!(
                consultation_id = %id,
                condition = %inference.condition,
                "emergency indicators present, recommendations suppressed"
            );
        } else if safety.has_warnings() {
            info!(
                consultation_id = %id,
                interactions = safety.drug_interactions.len(),
                allergies = safety.allergy_warnings.len(),
                low_confidence = safety.low_confidence_warning.is_some(),
                "safety warnings attached"
            );
        }

        // ── Stage 4: Recommendations ─────────────────────────────────────────
        let recommendations = self.recommender.recommend(&inference, &safety);
        if safety.is_emergency
            && (!recommendations.herbal.is_empty() || !recommendations.pharmaceutical.is_empty())
        {
            return Err(RemediaError::InvariantViolation {
                reason: "recommender returned suggestions for an emergency".to_string(),
            });
        }

        let consultation = Consultation {
            id,
            inference,
            safety,
            recommendations,
            timestamp: Utc::now(),
        };

        // ── Stage 5: Journal ─────────────────────────────────────────────────
        self.journal.append(&consultation.summary())?;

        info!(
            consultation_id = %consultation.id,
            condition = %consultation.inference.condition,
            confidence = consultation.inference.confidence,
            emergency = consultation.safety.is_emergency,
            "consultation complete"
        );

        Ok(consultation)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
