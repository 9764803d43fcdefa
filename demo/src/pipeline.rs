//! Builds a `Consultant` from configuration.
//!
//! Shared by the `consult` command and the end-to-end scenario tests below,
//! so both run the same inference, safety and recommendation stages.

use std::{collections::BTreeSet, sync::Arc};

use remedia_contracts::{
    config::RemediaConfig, consultation::ConsultationSummary, error::RemediaResult,
};
use remedia_core::{traits::ConsultationJournal, Consultant};
use remedia_infer::InferenceCoordinator;
use remedia_journal::InMemoryJournal;
use remedia_recommend::RecommendationAggregator;
use remedia_safety::SafetyGate;

/// Lets the caller keep a handle on the in-memory journal after the
/// consultant takes ownership of its boxed copy.
pub struct ArcJournal(pub Arc<InMemoryJournal>);

impl ConsultationJournal for ArcJournal {
    fn append(&self, summary: &ConsultationSummary) -> RemediaResult<()> {
        self.0.append(summary)
    }
}

/// Inference, safety gate and recommender from `config`, writing to `journal`.
pub fn build_consultant(
    config: &RemediaConfig,
    journal: Box<dyn ConsultationJournal>,
) -> RemediaResult<Consultant> {
    let inferencer = InferenceCoordinator::from_config(config)?;
    let gate = SafetyGate::from_config(config);
    let aggregator = RecommendationAggregator::from_config(config)?;

    Ok(Consultant::new(
        Box::new(inferencer),
        Box::new(gate),
        Box::new(aggregator),
        journal,
    ))
}

/// Trimmed, lowercased allergens; blanks dropped.
pub fn declared_allergens(raw: &[String]) -> BTreeSet<String> {
    raw.iter()
        .map(|a| a.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────
