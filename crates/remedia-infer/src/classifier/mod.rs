//! Name matching and statistical classification.
//!
//! Three independent steps, each usable on its own:
//!
//! 1. direct match: a vocabulary term occurs verbatim in the cleaned text
//! 2. fuzzy match: a token is close to a vocabulary term under a
//!    `SimilarityMetric`
//! 3. statistical: a pre-fit `TextModel` predicts a class
//!
//! `classify` runs them in that order and returns the first that fires.
//! Probabilities are never blended across steps.

pub mod model;
pub mod vocabulary;

use std::path::Path;

use tracing::{debug, warn};

use remedia_contracts::{
    config::InferenceConfig,
    inference::{CandidateSource, ConditionCandidate},
};
use remedia_core::traits::{SimilarityMetric, TextModel};

use crate::similarity::NormalizedLevenshtein;
use crate::text::{clean_text, title_case};

pub use model::TfidfLogisticModel;
pub use vocabulary::Vocabulary;

use vocabulary::first_substring_hit;

/// A single classifier decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub condition: String,
    pub confidence: f64,
    pub source: CandidateSource,
    /// Runner-up classes, statistical step only.
    pub alternates: Vec<ConditionCandidate>,
}

impl Classification {
    fn matched(condition: String, confidence: f64, source: CandidateSource) -> Self {
        Self {
            condition,
            confidence,
            source,
            alternates: Vec::new(),
        }
    }
}

pub struct TextClassifier {
    vocabulary: Vocabulary,
    metric: Box<dyn SimilarityMetric>,
    model: Option<Box<dyn TextModel>>,
    config: InferenceConfig,
}

impl TextClassifier {
    /// Rule-based steps only; the statistical step stays unavailable until a
    /// model is attached.
    pub fn new(vocabulary: Vocabulary, config: InferenceConfig) -> Self {
        Self {
            vocabulary,
            metric: Box::new(NormalizedLevenshtein),
            model: None,
            config,
        }
    }

    pub fn with_metric(mut self, metric: Box<dyn SimilarityMetric>) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_model(mut self, model: Box<dyn TextModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Attach the artifact at `path` if it loads; otherwise log and carry on
    /// without the statistical step.
    pub fn with_model_file(self, path: &Path) -> Self {
        match TfidfLogisticModel::from_file(path) {
            Ok(model) => self.with_model(Box::new(model)),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "statistical classifier disabled"
                );
                self
            }
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// First named condition found verbatim in the text.
    pub fn direct_named(&self, text: &str) -> Option<Classification> {
        self.direct_in(text, &self.vocabulary.named_conditions)
    }

    /// First symptom term found verbatim in the text.
    pub fn direct_symptom(&self, text: &str) -> Option<Classification> {
        self.direct_in(text, &self.vocabulary.symptom_terms)
    }

    fn direct_in(&self, text: &str, terms: &[String]) -> Option<Classification> {
        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return None;
        }
        let term = first_substring_hit(&cleaned, terms)?;
        debug!(term, "direct vocabulary match");
        Some(Classification::matched(
            title_case(term),
            self.config.direct_match_confidence,
            CandidateSource::DirectMatch,
        ))
    }

    /// Closest vocabulary term to any token, if strictly above the threshold.
    ///
    /// Containment counts as `containment_similarity` when the shorter side
    /// has at least `containment_min_len` characters. Confidence is the
    /// similarity rounded to three decimals.
    pub fn fuzzy(&self, text: &str) -> Option<Classification> {
        let cleaned = clean_text(text);
        let mut best: Option<(&str, f64)> = None;

        for token in cleaned.split_whitespace() {
            for term in self.vocabulary.all_terms() {
                let sim = self.token_similarity(token, term);
                match best {
                    Some((_, top)) if sim <= top => {}
                    _ => best = Some((term, sim)),
                }
            }
        }

        let (term, sim) = best?;
        if sim <= self.config.fuzzy_threshold {
            return None;
        }

        debug!(term, similarity = sim, "fuzzy vocabulary match");
        Some(Classification::matched(
            title_case(term),
            round3(sim),
            CandidateSource::FuzzyMatch,
        ))
    }

    fn token_similarity(&self, token: &str, term: &str) -> f64 {
        let shorter = token.chars().count().min(term.chars().count());
        let contained = token.contains(term) || term.contains(token);
        if contained && shorter >= self.config.containment_min_len {
            self.config.containment_similarity
        } else {
            self.metric.similarity(token, term)
        }
    }

    /// Arg-max class of the statistical model.
    ///
    /// `None` when no model is attached or the text shares no feature with
    /// the model's vocabulary.
    pub fn statistical(&self, text: &str) -> Option<Classification> {
        let model = self.model.as_ref()?;
        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return None;
        }

        let features = model.transform(&cleaned);
        if features.is_empty() {
            debug!("no known features for statistical model");
            return None;
        }

        let probs = model.predict_proba(&features);
        let mut ranked: Vec<(usize, f64)> = probs.into_iter().enumerate().collect();
        // Stable: equal probabilities keep class order.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let classes = model.classes();
        let (&(top_idx, top_p), rest) = ranked.split_first()?;
        let condition = classes.get(top_idx)?.clone();

        let alternates = rest
            .iter()
            .filter_map(|(idx, p)| {
                classes
                    .get(*idx)
                    .map(|name| ConditionCandidate::new(name.clone(), *p, CandidateSource::Classifier))
            })
            .take(self.config.max_alternates)
            .collect();

        debug!(condition = %condition, probability = top_p, "statistical prediction");
        Some(Classification {
            condition,
            confidence: top_p.clamp(0.0, 1.0),
            source: CandidateSource::Classifier,
            alternates,
        })
    }

    /// Direct, then fuzzy, then statistical; the first that fires.
    pub fn classify(&self, text: &str) -> Option<Classification> {
        self.direct_named(text)
            .or_else(|| self.direct_symptom(text))
            .or_else(|| self.fuzzy(text))
            .or_else(|| self.statistical(text))
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use remedia_contracts::{config::InferenceConfig, inference::CandidateSource};
    use remedia_core::traits::SimilarityMetric;

    use super::*;
    use crate::similarity::IndelRatio;

    fn classifier() -> TextClassifier {
        TextClassifier::new(Vocabulary::embedded().unwrap(), InferenceConfig::default())
    }

    fn with_model() -> TextClassifier {
        classifier().with_model(Box::new(
            TfidfLogisticModel::from_json_str(model::tests::THREE_CLASS).unwrap(),
        ))
    }

    // ── direct ────────────────────────────────────────────────────────────────

    #[test]
    fn test_direct_named_condition() {
        let c = classifier().direct_named("I have diabetes").unwrap();
        assert_eq!(c.condition, "Diabetes");
        assert_eq!(c.confidence, 0.95);
        assert_eq!(c.source, CandidateSource::DirectMatch);
    }

    #[test]
    fn test_direct_named_prefers_longer_phrase() {
        let c = classifier().direct_named("history of heart disease").unwrap();
        assert_eq!(c.condition, "Heart Disease");
    }

    #[test]
    fn test_direct_symptom_is_separate() {
        let c = classifier();
        assert!(c.direct_named("bad cough").is_none());
        assert_eq!(c.direct_symptom("bad cough").unwrap().condition, "Cough");
    }

    // ── fuzzy ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_fuzzy_corrects_misspelling() {
        let c = classifier().fuzzy("diabities").unwrap();
        assert_eq!(c.condition, "Diabetes");
        assert_eq!(c.confidence, 0.778);
        assert_eq!(c.source, CandidateSource::FuzzyMatch);
    }

    #[test]
    fn test_fuzzy_containment_needs_four_chars() {
        let c = classifier();
        // "colds" contains "cold"
        assert_eq!(c.fuzzy("colds").unwrap().confidence, 0.95);
        // "flus" contains "flu", but "flu" is too short for containment:
        // plain similarity 0.75 still clears the threshold.
        assert_eq!(c.fuzzy("flus").unwrap().confidence, 0.75);
    }

    #[test]
    fn test_fuzzy_rejects_distant_text() {
        assert!(classifier().fuzzy("xyzzy plugh").is_none());
        assert!(classifier().fuzzy("").is_none());
    }

    #[test]
    fn test_fuzzy_metric_is_pluggable() {
        struct Never;
        impl SimilarityMetric for Never {
            fn similarity(&self, _: &str, _: &str) -> f64 {
                0.0
            }
        }
        let c = classifier().with_metric(Box::new(Never));
        assert!(c.fuzzy("diabities").is_none());

        let indel = classifier().with_metric(Box::new(IndelRatio));
        // 2 * 7 / 17
        assert_eq!(indel.fuzzy("diabities").unwrap().confidence, 0.824);
    }

    // ── statistical ───────────────────────────────────────────────────────────

    #[test]
    fn test_statistical_unavailable_without_model() {
        let c = classifier();
        assert!(!c.has_model());
        assert!(c.statistical("sugar and thirst").is_none());
    }

    #[test]
    fn test_missing_model_file_is_not_fatal() {
        let c = classifier().with_model_file(Path::new("/nonexistent/model.json"));
        assert!(!c.has_model());
        assert_eq!(c.direct_named("asthma").unwrap().condition, "Asthma");
    }

    #[test]
    fn test_statistical_prediction_and_alternates() {
        let c = with_model().statistical("sugar and thirst").unwrap();
        assert_eq!(c.condition, "Diabetes");
        assert_eq!(c.source, CandidateSource::Classifier);
        assert!(c.confidence > 0.5 && c.confidence <= 1.0);
        assert_eq!(c.alternates.len(), 2);
        assert_eq!(c.alternates[0].name, "Asthma");
        assert!(c.alternates.iter().all(|a| a.name != "Diabetes"));
    }

    #[test]
    fn test_statistical_needs_known_features() {
        assert!(with_model().statistical("nothing familiar here").is_none());
    }

    #[test]
    fn test_classify_runs_one_step_in_order() {
        let c = with_model();
        assert_eq!(c.classify("asthma and sugar").unwrap().source, CandidateSource::DirectMatch);
        assert_eq!(c.classify("diabities").unwrap().source, CandidateSource::FuzzyMatch);
        assert_eq!(c.classify("sugar thirst").unwrap().source, CandidateSource::Classifier);
        assert!(c.classify("").is_none());
    }
}
