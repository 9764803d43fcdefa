//! Fixed-precedence inference over every strategy in the crate.
//!
//! ```text
//! text ──► empty? ──► named condition? ──► keyword scores? ──► symptom term / fuzzy?
//!                                                                   │
//!              General ◄── statistical? ◄── pattern (unless confident statistical)
//! ```
//!
//! Each branch produces one `Resolution` variant, which is then turned into
//! the final `InferenceResult`.

use tracing::{debug, info};

use remedia_contracts::{
    config::{InferenceConfig, RemediaConfig},
    error::RemediaResult,
    inference::{CandidateSource, ConditionCandidate, InferenceResult, InferenceSource},
};
use remedia_core::traits::Inferencer;

use crate::classifier::{Classification, TextClassifier, Vocabulary};
use crate::keyword::KeywordScorer;
use crate::pattern::{PatternMatch, PatternMatcher};

/// Which precedence step decided a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Blank input.
    Empty,
    /// A named condition appeared verbatim.
    NamedCondition(Classification),
    /// Keyword scoring produced at least one nonzero score.
    Keyword {
        condition: String,
        score: f64,
        alternates: Vec<ConditionCandidate>,
    },
    /// A symptom term appeared verbatim, or a token was close to a term.
    Vocabulary(Classification),
    /// A context pattern matched and no confident statistical result beat it.
    Pattern(PatternMatch),
    Statistical(Classification),
    /// Nothing matched.
    General,
}

pub struct InferenceCoordinator {
    keywords: KeywordScorer,
    patterns: PatternMatcher,
    classifier: TextClassifier,
    config: InferenceConfig,
}

impl InferenceCoordinator {
    pub fn new(
        keywords: KeywordScorer,
        patterns: PatternMatcher,
        classifier: TextClassifier,
        config: InferenceConfig,
    ) -> Self {
        let patterns = patterns.with_confidence(config.pattern_confidence);
        Self {
            keywords,
            patterns,
            classifier,
            config,
        }
    }

    /// Embedded tables, no statistical model.
    pub fn embedded(config: InferenceConfig) -> RemediaResult<Self> {
        let classifier = TextClassifier::new(Vocabulary::embedded()?, config.clone());
        Ok(Self::new(
            KeywordScorer::embedded()?,
            PatternMatcher::embedded()?,
            classifier,
            config,
        ))
    }

    /// Tables from the configured paths, embedded tables otherwise.
    ///
    /// A table that is configured but fails to load is an error. A model that
    /// fails to load only disables the statistical step.
    pub fn from_config(config: &RemediaConfig) -> RemediaResult<Self> {
        let tables = &config.tables;

        let keywords = match &tables.keywords {
            Some(path) => KeywordScorer::from_file(path)?,
            None => KeywordScorer::embedded()?,
        };
        let patterns = match &tables.patterns {
            Some(path) => PatternMatcher::from_file(path)?,
            None => PatternMatcher::embedded()?,
        };
        let vocabulary = match &tables.vocabulary {
            Some(path) => Vocabulary::from_file(path)?,
            None => Vocabulary::embedded()?,
        };

        let mut classifier = TextClassifier::new(vocabulary, config.inference.clone());
        if let Some(path) = &tables.model {
            classifier = classifier.with_model_file(path);
        }

        Ok(Self::new(keywords, patterns, classifier, config.inference.clone()))
    }

    pub fn classifier(&self) -> &TextClassifier {
        &self.classifier
    }

    /// Walk the precedence steps and stop at the first that fires.
    pub fn resolve(&self, text: &str) -> Resolution {
        // ── Step 0: blank input ──────────────────────────────────────────────
        if text.trim().is_empty() {
            return Resolution::Empty;
        }

        // ── Step 1: named condition ──────────────────────────────────────────
        if let Some(direct) = self.classifier.direct_named(text) {
            return Resolution::NamedCondition(direct);
        }

        // ── Step 2: keyword scoring ──────────────────────────────────────────
        let scores = self.keywords.score(text);
        let ranked = scores.ranked();
        if let Some((top, rest)) = ranked.split_first() {
            debug!(scored = ranked.len(), top = %top.name, "keyword scores");
            return Resolution::Keyword {
                condition: top.name.clone(),
                score: top.score,
                alternates: rest.to_vec(),
            };
        }

        // ── Step 3: symptom term or fuzzy name ───────────────────────────────
        if let Some(found) = self
            .classifier
            .direct_symptom(text)
            .or_else(|| self.classifier.fuzzy(text))
        {
            return Resolution::Vocabulary(found);
        }

        // ── Step 4: context pattern ──────────────────────────────────────────
        let statistical = self.classifier.statistical(text);
        if let Some(pattern) = self.patterns.match_text(text) {
            let overridden = statistical
                .as_ref()
                .is_some_and(|s| s.confidence >= self.config.statistical_override_threshold);
            if !overridden {
                return Resolution::Pattern(pattern);
            }
            debug!(pattern = %pattern.pattern, "pattern overridden by confident classifier");
        }

        // ── Step 5: statistical model ────────────────────────────────────────
        if let Some(stat) = statistical {
            return Resolution::Statistical(stat);
        }

        // ── Step 6: nothing matched ──────────────────────────────────────────
        Resolution::General
    }

    fn to_result(&self, text: &str, resolution: Resolution) -> InferenceResult {
        match resolution {
            Resolution::Empty => InferenceResult::no_condition(text),
            Resolution::General => {
                InferenceResult::general_condition(text, self.config.general_condition_confidence)
            }
            Resolution::NamedCondition(c) | Resolution::Vocabulary(c) | Resolution::Statistical(c) => {
                InferenceResult {
                    query: text.to_string(),
                    confidence: c.confidence.clamp(0.0, 1.0),
                    source: c.source.into(),
                    alternates: without(c.alternates, &c.condition),
                    condition: c.condition,
                    pattern_detected: None,
                    follow_up_questions: Vec::new(),
                }
            }
            Resolution::Keyword {
                condition,
                score,
                alternates,
            } => {
                let confidence = (score / self.config.score_ceiling)
                    .min(self.config.max_keyword_confidence)
                    .clamp(0.0, 1.0);
                InferenceResult {
                    query: text.to_string(),
                    confidence,
                    source: InferenceSource::Keyword,
                    alternates: without(alternates, &condition),
                    condition,
                    pattern_detected: None,
                    follow_up_questions: Vec::new(),
                }
            }
            Resolution::Pattern(p) => {
                let alternates = p
                    .other_diseases
                    .iter()
                    .map(|d| ConditionCandidate::new(d.clone(), p.matched as f64, CandidateSource::Pattern))
                    .collect();
                InferenceResult {
                    query: text.to_string(),
                    confidence: p.confidence.clamp(0.0, 1.0),
                    source: InferenceSource::Pattern,
                    alternates: without(alternates, &p.top_disease),
                    condition: p.top_disease,
                    pattern_detected: Some(p.pattern),
                    follow_up_questions: p.follow_up_questions,
                }
            }
        }
    }
}

fn without(candidates: Vec<ConditionCandidate>, condition: &str) -> Vec<ConditionCandidate> {
    candidates
        .into_iter()
        .filter(|c| c.name != condition)
        .collect()
}

impl Inferencer for InferenceCoordinator {
    fn infer(&self, text: &str) -> InferenceResult {
        let result = self.to_result(text, self.resolve(text));
        info!(
            condition = %result.condition,
            confidence = result.confidence,
            source = %result.source,
            "condition inferred"
        );
        result
    }
}
