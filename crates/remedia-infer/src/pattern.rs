//! Context patterns: coarse symptom clusters used when nothing more specific
//! explains a vague complaint ("not feeling well after my trek").

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use remedia_contracts::{
    error::{RemediaError, RemediaResult},
    safety::Severity,
};

use crate::text::normalize;

const TABLE: &str = "patterns";

pub const DEFAULT_PATTERNS_TOML: &str = include_str!("../tables/patterns.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPattern {
    pub name: String,
    pub keywords: Vec<String>,
    /// Most likely first.
    pub diseases: Vec<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PatternTable {
    patterns: Vec<ContextPattern>,
}

/// The winning pattern for one input.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    pub pattern: String,
    /// Number of the pattern's keywords found in the input.
    pub matched: usize,
    pub top_disease: String,
    pub confidence: f64,
    pub other_diseases: Vec<String>,
    pub severity: Severity,
    pub follow_up_questions: Vec<String>,
}

impl PatternMatch {
    /// One-line question for the user, or `None` if the pattern has no
    /// follow-ups.
    pub fn clarification_prompt(&self) -> Option<String> {
        match self.follow_up_questions.as_slice() {
            [] => None,
            [only] => Some(format!("To narrow this down: do you also have {}?", only)),
            [init @ .., last] => Some(format!(
                "To narrow this down: do you also have {} or {}?",
                init.join(", "),
                last
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PatternMatcher {
    patterns: Vec<ContextPattern>,
    confidence: f64,
}

impl PatternMatcher {
    pub const DEFAULT_CONFIDENCE: f64 = 0.75;

    pub fn embedded() -> RemediaResult<Self> {
        Self::from_toml_str(DEFAULT_PATTERNS_TOML)
    }

    pub fn from_toml_str(s: &str) -> RemediaResult<Self> {
        let table: PatternTable = toml::from_str(s)
            .map_err(|e| RemediaError::table(TABLE, format!("failed to parse TOML: {}", e)))?;

        for pattern in &table.patterns {
            if pattern.keywords.is_empty() {
                return Err(RemediaError::table(
                    TABLE,
                    format!("pattern '{}' has no keywords", pattern.name),
                ));
            }
            if pattern.diseases.is_empty() {
                return Err(RemediaError::table(
                    TABLE,
                    format!("pattern '{}' names no diseases", pattern.name),
                ));
            }
        }

        debug!(patterns = table.patterns.len(), "pattern table loaded");
        Ok(Self {
            patterns: table.patterns,
            confidence: Self::DEFAULT_CONFIDENCE,
        })
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

    /// Confidence attached to every match.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn patterns(&self) -> &[ContextPattern] {
        &self.patterns
    }

    /// The pattern with the most keyword hits; the first declared wins ties.
    pub fn match_text(&self, text: &str) -> Option<PatternMatch> {
        let text = normalize(text);
        if text.is_empty() {
            return None;
        }

        let mut best: Option<(&ContextPattern, usize)> = None;
        for pattern in &self.patterns {
            let hits = pattern
                .keywords
                .iter()
                .filter(|kw| text.contains(kw.as_str()))
                .count();
            if hits == 0 {
                continue;
            }
            match best {
                Some((_, top)) if hits <= top => {}
                _ => best = Some((pattern, hits)),
            }
        }

        let (pattern, matched) = best?;
        let (top, rest) = pattern.diseases.split_first()?;

        debug!(pattern = %pattern.name, matched, "context pattern selected");
        Some(PatternMatch {
            pattern: pattern.name.clone(),
            matched,
            top_disease: top.clone(),
            confidence: self.confidence,
            other_diseases: rest.to_vec(),
            severity: pattern.severity,
            follow_up_questions: pattern.follow_up_questions.clone(),
        })
    }
}
