//! Weighted keyword scoring over an ordered list of condition families.
//!
//! Each `KeywordFamily` maps one condition to weighted trigger phrases plus a
//! small set of declarative rules (boosts, gates, suppression, renaming, a
//! companion cluster). Families are scored in declaration order so that
//! suppression and tie-breaking are deterministic.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use remedia_contracts::{
    error::{RemediaError, RemediaResult},
    inference::{CandidateSource, ConditionCandidate},
};

use crate::text::{contains_any, normalize};

const TABLE: &str = "keywords";

/// The family table compiled into the crate.
pub const DEFAULT_KEYWORDS_TOML: &str = include_str!("../tables/keywords.toml");

/// Clinical area a family belongs to. Informational; scoring ignores it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionGroup {
    Reproductive,
    Respiratory,
    Infectious,
    Gastrointestinal,
    Musculoskeletal,
    MentalHealth,
    Neurological,
    Cardiac,
    Metabolic,
    Urinary,
    #[default]
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTerm {
    pub term: String,
    pub weight: f64,
}

/// Multiply the score when at least `min_matches` distinct terms matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiSymptomBoost {
    pub min_matches: usize,
    pub factor: f64,
}

/// Multiply the score when a term from `first` and a term from `second`
/// are both present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoOccurrenceBoost {
    pub first: Vec<String>,
    pub second: Vec<String>,
    pub factor: f64,
}

/// Holds when a term from `first` and a term from `second` are both present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoOccurrence {
    pub first: Vec<String>,
    pub second: Vec<String>,
}

impl CoOccurrence {
    fn holds(&self, text: &str) -> bool {
        contains_any(text, &self.first) && contains_any(text, &self.second)
    }
}

/// Report the family under `condition` when any of `any` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameRule {
    pub any: Vec<String>,
    pub condition: String,
}

/// A secondary cluster scored alongside a family.
///
/// The family keeps its own name only when its score is strictly greater
/// than the companion's; otherwise the combined score is reported under the
/// companion's condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Companion {
    pub condition: String,
    pub keywords: Vec<WeightedTerm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordFamily {
    pub condition: String,
    #[serde(default)]
    pub group: ConditionGroup,
    pub keywords: Vec<WeightedTerm>,
    /// The family is skipped unless one of these is present.
    #[serde(default)]
    pub requires_any: Vec<String>,
    /// The family is skipped when any of these conditions already scored.
    #[serde(default)]
    pub suppressed_by: Vec<String>,
    /// The family is skipped when both term sets of this rule are present.
    #[serde(default)]
    pub suppressed_when: Option<CoOccurrence>,
    #[serde(default)]
    pub multi_symptom_boost: Option<MultiSymptomBoost>,
    #[serde(default)]
    pub co_occurrence_boost: Option<CoOccurrenceBoost>,
    #[serde(default)]
    pub rename_when: Option<RenameRule>,
    #[serde(default)]
    pub companion: Option<Companion>,
}

impl KeywordFamily {
    /// Every condition name this family can report.
    fn reported_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.condition.as_str())
            .chain(self.rename_when.iter().map(|r| r.condition.as_str()))
            .chain(self.companion.iter().map(|c| c.condition.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeywordTable {
    families: Vec<KeywordFamily>,
}

/// How one family arrived at its score.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyScore {
    /// The condition actually reported (after renaming or companion).
    pub condition: String,
    /// The family's declared condition.
    pub family: String,
    pub score: f64,
    pub matched: Vec<String>,
    /// Boost factors applied, in order.
    pub multipliers: Vec<f64>,
}

/// Nonzero condition scores in family declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionScores(Vec<(String, f64)>);

impl ConditionScores {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, condition: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(name, _)| name == condition)
            .map(|(_, score)| *score)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, score)| (name.as_str(), *score))
    }

    /// Highest score; the earliest-declared condition wins ties.
    pub fn best(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (name, score) in self.iter() {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((name, score)),
            }
        }
        best
    }

    /// All scores as keyword candidates, descending, ties in declaration order.
    pub fn ranked(&self) -> Vec<ConditionCandidate> {
        let mut ranked: Vec<ConditionCandidate> = self
            .iter()
            .map(|(name, score)| ConditionCandidate::new(name, score, CandidateSource::Keyword))
            .collect();
        // Stable sort keeps declaration order among equal scores.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}

/// Scores free text against the family table.
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    families: Vec<KeywordFamily>,
}

impl KeywordScorer {
    /// Build from the table compiled into the crate.
    pub fn embedded() -> RemediaResult<Self> {
        Self::from_toml_str(DEFAULT_KEYWORDS_TOML)
    }

    /// Parse and validate a family table.
    ///
    /// Returns `RemediaError::TableLoad` for malformed TOML, non-positive
    /// weights or factors, duplicate conditions, and `suppressed_by`
    /// entries that do not name an earlier family.
    pub fn from_toml_str(s: &str) -> RemediaResult<Self> {
        let table: KeywordTable = toml::from_str(s)
            .map_err(|e| RemediaError::table(TABLE, format!("failed to parse TOML: {}", e)))?;
        validate_families(&table.families)?;
        debug!(families = table.families.len(), "keyword table loaded");
        Ok(Self {
            families: table.families,
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

    pub fn families(&self) -> &[KeywordFamily] {
        &self.families
    }

    /// Condition name to accumulated score, zero scores omitted.
    pub fn score(&self, text: &str) -> ConditionScores {
        let mut scores: Vec<(String, f64)> = Vec::new();
        for entry in self.score_breakdown(text) {
            scores.push((entry.condition, entry.score));
        }
        ConditionScores(scores)
    }

    /// Per-family detail for every family that produced a nonzero score.
    pub fn score_breakdown(&self, text: &str) -> Vec<FamilyScore> {
        let text = normalize(text);
        if text.is_empty() {
            return Vec::new();
        }

        let mut reported: Vec<FamilyScore> = Vec::new();

        for family in &self.families {
            if !family.requires_any.is_empty() && !contains_any(&text, &family.requires_any) {
                continue;
            }

            let suppressed = family
                .suppressed_by
                .iter()
                .any(|c| reported.iter().any(|r| &r.condition == c));
            if suppressed {
                debug!(family = %family.condition, "family suppressed by a more specific match");
                continue;
            }

            if family.suppressed_when.as_ref().is_some_and(|rule| rule.holds(&text)) {
                debug!(family = %family.condition, "family suppressed by co-occurring terms");
                continue;
            }

            let (mut score, mut matched) = sum_matches(&text, &family.keywords);
            let mut multipliers = Vec::new();

            if let Some(boost) = &family.multi_symptom_boost {
                if matched.len() >= boost.min_matches {
                    score *= boost.factor;
                    multipliers.push(boost.factor);
                }
            }

            if let Some(boost) = &family.co_occurrence_boost {
                if contains_any(&text, &boost.first) && contains_any(&text, &boost.second) {
                    score *= boost.factor;
                    multipliers.push(boost.factor);
                }
            }

            let mut condition = family.condition.clone();

            if let Some(companion) = &family.companion {
                let (companion_score, companion_matched) = sum_matches(&text, &companion.keywords);
                if score + companion_score <= 0.0 {
                    continue;
                }
                if score <= companion_score {
                    condition = companion.condition.clone();
                    score += companion_score;
                    matched.extend(companion_matched);
                }
            } else if score <= 0.0 {
                continue;
            }

            if let Some(rename) = &family.rename_when {
                if contains_any(&text, &rename.any) {
                    condition = rename.condition.clone();
                }
            }

            let entry = FamilyScore {
                condition,
                family: family.condition.clone(),
                score,
                matched,
                multipliers,
            };

            // A later family reporting the same name replaces the earlier score.
            match reported.iter_mut().find(|r| r.condition == entry.condition) {
                Some(existing) => *existing = entry,
                None => reported.push(entry),
            }
        }

        reported
    }
}

fn sum_matches(text: &str, keywords: &[WeightedTerm]) -> (f64, Vec<String>) {
    let mut score = 0.0;
    let mut matched = Vec::new();
    for kw in keywords {
        if text.contains(kw.term.as_str()) {
            score += kw.weight;
            matched.push(kw.term.clone());
        }
    }
    (score, matched)
}

fn validate_families(families: &[KeywordFamily]) -> RemediaResult<()> {
    if families.is_empty() {
        warn!("keyword table has no families; keyword scoring will never match");
    }

    let mut seen: Vec<&str> = Vec::new();

    for family in families {
        if family.condition.trim().is_empty() {
            return Err(RemediaError::table(TABLE, "family with empty condition name"));
        }
        if seen.contains(&family.condition.as_str()) {
            return Err(RemediaError::table(
                TABLE,
                format!("duplicate family '{}'", family.condition),
            ));
        }

        let companion_terms = family.companion.iter().flat_map(|c| c.keywords.iter());
        for kw in family.keywords.iter().chain(companion_terms) {
            if !(kw.weight.is_finite() && kw.weight > 0.0) {
                return Err(RemediaError::table(
                    TABLE,
                    format!(
                        "family '{}': term '{}' has non-positive weight {}",
                        family.condition, kw.term, kw.weight
                    ),
                ));
            }
        }

        let factors = family
            .multi_symptom_boost
            .iter()
            .map(|b| b.factor)
            .chain(family.co_occurrence_boost.iter().map(|b| b.factor));
        for factor in factors {
            if !(factor.is_finite() && factor > 0.0) {
                return Err(RemediaError::table(
                    TABLE,
                    format!("family '{}': invalid boost factor {}", family.condition, factor),
                ));
            }
        }

        if let Some(rule) = &family.suppressed_when {
            if rule.first.is_empty() || rule.second.is_empty() {
                return Err(RemediaError::table(
                    TABLE,
                    format!(
                        "family '{}': suppressed_when needs terms in both lists",
                        family.condition
                    ),
                ));
            }
        }

        for suppressor in &family.suppressed_by {
            if !seen.contains(&suppressor.as_str()) {
                return Err(RemediaError::table(
                    TABLE,
                    format!(
                        "family '{}' is suppressed by '{}', which is not declared above it",
                        family.condition, suppressor
                    ),
                ));
            }
        }

        seen.extend(family.reported_names());
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
