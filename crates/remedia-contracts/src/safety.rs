//! Safety gate findings.
//!
//! A `SafetyReport` is produced for every inference result before any
//! recommendation is shown. An emergency report blocks recommendations
//! entirely; every other finding is advisory and travels with the output.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{RemediaError, RemediaResult};

/// Standard disclaimer attached to every report and recommendation set.
pub const DISCLAIMER: &str = "This is an informational tool only. It does not diagnose or treat \
any condition. Always consult a qualified healthcare professional, remember that herbal remedies \
can interact with medications, and seek medical care promptly if symptoms persist or worsen.";

/// Ordered severity of an interaction or allergy finding.
///
/// Table data is loosely typed, so parsing is case-insensitive and falls back
/// to `Moderate` for anything unrecognised.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum Severity {
    Low,
    #[default]
    Moderate,
    High,
    Critical,
}

impl Severity {
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOW" | "MINOR" | "MILD" => Self::Low,
            "HIGH" | "SEVERE" | "MAJOR" => Self::High,
            "CRITICAL" | "CONTRAINDICATED" => Self::Critical,
            _ => Self::Moderate,
        }
    }
}

impl From<String> for Severity {
    fn from(raw: String) -> Self {
        Self::parse_lenient(&raw)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

/// A known interaction between two candidate drugs.
///
/// `drug_a` and `drug_b` carry the names as the recommender produced them,
/// in the order they were checked.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub drug_a: String,
    pub drug_b: String,
    pub severity: Severity,
    pub effect: String,
    pub recommendation: String,
}

/// A candidate drug that matches one of the user's declared allergens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AllergyRecord {
    pub drug: String,
    pub allergen: String,
    pub severity: Severity,
    /// True when the match came from the allergen's known cross-reactions
    /// rather than the allergen name itself.
    #[serde(default)]
    pub cross_reaction: bool,
}

impl AllergyRecord {
    /// Human-readable alert line.
    pub fn warning(&self) -> String {
        if self.cross_reaction {
            format!(
                "ALLERGY ALERT: {} may cross-react with your {} allergy ({})",
                self.drug, self.allergen, self.severity
            )
        } else {
            format!(
                "ALLERGY ALERT: {} may contain {} ({})",
                self.drug, self.allergen, self.severity
            )
        }
    }
}

/// Everything the safety gate found for one inference result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub is_emergency: bool,
    pub emergency_message: Option<String>,
    pub low_confidence_warning: Option<String>,
    pub drug_interactions: BTreeSet<InteractionRecord>,
    pub allergy_warnings: BTreeSet<AllergyRecord>,
    /// `false` exactly when `is_emergency` is set.
    pub proceed: bool,
    pub disclaimer: String,
}

impl SafetyReport {
    /// A report with no findings that lets recommendations proceed.
    pub fn cleared() -> Self {
        Self {
            is_emergency: false,
            emergency_message: None,
            low_confidence_warning: None,
            drug_interactions: BTreeSet::new(),
            allergy_warnings: BTreeSet::new(),
            proceed: true,
            disclaimer: DISCLAIMER.to_string(),
        }
    }

    /// A blocking report. No drug checks accompany an emergency.
    pub fn emergency(message: impl Into<String>) -> Self {
        Self {
            is_emergency: true,
            emergency_message: Some(message.into()),
            proceed: false,
            ..Self::cleared()
        }
    }

    /// True if any advisory finding is present.
    pub fn has_warnings(&self) -> bool {
        self.low_confidence_warning.is_some()
            || !self.drug_interactions.is_empty()
            || !self.allergy_warnings.is_empty()
    }

    /// The most severe interaction or allergy finding, if any.
    pub fn highest_severity(&self) -> Option<Severity> {
        self.drug_interactions
            .iter()
            .map(|i| i.severity)
            .chain(self.allergy_warnings.iter().map(|a| a.severity))
            .max()
    }

    pub fn validate(&self) -> RemediaResult<()> {
        if self.proceed == self.is_emergency {
            return Err(RemediaError::InvariantViolation {
                reason: format!(
                    "proceed={} contradicts is_emergency={}",
                    self.proceed, self.is_emergency
                ),
            });
        }
        if self.is_emergency
            && (!self.drug_interactions.is_empty() || !self.allergy_warnings.is_empty())
        {
            return Err(RemediaError::InvariantViolation {
                reason: "emergency report carries drug findings".to_string(),
            });
        }
        Ok(())
    }
}
