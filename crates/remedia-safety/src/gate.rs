//! The safety gate every inference result passes through.
//!
//! Check order is fixed:
//!
//! 1. emergency scan of the raw query (short-circuits everything else)
//! 2. low-confidence advisory
//! 3. drug-drug interactions among the candidate drugs
//! 4. candidate drugs against the user's declared allergens
//!
//! Only the emergency scan blocks. Everything else is advisory and travels
//! with the report.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use remedia_contracts::{
    config::{RemediaConfig, SafetyConfig},
    inference::InferenceResult,
    safety::{AllergyRecord, InteractionRecord, SafetyReport, Severity},
};
use remedia_core::traits::SafetyScreen;

use crate::emergency::{self, EMERGENCY_MESSAGE};
use crate::tables::{AllergyTable, InteractionTable};

pub struct SafetyGate {
    interactions: Option<InteractionTable>,
    allergies: Option<AllergyTable>,
    config: SafetyConfig,
}

impl SafetyGate {
    /// A gate with no reference tables. Interaction checks find nothing and
    /// allergy checks fall back to name matching at `Moderate` severity.
    pub fn new(config: SafetyConfig) -> Self {
        Self {
            interactions: None,
            allergies: None,
            config,
        }
    }

    pub fn with_interactions(mut self, table: InteractionTable) -> Self {
        self.interactions = Some(table);
        self
    }

    pub fn with_allergies(mut self, table: AllergyTable) -> Self {
        self.allergies = Some(table);
        self
    }

    /// A gate with the compiled-in tables.
    pub fn embedded(config: SafetyConfig) -> Self {
        let mut gate = Self::new(config);
        match InteractionTable::embedded() {
            Ok(table) => gate = gate.with_interactions(table),
            Err(e) => warn!(error = %e, "embedded interaction table unusable"),
        }
        match AllergyTable::embedded() {
            Ok(table) => gate = gate.with_allergies(table),
            Err(e) => warn!(error = %e, "embedded allergy table unusable"),
        }
        gate
    }

    /// Tables from the configured paths, embedded tables otherwise. A table
    /// that fails to load disables its check with a warning.
    pub fn from_config(config: &RemediaConfig) -> Self {
        let interactions = match &config.tables.interactions {
            Some(path) => InteractionTable::from_file(path),
            None => InteractionTable::embedded(),
        };
        let allergies = match &config.tables.allergies {
            Some(path) => AllergyTable::from_file(path),
            None => AllergyTable::embedded(),
        };

        let mut gate = Self::new(config.safety.clone());
        match interactions {
            Ok(table) => gate = gate.with_interactions(table),
            Err(e) => warn!(error = %e, "interaction check disabled"),
        }
        match allergies {
            Ok(table) => gate = gate.with_allergies(table),
            Err(e) => warn!(error = %e, "allergy severities and cross-reactions disabled"),
        }
        gate
    }

    fn low_confidence_warning(&self, confidence: f64) -> Option<String> {
        if confidence >= self.config.low_confidence_threshold {
            return None;
        }
        let pct = (confidence * 100.0) as u32;
        Some(format!(
            "Low confidence ({}%): the symptoms do not clearly match a known condition, \
             the description may be too vague, or the condition may be rare. Please consult \
             a healthcare professional and do not rely on this result alone.",
            pct
        ))
    }

    fn interactions_among(&self, drugs: &[String]) -> BTreeSet<InteractionRecord> {
        let mut found = BTreeSet::new();
        if drugs.len() < 2 {
            return found;
        }
        let Some(table) = &self.interactions else {
            warn!(drugs = drugs.len(), "interaction table unavailable, pairs not checked");
            return found;
        };

        for (i, a) in drugs.iter().enumerate() {
            for b in &drugs[i + 1..] {
                if a.trim().eq_ignore_ascii_case(b.trim()) {
                    continue;
                }
                if let Some(entry) = table.lookup(a, b) {
                    found.insert(InteractionRecord {
                        drug_a: a.clone(),
                        drug_b: b.clone(),
                        severity: entry.severity,
                        effect: entry.effect.clone(),
                        recommendation: entry.recommendation.clone(),
                    });
                }
            }
        }
        found
    }

    fn allergy_matches(
        &self,
        drugs: &[String],
        allergens: &BTreeSet<String>,
    ) -> BTreeSet<AllergyRecord> {
        let mut found = BTreeSet::new();
        if self.allergies.is_none() && !allergens.is_empty() && !drugs.is_empty() {
            warn!("allergy table unavailable, matching by name only");
        }

        for drug in drugs {
            let drug_lower = drug.trim().to_lowercase();
            if drug_lower.is_empty() {
                continue;
            }

            for allergen in allergens {
                let allergen_lower = allergen.trim().to_lowercase();
                if allergen_lower.is_empty() {
                    continue;
                }
                let entry = self.allergies.as_ref().and_then(|t| t.get(&allergen_lower));

                if overlaps(&drug_lower, &allergen_lower) {
                    found.insert(AllergyRecord {
                        drug: drug.clone(),
                        allergen: allergen.clone(),
                        severity: entry.map(|e| e.severity).unwrap_or(Severity::Moderate),
                        cross_reaction: false,
                    });
                    continue;
                }

                let Some(entry) = entry else { continue };
                if entry
                    .cross_reactions
                    .iter()
                    .any(|cross| overlaps(&drug_lower, cross))
                {
                    found.insert(AllergyRecord {
                        drug: drug.clone(),
                        allergen: allergen.clone(),
                        severity: entry.severity,
                        cross_reaction: true,
                    });
                }
            }
        }
        found
    }
}

/// Either name contains the other.
fn overlaps(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

impl SafetyScreen for SafetyGate {
    fn check_safety(
        &self,
        result: &InferenceResult,
        candidate_drugs: &[String],
        user_allergens: Option<&BTreeSet<String>>,
    ) -> SafetyReport {
        // ── Check 1: emergency ───────────────────────────────────────────────
        if let Some(phrase) = emergency::scan(&result.query) {
            warn!(phrase, "emergency phrase detected");
            return SafetyReport::emergency(EMERGENCY_MESSAGE);
        }

        let mut report = SafetyReport::cleared();

        // ── Check 2: confidence advisory ─────────────────────────────────────
        report.low_confidence_warning = self.low_confidence_warning(result.confidence);

        // ── Check 3: drug interactions ───────────────────────────────────────
        report.drug_interactions = self.interactions_among(candidate_drugs);

        // ── Check 4: allergies ───────────────────────────────────────────────
        if let Some(allergens) = user_allergens {
            report.allergy_warnings = self.allergy_matches(candidate_drugs, allergens);
        }

        debug!(
            condition = %result.condition,
            low_confidence = report.low_confidence_warning.is_some(),
            interactions = report.drug_interactions.len(),
            allergies = report.allergy_warnings.len(),
            "safety check complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use remedia_contracts::{
        config::{RemediaConfig, SafetyConfig},
        inference::{InferenceResult, InferenceSource},
        safety::{SafetyReport, Severity, DISCLAIMER},
    };
    use remedia_core::traits::SafetyScreen;

    use super::SafetyGate;
    use crate::tables::InteractionTable;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn gate() -> SafetyGate {
        SafetyGate::embedded(SafetyConfig::default())
    }

    fn result(query: &str, condition: &str, confidence: f64) -> InferenceResult {
        InferenceResult {
            query: query.to_string(),
            condition: condition.to_string(),
            confidence,
            source: InferenceSource::Keyword,
            alternates: Vec::new(),
            pattern_detected: None,
            follow_up_questions: Vec::new(),
        }
    }

    fn drugs(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn allergens(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    // ── Emergency ─────────────────────────────────────────────────────────────

    /// An emergency suppresses every drug check, even with known
    /// interactions and a matching allergy present.
    #[test]
    fn test_emergency_short_circuits() {
        let r = result("severe chest pain and sweating", "Hypertension / Cardiac Stress", 0.3);
        let report = gate().check_safety(
            &r,
            &drugs(&["Aspirin", "Warfarin"]),
            Some(&allergens(&["aspirin"])),
        );
        assert!(report.is_emergency);
        assert!(!report.proceed);
        assert!(report.emergency_message.as_deref().unwrap().contains("911"));
        assert!(report.drug_interactions.is_empty());
        assert!(report.allergy_warnings.is_empty());
        assert!(report.low_confidence_warning.is_none());
        assert_eq!(report.disclaimer, DISCLAIMER);
        report.validate().unwrap();
    }

    #[test]
    fn test_emergency_ignores_inferred_condition() {
        let r = result("i want to kill myself", "Depression", 0.95);
        assert!(gate().check_safety(&r, &[], None).is_emergency);
    }

    // ── Confidence ────────────────────────────────────────────────────────────

    #[test]
    fn test_low_confidence_warning() {
        let report = gate().check_safety(&result("fever", "Influenza / Viral Fever", 0.15), &[], None);
        assert!(report.proceed);
        let warning = report.low_confidence_warning.unwrap();
        assert!(warning.contains("(15%)"), "got: {warning}");
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let g = gate();
        assert!(g
            .check_safety(&result("x", "Y", 0.45), &[], None)
            .low_confidence_warning
            .is_none());
        assert!(g
            .check_safety(&result("x", "Y", 0.449), &[], None)
            .low_confidence_warning
            .is_some());
    }

    // ── Interactions ──────────────────────────────────────────────────────────

    #[test]
    fn test_interactions_among_candidates() {
        let report = gate().check_safety(
            &result("fever and body ache", "Fever", 0.8),
            &drugs(&["Paracetamol", "Ibuprofen", "Aspirin", "Nimesulide"]),
            None,
        );
        let pairs: Vec<(&str, &str, Severity)> = report
            .drug_interactions
            .iter()
            .map(|i| (i.drug_a.as_str(), i.drug_b.as_str(), i.severity))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Aspirin", "Nimesulide", Severity::High),
                ("Ibuprofen", "Aspirin", Severity::High),
                ("Ibuprofen", "Nimesulide", Severity::High),
            ]
        );
        assert_eq!(report.highest_severity(), Some(Severity::High));
    }

    #[test]
    fn test_single_drug_has_no_pairs() {
        let report = gate().check_safety(&result("x", "Y", 0.9), &drugs(&["Aspirin"]), None);
        assert!(report.drug_interactions.is_empty());
    }

    #[test]
    fn test_missing_interaction_table_degrades() {
        let report = SafetyGate::new(SafetyConfig::default()).check_safety(
            &result("x", "Y", 0.9),
            &drugs(&["Aspirin", "Warfarin"]),
            None,
        );
        assert!(report.proceed);
        assert!(report.drug_interactions.is_empty());
    }

    #[test]
    fn test_custom_interaction_table() {
        let table = InteractionTable::from_toml_str(
            "[[interactions]]\ndrug_a = \"Tulsi Drops\"\ndrug_b = \"Cetirizine\"\nseverity = \"LOW\"",
        )
        .unwrap();
        let g = SafetyGate::new(SafetyConfig::default()).with_interactions(table);
        let report = g.check_safety(
            &result("x", "Y", 0.9),
            &drugs(&["cetirizine", "TULSI DROPS"]),
            None,
        );
        assert_eq!(report.drug_interactions.len(), 1);
    }

    // ── Allergies ─────────────────────────────────────────────────────────────

    #[test]
    fn test_allergy_name_containment_both_ways() {
        let report = gate().check_safety(
            &result("fever", "Fever", 0.8),
            &drugs(&["Aspirin", "Paracetamol"]),
            Some(&allergens(&["Aspirin 75", "paracetamol"])),
        );
        let hits: Vec<(&str, &str, bool)> = report
            .allergy_warnings
            .iter()
            .map(|a| (a.drug.as_str(), a.allergen.as_str(), a.cross_reaction))
            .collect();
        assert_eq!(
            hits,
            vec![("Aspirin", "Aspirin 75", false), ("Paracetamol", "paracetamol", false)]
        );
    }

    #[test]
    fn test_allergy_severity_from_table_or_moderate() {
        let report = gate().check_safety(
            &result("x", "Y", 0.8),
            &drugs(&["Aspirin", "Chlorpheniramine"]),
            Some(&allergens(&["aspirin", "chlorpheniramine"])),
        );
        let by_drug = |name: &str| {
            report
                .allergy_warnings
                .iter()
                .find(|a| a.drug == name)
                .map(|a| a.severity)
        };
        assert_eq!(by_drug("Aspirin"), Some(Severity::High));
        assert_eq!(by_drug("Chlorpheniramine"), Some(Severity::Moderate));
    }

    #[test]
    fn test_cross_reaction_flagged() {
        let report = gate().check_safety(
            &result("cough with phlegm", "Bronchitis", 0.8),
            &drugs(&["Amoxicillin", "Cough Syrup (Guaifenesin)"]),
            Some(&allergens(&["penicillin"])),
        );
        assert_eq!(report.allergy_warnings.len(), 1);
        let record = report.allergy_warnings.iter().next().unwrap();
        assert_eq!(record.drug, "Amoxicillin");
        assert!(record.cross_reaction);
        assert_eq!(record.severity, Severity::High);
        assert!(record.warning().contains("cross-react"));
    }

    #[test]
    fn test_no_cross_reactions_without_table() {
        let report = SafetyGate::new(SafetyConfig::default()).check_safety(
            &result("x", "Y", 0.8),
            &drugs(&["Amoxicillin"]),
            Some(&allergens(&["penicillin"])),
        );
        assert!(report.allergy_warnings.is_empty());
    }

    #[test]
    fn test_blank_allergen_matches_nothing() {
        let report = gate().check_safety(
            &result("x", "Y", 0.8),
            &drugs(&["Aspirin"]),
            Some(&allergens(&["  "])),
        );
        assert!(report.allergy_warnings.is_empty());
    }

    // ── Construction ──────────────────────────────────────────────────────────

    #[test]
    fn test_unreadable_configured_tables_degrade() {
        let mut config = RemediaConfig::default();
        config.tables.interactions = Some("/nonexistent/interactions.toml".into());
        let g = SafetyGate::from_config(&config);
        let report = g.check_safety(
            &result("x", "Y", 0.9),
            &drugs(&["Aspirin", "Warfarin"]),
            Some(&allergens(&["penicillin"])),
        );
        assert!(report.drug_interactions.is_empty());
        report.validate().unwrap();
    }

    #[test]
    fn test_every_report_carries_disclaimer() {
        let report = gate().check_safety(&result("x", "Y", 0.9), &[], None);
        assert_eq!(report.disclaimer, DISCLAIMER);
        assert_eq!(report, SafetyReport::cleared());
        assert!(!report.has_warnings());
    }
}
