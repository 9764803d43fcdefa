//! Ranks herb and drug suggestions and folds in the safety findings.

use tracing::{debug, warn};

use remedia_contracts::{
    config::{RecommendConfig, RemediaConfig},
    error::RemediaResult,
    inference::InferenceResult,
    recommend::{
        DrugEntry, HerbEntry, Recommendation, RecommendationKind, RecommendationSet,
        MISSING_FIELD, UNKNOWN_FIELD,
    },
    safety::SafetyReport,
};
use remedia_core::traits::{DrugSource, HerbSource, Recommender};

use crate::availability::{availability_rank, availability_score};
use crate::catalog::{TomlDrugCatalog, TomlHerbCatalog};

pub struct RecommendationAggregator {
    herbs: Box<dyn HerbSource>,
    drugs: Box<dyn DrugSource>,
    config: RecommendConfig,
}

impl RecommendationAggregator {
    pub fn new(
        herbs: Box<dyn HerbSource>,
        drugs: Box<dyn DrugSource>,
        config: RecommendConfig,
    ) -> Self {
        Self {
            herbs,
            drugs,
            config,
        }
    }

    pub fn embedded(config: RecommendConfig) -> RemediaResult<Self> {
        Ok(Self::new(
            Box::new(TomlHerbCatalog::embedded()?),
            Box::new(TomlDrugCatalog::embedded()?),
            config,
        ))
    }

    /// Catalogs from the configured paths, embedded catalogs otherwise.
    pub fn from_config(config: &RemediaConfig) -> RemediaResult<Self> {
        let herbs = match &config.tables.herbs {
            Some(path) => TomlHerbCatalog::from_file(path)?,
            None => TomlHerbCatalog::embedded()?,
        };
        let drugs = match &config.tables.drugs {
            Some(path) => TomlDrugCatalog::from_file(path)?,
            None => TomlDrugCatalog::embedded()?,
        };
        Ok(Self::new(
            Box::new(herbs),
            Box::new(drugs),
            config.recommend.clone(),
        ))
    }

    /// Blank queries get no suggestions at all.
    fn has_subject(result: &InferenceResult) -> bool {
        result.condition != InferenceResult::NO_CONDITION
    }

    /// Relevance descending; equal relevance keeps source order.
    fn ranked_herbs(&self, condition: &str) -> Vec<HerbEntry> {
        let mut herbs = self.herbs.herbs_for(condition);
        herbs.retain(|h| {
            let valid = h.relevance.is_finite();
            if !valid {
                warn!(herb = %h.name, "herb with non-finite relevance dropped");
            }
            valid
        });
        herbs.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        herbs.truncate(self.config.top_n);
        herbs
    }

    /// Most available first; unknown availability last; stable.
    fn ranked_drugs(&self, condition: &str) -> Vec<DrugEntry> {
        let mut drugs = self.drugs.drugs_for(condition);
        drugs.sort_by_key(|d| availability_rank(d.availability.as_deref()));
        drugs.truncate(self.config.top_n);
        drugs
    }
}

fn text_or(value: &Option<String>, placeholder: &str) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => placeholder.to_string(),
    }
}

fn herb_recommendation(herb: HerbEntry) -> Recommendation {
    let metadata = [
        ("benefits", text_or(&herb.benefits, MISSING_FIELD)),
        ("active_compounds", text_or(&herb.active_compounds, MISSING_FIELD)),
        ("usage", text_or(&herb.usage, MISSING_FIELD)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    Recommendation {
        kind: RecommendationKind::Herbal,
        name: herb.name,
        rank_score: herb.relevance.clamp(0.0, 1.0),
        metadata,
    }
}

fn drug_recommendation(drug: DrugEntry) -> Recommendation {
    let brands = drug
        .brand_names
        .iter()
        .map(|b| b.trim())
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let brands = if brands.is_empty() {
        MISSING_FIELD.to_string()
    } else {
        brands
    };

    let metadata = [
        ("brand_names", brands),
        ("type", text_or(&drug.drug_type, UNKNOWN_FIELD)),
        ("dosage", text_or(&drug.dosage, MISSING_FIELD)),
        ("purpose", text_or(&drug.purpose, MISSING_FIELD)),
        ("availability", text_or(&drug.availability, UNKNOWN_FIELD)),
        ("price_range", text_or(&drug.price_range, MISSING_FIELD)),
        ("side_effects", text_or(&drug.side_effects, MISSING_FIELD)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    Recommendation {
        kind: RecommendationKind::Pharmaceutical,
        rank_score: availability_score(drug.availability.as_deref()),
        name: drug.name,
        metadata,
    }
}

impl Recommender for RecommendationAggregator {
    fn candidate_drugs(&self, result: &InferenceResult) -> Vec<String> {
        if !Self::has_subject(result) {
            return Vec::new();
        }
        self.ranked_drugs(&result.condition)
            .into_iter()
            .map(|d| d.name)
            .collect()
    }

    fn recommend(&self, result: &InferenceResult, safety: &SafetyReport) -> RecommendationSet {
        let mut set = RecommendationSet::from_safety(&result.condition, result.confidence, safety);

        if safety.is_emergency {
            debug!(condition = %result.condition, "emergency: no recommendations");
            return set;
        }
        if !Self::has_subject(result) {
            return set;
        }

        set.herbal = self
            .ranked_herbs(&result.condition)
            .into_iter()
            .map(herb_recommendation)
            .collect();
        set.pharmaceutical = self
            .ranked_drugs(&result.condition)
            .into_iter()
            .map(drug_recommendation)
            .collect();

        debug!(
            condition = %result.condition,
            herbal = set.herbal.len(),
            pharmaceutical = set.pharmaceutical.len(),
            "recommendations ranked"
        );
        set
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use remedia_contracts::{
        config::RecommendConfig,
        inference::{InferenceResult, InferenceSource},
        recommend::{DrugEntry, HerbEntry, RecommendationKind, MISSING_FIELD, UNKNOWN_FIELD},
        safety::{AllergyRecord, SafetyReport, Severity},
    };
    use remedia_core::traits::{DrugSource, HerbSource, Recommender};

    use super::RecommendationAggregator;

    // ── Mock sources ──────────────────────────────────────────────────────────

    struct FixedHerbs(Vec<(&'static str, f64)>);

    impl HerbSource for FixedHerbs {
        fn herbs_for(&self, _condition: &str) -> Vec<HerbEntry> {
            self.0
                .iter()
                .map(|(name, relevance)| HerbEntry {
                    name: name.to_string(),
                    relevance: *relevance,
                    benefits: None,
                    active_compounds: Some("Curcumin".to_string()),
                    usage: Some("  ".to_string()),
                })
                .collect()
        }
    }

    struct FixedDrugs(Vec<(&'static str, Option<&'static str>)>);

    impl DrugSource for FixedDrugs {
        fn drugs_for(&self, _condition: &str) -> Vec<DrugEntry> {
            self.0
                .iter()
                .map(|(name, availability)| DrugEntry {
                    name: name.to_string(),
                    brand_names: Vec::new(),
                    drug_type: None,
                    dosage: Some("500 mg".to_string()),
                    purpose: None,
                    availability: availability.map(str::to_string),
                    price_range: None,
                    side_effects: None,
                })
                .collect()
        }
    }

    fn aggregator(
        herbs: Vec<(&'static str, f64)>,
        drugs: Vec<(&'static str, Option<&'static str>)>,
    ) -> RecommendationAggregator {
        RecommendationAggregator::new(
            Box::new(FixedHerbs(herbs)),
            Box::new(FixedDrugs(drugs)),
            RecommendConfig::default(),
        )
    }

    fn result(condition: &str) -> InferenceResult {
        InferenceResult {
            query: "query".to_string(),
            condition: condition.to_string(),
            confidence: 0.8,
            source: InferenceSource::Keyword,
            alternates: Vec::new(),
            pattern_detected: None,
            follow_up_questions: Vec::new(),
        }
    }

    // ── Ranking ───────────────────────────────────────────────────────────────

    #[test]
    fn test_herbs_ranked_by_relevance_stable() {
        let agg = aggregator(
            vec![("A", 0.5), ("B", 0.9), ("C", 0.5), ("D", 0.7)],
            vec![],
        );
        let set = agg.recommend(&result("X"), &SafetyReport::cleared());
        let names: Vec<&str> = set.herbal.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "D", "A", "C"]);
        assert!(set.herbal.iter().all(|r| r.kind == RecommendationKind::Herbal));
    }

    #[test]
    fn test_drugs_ranked_by_availability_unknown_last() {
        let agg = aggregator(
            vec![],
            vec![
                ("Rx", Some("Medical Store (Prescription)")),
                ("Mystery", None),
                ("Otc", Some("Very Common - Medical Store (OTC)")),
                ("Odd", Some("Hospital/Blood Bank (Prescription)")),
                ("Common", Some("Common - Medical Store")),
            ],
        );
        assert_eq!(
            agg.candidate_drugs(&result("X")),
            vec!["Otc", "Common", "Rx", "Mystery", "Odd"]
        );
    }

    #[test]
    fn test_lists_capped_at_top_n() {
        let herbs = vec![("a", 0.1), ("b", 0.2), ("c", 0.3), ("d", 0.4), ("e", 0.5), ("f", 0.6)];
        let drugs = vec![
            ("1", None),
            ("2", None),
            ("3", None),
            ("4", None),
            ("5", None),
            ("6", None),
            ("7", None),
        ];
        let set = aggregator(herbs, drugs).recommend(&result("X"), &SafetyReport::cleared());
        assert_eq!(set.herbal.len(), 5);
        assert_eq!(set.pharmaceutical.len(), 5);
        assert_eq!(set.herbal[0].name, "f");
    }

    #[test]
    fn test_rank_scores_are_non_increasing() {
        let agg = aggregator(
            vec![("A", 0.4), ("B", 0.9), ("C", 0.4), ("D", 1.0)],
            vec![
                ("Rx", Some("Medical Store (Prescription)")),
                ("Mystery", None),
                ("Otc", Some("Very Common - Medical Store (OTC)")),
                ("Common", Some("Common - Medical Store")),
            ],
        );
        let set = agg.recommend(&result("X"), &SafetyReport::cleared());
        for list in [&set.herbal, &set.pharmaceutical] {
            assert!(list.windows(2).all(|w| w[0].rank_score >= w[1].rank_score));
            assert!(list.iter().all(|r| (0.0..=1.0).contains(&r.rank_score)));
        }
        assert_eq!(set.pharmaceutical[0].rank_score, 1.0);
        assert_eq!(set.pharmaceutical[3].rank_score, 0.0);
    }

    #[test]
    fn test_candidate_drugs_match_recommended_drugs() {
        let agg = aggregator(vec![], vec![("B", None), ("A", Some("Medical Store"))]);
        let r = result("X");
        let set = agg.recommend(&r, &SafetyReport::cleared());
        let listed: Vec<String> = set.pharmaceutical.iter().map(|d| d.name.clone()).collect();
        assert_eq!(agg.candidate_drugs(&r), listed);
    }

    // ── Safety handling ───────────────────────────────────────────────────────

    #[test]
    fn test_emergency_returns_empty_lists() {
        let agg = aggregator(vec![("A", 0.5)], vec![("B", None)]);
        let set = agg.recommend(&result("X"), &SafetyReport::emergency("call 112"));
        assert!(set.herbal.is_empty());
        assert!(set.pharmaceutical.is_empty());
        assert_eq!(set.emergency_message.as_deref(), Some("call 112"));
        assert!(set.is_emergency());
    }

    #[test]
    fn test_warnings_are_attached() {
        let mut safety = SafetyReport::cleared();
        safety.low_confidence_warning = Some("low".to_string());
        safety.allergy_warnings = BTreeSet::from([AllergyRecord {
            drug: "B".to_string(),
            allergen: "b".to_string(),
            severity: Severity::High,
            cross_reaction: false,
        }]);

        let set = aggregator(vec![("A", 0.5)], vec![("B", None)]).recommend(&result("X"), &safety);
        assert_eq!(set.low_confidence_warning.as_deref(), Some("low"));
        assert_eq!(set.allergy_warnings.len(), 1);
        assert_eq!(set.pharmaceutical.len(), 1);
        assert_eq!(set.disclaimer, safety.disclaimer);
    }

    #[test]
    fn test_blank_query_gets_nothing() {
        let agg = aggregator(vec![("A", 0.5)], vec![("B", None)]);
        let r = InferenceResult::no_condition("");
        assert!(agg.candidate_drugs(&r).is_empty());
        assert!(agg.recommend(&r, &SafetyReport::cleared()).names().is_empty());
    }

    // ── Metadata ──────────────────────────────────────────────────────────────

    #[test]
    fn test_missing_metadata_gets_placeholders() {
        let set = aggregator(vec![("A", 0.5)], vec![("B", None)])
            .recommend(&result("X"), &SafetyReport::cleared());

        let herb = &set.herbal[0];
        assert_eq!(herb.field("benefits"), MISSING_FIELD);
        assert_eq!(herb.field("active_compounds"), "Curcumin");
        assert_eq!(herb.field("usage"), MISSING_FIELD);

        let drug = &set.pharmaceutical[0];
        assert_eq!(drug.field("type"), UNKNOWN_FIELD);
        assert_eq!(drug.field("availability"), UNKNOWN_FIELD);
        assert_eq!(drug.field("brand_names"), MISSING_FIELD);
        assert_eq!(drug.field("dosage"), "500 mg");
        assert_eq!(drug.rank_score, 0.0);
    }

    // ── Embedded catalogs ─────────────────────────────────────────────────────

    #[test]
    fn test_embedded_catalogs_for_cold_cluster() {
        let agg = RecommendationAggregator::embedded(RecommendConfig::default()).unwrap();
        let r = result("Common Cold / Influenza");
        let set = agg.recommend(&r, &SafetyReport::cleared());
        assert_eq!(set.herbal[0].name, "Tulsi");
        assert_eq!(set.pharmaceutical.len(), 5);
        assert_eq!(set.pharmaceutical[0].name, "Cough Syrup (Guaifenesin)");
        assert_eq!(
            set.pharmaceutical[0].field("brand_names"),
            "Mucinex, Robitussin, Actikuf"
        );
    }

    #[test]
    fn test_embedded_drug_scores_follow_list_order() {
        let agg = RecommendationAggregator::embedded(RecommendConfig::default()).unwrap();
        let set = agg.recommend(&result("COVID-19"), &SafetyReport::cleared());
        let names: Vec<&str> = set.pharmaceutical.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Paracetamol", "Remdesivir", "Tocilizumab", "Azithromycin", "Dexamethasone"]
        );
        let scores: Vec<f64> = set.pharmaceutical.iter().map(|r| r.rank_score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]), "got {scores:?}");
        assert_eq!(scores[0], 1.0);
    }
}
