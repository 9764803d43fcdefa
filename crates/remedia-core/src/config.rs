//! Loading `RemediaConfig` from TOML.

use std::path::Path;

use tracing::debug;

use remedia_contracts::{
    config::RemediaConfig,
    error::{RemediaError, RemediaResult},
};

/// Parse a configuration document. Absent sections and fields keep their
/// defaults.
pub fn load_config_str(s: &str) -> RemediaResult<RemediaConfig> {
    let config: RemediaConfig = toml::from_str(s).map_err(|e| RemediaError::ConfigError {
        reason: format!("failed to parse configuration TOML: {}", e),
    })?;
    validate(&config)?;
    Ok(config)
}

/// Read and parse the configuration file at `path`.
pub fn load_config_file(path: &Path) -> RemediaResult<RemediaConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| RemediaError::ConfigError {
        reason: format!("failed to read configuration file '{}': {}", path.display(), e),
    })?;
    debug!(path = %path.display(), "loading configuration");
    load_config_str(&contents)
}

/// Reject threshold values that would break the confidence invariants.
fn validate(config: &RemediaConfig) -> RemediaResult<()> {
    let inference = &config.inference;
    let unit_fields = [
        ("inference.max_keyword_confidence", inference.max_keyword_confidence),
        ("inference.direct_match_confidence", inference.direct_match_confidence),
        ("inference.fuzzy_threshold", inference.fuzzy_threshold),
        ("inference.containment_similarity", inference.containment_similarity),
        ("inference.pattern_confidence", inference.pattern_confidence),
        (
            "inference.statistical_override_threshold",
            inference.statistical_override_threshold,
        ),
        (
            "inference.general_condition_confidence",
            inference.general_condition_confidence,
        ),
        (
            "safety.low_confidence_threshold",
            config.safety.low_confidence_threshold,
        ),
    ];

    for (name, value) in unit_fields {
        if !(0.0..=1.0).contains(&value) {
            return Err(RemediaError::ConfigError {
                reason: format!("{} must be within [0, 1], got {}", name, value),
            });
        }
    }

    if inference.score_ceiling <= 0.0 {
        return Err(RemediaError::ConfigError {
            reason: format!(
                "inference.score_ceiling must be positive, got {}",
                inference.score_ceiling
            ),
        });
    }

    if config.recommend.top_n == 0 {
        return Err(RemediaError::ConfigError {
            reason: "recommend.top_n must be at least 1".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use remedia_contracts::error::RemediaError;

    use super::load_config_str;

    #[test]
    fn empty_document_yields_defaults() {
        let config = load_config_str("").unwrap();
        assert_eq!(config.inference.fuzzy_threshold, 0.7);
        assert_eq!(config.recommend.top_n, 5);
    }

    #[test]
    fn partial_document_overrides_only_listed_fields() {
        let config = load_config_str(
            r#"
            [safety]
            low_confidence_threshold = 0.6

            [tables]
            model = "data/model.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.safety.low_confidence_threshold, 0.6);
        assert_eq!(config.inference.pattern_confidence, 0.75);
        assert_eq!(
            config.tables.model.as_deref(),
            Some(std::path::Path::new("data/model.json"))
        );
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        match load_config_str("[inference\nfuzzy_threshold = ") {
            Err(RemediaError::ConfigError { reason }) => {
                assert!(reason.contains("failed to parse configuration TOML"), "got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let err = load_config_str("[inference]\nfuzzy_threshold = 1.5").unwrap_err();
        assert!(err.to_string().contains("inference.fuzzy_threshold"));
    }

    #[test]
    fn zero_top_n_is_rejected() {
        assert!(load_config_str("[recommend]\ntop_n = 0").is_err());
    }
}
