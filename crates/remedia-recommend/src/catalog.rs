//! TOML-backed herb and drug sources.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use remedia_contracts::{
    error::{RemediaError, RemediaResult},
    recommend::{DrugEntry, HerbEntry},
};
use remedia_core::traits::{DrugSource, HerbSource};

pub const DEFAULT_HERBS_TOML: &str = include_str!("../tables/herbs.toml");
pub const DEFAULT_DRUGS_TOML: &str = include_str!("../tables/drugs.toml");

fn read_table(table: &str, path: &Path) -> RemediaResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        RemediaError::table(table, format!("failed to read '{}': {}", path.display(), e))
    })
}

// ── Herbs ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct RankedHerb {
    name: String,
    relevance: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct HerbRule {
    any: Vec<String>,
    herbs: Vec<RankedHerb>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct HerbFallback {
    #[serde(default)]
    herbs: Vec<RankedHerb>,
}

#[derive(Debug, Clone, Deserialize)]
struct HerbDetail {
    name: String,
    #[serde(default)]
    benefits: Option<String>,
    #[serde(default)]
    active_compounds: Option<String>,
    #[serde(default)]
    usage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HerbFile {
    #[serde(default)]
    rules: Vec<HerbRule>,
    #[serde(default)]
    fallback: HerbFallback,
    #[serde(default)]
    details: Vec<HerbDetail>,
}

/// Maps condition-name fragments to ranked herbs.
#[derive(Debug, Clone)]
pub struct TomlHerbCatalog {
    rules: Vec<HerbRule>,
    fallback: Vec<RankedHerb>,
    details: HashMap<String, HerbDetail>,
}

impl TomlHerbCatalog {
    pub fn embedded() -> RemediaResult<Self> {
        Self::from_toml_str(DEFAULT_HERBS_TOML)
    }

    pub fn from_toml_str(s: &str) -> RemediaResult<Self> {
        let mut file: HerbFile = toml::from_str(s)
            .map_err(|e| RemediaError::table("herbs", format!("failed to parse TOML: {}", e)))?;

        let herbs = file
            .rules
            .iter()
            .flat_map(|r| r.herbs.iter())
            .chain(file.fallback.herbs.iter());
        for herb in herbs {
            if !(0.0..=1.0).contains(&herb.relevance) {
                return Err(RemediaError::table(
                    "herbs",
                    format!("herb '{}' has relevance {} outside [0, 1]", herb.name, herb.relevance),
                ));
            }
        }

        for rule in &mut file.rules {
            for fragment in &mut rule.any {
                *fragment = fragment.to_lowercase();
            }
        }

        let details = file
            .details
            .into_iter()
            .map(|d| (d.name.to_lowercase(), d))
            .collect::<HashMap<_, _>>();

        debug!(rules = file.rules.len(), details = details.len(), "herb catalog loaded");
        Ok(Self {
            rules: file.rules,
            fallback: file.fallback.herbs,
            details,
        })
    }

    pub fn from_file(path: &Path) -> RemediaResult<Self> {
        Self::from_toml_str(&read_table("herbs", path)?)
    }

    fn entry(&self, herb: &RankedHerb) -> HerbEntry {
        let detail = self.details.get(&herb.name.to_lowercase());
        HerbEntry {
            name: herb.name.clone(),
            relevance: herb.relevance,
            benefits: detail.and_then(|d| d.benefits.clone()),
            active_compounds: detail.and_then(|d| d.active_compounds.clone()),
            usage: detail.and_then(|d| d.usage.clone()),
        }
    }
}

impl HerbSource for TomlHerbCatalog {
    fn herbs_for(&self, condition: &str) -> Vec<HerbEntry> {
        let lowered = condition.to_lowercase();
        let herbs = self
            .rules
            .iter()
            .find(|rule| rule.any.iter().any(|f| lowered.contains(f.as_str())))
            .map(|rule| &rule.herbs)
            .unwrap_or(&self.fallback);
        herbs.iter().map(|h| self.entry(h)).collect()
    }
}

// ── Drugs ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct DrugCondition {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    drugs: Vec<DrugEntry>,
}

#[derive(Debug, Deserialize)]
struct DrugFile {
    #[serde(default)]
    aliases: HashMap<String, String>,
    #[serde(default)]
    conditions: Vec<DrugCondition>,
}

/// Condition to drug list, with alias mapping and partial-name lookup.
#[derive(Debug, Clone)]
pub struct TomlDrugCatalog {
    /// Lower-cased alias to catalog condition.
    aliases: HashMap<String, String>,
    conditions: Vec<DrugCondition>,
}

impl TomlDrugCatalog {
    pub fn embedded() -> RemediaResult<Self> {
        Self::from_toml_str(DEFAULT_DRUGS_TOML)
    }

    pub fn from_toml_str(s: &str) -> RemediaResult<Self> {
        let file: DrugFile = toml::from_str(s)
            .map_err(|e| RemediaError::table("drugs", format!("failed to parse TOML: {}", e)))?;

        if let Some(c) = file.conditions.iter().find(|c| c.name.trim().is_empty()) {
            return Err(RemediaError::table(
                "drugs",
                format!("condition with blank name ({} drugs)", c.drugs.len()),
            ));
        }

        let aliases = file
            .aliases
            .into_iter()
            .map(|(alias, target)| (alias.trim().to_lowercase(), target))
            .collect::<HashMap<_, _>>();

        debug!(
            conditions = file.conditions.len(),
            aliases = aliases.len(),
            "drug catalog loaded"
        );
        Ok(Self {
            aliases,
            conditions: file.conditions,
        })
    }

    pub fn from_file(path: &Path) -> RemediaResult<Self> {
        Self::from_toml_str(&read_table("drugs", path)?)
    }

    /// Catalog conditions in declaration order.
    pub fn conditions(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(|c| c.name.as_str())
    }

    pub fn description(&self, condition: &str) -> Option<&str> {
        self.find(condition).and_then(|c| c.description.as_deref())
    }

    fn find(&self, condition: &str) -> Option<&DrugCondition> {
        let query = condition.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        let mapped = self
            .aliases
            .get(&query)
            .map(|target| target.to_lowercase())
            .unwrap_or(query);

        self.conditions
            .iter()
            .find(|c| c.name.to_lowercase() == mapped)
            .or_else(|| {
                self.conditions.iter().find(|c| {
                    let name = c.name.to_lowercase();
                    mapped.contains(&name) || name.contains(&mapped)
                })
            })
    }
}

impl DrugSource for TomlDrugCatalog {
    fn drugs_for(&self, condition: &str) -> Vec<DrugEntry> {
        match self.find(condition) {
            Some(found) => {
                debug!(query = condition, catalog = %found.name, "drug catalog match");
                found.drugs.clone()
            }
            None => Vec::new(),
        }
    }
}
