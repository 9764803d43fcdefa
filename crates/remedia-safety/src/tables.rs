//! Interaction and allergy reference tables.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use remedia_contracts::{
    error::{RemediaError, RemediaResult},
    safety::Severity,
};

pub const DEFAULT_INTERACTIONS_TOML: &str = include_str!("../tables/interactions.toml");
pub const DEFAULT_ALLERGIES_TOML: &str = include_str!("../tables/allergies.toml");

fn read_table(table: &str, path: &Path) -> RemediaResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        RemediaError::table(table, format!("failed to read '{}': {}", path.display(), e))
    })
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Order-independent lookup key: both names lower-cased, then sorted.
pub fn pair_key(a: &str, b: &str) -> (String, String) {
    let (a, b) = (normalize(a), normalize(b));
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ── Interactions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEntry {
    pub drug_a: String,
    pub drug_b: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub effect: String,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Deserialize)]
struct InteractionFile {
    #[serde(default)]
    interactions: Vec<InteractionEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionTable {
    pairs: HashMap<(String, String), InteractionEntry>,
}

impl InteractionTable {
    pub fn embedded() -> RemediaResult<Self> {
        Self::from_toml_str(DEFAULT_INTERACTIONS_TOML)
    }

    /// A later entry for the same pair replaces the earlier one.
    pub fn from_toml_str(s: &str) -> RemediaResult<Self> {
        let file: InteractionFile = toml::from_str(s).map_err(|e| {
            RemediaError::table("interactions", format!("failed to parse TOML: {}", e))
        })?;

        let mut pairs = HashMap::new();
        for entry in file.interactions {
            let key = pair_key(&entry.drug_a, &entry.drug_b);
            if key.0.is_empty() || key.1.is_empty() {
                return Err(RemediaError::table("interactions", "entry with a blank drug name"));
            }
            if let Some(previous) = pairs.insert(key, entry) {
                warn!(
                    drug_a = %previous.drug_a,
                    drug_b = %previous.drug_b,
                    "duplicate interaction entry replaced"
                );
            }
        }

        debug!(pairs = pairs.len(), "interaction table loaded");
        Ok(Self { pairs })
    }

    pub fn from_file(path: &Path) -> RemediaResult<Self> {
        Self::from_toml_str(&read_table("interactions", path)?)
    }

    pub fn lookup(&self, a: &str, b: &str) -> Option<&InteractionEntry> {
        self.pairs.get(&pair_key(a, b))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

// ── Allergies ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllergenEntry {
    pub allergen: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub cross_reactions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AllergyFile {
    #[serde(default)]
    allergens: Vec<AllergenEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct AllergyTable {
    allergens: HashMap<String, AllergenEntry>,
}

impl AllergyTable {
    pub fn embedded() -> RemediaResult<Self> {
        Self::from_toml_str(DEFAULT_ALLERGIES_TOML)
    }

    /// Allergen names and cross-reactions are lower-cased on load.
    pub fn from_toml_str(s: &str) -> RemediaResult<Self> {
        let file: AllergyFile = toml::from_str(s).map_err(|e| {
            RemediaError::table("allergies", format!("failed to parse TOML: {}", e))
        })?;

        let mut allergens = HashMap::new();
        for mut entry in file.allergens {
            entry.allergen = normalize(&entry.allergen);
            if entry.allergen.is_empty() {
                return Err(RemediaError::table("allergies", "entry with a blank allergen"));
            }
            entry.cross_reactions = entry
                .cross_reactions
                .iter()
                .map(|c| normalize(c))
                .filter(|c| !c.is_empty())
                .collect();
            allergens.insert(entry.allergen.clone(), entry);
        }

        debug!(allergens = allergens.len(), "allergy table loaded");
        Ok(Self { allergens })
    }

    pub fn from_file(path: &Path) -> RemediaResult<Self> {
        Self::from_toml_str(&read_table("allergies", path)?)
    }

    /// Case-insensitive lookup by allergen name.
    pub fn get(&self, allergen: &str) -> Option<&AllergenEntry> {
        self.allergens.get(&normalize(allergen))
    }

    pub fn len(&self) -> usize {
        self.allergens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allergens.is_empty()
    }
}
