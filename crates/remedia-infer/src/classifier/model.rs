//! Pre-fit TF-IDF + linear classifier loaded from a JSON artifact.
//!
//! The artifact is produced offline by the training pipeline. Layout:
//!
//! ```json
//! {
//!   "classes": ["Asthma", "Diabetes"],
//!   "vocabulary": {"wheeze": 0, "sugar": 1, "high sugar": 2},
//!   "idf": [1.7, 1.2, 2.3],
//!   "ngram_range": [1, 2],
//!   "stop_words": ["and", "the"],
//!   "coef": [[2.1, -0.4, 0.0]],
//!   "intercept": [-0.3],
//!   "calibration": [{"a": -1.8, "b": 0.1}]
//! }
//! ```
//!
//! `coef` has one row per class, or a single row for a two-class model
//! (positive decision means the second class). `calibration` is optional and
//! aligned with `coef` rows.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use remedia_contracts::error::{RemediaError, RemediaResult};
use remedia_core::traits::{SparseVector, TextModel};

/// Sigmoid parameters: `p = 1 / (1 + exp(a * decision + b))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
}

impl PlattScaling {
    fn apply(&self, decision: f64) -> f64 {
        1.0 / (1.0 + (self.a * decision + self.b).exp())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ModelArtifact {
    classes: Vec<String>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    stop_words: Vec<String>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    #[serde(default)]
    calibration: Option<Vec<PlattScaling>>,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

#[derive(Debug, Clone)]
pub struct TfidfLogisticModel {
    classes: Vec<String>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    calibration: Option<Vec<PlattScaling>>,
}

impl TfidfLogisticModel {
    pub fn from_json_str(s: &str) -> RemediaResult<Self> {
        let artifact: ModelArtifact =
            serde_json::from_str(s).map_err(|e| RemediaError::ModelUnavailable {
                reason: format!("failed to parse model JSON: {}", e),
            })?;
        Self::from_artifact(artifact)
    }

    pub fn from_file(path: &Path) -> RemediaResult<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| RemediaError::ModelUnavailable {
                reason: format!("failed to read '{}': {}", path.display(), e),
            })?;
        Self::from_json_str(&contents)
    }

    fn from_artifact(a: ModelArtifact) -> RemediaResult<Self> {
        let unavailable = |reason: String| RemediaError::ModelUnavailable { reason };

        if a.classes.len() < 2 {
            return Err(unavailable(format!(
                "model needs at least 2 classes, found {}",
                a.classes.len()
            )));
        }

        let binary = a.classes.len() == 2 && a.coef.len() == 1;
        if !binary && a.coef.len() != a.classes.len() {
            return Err(unavailable(format!(
                "{} coefficient rows for {} classes",
                a.coef.len(),
                a.classes.len()
            )));
        }
        if a.intercept.len() != a.coef.len() {
            return Err(unavailable(format!(
                "{} intercepts for {} coefficient rows",
                a.intercept.len(),
                a.coef.len()
            )));
        }

        let n_features = a.idf.len();
        if let Some(row) = a.coef.iter().find(|row| row.len() != n_features) {
            return Err(unavailable(format!(
                "coefficient row has {} features, idf has {}",
                row.len(),
                n_features
            )));
        }
        if let Some((term, idx)) = a.vocabulary.iter().find(|(_, idx)| **idx >= n_features) {
            return Err(unavailable(format!(
                "vocabulary term '{}' has index {} beyond {} features",
                term, idx, n_features
            )));
        }

        let (lo, hi) = a.ngram_range;
        if lo == 0 || lo > hi {
            return Err(unavailable(format!("invalid ngram_range ({}, {})", lo, hi)));
        }

        if let Some(cal) = &a.calibration {
            if cal.len() != a.coef.len() {
                return Err(unavailable(format!(
                    "{} calibration entries for {} coefficient rows",
                    cal.len(),
                    a.coef.len()
                )));
            }
        }

        debug!(
            classes = a.classes.len(),
            features = n_features,
            calibrated = a.calibration.is_some(),
            "classifier model loaded"
        );

        Ok(Self {
            classes: a.classes,
            vocabulary: a.vocabulary,
            idf: a.idf,
            ngram_range: a.ngram_range,
            stop_words: a.stop_words.into_iter().collect(),
            coef: a.coef,
            intercept: a.intercept,
            calibration: a.calibration,
        })
    }

    fn tokens<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split_whitespace()
            .filter(|t| t.chars().count() >= 2 && !self.stop_words.contains(*t))
            .collect()
    }

    fn decisions(&self, features: &SparseVector) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| {
                features
                    .iter()
                    .filter_map(|(idx, v)| row.get(*idx).map(|w| w * v))
                    .sum::<f64>()
                    + b
            })
            .collect()
    }
}

impl TextModel for TfidfLogisticModel {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn transform(&self, text: &str) -> SparseVector {
        let tokens = self.tokens(text);
        let (lo, hi) = self.ngram_range;

        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for n in lo..=hi {
            for window in tokens.windows(n) {
                let gram = window.join(" ");
                if let Some(&idx) = self.vocabulary.get(&gram) {
                    *counts.entry(idx).or_insert(0.0) += 1.0;
                }
            }
        }

        let mut weighted: SparseVector = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();

        let norm = weighted.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, v) in &mut weighted {
                *v /= norm;
            }
        }
        weighted
    }

    fn predict_proba(&self, features: &SparseVector) -> Vec<f64> {
        let decisions = self.decisions(features);

        if decisions.len() == 1 {
            let positive = match &self.calibration {
                Some(cal) => cal[0].apply(decisions[0]),
                None => sigmoid(decisions[0]),
            };
            return vec![1.0 - positive, positive];
        }

        match &self.calibration {
            Some(cal) => {
                let raw: Vec<f64> = decisions
                    .iter()
                    .zip(cal)
                    .map(|(d, c)| c.apply(*d))
                    .collect();
                let total: f64 = raw.iter().sum();
                if total > 0.0 {
                    raw.iter().map(|p| p / total).collect()
                } else {
                    vec![1.0 / raw.len() as f64; raw.len()]
                }
            }
            None => softmax(&decisions),
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn softmax(xs: &[f64]) -> Vec<f64> {
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = xs.iter().map(|x| (x - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}
