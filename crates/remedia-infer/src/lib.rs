//! # remedia-infer
//!
//! Condition inference from free-text symptom descriptions.
//!
//! - `keyword`     weighted keyword families with boosts and suppression
//! - `pattern`     coarse context patterns for vague complaints
//! - `classifier`  direct, fuzzy, and statistical name matching
//! - `coordinator` the fixed-precedence `Inferencer` over all of the above
//!
//! Default tables are compiled in from `tables/` and can be replaced with
//! files at construction time.

pub mod classifier;
pub mod coordinator;
pub mod keyword;
pub mod pattern;
pub mod similarity;
pub mod text;

pub use classifier::{TextClassifier, TfidfLogisticModel, Vocabulary};
pub use coordinator::{InferenceCoordinator, Resolution};
pub use keyword::KeywordScorer;
pub use pattern::PatternMatcher;
