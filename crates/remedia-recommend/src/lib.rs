//! # remedia-recommend
//!
//! Turns an inferred condition into ranked herbal and pharmaceutical
//! suggestions. Herbs rank by relevance, drugs by how easy they are to get.
//! Nothing is suggested when the safety gate reports an emergency.

pub mod aggregator;
pub mod availability;
pub mod catalog;

pub use aggregator::RecommendationAggregator;
pub use availability::{availability_rank, availability_score};
pub use catalog::{TomlDrugCatalog, TomlHerbCatalog};
