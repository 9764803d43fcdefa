//! # remedia-safety
//!
//! The mandatory safety layer between condition inference and
//! recommendations: a compiled-in emergency scan, a low-confidence advisory,
//! and drug interaction and allergy screening backed by TOML tables.

pub mod emergency;
pub mod gate;
pub mod tables;

pub use gate::SafetyGate;
pub use tables::{AllergyTable, InteractionTable};
