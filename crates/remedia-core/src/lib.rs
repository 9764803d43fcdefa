//! # remedia-core
//!
//! The consultation runtime for Remedia.
//!
//! This crate provides:
//! - The seam traits every pipeline stage implements (`traits`)
//! - TOML configuration loading (`config`)
//! - The `Consultant` that wires the stages together in safety order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use remedia_core::{Consultant, config::load_config_file};
//!
//! let consultant = Consultant::new(inferencer, gate, aggregator, journal);
//! let consultation = consultant.consult("fever and chills since yesterday", None)?;
//! ```

pub mod config;
pub mod consultant;
pub mod traits;

pub use consultant::Consultant;
