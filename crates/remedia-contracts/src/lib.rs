//! # remedia-contracts
//!
//! Shared types, error model, and configuration schema for Remedia.
//!
//! Every other crate in the workspace imports from here. Only data
//! definitions, invariant checks, and error types live in this crate.

pub mod config;
pub mod consultation;
pub mod error;
pub mod inference;
pub mod recommend;
pub mod safety;
