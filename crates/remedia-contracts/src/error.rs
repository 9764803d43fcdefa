//! Error types for the Remedia consultation pipeline.
//!
//! Only construction-time problems (bad tables, bad config) and programming
//! defects surface as errors. Missing optional data degrades a step instead
//! and is reported through `tracing`.

use thiserror::Error;

/// The unified error type for the Remedia crates.
#[derive(Debug, Error)]
pub enum RemediaError {
    /// A configuration document is missing, unreadable, or malformed.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A lookup table (keywords, patterns, interactions, catalogs) failed to load.
    #[error("failed to load {table} table: {reason}")]
    TableLoad { table: String, reason: String },

    /// The statistical classifier artifact could not be used.
    ///
    /// Callers normally downgrade this to a warning and run without the
    /// statistical step.
    #[error("classifier model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    /// A result violated one of its structural invariants.
    #[error("invariant violation: {reason}")]
    InvariantViolation { reason: String },

    /// The consultation journal could not persist an entry.
    #[error("journal write failed: {reason}")]
    JournalWriteFailed { reason: String },
}

impl RemediaError {
    /// Shorthand for a `TableLoad` error.
    pub fn table(table: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::TableLoad {
            table: table.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used throughout the Remedia crates.
pub type RemediaResult<T> = Result<T, RemediaError>;
