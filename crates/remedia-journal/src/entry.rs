//! Journal entry type.

use serde::{Deserialize, Serialize};

use remedia_contracts::consultation::ConsultationSummary;

/// One consultation in the hash chain.
///
/// `this_hash` commits to `sequence`, `prev_hash` and the summary, so
/// editing any of them, or dropping or reordering entries, breaks the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the chain, starting at 0.
    pub sequence: u64,
    pub summary: ConsultationSummary,
    /// `this_hash` of the previous entry, or `GENESIS_HASH` for the first.
    pub prev_hash: String,
    pub this_hash: String,
}

impl JournalEntry {
    /// `prev_hash` of the first entry in every journal: 64 hex zeros.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}
