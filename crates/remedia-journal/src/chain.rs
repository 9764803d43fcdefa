//! Hashing and chain verification.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. prev_hash as UTF-8 bytes
//!   3. compact JSON of the summary

use sha2::{Digest, Sha256};

use remedia_contracts::{
    consultation::ConsultationSummary,
    error::{RemediaError, RemediaResult},
};

use crate::entry::JournalEntry;

/// Lowercase hex SHA-256 of one entry's content.
pub fn hash_entry(
    sequence: u64,
    summary: &ConsultationSummary,
    prev_hash: &str,
) -> RemediaResult<String> {
    let summary_json =
        serde_json::to_vec(summary).map_err(|e| RemediaError::JournalWriteFailed {
            reason: format!("summary is not serializable: {}", e),
        })?;

    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&summary_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Where the next entry attaches.
#[derive(Debug, Clone)]
pub(crate) struct ChainHead {
    pub(crate) sequence: u64,
    pub(crate) last_hash: String,
}

impl ChainHead {
    pub(crate) fn genesis() -> Self {
        Self {
            sequence: 0,
            last_hash: JournalEntry::GENESIS_HASH.to_string(),
        }
    }

    /// Resume after the last entry of an existing chain.
    pub(crate) fn after(entries: &[JournalEntry]) -> Self {
        match entries.last() {
            Some(last) => Self {
                sequence: last.sequence + 1,
                last_hash: last.this_hash.clone(),
            },
            None => Self::genesis(),
        }
    }

    /// Build the next entry without advancing; call `advance` once it is stored.
    pub(crate) fn link(&self, summary: &ConsultationSummary) -> RemediaResult<JournalEntry> {
        let this_hash = hash_entry(self.sequence, summary, &self.last_hash)?;
        Ok(JournalEntry {
            sequence: self.sequence,
            summary: summary.clone(),
            prev_hash: self.last_hash.clone(),
            this_hash,
        })
    }

    pub(crate) fn advance(&mut self, stored: &JournalEntry) {
        self.sequence = stored.sequence + 1;
        self.last_hash = stored.this_hash.clone();
    }
}

/// True when every entry links to its predecessor, carries the expected
/// sequence number, and hashes to its stored `this_hash`. Empty is valid.
pub fn verify_chain(entries: &[JournalEntry]) -> bool {
    let mut expected_prev: &str = JournalEntry::GENESIS_HASH;

    for (idx, entry) in entries.iter().enumerate() {
        if entry.sequence != idx as u64 || entry.prev_hash != expected_prev {
            return false;
        }

        match hash_entry(entry.sequence, &entry.summary, &entry.prev_hash) {
            Ok(recomputed) if recomputed == entry.this_hash => {}
            _ => return false,
        }

        expected_prev = entry.this_hash.as_str();
    }

    true
}
