//! In-memory `ConsultationJournal`.
//!
//! Entries live in a `Vec` behind a `Mutex`, so one journal can be shared by
//! every consultation in a process. Nothing survives a restart; use
//! `JsonlJournal` for that.

use std::sync::{Arc, Mutex};

use tracing::debug;

use remedia_contracts::{
    consultation::ConsultationSummary,
    error::{RemediaError, RemediaResult},
};
use remedia_core::traits::ConsultationJournal;

use crate::{
    chain::{verify_chain, ChainHead},
    entry::JournalEntry,
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct InMemoryState {
    pub(crate) entries: Vec<JournalEntry>,
    pub(crate) head: ChainHead,
}

// ── Public journal ────────────────────────────────────────────────────────────

pub struct InMemoryJournal {
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryState {
                entries: Vec::new(),
                head: ChainHead::genesis(),
            })),
        }
    }

    /// Every entry appended so far, oldest first.
    ///
    /// Empty if the state lock was poisoned.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.state
            .lock()
            .map(|state| state.entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `this_hash` of the newest entry, or `GENESIS_HASH` when empty.
    pub fn terminal_hash(&self) -> String {
        self.state
            .lock()
            .map(|s| s.head.last_hash.clone())
            .unwrap_or_default()
    }

    /// False if any stored entry was altered, or the lock was poisoned.
    pub fn verify_integrity(&self) -> bool {
        self.state
            .lock()
            .map(|s| verify_chain(&s.entries))
            .unwrap_or(false)
    }
}

impl Default for InMemoryJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsultationJournal for InMemoryJournal {
    fn append(&self, summary: &ConsultationSummary) -> RemediaResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| RemediaError::JournalWriteFailed {
                reason: format!("journal state lock poisoned: {}", e),
            })?;

        let entry = state.head.link(summary)?;
        state.head.advance(&entry);
        debug!(
            sequence = entry.sequence,
            consultation_id = %entry.summary.consultation_id,
            "journal entry appended"
        );
        state.entries.push(entry);

        Ok(())
    }
}
