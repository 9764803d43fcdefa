//! # remedia-journal
//!
//! Append-only, SHA-256 hash-chained record of every consultation.
//!
//! Each `JournalEntry` links to the previous one through its hash, so
//! editing, dropping or reordering any entry is caught by `verify_chain`.
//!
//! ```rust,ignore
//! use remedia_journal::JsonlJournal;
//!
//! let journal = JsonlJournal::open("consultations.jsonl")?;
//! let consultant = Consultant::new(inferencer, gate, aggregator, Box::new(journal));
//! ```

pub mod chain;
pub mod entry;
pub mod jsonl;
pub mod memory;

pub use chain::{hash_entry, verify_chain};
pub use entry::JournalEntry;
pub use jsonl::{read_entries, JsonlJournal};
pub use memory::InMemoryJournal;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::Utc;
    use tempfile::TempDir;

    use remedia_contracts::{consultation::ConsultationSummary, error::RemediaError};
    use remedia_core::traits::ConsultationJournal;

    use super::{read_entries, verify_chain, InMemoryJournal, JournalEntry, JsonlJournal};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn summary(condition: &str, confidence: f64) -> ConsultationSummary {
        ConsultationSummary {
            consultation_id: format!("consult-{}", condition.to_lowercase()),
            query: format!("symptoms of {}", condition.to_lowercase()),
            condition: condition.to_string(),
            confidence,
            source: "keyword".to_string(),
            is_emergency: false,
            recommended: vec!["Tulsi".to_string(), "Paracetamol".to_string()],
            interaction_count: 0,
            allergy_count: 0,
            timestamp: Utc::now(),
        }
    }

    fn filled_journal() -> InMemoryJournal {
        let journal = InMemoryJournal::new();
        journal.append(&summary("Cold", 0.45)).unwrap();
        journal.append(&summary("Fever", 0.3)).unwrap();
        journal.append(&summary("Diabetes", 0.95)).unwrap();
        journal
    }

    // ── In-memory ─────────────────────────────────────────────────────────────

    #[test]
    fn test_hash_chain_integrity() {
        let journal = filled_journal();
        assert_eq!(journal.len(), 3);
        assert!(journal.verify_integrity());
    }

    #[test]
    fn test_tamper_detection() {
        let journal = filled_journal();
        {
            let mut state = journal.state.lock().unwrap();
            state.entries[0].summary.condition = "Heart Disease".to_string();
        }
        assert!(!journal.verify_integrity());
    }

    #[test]
    fn test_dropped_entry_is_detected() {
        let mut entries = filled_journal().entries();
        entries.remove(1);
        assert!(!verify_chain(&entries));
    }

    #[test]
    fn test_genesis_hash() {
        let journal = InMemoryJournal::new();
        assert_eq!(journal.terminal_hash(), JournalEntry::GENESIS_HASH);

        journal.append(&summary("Cold", 0.45)).unwrap();
        let entries = journal.entries();
        assert_eq!(entries[0].prev_hash, JournalEntry::GENESIS_HASH);
        assert_eq!(journal.terminal_hash(), entries[0].this_hash);
    }

    #[test]
    fn test_sequence_monotonic() {
        let entries = filled_journal().entries();
        for (idx, entry) in entries.iter().enumerate() {
            assert_eq!(entry.sequence, idx as u64);
        }
        assert_eq!(entries[1].prev_hash, entries[0].this_hash);
        assert_eq!(entries[2].prev_hash, entries[1].this_hash);
    }

    #[test]
    fn test_verify_empty() {
        assert!(InMemoryJournal::new().verify_integrity());
        assert!(InMemoryJournal::new().is_empty());
        assert!(verify_chain(&[]));
    }

    // ── JSON lines ────────────────────────────────────────────────────────────

    #[test]
    fn test_jsonl_appends_and_resumes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");

        let journal = JsonlJournal::open(&path).unwrap();
        journal.append(&summary("Cold", 0.45)).unwrap();
        journal.append(&summary("Fever", 0.7777777777777778)).unwrap();
        drop(journal);

        let reopened = JsonlJournal::open(&path).unwrap();
        reopened.append(&summary("Asthma", 0.95)).unwrap();
        assert!(reopened.verify().unwrap());

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].sequence, 2);
        assert_eq!(entries[2].summary.condition, "Asthma");
        assert_eq!(entries[1].summary.confidence, 0.7777777777777778);
    }

    #[test]
    fn test_jsonl_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        assert!(read_entries(&path).unwrap().is_empty());
        assert!(JsonlJournal::open(&path).unwrap().verify().unwrap());
        assert!(!path.exists(), "open alone must not create the file");
    }

    #[test]
    fn test_jsonl_refuses_tampered_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        let journal = JsonlJournal::open(&path).unwrap();
        journal.append(&summary("Cold", 0.45)).unwrap();
        journal.append(&summary("Fever", 0.3)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        fs::write(&path, content.replacen("\"Cold\"", "\"Malaria\"", 1)).unwrap();

        assert!(!journal.verify().unwrap());
        match JsonlJournal::open(&path) {
            Err(RemediaError::JournalWriteFailed { reason }) => {
                assert!(reason.contains("fails verification"), "got: {reason}");
            }
            Ok(_) => panic!("expected JournalWriteFailed, got Ok"),
            Err(other) => panic!("expected JournalWriteFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_jsonl_rejects_garbage_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        fs::write(&path, "not json\n").unwrap();

        match read_entries(&path) {
            Err(RemediaError::JournalWriteFailed { reason }) => {
                assert!(reason.contains("line 1"), "got: {reason}");
            }
            other => panic!("expected JournalWriteFailed, got {:?}", other),
        }
    }
}
