//! JSON-lines `ConsultationJournal`: one entry per line, appended to a file.
//!
//! Opening an existing file resumes its chain, so entries from separate runs
//! form a single verifiable sequence.

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, info};

use remedia_contracts::{
    consultation::ConsultationSummary,
    error::{RemediaError, RemediaResult},
};
use remedia_core::traits::ConsultationJournal;

use crate::{
    chain::{verify_chain, ChainHead},
    entry::JournalEntry,
};

fn write_failed(path: &Path, what: &str, e: impl std::fmt::Display) -> RemediaError {
    RemediaError::JournalWriteFailed {
        reason: format!("{} '{}': {}", what, path.display(), e),
    }
}

/// Every entry in the journal file at `path`; a missing file reads as empty.
pub fn read_entries(path: &Path) -> RemediaResult<Vec<JournalEntry>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(write_failed(path, "failed to read", e)),
    };

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .map_err(|e| write_failed(path, &format!("bad entry on line {} of", idx + 1), e))
        })
        .collect()
}

pub struct JsonlJournal {
    path: PathBuf,
    head: Mutex<ChainHead>,
}

impl JsonlJournal {
    /// Open `path` for appending, creating it on first write.
    ///
    /// # Errors
    ///
    /// `JournalWriteFailed` if the existing file is unreadable or its chain
    /// does not verify; new entries are never appended to a broken chain.
    pub fn open(path: impl Into<PathBuf>) -> RemediaResult<Self> {
        let path = path.into();
        let existing = read_entries(&path)?;
        if !verify_chain(&existing) {
            return Err(RemediaError::JournalWriteFailed {
                reason: format!("existing journal '{}' fails verification", path.display()),
            });
        }

        info!(
            path = %path.display(),
            entries = existing.len(),
            "journal opened"
        );
        Ok(Self {
            head: Mutex::new(ChainHead::after(&existing)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file and check its chain.
    pub fn verify(&self) -> RemediaResult<bool> {
        Ok(verify_chain(&read_entries(&self.path)?))
    }
}

impl ConsultationJournal for JsonlJournal {
    fn append(&self, summary: &ConsultationSummary) -> RemediaResult<()> {
        let mut head = self.head.lock().map_err(|e| RemediaError::JournalWriteFailed {
            reason: format!("journal head lock poisoned: {}", e),
        })?;

        let entry = head.link(summary)?;
        let mut line = serde_json::to_string(&entry)
            .map_err(|e| write_failed(&self.path, "failed to encode entry for", e))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| write_failed(&self.path, "failed to open", e))?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| write_failed(&self.path, "failed to append to", e))?;

        head.advance(&entry);
        debug!(
            sequence = entry.sequence,
            path = %self.path.display(),
            "journal entry written"
        );
        Ok(())
    }
}
