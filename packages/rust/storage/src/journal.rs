//! Move journal.
//!
//! Before a multi-file plan is applied the complete plan is serialized here,
//! whole-file contents included, so replaying it is idempotent.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use repogov_shared::{RepoGovError, Result};

use crate::WritePlan;

const JOURNAL_VERSION: u32 = 1;

/// A serialized write plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub version: u32,
    /// RFC 3339 timestamp of when the plan was journaled.
    pub created: String,
    pub entries: Vec<JournalEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub path: PathBuf,
    pub sha256: String,
    pub contents: String,
}

impl Journal {
    pub fn from_plan(plan: &WritePlan) -> Self {
        Self {
            version: JOURNAL_VERSION,
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            entries: plan
                .writes()
                .iter()
                .map(|w| JournalEntry {
                    path: w.path.clone(),
                    sha256: sha256_hex(&w.contents),
                    contents: w.contents.clone(),
                })
                .collect(),
        }
    }

    /// Persist the journal (temp file + rename, like every other write).
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| RepoGovError::parse(format!("failed to serialize journal: {e}")))?;
        crate::write_atomic(path, &json)?;
        tracing::debug!(path = %path.display(), entries = self.entries.len(), "journal written");
        Ok(())
    }

    /// Load an outstanding journal, `None` when there is none.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepoGovError::io(path, e)),
        };
        let journal: Self = serde_json::from_str(&text).map_err(|e| {
            RepoGovError::parse(format!("journal {} is unreadable: {e}", path.display()))
        })?;
        if journal.version != JOURNAL_VERSION {
            return Err(RepoGovError::parse(format!(
                "journal {} has unsupported version {}",
                path.display(),
                journal.version
            )));
        }
        Ok(Some(journal))
    }

    /// Check every entry's digest against its contents.
    pub fn verify(&self) -> Result<()> {
        for entry in &self.entries {
            if sha256_hex(&entry.contents) != entry.sha256 {
                return Err(RepoGovError::parse(format!(
                    "journal entry for {} does not match its digest",
                    entry.path.display()
                )));
            }
        }
        Ok(())
    }

    pub fn clear(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RepoGovError::io(path, e)),
        }
    }
}

/// Lower-case hex SHA-256 of `contents`.
pub fn sha256_hex(contents: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("repogov-journal-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn journal_roundtrip_through_disk() {
        let dir = temp_dir();
        let mut plan = WritePlan::new();
        plan.push(dir.join("a.md"), "alpha\n");
        let journal = Journal::from_plan(&plan);
        let path = dir.join("journal.json");
        journal.write(&path).unwrap();

        let loaded = Journal::read(&path).unwrap().unwrap();
        assert_eq!(loaded, journal);
        loaded.verify().unwrap();

        Journal::clear(&path).unwrap();
        assert!(Journal::read(&path).unwrap().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn tampered_entry_fails_verification() {
        let mut plan = WritePlan::new();
        plan.push("/x.md", "original");
        let mut journal = Journal::from_plan(&plan);
        journal.entries[0].contents.push_str(" edited");
        assert!(matches!(journal.verify(), Err(RepoGovError::Parse { .. })));
    }

    #[test]
    fn digest_is_lowercase_hex() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
