//! File-backed storage for governance documents.
//!
//! Every operation is a whole-file read followed by whole-file writes. Core
//! workflows never write directly: they return a [`WritePlan`], and the
//! [`Store`] applies it in order, each file via temp-file + rename.
//!
//! Two safeguards are optional and off by default:
//! - an advisory exclusive lock held for one read-compute-write sequence
//!   ([`Store::lock`]);
//! - a journal of the full plan written before a multi-file plan is applied,
//!   so an interrupted move can be replayed ([`Store::recover`]).
//!
//! With both disabled, concurrent invocations race and the last writer wins.

mod journal;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info, instrument, warn};

use repogov_shared::{RepoGovError, RepoPaths, Result};

pub use journal::{Journal, JournalEntry, sha256_hex};

// ---------------------------------------------------------------------------
// Write plans
// ---------------------------------------------------------------------------

/// One whole-file overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWrite {
    pub path: PathBuf,
    pub contents: String,
}

/// Ordered list of file writes produced by one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WritePlan {
    writes: Vec<FileWrite>,
}

impl WritePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a write. A later write to the same path replaces the earlier one
    /// in place, keeping the original position.
    pub fn push(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        let path = path.into();
        let contents = contents.into();
        match self.writes.iter_mut().find(|w| w.path == path) {
            Some(existing) => existing.contents = contents,
            None => self.writes.push(FileWrite { path, contents }),
        }
    }

    pub fn writes(&self) -> &[FileWrite] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Contents queued for `path`, if any.
    pub fn contents_for(&self, path: &Path) -> Option<&str> {
        self.writes
            .iter()
            .find(|w| w.path == path)
            .map(|w| w.contents.as_str())
    }
}

impl IntoIterator for WritePlan {
    type Item = FileWrite;
    type IntoIter = std::vec::IntoIter<FileWrite>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Options for a [`Store`].
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Lock file to take for the duration of an invocation.
    pub lock_file: Option<PathBuf>,
    /// Journal file written before multi-file plans.
    pub journal_file: Option<PathBuf>,
}

impl StoreOptions {
    /// Options from resolved paths and the two safety switches.
    pub fn from_paths(paths: &RepoPaths, lock: bool, journal: bool) -> Self {
        Self {
            lock_file: lock.then(|| paths.lock_file.clone()),
            journal_file: journal.then(|| paths.journal_file.clone()),
        }
    }
}

/// Reads and writes governance documents on disk.
#[derive(Debug, Clone, Default)]
pub struct Store {
    options: StoreOptions,
}

/// Held exclusive lock. Released on drop.
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "failed to release lock");
        }
    }
}

/// What [`Store::recover`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// No journal was outstanding.
    Clean,
    /// The journaled plan was re-applied to these paths.
    Replayed(Vec<PathBuf>),
}

impl Store {
    pub fn new(options: StoreOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Take the exclusive lock when one is configured.
    ///
    /// Fails immediately with [`RepoGovError::Lock`] when another process holds it.
    pub fn lock(&self) -> Result<Option<LockGuard>> {
        let Some(path) = &self.options.lock_file else {
            return Ok(None);
        };
        ensure_parent_dir(path)?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| RepoGovError::io(path, e))?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => {
                debug!(path = %path.display(), "acquired exclusive lock");
                Ok(Some(LockGuard {
                    file,
                    path: path.clone(),
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(RepoGovError::Lock {
                path: path.clone(),
                message: "held by another process".to_string(),
            }),
            Err(e) => Err(RepoGovError::Lock {
                path: path.clone(),
                message: e.to_string(),
            }),
        }
    }

    /// Read a file, `None` when it does not exist.
    pub fn read_optional(&self, path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RepoGovError::io(path, e)),
        }
    }

    /// Read a file that must exist; a missing file is [`RepoGovError::NotFound`].
    pub fn read_required(&self, path: &Path) -> Result<String> {
        self.read_optional(path)?
            .ok_or_else(|| RepoGovError::not_found(format!("file {}", path.display())))
    }

    /// File names in `dir`, sorted. A missing directory is empty.
    pub fn list_dir(&self, dir: &Path) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RepoGovError::io(dir, e)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RepoGovError::io(dir, e))?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Apply a plan in order.
    ///
    /// With a journal configured, plans touching more than one file are
    /// journaled first and the journal is removed after the last write. A
    /// failure part-way leaves the journal in place for [`Store::recover`].
    #[instrument(skip_all, fields(writes = plan.len()))]
    pub fn apply(&self, plan: &WritePlan) -> Result<()> {
        if plan.is_empty() {
            debug!("nothing to write");
            return Ok(());
        }

        let journal = match &self.options.journal_file {
            Some(path) if plan.len() > 1 => {
                Journal::from_plan(plan).write(path)?;
                Some(path)
            }
            _ => None,
        };

        for write in plan.writes() {
            write_atomic(&write.path, &write.contents)?;
        }

        if let Some(path) = journal {
            Journal::clear(path)?;
        }
        info!(files = plan.len(), "applied write plan");
        Ok(())
    }

    /// Replay an outstanding journal, if any.
    #[instrument(skip_all)]
    pub fn recover(&self) -> Result<Recovery> {
        let Some(path) = &self.options.journal_file else {
            return Err(RepoGovError::config(
                "recovery needs a journal file; enable [safety] journal or pass --journal",
            ));
        };
        let Some(journal) = Journal::read(path)? else {
            return Ok(Recovery::Clean);
        };
        journal.verify()?;

        let mut replayed = Vec::with_capacity(journal.entries.len());
        for entry in &journal.entries {
            write_atomic(&entry.path, &entry.contents)?;
            replayed.push(entry.path.clone());
        }
        Journal::clear(path)?;
        info!(files = replayed.len(), "replayed journal");
        Ok(Recovery::Replayed(replayed))
    }
}

/// Write `contents` to a sibling temp file, then rename it over `path`.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| RepoGovError::validation(format!("not a file path: {}", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, contents).map_err(|e| RepoGovError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| RepoGovError::io(path, e))?;

    debug!(path = %path.display(), size = contents.len(), "wrote file");
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| RepoGovError::io(parent, e))
        }
        _ => Ok(()),
    }
}
