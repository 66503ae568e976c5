//! The resolved repository every workflow runs against.

use std::path::{Path, PathBuf};

use repogov_markdown::Document;
use repogov_shared::{RepoConfig, RepoGovError, RepoPaths, Result};
use repogov_storage::{Store, StoreOptions};

/// Configuration, absolute paths and the store for one project root.
#[derive(Debug, Clone)]
pub struct RepoContext {
    pub config: RepoConfig,
    pub paths: RepoPaths,
    pub store: Store,
}

impl RepoContext {
    /// Resolve `config` against an already-absolute `root`.
    pub fn new(root: &Path, config: RepoConfig, options: StoreOptions) -> Self {
        let paths = RepoPaths::resolve(root, &config);
        Self {
            config,
            paths,
            store: Store::new(options),
        }
    }

    pub fn root(&self) -> &Path {
        &self.paths.root
    }

    /// Load a document; a missing file is an empty document.
    pub fn load_document(&self, path: &Path) -> Result<Document> {
        Ok(self
            .store
            .read_optional(path)?
            .map(|text| Document::parse(&text))
            .unwrap_or_default())
    }

    /// Load a document that must exist.
    pub fn load_existing(&self, path: &Path) -> Result<Document> {
        let text = self.store.read_optional(path)?.ok_or_else(|| {
            RepoGovError::not_found(format!("document {}", self.paths.relative(path)))
        })?;
        Ok(Document::parse(&text))
    }

    /// Resolve a caller-supplied path against the root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.paths.root.join(path)
        }
    }

    /// Root-relative display form of a path.
    pub fn display(&self, path: &Path) -> String {
        self.paths.relative(path)
    }
}
