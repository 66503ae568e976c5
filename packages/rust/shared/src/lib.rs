//! Shared types, error model, and configuration for repogov.
//!
//! This crate is the foundation depended on by all other repogov crates.
//! It provides:
//! - [`RepoGovError`] - the unified error type
//! - Domain types ([`Identifier`], [`SummaryRow`], [`LifecycleState`], [`HitlStatus`])
//! - Configuration ([`RepoConfig`], [`RepoPaths`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    CONFIG_FILE_NAME, GithubConfig, IdsConfig, PathsConfig, RepoConfig, RepoPaths, SafetyConfig,
    TasksConfig, config_file_path, init_config, load_config, load_config_from, require_token,
};
pub use error::{RepoGovError, Result};
pub use types::{HitlStatus, Identifier, LifecycleState, SummaryRow, WaiverState};
