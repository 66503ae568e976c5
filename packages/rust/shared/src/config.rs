//! Repository configuration for repogov.
//!
//! Project config lives at `<root>/.repo/repogov.toml`.
//! CLI flags override config file values, which override defaults.
//! The project root is always passed in explicitly; nothing here looks at
//! the process working directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RepoGovError, Result};

/// Config file name inside the `.repo/` directory.
pub const CONFIG_FILE_NAME: &str = "repogov.toml";

/// Governance directory under the project root.
const REPO_DIR_NAME: &str = ".repo";

// ---------------------------------------------------------------------------
// Config structs (matching repogov.toml schema)
// ---------------------------------------------------------------------------

/// Top-level repository config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Document and directory locations, relative to the project root.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Identifier padding widths.
    #[serde(default)]
    pub ids: IdsConfig,

    /// Task board settings.
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Pull request service settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Concurrency safeguards.
    #[serde(default)]
    pub safety: SafetyConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_backlog")]
    pub backlog: String,
    #[serde(default = "default_todo")]
    pub todo: String,
    /// Directory holding `P0TODO.md` .. `P3TODO.md`.
    #[serde(default = "default_priority_dir")]
    pub priority_dir: String,
    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,
    #[serde(default = "default_hitl_index")]
    pub hitl_index: String,
    #[serde(default = "default_hitl_dir")]
    pub hitl_dir: String,
    #[serde(default = "default_waivers_dir")]
    pub waivers_dir: String,
    #[serde(default = "default_logs_dir")]
    pub logs_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            backlog: default_backlog(),
            todo: default_todo(),
            priority_dir: default_priority_dir(),
            archive_dir: default_archive_dir(),
            hitl_index: default_hitl_index(),
            hitl_dir: default_hitl_dir(),
            waivers_dir: default_waivers_dir(),
            logs_dir: default_logs_dir(),
        }
    }
}

fn default_backlog() -> String {
    ".repo/tasks/BACKLOG.md".into()
}
fn default_todo() -> String {
    ".repo/tasks/TODO.md".into()
}
fn default_priority_dir() -> String {
    ".".into()
}
fn default_archive_dir() -> String {
    ".repo/archive/tasks".into()
}
fn default_hitl_index() -> String {
    ".repo/policy/HITL.md".into()
}
fn default_hitl_dir() -> String {
    ".repo/hitl".into()
}
fn default_waivers_dir() -> String {
    ".repo/waivers".into()
}
fn default_logs_dir() -> String {
    ".repo/logs".into()
}

/// `[ids]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdsConfig {
    #[serde(default = "default_task_width")]
    pub task_width: usize,
    #[serde(default = "default_four")]
    pub hitl_width: usize,
    #[serde(default = "default_four")]
    pub waiver_width: usize,
}

impl Default for IdsConfig {
    fn default() -> Self {
        Self {
            task_width: default_task_width(),
            hitl_width: default_four(),
            waiver_width: default_four(),
        }
    }
}

fn default_task_width() -> usize {
    3
}
fn default_four() -> usize {
    crate::types::DEFAULT_ID_WIDTH
}

/// `[tasks]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Section of the TODO board that promoted tasks are inserted into.
    #[serde(default = "default_active_section")]
    pub active_section: String,

    /// Maximum number of tasks on the TODO board before promotion is refused.
    #[serde(default = "default_max_active")]
    pub max_active: usize,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            active_section: default_active_section(),
            max_active: default_max_active(),
        }
    }
}

fn default_active_section() -> String {
    "Active Tasks".into()
}
fn default_max_active() -> usize {
    5
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Name of the env var holding the token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// REST API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// `owner/name`; empty means auto-detect.
    #[serde(default)]
    pub repository: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            api_base: default_api_base(),
            repository: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_api_base() -> String {
    "https://api.github.com".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[safety]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Hold an exclusive advisory lock around each read-modify-write.
    #[serde(default)]
    pub lock: bool,

    /// Journal multi-document writes so an interrupted move can be replayed.
    #[serde(default)]
    pub journal: bool,
}

// ---------------------------------------------------------------------------
// Resolved paths (runtime, merged from config + root)
// ---------------------------------------------------------------------------

/// Absolute locations of every governance document, resolved against the root.
#[derive(Debug, Clone)]
pub struct RepoPaths {
    pub root: PathBuf,
    pub backlog: PathBuf,
    pub todo: PathBuf,
    pub priority_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub hitl_index: PathBuf,
    pub hitl_dir: PathBuf,
    pub waivers_dir: PathBuf,
    pub logs_dir: PathBuf,
    /// Lock file used when `[safety] lock` is on.
    pub lock_file: PathBuf,
    /// Journal file used when `[safety] journal` is on.
    pub journal_file: PathBuf,
}

impl RepoPaths {
    /// Resolve every configured path against `root`.
    pub fn resolve(root: &Path, config: &RepoConfig) -> Self {
        let p = &config.paths;
        let repo_dir = root.join(REPO_DIR_NAME);
        Self {
            root: root.to_path_buf(),
            backlog: root.join(&p.backlog),
            todo: root.join(&p.todo),
            priority_dir: root.join(&p.priority_dir),
            archive_dir: root.join(&p.archive_dir),
            hitl_index: root.join(&p.hitl_index),
            hitl_dir: root.join(&p.hitl_dir),
            waivers_dir: root.join(&p.waivers_dir),
            logs_dir: root.join(&p.logs_dir),
            lock_file: repo_dir.join(".repogov.lock"),
            journal_file: repo_dir.join(".repogov-journal.json"),
        }
    }

    /// Path of a priority board, e.g. `P0TODO.md`.
    pub fn priority_board(&self, priority: u8) -> PathBuf {
        self.priority_dir.join(format!("P{priority}TODO.md"))
    }

    /// Boards searched when archiving: `P0TODO.md`..`P3TODO.md`, then the TODO board.
    pub fn task_boards(&self) -> Vec<PathBuf> {
        let mut boards: Vec<PathBuf> = (0..=3).map(|p| self.priority_board(p)).collect();
        boards.push(self.todo.clone());
        boards
    }

    /// Express `path` relative to the root with forward slashes, for index tables.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config file (`<root>/.repo/repogov.toml`).
pub fn config_file_path(root: &Path) -> PathBuf {
    root.join(REPO_DIR_NAME).join(CONFIG_FILE_NAME)
}

/// Load the repository config. Returns defaults if the file does not exist.
pub fn load_config(root: &Path) -> Result<RepoConfig> {
    let path = config_file_path(root);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(RepoConfig::default());
    }

    load_config_from(&path)
}

/// Load the repository config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<RepoConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RepoGovError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| RepoGovError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file under `root`. Returns the path to the created file.
pub fn init_config(root: &Path) -> Result<PathBuf> {
    let path = config_file_path(root);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| RepoGovError::io(dir, e))?;
    }

    let config = RepoConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| RepoGovError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| RepoGovError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the pull request token from the configured env var.
pub fn require_token(config: &RepoConfig) -> Result<String> {
    let var_name = &config.github.token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(RepoGovError::config(format!(
            "GitHub token not found. Set the {var_name} environment variable."
        ))),
    }
}
