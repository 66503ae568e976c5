//! Structured JSON logs of agent work on a task.
//!
//! A log is created once per task session and appended to as actions and
//! verification evidence accumulate. It records a reasoning summary, never
//! raw reasoning.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use repogov_shared::{RepoGovError, Result};
use repogov_storage::WritePlan;

use crate::context::RepoContext;

const NOTES: &str = "No secrets. No private data. No raw chain-of-thought.";
const FILE_STAMP: &str = "%Y%m%d-%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Modify,
    Delete,
    Read,
    Verify,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvidenceKind {
    Build,
    Test,
    Lint,
    TypeCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStatus {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub filepath: String,
    pub timestamp: DateTime<Utc>,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(rename = "type")]
    pub kind: EvidenceKind,
    pub command: String,
    pub output: String,
    pub status: EvidenceStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMetadata {
    pub agent_id: String,
    pub task_id: String,
    pub status: LogStatus,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// On-disk log document. Free-form entries (decisions, risks, follow-ups)
/// are kept as raw JSON so hand-edited logs still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLog {
    pub intent: String,
    #[serde(default)]
    pub plan: Vec<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub decisions: Vec<serde_json::Value>,
    #[serde(default)]
    pub risks: Vec<serde_json::Value>,
    #[serde(default)]
    pub follow_ups: Vec<serde_json::Value>,
    #[serde(default)]
    pub reasoning_summary: String,
    #[serde(default)]
    pub notes: String,
    pub metadata: LogMetadata,
}

impl AgentLog {
    pub fn new(agent_id: &str, task_id: &str, intent: &str, plan: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            intent: intent.to_string(),
            plan,
            actions: Vec::new(),
            evidence: Vec::new(),
            decisions: Vec::new(),
            risks: Vec::new(),
            follow_ups: Vec::new(),
            reasoning_summary: String::new(),
            notes: NOTES.to_string(),
            metadata: LogMetadata {
                agent_id: agent_id.to_string(),
                task_id: task_id.to_string(),
                status: LogStatus::Pending,
                created: now,
                updated: now,
            },
        }
    }

    /// Pretty JSON, two-space indented, with a final newline.
    pub fn render(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| RepoGovError::parse(format!("failed to serialize agent log: {e}")))?;
        json.push('\n');
        Ok(json)
    }
}

/// File name for a log started at `now`.
pub fn file_name(task_id: &str, now: DateTime<Utc>) -> String {
    format!("log-{task_id}-{}.json", now.format(FILE_STAMP))
}

#[derive(Debug, Clone)]
pub struct CreatedLog {
    pub path: PathBuf,
    pub log: AgentLog,
    pub plan: WritePlan,
}

#[instrument(skip_all, fields(task = task_id, agent = agent_id))]
pub fn create(
    ctx: &RepoContext,
    agent_id: &str,
    task_id: &str,
    intent: &str,
    plan: Vec<String>,
    now: DateTime<Utc>,
) -> Result<CreatedLog> {
    if task_id.trim().is_empty() || task_id.contains(['/', '\\']) {
        return Err(RepoGovError::validation(format!(
            "'{task_id}' cannot be used in a log file name"
        )));
    }
    let path = ctx.paths.logs_dir.join(file_name(task_id, now));
    if ctx.store.read_optional(&path)?.is_some() {
        return Err(RepoGovError::validation(format!(
            "log {} already exists",
            ctx.display(&path)
        )));
    }

    let log = AgentLog::new(agent_id, task_id, intent, plan, now);
    let mut writes = WritePlan::new();
    writes.push(&path, log.render()?);
    info!(path = %ctx.display(&path), "planned agent log");
    Ok(CreatedLog {
        path,
        log,
        plan: writes,
    })
}

/// Load an existing log; `path` may be root-relative.
pub fn load(ctx: &RepoContext, path: &Path) -> Result<AgentLog> {
    let path = ctx.resolve(path);
    let text = ctx.store.read_required(&path)?;
    serde_json::from_str(&text)
        .map_err(|e| RepoGovError::parse(format!("{} is not an agent log: {e}", ctx.display(&path))))
}

fn update<F>(ctx: &RepoContext, path: &Path, now: DateTime<Utc>, edit: F) -> Result<WritePlan>
where
    F: FnOnce(&mut AgentLog),
{
    let mut log = load(ctx, path)?;
    edit(&mut log);
    log.metadata.updated = now;
    let mut plan = WritePlan::new();
    plan.push(ctx.resolve(path), log.render()?);
    Ok(plan)
}

#[instrument(skip_all, fields(kind = ?kind, file = filepath))]
pub fn add_action(
    ctx: &RepoContext,
    path: &Path,
    kind: ActionKind,
    filepath: &str,
    reasoning: &str,
    verification: Option<&str>,
    now: DateTime<Utc>,
) -> Result<WritePlan> {
    update(ctx, path, now, |log| {
        log.actions.push(Action {
            kind,
            filepath: filepath.to_string(),
            timestamp: now,
            reasoning: reasoning.to_string(),
            verification: verification.map(str::to_string),
        });
    })
}

#[instrument(skip_all, fields(kind = ?kind, status = ?status))]
pub fn add_evidence(
    ctx: &RepoContext,
    path: &Path,
    kind: EvidenceKind,
    command: &str,
    output: &str,
    status: EvidenceStatus,
    now: DateTime<Utc>,
) -> Result<WritePlan> {
    update(ctx, path, now, |log| {
        log.evidence.push(Evidence {
            kind,
            command: command.to_string(),
            output: output.to_string(),
            status,
            timestamp: now,
        });
    })
}
