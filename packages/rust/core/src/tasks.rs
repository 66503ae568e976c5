//! Task board workflows: promote, complete, archive, reprioritize.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use tracing::{info, instrument, warn};

use repogov_markdown::{Document, locate, record_starts};
use repogov_shared::{Identifier, LifecycleState, RepoGovError, Result};
use repogov_storage::WritePlan;

use crate::context::RepoContext;
use crate::lifecycle::{DATE_FORMAT, classify_record};
use crate::transplant::{
    FieldUpdate, Placement, mark_completed, mark_completed_in_file, require_record, transplant,
};

/// Highest priority board number (`P3TODO.md`).
pub const MAX_PRIORITY: u8 = 3;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("task validation regex")
}

static TASK_ID_RE: LazyLock<Regex> = LazyLock::new(|| case_insensitive(r"\[TASK-\d+\]"));
static PRIORITY_RE: LazyLock<Regex> =
    LazyLock::new(|| case_insensitive(r"\*\*Priority\*\*:\s*(P0|P1|P2|P3)"));
static STATUS_RE: LazyLock<Regex> = LazyLock::new(|| case_insensitive(r"\*\*Status\*\*:"));
static CRITERIA_RE: LazyLock<Regex> = LazyLock::new(|| case_insensitive(r"Acceptance Criteria"));

/// Names of the required task fields missing from `record`, in a fixed order.
pub fn missing_task_fields(record: &[String]) -> Vec<String> {
    let text = record.join("\n");
    [
        (&*TASK_ID_RE, "Task ID"),
        (&*PRIORITY_RE, "Priority"),
        (&*STATUS_RE, "Status"),
        (&*CRITERIA_RE, "Acceptance Criteria"),
    ]
    .into_iter()
    .filter(|(re, _)| !re.is_match(&text))
    .map(|(_, name)| name.to_string())
    .collect()
}

// ---------------------------------------------------------------------------
// Promote
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct PromoteOptions {
    /// Stop after validation.
    pub validate_only: bool,
    /// Promote even when the TODO board is at capacity.
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct Promotion {
    pub id: Identifier,
    /// Tasks on the TODO board before the promotion.
    pub active_before: usize,
    /// Empty for validate-only runs.
    pub plan: WritePlan,
}

/// Validate a backlog task and move it into the TODO board's active section.
#[instrument(skip_all, fields(%id))]
pub fn promote(ctx: &RepoContext, id: &Identifier, opts: PromoteOptions) -> Result<Promotion> {
    let backlog_path = &ctx.paths.backlog;
    let todo_path = &ctx.paths.todo;
    let backlog_name = ctx.display(backlog_path);

    let mut backlog = ctx.load_existing(backlog_path)?;
    let span = require_record(&backlog, id, &backlog_name)?;
    let missing = missing_task_fields(backlog.slice(span.content_range()));
    if !missing.is_empty() {
        return Err(RepoGovError::missing_fields(id.to_string(), missing));
    }
    info!("task format is valid");

    let mut todo = ctx.load_document(todo_path)?;
    let active_before = record_starts(&todo, id.prefix()).len();

    if opts.validate_only {
        return Ok(Promotion {
            id: id.clone(),
            active_before,
            plan: WritePlan::new(),
        });
    }

    let max_active = ctx.config.tasks.max_active;
    if active_before >= max_active {
        if !opts.force {
            return Err(RepoGovError::validation(format!(
                "{} already holds {active_before} tasks (maximum {max_active}); pass --force to promote anyway",
                ctx.display(todo_path)
            )));
        }
        warn!(active_before, max_active, "promoting past the active task limit");
    }

    let placement = Placement::Section(ctx.config.tasks.active_section.clone());
    transplant(&mut backlog, &mut todo, id, &placement, &backlog_name)?;

    let mut plan = WritePlan::new();
    plan.push(backlog_path, backlog.render());
    plan.push(todo_path, todo.render());
    info!(active_before, "planned promotion");
    Ok(Promotion {
        id: id.clone(),
        active_before,
        plan,
    })
}

// ---------------------------------------------------------------------------
// Complete
// ---------------------------------------------------------------------------

/// Mark a task completed on `board`. Idempotent.
pub fn complete(ctx: &RepoContext, board: &Path, id: &Identifier) -> Result<(FieldUpdate, WritePlan)> {
    mark_completed_in_file(ctx, board, id)
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// State a task is archived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveStatus {
    /// Mark the task completed before moving it.
    Completed,
    /// Move it as it is.
    Archived,
}

#[derive(Debug, Clone)]
pub struct Archival {
    pub board: PathBuf,
    pub archive_file: PathBuf,
    /// Lifecycle of the record as found on the board.
    pub found_state: LifecycleState,
    pub plan: WritePlan,
}

/// First board (`P0TODO.md`..`P3TODO.md`, then `TODO.md`) holding `id`.
pub fn find_board(ctx: &RepoContext, id: &Identifier) -> Result<(PathBuf, Document)> {
    for board in ctx.paths.task_boards() {
        let Some(text) = ctx.store.read_optional(&board)? else {
            continue;
        };
        let doc = Document::parse(&text);
        if locate(&doc, id).is_some() {
            return Ok((board, doc));
        }
    }
    Err(RepoGovError::not_found(format!("{id} in any TODO board")))
}

/// Path of the archive file for `date`.
pub fn archive_file(ctx: &RepoContext, date: NaiveDate) -> PathBuf {
    ctx.paths
        .archive_dir
        .join(format!("TODO_ARCHIVE_{}.md", date.format(DATE_FORMAT)))
}

/// Move a task from its board into the dated archive file.
#[instrument(skip_all, fields(%id))]
pub fn archive(
    ctx: &RepoContext,
    id: &Identifier,
    status: ArchiveStatus,
    today: NaiveDate,
) -> Result<Archival> {
    let (board, mut doc) = find_board(ctx, id)?;
    let board_name = ctx.display(&board);
    let span = require_record(&doc, id, &board_name)?;
    let found_state = classify_record(&doc, &span);

    if status == ArchiveStatus::Completed {
        match mark_completed(&mut doc, id, &board_name) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                warn!(error = %e, "could not mark record completed; archiving as is");
            }
            Err(e) => return Err(e),
        }
    }

    let archive_path = archive_file(ctx, today);
    let mut archive_doc = ctx.load_document(&archive_path)?;
    if archive_doc.is_empty() {
        archive_doc = Document::from_lines([format!("# Task Archive {}", today.format(DATE_FORMAT))]);
    }
    transplant(&mut doc, &mut archive_doc, id, &Placement::EndOfFile, &board_name)?;

    let mut plan = WritePlan::new();
    plan.push(&board, doc.render());
    plan.push(&archive_path, archive_doc.render());
    info!(board = %board_name, archive = %ctx.display(&archive_path), "planned archival");
    Ok(Archival {
        board,
        archive_file: archive_path,
        found_state,
        plan,
    })
}

// ---------------------------------------------------------------------------
// Reprioritize
// ---------------------------------------------------------------------------

/// Move a task between priority boards. Both boards must already exist.
#[instrument(skip_all, fields(%id, from, to))]
pub fn reprioritize(ctx: &RepoContext, id: &Identifier, from: u8, to: u8) -> Result<WritePlan> {
    for p in [from, to] {
        if p > MAX_PRIORITY {
            return Err(RepoGovError::validation(format!(
                "priority P{p} is out of range (P0..P{MAX_PRIORITY})"
            )));
        }
    }
    if from == to {
        return Err(RepoGovError::validation(format!("{id} is already on P{from}")));
    }

    let source_path = ctx.paths.priority_board(from);
    let target_path = ctx.paths.priority_board(to);
    let mut source = ctx.load_existing(&source_path)?;
    let mut target = ctx.load_existing(&target_path)?;
    transplant(
        &mut source,
        &mut target,
        id,
        &Placement::EndOfFile,
        &ctx.display(&source_path),
    )?;

    let mut plan = WritePlan::new();
    plan.push(&source_path, source.render());
    plan.push(&target_path, target.render());
    info!("planned reprioritization");
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use repogov_shared::RepoConfig;
    use repogov_storage::StoreOptions;

    fn fixture(name: &str) -> String {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name);
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"))
    }

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("repogov-tasks-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(dir.join(".repo/tasks")).unwrap();
        dir
    }

    fn ctx_with_fixtures(root: &Path) -> RepoContext {
        std::fs::write(root.join(".repo/tasks/BACKLOG.md"), fixture("tasks/BACKLOG.md")).unwrap();
        std::fs::write(root.join(".repo/tasks/TODO.md"), fixture("tasks/TODO.md")).unwrap();
        RepoContext::new(root, RepoConfig::default(), StoreOptions::default())
    }

    fn id(s: &str) -> Identifier {
        Identifier::parse(s).unwrap()
    }

    #[test]
    fn promote_moves_record_into_active_section() {
        let root = temp_root();
        let ctx = ctx_with_fixtures(&root);
        let promotion = promote(&ctx, &id("TASK-071"), PromoteOptions::default()).unwrap();
        assert_eq!(promotion.active_before, 2);

        let plan = &promotion.plan;
        let backlog = plan.contents_for(&ctx.paths.backlog).unwrap();
        let todo = plan.contents_for(&ctx.paths.todo).unwrap();
        assert!(!backlog.contains("#### [TASK-071]"));
        assert!(backlog.contains("Reference TASK-071 from prose"));

        let todo_doc = Document::parse(todo);
        let span = locate(&todo_doc, &id("TASK-071")).unwrap();
        let rule = todo_doc.lines().iter().position(|l| l == "---").unwrap();
        assert!(span.start < rule, "promoted task must land inside the active section");
        // Source is written before target.
        assert_eq!(plan.writes()[0].path, ctx.paths.backlog);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn promote_reports_every_missing_field() {
        let root = temp_root();
        let ctx = ctx_with_fixtures(&root);
        let err = promote(&ctx, &id("TASK-072"), PromoteOptions::default()).unwrap_err();
        match err {
            RepoGovError::ValidationFailed { subject, missing } => {
                assert_eq!(subject, "TASK-072");
                assert_eq!(missing, vec!["Acceptance Criteria"]);
            }
            other => panic!("unexpected error {other}"),
        }
        let err = promote(&ctx, &id("TASK-080"), PromoteOptions::default()).unwrap_err();
        assert!(err.to_string().contains("missing Priority"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn validate_only_plans_nothing() {
        let root = temp_root();
        let ctx = ctx_with_fixtures(&root);
        let opts = PromoteOptions {
            validate_only: true,
            force: false,
        };
        assert!(promote(&ctx, &id("TASK-071"), opts).unwrap().plan.is_empty());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn full_board_needs_force() {
        let root = temp_root();
        let mut config = RepoConfig::default();
        config.tasks.max_active = 2;
        std::fs::write(root.join(".repo/tasks/BACKLOG.md"), fixture("tasks/BACKLOG.md")).unwrap();
        std::fs::write(root.join(".repo/tasks/TODO.md"), fixture("tasks/TODO.md")).unwrap();
        let ctx = RepoContext::new(&root, config, StoreOptions::default());

        let err = promote(&ctx, &id("TASK-071"), PromoteOptions::default()).unwrap_err();
        assert!(matches!(err, RepoGovError::Validation { .. }));

        let forced = PromoteOptions {
            validate_only: false,
            force: true,
        };
        assert!(!promote(&ctx, &id("TASK-071"), forced).unwrap().plan.is_empty());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn promote_into_missing_todo_creates_section() {
        let root = temp_root();
        std::fs::write(root.join(".repo/tasks/BACKLOG.md"), fixture("tasks/BACKLOG.md")).unwrap();
        let ctx = RepoContext::new(&root, RepoConfig::default(), StoreOptions::default());
        let promotion = promote(&ctx, &id("TASK-071"), PromoteOptions::default()).unwrap();
        let todo = promotion.plan.contents_for(&ctx.paths.todo).unwrap();
        assert!(todo.starts_with("## Active Tasks\n\n#### [TASK-071] Add record locator\n"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn archive_marks_and_moves_from_first_board() {
        let root = temp_root();
        let ctx = ctx_with_fixtures(&root);
        std::fs::write(ctx.paths.priority_board(1), "# P1\n\n- [ ] [TASK-090] Ship\n  notes\n").unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

        let archival = archive(&ctx, &id("TASK-090"), ArchiveStatus::Completed, today).unwrap();
        assert_eq!(archival.board, ctx.paths.priority_board(1));
        assert_eq!(archival.found_state, LifecycleState::Pending);
        assert!(archival.archive_file.ends_with("TODO_ARCHIVE_2025-01-10.md"));

        let board = archival.plan.contents_for(&archival.board).unwrap();
        assert_eq!(board, "# P1\n");
        let archived = archival.plan.contents_for(&archival.archive_file).unwrap();
        assert_eq!(
            archived,
            "# Task Archive 2025-01-10\n\n- [x] [TASK-090] Ship\n  notes\n"
        );
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn archive_completed_heading_without_status_still_moves() {
        let root = temp_root();
        let ctx = ctx_with_fixtures(&root);
        std::fs::write(
            ctx.paths.priority_board(1),
            "# P1\n\n#### [TASK-091] Docs\n**Priority**: P1\nbody\n",
        )
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

        let archival = archive(&ctx, &id("TASK-091"), ArchiveStatus::Completed, today).unwrap();
        assert_eq!(archival.plan.contents_for(&archival.board).unwrap(), "# P1\n");
        assert_eq!(
            archival.plan.contents_for(&archival.archive_file).unwrap(),
            "# Task Archive 2025-01-10\n\n#### [TASK-091] Docs\n**Priority**: P1\nbody\n"
        );
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn archive_of_unknown_task_is_not_found() {
        let root = temp_root();
        let ctx = ctx_with_fixtures(&root);
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let err = archive(&ctx, &id("TASK-999"), ArchiveStatus::Archived, today).unwrap_err();
        assert!(err.is_not_found());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn reprioritize_requires_both_boards() {
        let root = temp_root();
        let ctx = ctx_with_fixtures(&root);
        std::fs::write(ctx.paths.priority_board(3), "# P3\n- [ ] [TASK-100] Later\n").unwrap();
        let err = reprioritize(&ctx, &id("TASK-100"), 3, 0).unwrap_err();
        assert!(err.is_not_found());

        std::fs::write(ctx.paths.priority_board(0), "# P0\n").unwrap();
        let plan = reprioritize(&ctx, &id("TASK-100"), 3, 0).unwrap();
        assert_eq!(plan.contents_for(&ctx.paths.priority_board(3)), Some("# P3\n"));
        assert_eq!(
            plan.contents_for(&ctx.paths.priority_board(0)),
            Some("# P0\n\n- [ ] [TASK-100] Later\n")
        );
        assert!(reprioritize(&ctx, &id("TASK-100"), 3, 7).is_err());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn complete_is_idempotent_on_disk_plan() {
        let root = temp_root();
        let ctx = ctx_with_fixtures(&root);
        let (update, plan) = complete(&ctx, &ctx.paths.todo, &id("TASK-061")).unwrap();
        assert_eq!(update, FieldUpdate::Unchanged);
        assert!(plan.is_empty());

        let (update, plan) = complete(&ctx, &ctx.paths.todo, &id("TASK-060")).unwrap();
        assert_eq!(update, FieldUpdate::Changed);
        assert!(plan.writes()[0].contents.contains("- [x] [TASK-060] Wire configuration"));
        let _ = std::fs::remove_dir_all(&root);
    }
}
