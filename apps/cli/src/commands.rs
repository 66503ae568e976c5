//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, eyre};
use tracing::{info, warn};

use repogov_core::agent_log::{self, ActionKind, EvidenceKind, EvidenceStatus};
use repogov_core::hitl::{self, ACTIVE_TABLE, ARCHIVED_TABLE, HitlCategory, NewHitlItem};
use repogov_core::tasks::{self, ArchiveStatus, PromoteOptions};
use repogov_core::waiver::{self, NewWaiver, WaiverSummary};
use repogov_core::{
    FieldMatcher, FieldUpdate, Placement, RepoContext, Scope, allocate, move_record,
    mutate_field_in_file, parse_date,
};
use repogov_github::{GithubClient, GithubOptions, Repository, pr_number_from_event};
use repogov_markdown::locate;
use repogov_shared::{
    Identifier, RepoGovError, RepoPaths, init_config, load_config, require_token,
};
use repogov_storage::{LockGuard, Recovery, StoreOptions, WritePlan};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// repogov: governance records kept as plain markdown.
#[derive(Parser)]
#[command(
    name = "repogov",
    version,
    about = "Manage task boards, HITL items, waivers and agent logs stored as markdown.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Project root. Every configured path is resolved against it.
    #[arg(long, env = "REPOGOV_ROOT", default_value = ".", global = true)]
    pub root: PathBuf,

    /// Print what would be written instead of writing it.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Hold an exclusive lock on `.repo/.repogov.lock` for the whole command.
    #[arg(long, global = true)]
    pub lock: bool,

    /// Journal multi-file writes so an interrupted move can be recovered.
    #[arg(long, global = true)]
    pub journal: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Task board workflows.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Human-in-the-loop items.
    Hitl {
        #[command(subcommand)]
        action: HitlAction,
    },

    /// Policy waivers.
    Waiver {
        #[command(subcommand)]
        action: WaiverAction,
    },

    /// Agent work logs.
    Log {
        #[command(subcommand)]
        action: LogAction,
    },

    /// Print the next free identifier for a prefix.
    NextId {
        /// Identifier prefix, e.g. `TASK`.
        #[arg(long)]
        prefix: String,

        /// Directory of `PREFIX-<digits>` files to scan (repeatable).
        #[arg(long)]
        dir: Vec<PathBuf>,

        /// Document with embedded identifiers to scan (repeatable).
        #[arg(long)]
        doc: Vec<PathBuf>,

        /// Zero-padding width.
        #[arg(long, default_value = "4")]
        width: usize,
    },

    /// Print a record located by its identifier.
    Locate {
        #[arg(long)]
        doc: PathBuf,

        #[arg(long)]
        id: String,
    },

    /// Move a record from one document into another.
    Move {
        #[arg(long)]
        from: PathBuf,

        #[arg(long)]
        to: PathBuf,

        #[arg(long)]
        id: String,

        /// Insert at the end of this section instead of the end of the file.
        #[arg(long)]
        section: Option<String>,
    },

    /// Set a field inside a record.
    SetField {
        #[arg(long)]
        doc: PathBuf,

        #[arg(long)]
        id: String,

        /// Bold field name, e.g. `Status`.
        #[arg(long, required_unless_present = "checkbox")]
        field: Option<String>,

        /// Target the record's checkbox (`x` or ` `).
        #[arg(long, conflicts_with = "field")]
        checkbox: bool,

        #[arg(long)]
        value: String,
    },

    /// Replay an interrupted journaled write.
    Recover,

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum TaskAction {
    /// Validate a backlog task and move it onto the TODO board.
    Promote {
        id: String,

        /// Only check the task format.
        #[arg(long)]
        validate_only: bool,

        /// Promote even when the TODO board is full.
        #[arg(long)]
        force: bool,
    },

    /// Mark a task completed.
    Complete {
        id: String,

        /// Board holding the task (defaults to the first board that has it).
        #[arg(long)]
        board: Option<PathBuf>,
    },

    /// Move a task into today's archive file.
    Archive {
        id: String,

        #[arg(long, value_enum, default_value = "completed")]
        status: ArchiveArg,

        /// Archive date, `YYYY-MM-DD` (defaults to today).
        #[arg(long)]
        date: Option<String>,
    },

    /// Move a task between priority boards.
    Reprioritize {
        id: String,

        #[arg(long)]
        from: u8,

        #[arg(long)]
        to: u8,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum ArchiveArg {
    Completed,
    Archived,
}

#[derive(Subcommand)]
pub(crate) enum HitlAction {
    /// Create a HITL item and register it in the index.
    Create {
        #[arg(long, value_enum)]
        category: CategoryArg,

        #[arg(long)]
        summary: String,

        /// Change types needing this item.
        #[arg(long)]
        required_for: String,

        #[arg(long)]
        owner: String,

        #[arg(long)]
        reviewer: Option<String>,

        /// Related pull request number.
        #[arg(long)]
        pr: Option<String>,

        #[arg(long)]
        adr: Option<String>,

        #[arg(long)]
        waiver: Option<String>,

        #[arg(long)]
        task: Option<String>,
    },

    /// List index rows.
    List {
        /// Show the Archived table instead of Active.
        #[arg(long)]
        archived: bool,
    },

    /// Write the Active items into a pull request description.
    SyncPr {
        /// Pull request number (defaults to the one in GITHUB_EVENT_PATH).
        #[arg(long)]
        pr: Option<u64>,

        /// `owner/name` (defaults to config, GITHUB_REPOSITORY, then the origin remote).
        #[arg(long)]
        repository: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum CategoryArg {
    ExternalIntegration,
    Clarification,
    Risk,
    Feedback,
    Vendor,
}

impl From<CategoryArg> for HitlCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::ExternalIntegration => Self::ExternalIntegration,
            CategoryArg::Clarification => Self::Clarification,
            CategoryArg::Risk => Self::Risk,
            CategoryArg::Feedback => Self::Feedback,
            CategoryArg::Vendor => Self::Vendor,
        }
    }
}

#[derive(Subcommand)]
pub(crate) enum WaiverAction {
    /// Create a waiver file.
    Create {
        /// Policy or gate being waived.
        #[arg(long)]
        waives: String,

        #[arg(long)]
        why: String,

        #[arg(long)]
        scope: String,

        #[arg(long)]
        owner: String,

        /// `YYYY-MM-DD`.
        #[arg(long)]
        expiration: String,

        #[arg(long)]
        remediation: Option<String>,

        #[arg(long)]
        link: Option<String>,
    },

    /// List expired waivers; exits 1 when there are any.
    CheckExpired {
        /// Reference date, `YYYY-MM-DD` (defaults to today).
        #[arg(long)]
        date: Option<String>,
    },

    /// List active waivers.
    List {
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
pub(crate) enum LogAction {
    /// Start a log for a task.
    Create {
        #[arg(long)]
        task: String,

        #[arg(long)]
        agent: String,

        #[arg(long)]
        intent: String,

        /// Plan step (repeatable).
        #[arg(long)]
        plan: Vec<String>,
    },

    /// Record a file action.
    AddAction {
        /// Log file, relative to the root.
        #[arg(long)]
        log: PathBuf,

        #[arg(long = "type", value_enum)]
        kind: ActionArg,

        #[arg(long)]
        file: String,

        #[arg(long)]
        reasoning: String,

        #[arg(long)]
        verification: Option<String>,
    },

    /// Record verification evidence.
    AddEvidence {
        #[arg(long)]
        log: PathBuf,

        #[arg(long = "type", value_enum)]
        kind: EvidenceArg,

        #[arg(long)]
        command: String,

        #[arg(long, default_value = "")]
        output: String,

        #[arg(long, value_enum)]
        status: EvidenceStatusArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum ActionArg {
    Create,
    Modify,
    Delete,
    Read,
    Verify,
    Test,
}

impl From<ActionArg> for ActionKind {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Create => Self::Create,
            ActionArg::Modify => Self::Modify,
            ActionArg::Delete => Self::Delete,
            ActionArg::Read => Self::Read,
            ActionArg::Verify => Self::Verify,
            ActionArg::Test => Self::Test,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum EvidenceArg {
    Build,
    Test,
    Lint,
    TypeCheck,
}

impl From<EvidenceArg> for EvidenceKind {
    fn from(arg: EvidenceArg) -> Self {
        match arg {
            EvidenceArg::Build => Self::Build,
            EvidenceArg::Test => Self::Test,
            EvidenceArg::Lint => Self::Lint,
            EvidenceArg::TypeCheck => Self::TypeCheck,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum EvidenceStatusArg {
    Passed,
    Failed,
    Skipped,
}

impl From<EvidenceStatusArg> for EvidenceStatus {
    fn from(arg: EvidenceStatusArg) -> Self {
        match arg {
            EvidenceStatusArg::Passed => Self::Passed,
            EvidenceStatusArg::Failed => Self::Failed,
            EvidenceStatusArg::Skipped => Self::Skipped,
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write `.repo/repogov.toml` with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "repogov=info",
        1 => "repogov=debug",
        _ => "repogov=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Resolved context plus the lock held for the rest of the command.
struct Session {
    ctx: RepoContext,
    dry_run: bool,
    _lock: Option<LockGuard>,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self> {
        let root = std::fs::canonicalize(&cli.root)
            .map_err(|e| eyre!("project root '{}' is not usable: {e}", cli.root.display()))?;
        let config = load_config(&root)?;

        let paths = RepoPaths::resolve(&root, &config);
        let options = StoreOptions::from_paths(
            &paths,
            cli.lock || config.safety.lock,
            cli.journal || config.safety.journal,
        );
        let ctx = RepoContext::new(&root, config, options);
        let lock = if cli.dry_run { None } else { ctx.store.lock()? };

        Ok(Self {
            ctx,
            dry_run: cli.dry_run,
            _lock: lock,
        })
    }

    /// Write the plan, or print it on a dry run.
    ///
    /// Dry-run stdout is exactly the bytes a real run writes; file markers
    /// go to stderr.
    fn commit(&self, plan: &WritePlan) -> Result<()> {
        if plan.is_empty() {
            return Ok(());
        }
        if self.dry_run {
            for write in plan.writes() {
                eprintln!("--- would write {}", self.ctx.display(&write.path));
                print!("{}", write.contents);
            }
            return Ok(());
        }
        self.ctx.store.apply(plan)?;
        for write in plan.writes() {
            println!("  wrote {}", self.ctx.display(&write.path));
        }
        Ok(())
    }

    fn path(&self, path: &Path) -> PathBuf {
        self.ctx.resolve(path)
    }
}

fn parse_id(s: &str) -> Result<Identifier> {
    Ok(Identifier::parse(s.trim())?)
}

fn date_or_today(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(d) => Ok(parse_date(d)?),
        None => Ok(Local::now().date_naive()),
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    if let Command::Config { action } = &cli.command {
        return cmd_config(&cli.root, action);
    }

    let session = Session::open(&cli)?;
    match cli.command {
        Command::Task { action } => cmd_task(&session, action),
        Command::Hitl { action } => cmd_hitl(&session, action).await,
        Command::Waiver { action } => cmd_waiver(&session, action),
        Command::Log { action } => cmd_log(&session, action),
        Command::NextId {
            prefix,
            dir,
            doc,
            width,
        } => cmd_next_id(&session, &prefix, &dir, &doc, width),
        Command::Locate { doc, id } => cmd_locate(&session, &doc, &id),
        Command::Move {
            from,
            to,
            id,
            section,
        } => {
            let placement = section.map_or(Placement::EndOfFile, Placement::Section);
            let plan = move_record(
                &session.ctx,
                &session.path(&from),
                &session.path(&to),
                &parse_id(&id)?,
                &placement,
            )?;
            session.commit(&plan)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::SetField {
            doc,
            id,
            field,
            checkbox,
            value,
        } => {
            let matcher = match field {
                Some(name) if !checkbox => FieldMatcher::Bold(name),
                _ => FieldMatcher::Checkbox,
            };
            let (update, plan) = mutate_field_in_file(
                &session.ctx,
                &session.path(&doc),
                &parse_id(&id)?,
                &matcher,
                &value,
            )?;
            report_update(update);
            session.commit(&plan)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Recover => cmd_recover(&session),
        Command::Config { .. } => Ok(ExitCode::SUCCESS),
    }
}

fn report_update(update: FieldUpdate) {
    match update {
        FieldUpdate::Changed => info!("field updated"),
        FieldUpdate::Unchanged => info!("field already had that value"),
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

fn cmd_task(session: &Session, action: TaskAction) -> Result<ExitCode> {
    let ctx = &session.ctx;
    match action {
        TaskAction::Promote {
            id,
            validate_only,
            force,
        } => {
            let promotion = tasks::promote(
                ctx,
                &parse_id(&id)?,
                PromoteOptions {
                    validate_only,
                    force,
                },
            )?;
            if validate_only {
                println!("  {} is ready to promote", promotion.id);
                println!(
                    "  {} holds {} of {} active tasks",
                    ctx.display(&ctx.paths.todo),
                    promotion.active_before,
                    ctx.config.tasks.max_active
                );
                return Ok(ExitCode::SUCCESS);
            }
            session.commit(&promotion.plan)?;
        }
        TaskAction::Complete { id, board } => {
            let id = parse_id(&id)?;
            let board = match board {
                Some(board) => session.path(&board),
                None => tasks::find_board(ctx, &id)?.0,
            };
            let (update, plan) = tasks::complete(ctx, &board, &id)?;
            report_update(update);
            session.commit(&plan)?;
        }
        TaskAction::Archive { id, status, date } => {
            let status = match status {
                ArchiveArg::Completed => ArchiveStatus::Completed,
                ArchiveArg::Archived => ArchiveStatus::Archived,
            };
            let today = date_or_today(date.as_deref())?;
            let archival = tasks::archive(ctx, &parse_id(&id)?, status, today)?;
            info!(
                board = %ctx.display(&archival.board),
                state = %archival.found_state,
                "archiving task"
            );
            session.commit(&archival.plan)?;
        }
        TaskAction::Reprioritize { id, from, to } => {
            let plan = tasks::reprioritize(ctx, &parse_id(&id)?, from, to)?;
            session.commit(&plan)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// HITL
// ---------------------------------------------------------------------------

async fn cmd_hitl(session: &Session, action: HitlAction) -> Result<ExitCode> {
    let ctx = &session.ctx;
    match action {
        HitlAction::Create {
            category,
            summary,
            required_for,
            owner,
            reviewer,
            pr,
            adr,
            waiver,
            task,
        } => {
            let item = NewHitlItem {
                category: category.into(),
                summary,
                required_for,
                owner,
                reviewer,
                related_pr: pr,
                related_adr: adr,
                related_waiver: waiver,
                related_task: task,
            };
            let created = hitl::create(ctx, &item, Local::now().date_naive())?;
            session.commit(&created.plan)?;
            if !session.dry_run {
                println!("  created {}", created.id);
            }
        }
        HitlAction::List { archived } => {
            let table = if archived { ARCHIVED_TABLE } else { ACTIVE_TABLE };
            let rows = hitl::list(ctx, table)?;
            if rows.is_empty() {
                println!("  no {} HITL items", table.to_lowercase());
            }
            for row in rows {
                println!(
                    "  {}  {}  {}  {}  {}",
                    row.id, row.category, row.status, row.summary, row.filepath
                );
            }
        }
        HitlAction::SyncPr { pr, repository } => {
            cmd_sync_pr(session, pr, repository).await?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_sync_pr(session: &Session, pr: Option<u64>, repository: Option<String>) -> Result<()> {
    let ctx = &session.ctx;
    let section = hitl::pr_section(ctx)?;

    let token = match require_token(&ctx.config) {
        Ok(token) => Some(token),
        Err(e) => {
            warn!("{e} Printing the section instead of syncing.");
            None
        }
    };
    let token = match token {
        Some(token) if !session.dry_run => token,
        _ => {
            print!("{section}");
            return Ok(());
        }
    };

    let number = match pr {
        Some(number) => number,
        None => {
            let event = std::env::var_os("GITHUB_EVENT_PATH")
                .ok_or_else(|| eyre!("no pull request number: pass --pr or set GITHUB_EVENT_PATH"))?;
            pr_number_from_event(Path::new(&event))?
                .ok_or_else(|| eyre!("the GitHub event payload has no pull request number"))?
        }
    };

    let configured = repository.unwrap_or_else(|| ctx.config.github.repository.clone());
    let env_slug = std::env::var("GITHUB_REPOSITORY").ok();
    let repo = Repository::resolve(&configured, env_slug.as_deref(), ctx.root())?;

    let options = GithubOptions::from_config(&ctx.config.github, token)?;
    let client = GithubClient::new(repo, &options)?;
    hitl::sync_pr(&client, number, &section).await?;
    println!("  synced HITL items to {}#{number}", client.repository());
    Ok(())
}

// ---------------------------------------------------------------------------
// Waivers
// ---------------------------------------------------------------------------

fn cmd_waiver(session: &Session, action: WaiverAction) -> Result<ExitCode> {
    let ctx = &session.ctx;
    match action {
        WaiverAction::Create {
            waives,
            why,
            scope,
            owner,
            expiration,
            remediation,
            link,
        } => {
            let request = NewWaiver {
                waives,
                why,
                scope,
                owner,
                expiration,
                remediation,
                link,
            };
            let created = waiver::create(ctx, &request)?;
            session.commit(&created.plan)?;
            if !session.dry_run {
                println!("  created {}", created.id);
            }
            Ok(ExitCode::SUCCESS)
        }
        WaiverAction::CheckExpired { date } => {
            let reference = date_or_today(date.as_deref())?;
            let expired = waiver::check_expired(ctx, reference)?;
            if expired.is_empty() {
                println!("  no expired waivers");
                return Ok(ExitCode::SUCCESS);
            }
            for w in &expired {
                print_waiver(w);
            }
            Ok(ExitCode::FAILURE)
        }
        WaiverAction::List { date } => {
            let reference = date_or_today(date.as_deref())?;
            let active = waiver::list_active(ctx, reference)?;
            if active.is_empty() {
                println!("  no active waivers");
            }
            for w in &active {
                print_waiver(w);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_waiver(w: &WaiverSummary) {
    println!(
        "  {}  waives: {}  owner: {}  expires: {} ({})",
        w.file, w.waives, w.owner, w.expiration, w.state
    );
}

// ---------------------------------------------------------------------------
// Agent logs
// ---------------------------------------------------------------------------

fn cmd_log(session: &Session, action: LogAction) -> Result<ExitCode> {
    let ctx = &session.ctx;
    let now = Utc::now();
    let plan = match action {
        LogAction::Create {
            task,
            agent,
            intent,
            plan,
        } => {
            let created = agent_log::create(ctx, &agent, &task, &intent, plan, now)?;
            if !session.dry_run {
                println!("  log {}", ctx.display(&created.path));
            }
            created.plan
        }
        LogAction::AddAction {
            log,
            kind,
            file,
            reasoning,
            verification,
        } => agent_log::add_action(
            ctx,
            &log,
            kind.into(),
            &file,
            &reasoning,
            verification.as_deref(),
            now,
        )?,
        LogAction::AddEvidence {
            log,
            kind,
            command,
            output,
            status,
        } => agent_log::add_evidence(
            ctx,
            &log,
            kind.into(),
            &command,
            &output,
            status.into(),
            now,
        )?,
    };
    session.commit(&plan)?;
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// Utilities
// ---------------------------------------------------------------------------

fn cmd_next_id(
    session: &Session,
    prefix: &str,
    dirs: &[PathBuf],
    docs: &[PathBuf],
    width: usize,
) -> Result<ExitCode> {
    if dirs.is_empty() && docs.is_empty() {
        return Err(eyre!("give at least one --dir or --doc to scan"));
    }
    let dirs: Vec<PathBuf> = dirs.iter().map(|d| session.path(d)).collect();
    let docs: Vec<PathBuf> = docs.iter().map(|d| session.path(d)).collect();
    let scopes: Vec<Scope<'_>> = dirs
        .iter()
        .map(|d| Scope::Directory(d.as_path()))
        .chain(docs.iter().map(|d| Scope::Document(d.as_path())))
        .collect();

    let id = allocate(&session.ctx, &scopes, prefix, width)?;
    println!("{id}");
    Ok(ExitCode::SUCCESS)
}

fn cmd_locate(session: &Session, doc: &Path, id: &str) -> Result<ExitCode> {
    let ctx = &session.ctx;
    let path = session.path(doc);
    let id = parse_id(id)?;
    let document = ctx.load_existing(&path)?;
    let span = locate(&document, &id).ok_or_else(|| {
        RepoGovError::not_found(format!("{id} in {}", ctx.display(&path)))
    })?;

    eprintln!(
        "{id}: lines {}-{} of {}",
        span.start + 1,
        span.content_end,
        ctx.display(&path)
    );
    for line in document.slice(span.content_range()) {
        println!("{line}");
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_recover(session: &Session) -> Result<ExitCode> {
    if session.dry_run {
        return Err(eyre!("recover cannot run as a dry run"));
    }
    match session.ctx.store.recover()? {
        Recovery::Clean => println!("  no interrupted writes"),
        Recovery::Replayed(paths) => {
            for path in paths {
                println!("  restored {}", session.ctx.display(&path));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_config(root: &Path, action: &ConfigAction) -> Result<ExitCode> {
    let root = std::fs::canonicalize(root)
        .map_err(|e| eyre!("project root '{}' is not usable: {e}", root.display()))?;
    match action {
        ConfigAction::Init => {
            let path = init_config(&root)?;
            println!("  wrote {}", path.display());
        }
        ConfigAction::Show => {
            let config = load_config(&root)?;
            let text = toml::to_string_pretty(&config)
                .map_err(|e| eyre!("failed to render config: {e}"))?;
            print!("{text}");
        }
    }
    Ok(ExitCode::SUCCESS)
}
