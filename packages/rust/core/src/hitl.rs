//! Human-in-the-loop items: detail files, the index tables, and the PR summary.

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use repogov_github::PullRequestBodies;
use repogov_markdown::{Document, append_row, escape_cell, read_rows, render_section};
use repogov_shared::{HitlStatus, Identifier, RepoGovError, Result, SummaryRow};
use repogov_storage::WritePlan;

use crate::allocate::{Scope, allocate};
use crate::context::RepoContext;
use crate::lifecycle::DATE_FORMAT;

pub const HITL_PREFIX: &str = "HITL";
pub const ACTIVE_TABLE: &str = "Active";
pub const ARCHIVED_TABLE: &str = "Archived";

/// Heading of the summary section kept in pull request descriptions.
pub const PR_SECTION_HEADING: &str = "## HITL Items";

const PR_TABLE_HEADER: &str = "| ID | Category | Status | Summary |";
const PR_TABLE_SEPARATOR: &str = "|---|---|---|---|";
const UNKNOWN_STATUS_GLYPH: &str = "❓";

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitlCategory {
    ExternalIntegration,
    Clarification,
    Risk,
    Feedback,
    Vendor,
}

impl HitlCategory {
    pub const ALL: [Self; 5] = [
        Self::ExternalIntegration,
        Self::Clarification,
        Self::Risk,
        Self::Feedback,
        Self::Vendor,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::ExternalIntegration => "External Integration",
            Self::Clarification => "Clarification",
            Self::Risk => "Risk",
            Self::Feedback => "Feedback",
            Self::Vendor => "Vendor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for HitlCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Input for a new HITL item.
#[derive(Debug, Clone)]
pub struct NewHitlItem {
    pub category: HitlCategory,
    pub summary: String,
    /// Change types that need this item, e.g. `security, release`.
    pub required_for: String,
    pub owner: String,
    pub reviewer: Option<String>,
    pub related_pr: Option<String>,
    pub related_adr: Option<String>,
    pub related_waiver: Option<String>,
    pub related_task: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatedHitl {
    pub id: Identifier,
    pub item_path: PathBuf,
    pub plan: WritePlan,
}

/// Allocate an id, render the detail file and register it in the Active table.
#[instrument(skip_all, fields(category = %item.category))]
pub fn create(ctx: &RepoContext, item: &NewHitlItem, today: NaiveDate) -> Result<CreatedHitl> {
    let summary = item.summary.trim();
    if summary.is_empty() {
        return Err(RepoGovError::validation("HITL summary must not be empty"));
    }
    // Rejects line breaks before anything is allocated.
    escape_cell(summary)?;

    let paths = &ctx.paths;
    let id = allocate(
        ctx,
        &[Scope::Document(&paths.hitl_index), Scope::Directory(&paths.hitl_dir)],
        HITL_PREFIX,
        ctx.config.ids.hitl_width,
    )?;
    let item_path = paths.hitl_dir.join(format!("{id}.md"));

    let row = SummaryRow {
        id: id.to_string(),
        category: item.category.label().to_string(),
        status: HitlStatus::Pending.label().to_string(),
        summary: summary.to_string(),
        filepath: ctx.display(&item_path),
    };

    let mut index = ctx.load_document(&paths.hitl_index)?;
    if index.is_empty() {
        index = index_template(&ctx.display(&paths.hitl_index), &row)?;
    } else {
        append_row(&mut index, ACTIVE_TABLE, &row)?;
    }

    let mut plan = WritePlan::new();
    plan.push(&item_path, render_item(&id, item, today));
    plan.push(&paths.hitl_index, index.render());
    info!(%id, "planned HITL item");
    Ok(CreatedHitl {
        id,
        item_path,
        plan,
    })
}

fn index_template(index_name: &str, first: &SummaryRow) -> Result<Document> {
    let mut lines = vec![
        format!("# /{index_name}"),
        "HITL = Human-In-The-Loop. This is the single binding place for human-required actions."
            .to_string(),
        String::new(),
        "## Index tables".to_string(),
    ];
    lines.extend(render_section(ACTIVE_TABLE, 3, std::slice::from_ref(first))?);
    lines.push(String::new());
    lines.extend(render_section(ARCHIVED_TABLE, 3, &[])?);
    Ok(Document::from_lines(lines))
}

/// Detail file contents for a new item.
///
/// Header fields end with two spaces so they render as separate lines.
pub fn render_item(id: &Identifier, item: &NewHitlItem, today: NaiveDate) -> String {
    let summary = item.summary.trim();
    let mut fields = vec![
        ("ID", id.to_string()),
        ("Category", item.category.label().to_string()),
        ("Required For", item.required_for.clone()),
        ("Owner", item.owner.clone()),
    ];
    if let Some(reviewer) = &item.reviewer {
        fields.push(("Reviewer", reviewer.clone()));
    }
    fields.push(("Status", HitlStatus::Pending.label().to_string()));
    fields.push(("Date Required", today.format(DATE_FORMAT).to_string()));
    fields.push(("Date Completed", String::new()));

    let mut lines = vec![format!("# {id}: {summary}"), String::new()];
    lines.extend(fields.into_iter().map(|(name, value)| {
        if value.is_empty() {
            format!("**{name}**:  ")
        } else {
            format!("**{name}**: {value}  ")
        }
    }));

    let related: Vec<String> = [
        item.related_pr.as_deref().map(|pr| format!("- **PR**: #{pr}")),
        item.related_adr.as_deref().map(|adr| format!("- **ADR**: {adr}")),
        item.related_waiver.as_deref().map(|w| format!("- **Waiver**: {w}")),
        item.related_task.as_deref().map(|t| format!("- **Task**: {t}")),
    ]
    .into_iter()
    .flatten()
    .collect();

    lines.extend(
        [
            "",
            "## Summary",
            "",
            summary,
            "",
            "## Required Human Action",
            "",
            "1. Review the change and assess risk",
            "2. Approve or request modifications",
            "3. Mark as Completed when satisfied",
            "",
            "## Evidence of Completion",
            "",
            "- [ ] Review completed",
            "- [ ] Risk assessment approved",
            "- [ ] Evidence verified (filepaths: _add filepaths here_)",
            "",
            "## Related Artifacts",
            "",
        ]
        .map(String::from),
    );
    if related.is_empty() {
        lines.push("None".to_string());
    } else {
        lines.extend(related);
    }
    Document::from_lines(lines).render()
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Rows of an index table (`Active` or `Archived`). The index must exist.
pub fn list(ctx: &RepoContext, table: &str) -> Result<Vec<SummaryRow>> {
    let index = ctx.load_existing(&ctx.paths.hitl_index)?;
    read_rows(&index, table)
}

// ---------------------------------------------------------------------------
// Pull request summary
// ---------------------------------------------------------------------------

/// Render the `## HITL Items` section for a pull request description.
pub fn render_pr_section(rows: &[SummaryRow]) -> Result<String> {
    if rows.is_empty() {
        return Ok(format!("{PR_SECTION_HEADING}\n\nNo active HITL items.\n"));
    }
    let mut lines = vec![
        PR_SECTION_HEADING.to_string(),
        String::new(),
        PR_TABLE_HEADER.to_string(),
        PR_TABLE_SEPARATOR.to_string(),
    ];
    for row in rows {
        let glyph = HitlStatus::parse(&row.status)
            .map(HitlStatus::glyph)
            .unwrap_or(UNKNOWN_STATUS_GLYPH);
        lines.push(format!(
            "| {} | {} | {glyph} {} | {} |",
            escape_cell(&row.id)?,
            escape_cell(&row.category)?,
            escape_cell(&row.status)?,
            escape_cell(&row.summary)?,
        ));
    }
    Ok(lines.join("\n"))
}

/// The PR section for the current Active table.
pub fn pr_section(ctx: &RepoContext) -> Result<String> {
    render_pr_section(&list(ctx, ACTIVE_TABLE)?)
}

/// Replace the HITL section of `body`, or add it.
///
/// An existing section runs from its heading up to the next `\n## ` or the
/// end of the body (a final newline is kept). Without one the section is
/// appended after a blank line, or becomes the whole body when it is empty.
pub fn splice_pr_body(body: &str, section: &str) -> String {
    let marker = format!("{PR_SECTION_HEADING}\n");
    let start = body
        .match_indices(&marker)
        .map(|(i, _)| i)
        .find(|&i| i == 0 || body[..i].ends_with('\n'));

    match start {
        Some(start) => {
            // Search from the heading's own newline so a directly following
            // heading still closes the section.
            let from = start + marker.len() - 1;
            let end = match body[from..].find("\n## ") {
                Some(offset) => from + offset,
                None if body.ends_with('\n') && body.len() > from + 1 => body.len() - 1,
                None => body.len(),
            };
            // The kept tail already supplies the newline that ends the section.
            let section = section.strip_suffix('\n').unwrap_or(section);
            format!("{}{section}{}", &body[..start], &body[end..])
        }
        None if body.is_empty() => section.to_string(),
        None => format!("{body}\n\n{section}"),
    }
}

/// Fetch the PR description, splice in `section` and write it back.
///
/// Returns the new body. An already up-to-date description is not rewritten.
#[instrument(skip_all, fields(pr = number))]
pub async fn sync_pr<C>(client: &C, number: u64, section: &str) -> Result<String>
where
    C: PullRequestBodies,
{
    let body = client.get_body(number).await?;
    let updated = splice_pr_body(&body, section);
    if updated == body {
        debug!("pull request description already up to date");
        return Ok(updated);
    }
    client.set_body(number, &updated).await?;
    info!("synced HITL items to pull request");
    Ok(updated)
}
