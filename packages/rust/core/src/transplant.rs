//! Record transplanter: move a record between documents, or edit a field in place.
//!
//! Both operations are computed in memory and returned as a [`WritePlan`];
//! nothing is written here. A move plan writes the source document first and
//! the target second. Without the optional journal, an interruption between
//! the two writes leaves the record in the source only (if the source write
//! never landed) or in neither (if the target write failed). Concurrent
//! invocations are not detected: the last writer wins.

use std::path::Path;

use tracing::{debug, info, instrument};

use repogov_markdown::{
    Document, LineKind, RecordSpan, classify, find_field, find_section, locate, replace_field_value,
};
use repogov_shared::{Identifier, RepoGovError, Result};
use repogov_storage::WritePlan;

use crate::context::RepoContext;

// ---------------------------------------------------------------------------
// Placement & field matchers
// ---------------------------------------------------------------------------

/// Where a transplanted record lands in the target document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Append at end of file.
    EndOfFile,
    /// Insert at the end of the named section. A missing section falls back
    /// to end of file; an empty document gets the section heading first.
    Section(String),
}

/// Which line inside a record a field edit targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMatcher {
    /// The first checklist marker: `- [ ]` / `- [x]`. Values are `x` or ` `.
    Checkbox,
    /// The first `**Name**: value` line.
    Bold(String),
}

/// Outcome of a field edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdate {
    Changed,
    /// The field already held the value; nothing to write.
    Unchanged,
}

// ---------------------------------------------------------------------------
// In-memory operations
// ---------------------------------------------------------------------------

/// Locate `id` or fail with a not-found error naming the document.
pub fn require_record(doc: &Document, id: &Identifier, doc_name: &str) -> Result<RecordSpan> {
    locate(doc, id).ok_or_else(|| RepoGovError::not_found(format!("{id} in {doc_name}")))
}

/// Remove the record (trailing blank lines included) and return its text
/// with trailing blanks trimmed. A record at the end of the document also
/// takes the blank separator lines before it.
pub fn excise(doc: &mut Document, span: &RecordSpan) -> Vec<String> {
    let at_end = span.end >= doc.len();
    let mut removed = doc.remove_range(span.range());
    removed.truncate(span.content_end - span.start);
    if at_end {
        let mut keep = doc.len();
        while keep > 0 && blank(doc, keep - 1) {
            keep -= 1;
        }
        doc.remove_range(keep..doc.len());
        if doc.is_empty() {
            doc.set_trailing_newline(false);
        }
    }
    removed
}

/// Insert record lines into `doc` at `placement`.
pub fn insert_record(doc: &mut Document, record: Vec<String>, placement: &Placement) {
    match placement {
        Placement::Section(name) if doc.is_empty() => {
            doc.append_lines([format!("## {name}"), String::new()]);
            doc.append_lines(record);
        }
        Placement::Section(name) => match find_section(doc, name) {
            Some(section) => {
                let mut at = section.end;
                while at > section.heading + 1 && blank(doc, at - 1) {
                    at -= 1;
                }
                let mut lines = vec![String::new()];
                lines.extend(record);
                if at < doc.len() && !blank(doc, at) {
                    lines.push(String::new());
                }
                doc.insert_lines(at, lines);
            }
            None => append_at_end(doc, record),
        },
        Placement::EndOfFile => append_at_end(doc, record),
    }
}

fn append_at_end(doc: &mut Document, record: Vec<String>) {
    let mut lines = Vec::with_capacity(record.len() + 1);
    if !doc.ends_with_blank() {
        lines.push(String::new());
    }
    lines.extend(record);
    doc.append_lines(lines);
    doc.set_trailing_newline(true);
}

fn blank(doc: &Document, index: usize) -> bool {
    doc.line(index).is_some_and(|l| l.trim().is_empty())
}

/// Move the record for `id` from `source` into `target`.
pub fn transplant(
    source: &mut Document,
    target: &mut Document,
    id: &Identifier,
    placement: &Placement,
    source_name: &str,
) -> Result<()> {
    let span = require_record(source, id, source_name)?;
    let record = excise(source, &span);
    debug!(%id, lines = record.len(), "excised record");
    insert_record(target, record, placement);
    Ok(())
}

/// Set a field inside the record for `id`.
///
/// Editing a field to the value it already holds is a successful no-op.
pub fn mutate_field(
    doc: &mut Document,
    id: &Identifier,
    matcher: &FieldMatcher,
    value: &str,
    doc_name: &str,
) -> Result<FieldUpdate> {
    let span = require_record(doc, id, doc_name)?;
    match matcher {
        FieldMatcher::Checkbox => {
            let checked = match value {
                "x" | "X" => true,
                " " | "" => false,
                other => {
                    return Err(RepoGovError::validation(format!(
                        "checkbox value must be 'x' or ' ', got '{other}'"
                    )));
                }
            };
            let index = span
                .range()
                .find(|&i| doc.line(i).is_some_and(|l| matches!(classify(l), LineKind::Checklist { .. })))
                .ok_or_else(|| RepoGovError::not_found(format!("checkbox in {id}")))?;
            let line = doc.line(index).unwrap_or_default();
            let updated = set_checkbox(line, checked);
            if updated == line {
                return Ok(FieldUpdate::Unchanged);
            }
            doc.set_line(index, updated);
            Ok(FieldUpdate::Changed)
        }
        FieldMatcher::Bold(name) => {
            let index = find_field(doc, span.content_range(), name)
                .ok_or_else(|| RepoGovError::not_found(format!("field '{name}' in {id}")))?;
            let line = doc.line(index).unwrap_or_default();
            let updated = replace_field_value(line, value)
                .ok_or_else(|| RepoGovError::parse(format!("field '{name}' in {id} is malformed")))?;
            if updated == line {
                return Ok(FieldUpdate::Unchanged);
            }
            doc.set_line(index, updated);
            Ok(FieldUpdate::Changed)
        }
    }
}

/// Mark a record completed: tick a checklist record, or set `**Status**: Completed`
/// on a heading record. Idempotent.
pub fn mark_completed(doc: &mut Document, id: &Identifier, doc_name: &str) -> Result<FieldUpdate> {
    let span = require_record(doc, id, doc_name)?;
    if span.is_checklist() {
        mutate_field(doc, id, &FieldMatcher::Checkbox, "x", doc_name)
    } else {
        mutate_field(doc, id, &FieldMatcher::Bold("Status".into()), "Completed", doc_name)
    }
}

/// Rewrite the `[ ]` / `[x]` marker of a checklist line.
fn set_checkbox(line: &str, checked: bool) -> String {
    let Some(open) = line.find('[') else {
        return line.to_string();
    };
    let marker = if checked { 'x' } else { ' ' };
    let current = line[open + 1..].chars().next();
    match current {
        Some('x' | 'X') if checked => line.to_string(),
        Some(c) if c == marker => line.to_string(),
        Some(c) => {
            let mut out = String::with_capacity(line.len());
            out.push_str(&line[..=open]);
            out.push(marker);
            out.push_str(&line[open + 1 + c.len_utf8()..]);
            out
        }
        None => line.to_string(),
    }
}

// ---------------------------------------------------------------------------
// File-level operations
// ---------------------------------------------------------------------------

/// Plan moving `id` from the `source` file into the `target` file.
///
/// The source must exist; a missing target is created. When both paths
/// name the same file the record is relocated within that one document.
#[instrument(skip_all, fields(%id, source = %ctx.display(source), target = %ctx.display(target)))]
pub fn move_record(
    ctx: &RepoContext,
    source: &Path,
    target: &Path,
    id: &Identifier,
    placement: &Placement,
) -> Result<WritePlan> {
    let path = ctx.resolve(source);
    if path == ctx.resolve(target) {
        let mut doc = ctx.load_existing(&path)?;
        let span = require_record(&doc, id, &ctx.display(source))?;
        let record = excise(&mut doc, &span);
        insert_record(&mut doc, record, placement);
        let mut plan = WritePlan::new();
        plan.push(path, doc.render());
        info!("planned in-place record move");
        return Ok(plan);
    }

    let mut source_doc = ctx.load_existing(source)?;
    let mut target_doc = ctx.load_document(target)?;
    transplant(
        &mut source_doc,
        &mut target_doc,
        id,
        placement,
        &ctx.display(source),
    )?;

    let mut plan = WritePlan::new();
    plan.push(source, source_doc.render());
    plan.push(target, target_doc.render());
    info!("planned record move");
    Ok(plan)
}

/// Plan a field edit in one file. An unchanged field yields an empty plan.
#[instrument(skip_all, fields(%id, doc = %ctx.display(path)))]
pub fn mutate_field_in_file(
    ctx: &RepoContext,
    path: &Path,
    id: &Identifier,
    matcher: &FieldMatcher,
    value: &str,
) -> Result<(FieldUpdate, WritePlan)> {
    let mut doc = ctx.load_existing(path)?;
    let update = mutate_field(&mut doc, id, matcher, value, &ctx.display(path))?;
    Ok((update, plan_if_changed(path, &doc, update)))
}

/// Plan marking a record completed in one file.
#[instrument(skip_all, fields(%id, doc = %ctx.display(path)))]
pub fn mark_completed_in_file(
    ctx: &RepoContext,
    path: &Path,
    id: &Identifier,
) -> Result<(FieldUpdate, WritePlan)> {
    let mut doc = ctx.load_existing(path)?;
    let update = mark_completed(&mut doc, id, &ctx.display(path))?;
    if update == FieldUpdate::Unchanged {
        info!("record already completed");
    }
    Ok((update, plan_if_changed(path, &doc, update)))
}

fn plan_if_changed(path: &Path, doc: &Document, update: FieldUpdate) -> WritePlan {
    let mut plan = WritePlan::new();
    if update == FieldUpdate::Changed {
        plan.push(path, doc.render());
    }
    plan
}
