//! Summary table synchronizer.
//!
//! A summary table lives under a named heading and has the fixed layout
//!
//! ```text
//! ### Active
//! |ID|Category|Status|Summary|Filepath|
//! |---|---|---|---|---|
//! |HITL-0001|Risk|Pending|Rotate keys|.repo/hitl/HITL-0001.md|
//! ```
//!
//! Parsing reads rows into [`SummaryRow`]s; writing only ever inserts or
//! replaces whole row lines, so the header, the separator and any row this
//! module could not parse stay byte-for-byte as they were.

use repogov_shared::{RepoGovError, Result, SummaryRow};

use crate::document::Document;
use crate::line::{LineKind, classify_lines};
use crate::section::{Section, find_section};

pub const TABLE_HEADER: &str = "|ID|Category|Status|Summary|Filepath|";
pub const TABLE_SEPARATOR: &str = "|---|---|---|---|---|";

/// Heading depth used when a section has to be created.
pub const DEFAULT_SECTION_DEPTH: u8 = 3;

/// Rows need at least id, category, status and summary.
const MIN_CELLS: usize = 4;

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// A parsed table and where its pieces sit in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryTable {
    pub section: Section,
    pub header: usize,
    pub separator: usize,
    /// Exclusive end of the row block.
    pub end: usize,
    /// Parsed rows with their line index.
    pub rows: Vec<(usize, SummaryRow)>,
}

impl SummaryTable {
    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        self.rows.iter().map(|(_, row)| row.clone()).collect()
    }

    pub fn find(&self, id: &str) -> Option<(usize, &SummaryRow)> {
        self.rows
            .iter()
            .find(|(_, row)| row.id == id)
            .map(|(line, row)| (*line, row))
    }
}

/// Outcome of looking for a table under a named section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableLookup {
    /// No heading with that name.
    Missing,
    /// The heading exists but holds no table.
    EmptySection(Section),
    Table(SummaryTable),
}

/// Locate and parse the table under `section_name`.
///
/// A table header without a separator line directly beneath it is a
/// [`RepoGovError::Parse`]; rows with too few cells are skipped with a warning.
pub fn lookup_table(doc: &Document, section_name: &str) -> Result<TableLookup> {
    let Some(section) = find_section(doc, section_name) else {
        return Ok(TableLookup::Missing);
    };
    let lines = doc.lines();
    let kinds = classify_lines(lines);

    let Some(header) = section
        .body()
        .find(|&i| matches!(kinds[i], LineKind::TableRow | LineKind::TableSeparator))
    else {
        return Ok(TableLookup::EmptySection(section));
    };

    let separator = header + 1;
    if separator >= section.end || kinds[separator] != LineKind::TableSeparator {
        return Err(RepoGovError::parse(format!(
            "table under '{section_name}' (line {}) has no separator row",
            header + 1
        )));
    }

    let mut rows = Vec::new();
    let mut end = separator + 1;
    while end < section.end && kinds[end] == LineKind::TableRow {
        match parse_row(&lines[end]) {
            Some(row) => rows.push((end, row)),
            None => tracing::warn!(
                section = section_name,
                line = end + 1,
                "skipping malformed table row"
            ),
        }
        end += 1;
    }

    tracing::debug!(section = section_name, rows = rows.len(), "parsed summary table");
    Ok(TableLookup::Table(SummaryTable {
        section,
        header,
        separator,
        end,
        rows,
    }))
}

/// Rows of the table under `section_name`; empty when the section or table is absent.
pub fn read_rows(doc: &Document, section_name: &str) -> Result<Vec<SummaryRow>> {
    Ok(match lookup_table(doc, section_name)? {
        TableLookup::Table(table) => table.summary_rows(),
        TableLookup::Missing | TableLookup::EmptySection(_) => Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// Split a row into trimmed cells, honouring `\|` and `\\` escapes.
pub fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut closed = false;
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        closed = false;
        match c {
            '\\' if matches!(chars.peek().copied(), Some('|' | '\\')) => {
                current.extend(chars.next());
            }
            '|' => {
                cells.push(std::mem::take(&mut current).trim().to_string());
                closed = true;
            }
            _ => current.push(c),
        }
    }
    if !closed {
        cells.push(current.trim().to_string());
    }
    cells
}

fn parse_row(line: &str) -> Option<SummaryRow> {
    let mut cells = split_cells(line);
    if cells.len() < MIN_CELLS {
        return None;
    }
    cells.resize(5, String::new());
    let mut cells = cells.into_iter();
    let mut next = || cells.next().unwrap_or_default();
    Some(SummaryRow {
        id: next(),
        category: next(),
        status: next(),
        summary: next(),
        filepath: next(),
    })
}

/// Escape backslashes and the delimiter; line breaks cannot be represented
/// and are rejected.
pub fn escape_cell(value: &str) -> Result<String> {
    if value.contains(['\n', '\r']) {
        return Err(RepoGovError::validation(format!(
            "table cell may not contain a line break: {value:?}"
        )));
    }
    Ok(value.trim().replace('\\', "\\\\").replace('|', "\\|"))
}

/// Render a row in the compact `|a|b|c|d|e|` form.
pub fn render_row(row: &SummaryRow) -> Result<String> {
    let mut out = String::from("|");
    for cell in row.cells() {
        out.push_str(&escape_cell(cell)?);
        out.push('|');
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Complete section text: heading, header, separator and rows.
pub fn render_section(name: &str, depth: u8, rows: &[SummaryRow]) -> Result<Vec<String>> {
    let mut lines = vec![
        format!("{} {}", "#".repeat(usize::from(depth.clamp(1, 6))), name),
        TABLE_HEADER.to_string(),
        TABLE_SEPARATOR.to_string(),
    ];
    for row in rows {
        lines.push(render_row(row)?);
    }
    Ok(lines)
}

/// Insert `row` after the last row of the table under `section_name`.
///
/// An empty section gets a header and separator; a missing section is
/// rendered from scratch and appended to the document.
pub fn append_row(doc: &mut Document, section_name: &str, row: &SummaryRow) -> Result<()> {
    let rendered = render_row(row)?;
    match lookup_table(doc, section_name)? {
        TableLookup::Table(table) => {
            doc.insert_lines(table.end, [rendered]);
        }
        TableLookup::EmptySection(section) => {
            doc.insert_lines(
                section.heading + 1,
                [TABLE_HEADER.to_string(), TABLE_SEPARATOR.to_string(), rendered],
            );
        }
        TableLookup::Missing => {
            let mut lines = Vec::new();
            if !doc.ends_with_blank() {
                lines.push(String::new());
            }
            lines.extend(render_section(
                section_name,
                DEFAULT_SECTION_DEPTH,
                std::slice::from_ref(row),
            )?);
            doc.append_lines(lines);
        }
    }
    Ok(())
}

/// Replace the row with the same id, or append it. Returns `true` on replace.
pub fn upsert_row(doc: &mut Document, section_name: &str, row: &SummaryRow) -> Result<bool> {
    let existing = match lookup_table(doc, section_name)? {
        TableLookup::Table(table) => table.find(&row.id).map(|(line, _)| line),
        TableLookup::Missing | TableLookup::EmptySection(_) => None,
    };
    if let Some(line) = existing {
        doc.set_line(line, render_row(row)?);
        return Ok(true);
    }
    append_row(doc, section_name, row)?;
    Ok(false)
}
