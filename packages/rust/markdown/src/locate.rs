//! Record locator.
//!
//! A record starts at the first heading or checklist line carrying the
//! identifier token. It extends up to (excluding) the next line that starts a
//! sibling record or a shallower section:
//!
//! - heading start at depth `d`: the next heading at depth `<= d`, or a
//!   top-level checklist item carrying an identifier of the same prefix;
//! - checklist start at indent `i`: the next heading, or the next checklist
//!   item indented `<= i`.
//!
//! A `---` thematic break closes either kind.
//!
//! Lines inside fenced code never start or end a record. Prose that merely
//! mentions the identifier is ignored.

use std::ops::Range;

use repogov_shared::Identifier;

use crate::document::Document;
use crate::line::{LineKind, classify_lines};
use crate::token::{contains_token, has_identifier_with_prefix, scan_identifiers};

/// Line range of a located record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSpan {
    /// Index of the record's heading/checklist line.
    pub start: usize,
    /// Exclusive end, including trailing blank lines.
    pub end: usize,
    /// Exclusive end with trailing blank lines trimmed.
    pub content_end: usize,
    /// Kind of the start line.
    pub kind: LineKind,
}

impl RecordSpan {
    /// Full range, trailing blanks included.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Range of the record's own text.
    pub fn content_range(&self) -> Range<usize> {
        self.start..self.content_end
    }

    pub fn is_checklist(&self) -> bool {
        matches!(self.kind, LineKind::Checklist { .. })
    }
}

/// Find the record for `id`. `None` when no structural line carries the token.
pub fn locate(doc: &Document, id: &Identifier) -> Option<RecordSpan> {
    let token = id.to_string();
    let lines = doc.lines();
    let kinds = classify_lines(lines);

    let start = (0..lines.len())
        .find(|&i| kinds[i].is_record_marker() && contains_token(&lines[i], &token))?;
    let kind = kinds[start];

    let end = (start + 1..lines.len())
        .find(|&i| terminates(kind, kinds[i], &lines[i], id.prefix()))
        .unwrap_or(lines.len());

    let mut content_end = end;
    while content_end > start + 1 && kinds[content_end - 1] == LineKind::Blank {
        content_end -= 1;
    }

    tracing::trace!(%id, start, end, content_end, "located record");
    Some(RecordSpan {
        start,
        end,
        content_end,
        kind,
    })
}

/// Every record start carrying an identifier with `prefix`, in document order.
pub fn record_starts(doc: &Document, prefix: &str) -> Vec<(usize, Identifier)> {
    let lines = doc.lines();
    classify_lines(lines)
        .into_iter()
        .enumerate()
        .filter(|(_, kind)| kind.is_record_marker())
        .filter_map(|(i, _)| {
            scan_identifiers(&lines[i], prefix)
                .into_iter()
                .next()
                .map(|id| (i, id))
        })
        .collect()
}

fn terminates(start: LineKind, candidate: LineKind, line: &str, prefix: &str) -> bool {
    match (start, candidate) {
        (_, LineKind::Rule) => true,
        (LineKind::Heading { depth }, LineKind::Heading { depth: other }) => other <= depth,
        (LineKind::Heading { .. }, LineKind::Checklist { indent: 0, .. }) => {
            has_identifier_with_prefix(line, prefix)
        }
        (LineKind::Checklist { .. }, LineKind::Heading { .. }) => true,
        (LineKind::Checklist { indent, .. }, LineKind::Checklist { indent: other, .. }) => {
            other <= indent
        }
        _ => false,
    }
}
