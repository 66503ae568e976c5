//! Named sections and `**Field**: value` lines.

use std::ops::Range;

use crate::document::Document;
use crate::line::{LineKind, classify_lines, heading_title};

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// A heading and the lines it governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    /// Index of the heading line.
    pub heading: usize,
    pub depth: u8,
    /// Exclusive end of the section body.
    pub end: usize,
}

impl Section {
    /// Lines after the heading.
    pub fn body(&self) -> Range<usize> {
        self.heading + 1..self.end
    }
}

/// Find the first heading whose title equals `name` (trimmed, any depth).
///
/// The section ends at the next heading of the same or shallower depth, at a
/// `---` rule, or at end of document.
pub fn find_section(doc: &Document, name: &str) -> Option<Section> {
    let lines = doc.lines();
    let kinds = classify_lines(lines);
    let wanted = name.trim();

    let (heading, depth) = kinds.iter().enumerate().find_map(|(i, kind)| {
        let depth = kind.heading_depth()?;
        (heading_title(&lines[i]) == Some(wanted)).then_some((i, depth))
    })?;

    let end = kinds
        .iter()
        .enumerate()
        .skip(heading + 1)
        .find(|(_, kind)| match kind {
            LineKind::Heading { depth: other } => *other <= depth,
            LineKind::Rule => true,
            _ => false,
        })
        .map_or(lines.len(), |(i, _)| i);

    Some(Section {
        heading,
        depth,
        end,
    })
}

// ---------------------------------------------------------------------------
// Bold fields
// ---------------------------------------------------------------------------

/// A parsed `**Name**: value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoldField<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

/// Parse `**Name**: value` or `**Name:** value`, optionally behind a list marker.
pub fn parse_bold_field(line: &str) -> Option<BoldField<'_>> {
    let rest = strip_list_marker(line.trim_start());
    let rest = rest.strip_prefix("**")?;
    let close = rest.find("**")?;
    let inner = &rest[..close];
    let after = &rest[close + 2..];

    let (name, value) = match inner.strip_suffix(':') {
        Some(name) => (name, after),
        None => (inner, after.strip_prefix(':')?),
    };
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(BoldField {
        name,
        value: value.trim(),
    })
}

/// Value of the first `name` field in `lines` (case-insensitive name match).
pub fn field_value<'a>(lines: &'a [String], name: &str) -> Option<&'a str> {
    lines.iter().find_map(|line| {
        parse_bold_field(line)
            .filter(|field| field.name.eq_ignore_ascii_case(name))
            .map(|field| field.value)
    })
}

/// Index (into `range`) of the first `name` field line.
pub fn find_field(doc: &Document, range: Range<usize>, name: &str) -> Option<usize> {
    let start = range.start;
    doc.slice(range)
        .iter()
        .position(|line| {
            parse_bold_field(line).is_some_and(|field| field.name.eq_ignore_ascii_case(name))
        })
        .map(|offset| start + offset)
}

/// Rewrite a field line with a new value, keeping its prefix, any
/// trailing two-space hard break and a CRLF line ending.
pub fn replace_field_value(line: &str, value: &str) -> Option<String> {
    let (content, eol) = match line.strip_suffix('\r') {
        Some(content) => (content, "\r"),
        None => (line, ""),
    };
    let field = parse_bold_field(content)?;
    let value_start = if field.value.is_empty() {
        content.trim_end().len()
    } else {
        content.rfind(field.value)?
    };
    let head = content[..value_start].trim_end();
    let hard_break = if content.ends_with("  ") { "  " } else { "" };
    Some(format!("{head} {value}{hard_break}{eol}"))
}

fn strip_list_marker(s: &str) -> &str {
    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = s.strip_prefix(marker) {
            return rest.trim_start();
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_ends_at_sibling_heading() {
        let doc = Document::parse("# T\n## Active\n- a\n### Sub\n- b\n## Done\n- c\n");
        let section = find_section(&doc, "Active").unwrap();
        assert_eq!(section.heading, 1);
        assert_eq!(section.depth, 2);
        assert_eq!(section.end, 5);
    }

    #[test]
    fn section_ends_at_rule_or_eof() {
        let doc = Document::parse("## Active Tasks\n- a\n---\nfooter\n");
        assert_eq!(find_section(&doc, "Active Tasks").unwrap().end, 2);

        let doc = Document::parse("## Active Tasks\n- a\n");
        assert_eq!(find_section(&doc, "Active Tasks").unwrap().body(), 1..2);
    }

    #[test]
    fn missing_section_is_none() {
        let doc = Document::parse("## Active\n");
        assert!(find_section(&doc, "Archived").is_none());
        assert!(find_section(&doc, "Activ").is_none());
    }

    #[test]
    fn bold_field_forms() {
        let field = parse_bold_field("**Priority**: P1").unwrap();
        assert_eq!((field.name, field.value), ("Priority", "P1"));

        let field = parse_bold_field("- **Expiration:** 2025-01-10").unwrap();
        assert_eq!((field.name, field.value), ("Expiration", "2025-01-10"));

        let field = parse_bold_field("**Date Completed**:").unwrap();
        assert_eq!(field.value, "");

        assert!(parse_bold_field("**bold** text").is_none());
        assert!(parse_bold_field("plain: text").is_none());
    }

    #[test]
    fn field_lookup_is_case_insensitive() {
        let lines: Vec<String> = vec!["**STATUS**: Pending".into(), "**Owner**: ops".into()];
        assert_eq!(field_value(&lines, "status"), Some("Pending"));
        assert_eq!(field_value(&lines, "Reviewer"), None);
    }

    #[test]
    fn replace_value_keeps_crlf_ending() {
        assert_eq!(
            replace_field_value("**Status**: Pending\r", "Completed").unwrap(),
            "**Status**: Completed\r"
        );
        assert_eq!(
            replace_field_value("- **Status**: Pending  \r", "Completed").unwrap(),
            "- **Status**: Completed  \r"
        );
    }

    #[test]
    fn replace_value_keeps_prefix_and_hard_break() {
        assert_eq!(
            replace_field_value("- **Status**: Pending  ", "Completed").unwrap(),
            "- **Status**: Completed  "
        );
        assert_eq!(
            replace_field_value("**Date Completed**:", "2025-01-10").unwrap(),
            "**Date Completed**: 2025-01-10"
        );
    }

    #[test]
    fn find_field_is_bounded_by_range() {
        let doc = Document::parse("**Status**: A\n### x\n**Status**: B\n");
        assert_eq!(find_field(&doc, 1..3, "Status"), Some(2));
        assert_eq!(find_field(&doc, 1..2, "Status"), None);
    }
}
