//! Tagged-line classifier.
//!
//! Every structural decision the record store makes (where a record starts,
//! where it ends, where a table lives) goes through [`classify_lines`], so the
//! grammar is defined once: headings of any depth, checklist items, table
//! rows, thematic breaks, fenced code, blank lines, and everything else.

use std::sync::LazyLock;

use regex::Regex;

/// Structural role of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `#` .. `######` followed by whitespace or end of line.
    Heading { depth: u8 },
    /// `- [ ] ...` / `- [x] ...` (also `*` and `+` bullets).
    Checklist { indent: usize, checked: bool },
    /// `|---|---|` delimiter row.
    TableSeparator,
    /// Any other line starting with `|`.
    TableRow,
    /// `---`, `***` or `___` thematic break.
    Rule,
    /// Opening or closing code fence.
    Fence,
    /// A line inside a fenced code block.
    Code,
    Blank,
    Text,
}

impl LineKind {
    /// Headings and checklist items are the only lines that can start a record.
    pub fn is_record_marker(self) -> bool {
        matches!(self, Self::Heading { .. } | Self::Checklist { .. })
    }

    pub fn heading_depth(self) -> Option<u8> {
        match self {
            Self::Heading { depth } => Some(depth),
            _ => None,
        }
    }
}

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})(?:\s|$)").expect("heading regex"));

static CHECKLIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)[-*+]\s+\[([ xX])\](?:\s|$)").expect("checklist regex")
});

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\|?(?:\s*:?-+:?\s*\|)+\s*(?::?-+:?\s*)?$").expect("table separator regex")
});

static RULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$").expect("rule regex")
});

/// Classify one line without fence context.
pub fn classify(line: &str) -> LineKind {
    let line = line.trim_end_matches('\r');
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if is_fence(trimmed) {
        return LineKind::Fence;
    }
    if let Some(caps) = HEADING_RE.captures(line) {
        // At most six hashes by construction.
        return LineKind::Heading {
            depth: caps[1].len() as u8,
        };
    }
    if let Some(caps) = CHECKLIST_RE.captures(line) {
        return LineKind::Checklist {
            indent: indent_width(&caps[1]),
            checked: &caps[2] != " ",
        };
    }
    if trimmed.starts_with('|') {
        if SEPARATOR_RE.is_match(trimmed) {
            return LineKind::TableSeparator;
        }
        return LineKind::TableRow;
    }
    if RULE_RE.is_match(line) {
        return LineKind::Rule;
    }
    LineKind::Text
}

/// Classify every line, treating the inside of fenced code blocks as [`LineKind::Code`].
pub fn classify_lines(lines: &[String]) -> Vec<LineKind> {
    let mut kinds = Vec::with_capacity(lines.len());
    let mut in_fence = false;

    for line in lines {
        let kind = classify(line);
        if kind == LineKind::Fence {
            in_fence = !in_fence;
            kinds.push(kind);
        } else if in_fence {
            kinds.push(LineKind::Code);
        } else {
            kinds.push(kind);
        }
    }

    kinds
}

/// Heading text without the hashes, e.g. `Active Tasks` for `## Active Tasks`.
pub fn heading_title(line: &str) -> Option<&str> {
    let line = line.trim_end_matches('\r');
    let caps = HEADING_RE.captures(line)?;
    let rest = &line[caps[1].len()..];
    Some(rest.trim().trim_end_matches('#').trim_end())
}

fn is_fence(trimmed: &str) -> bool {
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Tabs count as four columns.
fn indent_width(ws: &str) -> usize {
    ws.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_headings_by_depth() {
        assert_eq!(classify("# Title"), LineKind::Heading { depth: 1 });
        assert_eq!(classify("#### [TASK-071] Do it"), LineKind::Heading { depth: 4 });
        assert_eq!(classify("##"), LineKind::Heading { depth: 2 });
        assert_eq!(classify("#hashtag"), LineKind::Text);
        assert_eq!(classify("####### seven"), LineKind::Text);
    }

    #[test]
    fn classify_checklists() {
        assert_eq!(
            classify("- [ ] [TASK-071] Title"),
            LineKind::Checklist { indent: 0, checked: false }
        );
        assert_eq!(
            classify("  * [X] nested"),
            LineKind::Checklist { indent: 2, checked: true }
        );
        assert_eq!(classify("- [link](http://x)"), LineKind::Text);
        assert_eq!(classify("- plain bullet"), LineKind::Text);
    }

    #[test]
    fn classify_tables_and_rules() {
        assert_eq!(classify("|ID|Category|"), LineKind::TableRow);
        assert_eq!(classify("|---|---|"), LineKind::TableSeparator);
        assert_eq!(classify("| :--- | ---: |"), LineKind::TableSeparator);
        assert_eq!(classify("---"), LineKind::Rule);
        assert_eq!(classify("* * *"), LineKind::Rule);
        assert_eq!(classify("--"), LineKind::Text);
    }

    #[test]
    fn crlf_is_ignored() {
        assert_eq!(classify("## Active\r"), LineKind::Heading { depth: 2 });
        assert_eq!(classify("\r"), LineKind::Blank);
    }

    #[test]
    fn fenced_code_is_not_structural() {
        let lines: Vec<String> = ["## Real", "```md", "## Fake", "- [ ] fake", "```", "- [ ] real"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let kinds = classify_lines(&lines);
        assert_eq!(kinds[0], LineKind::Heading { depth: 2 });
        assert_eq!(kinds[1], LineKind::Fence);
        assert_eq!(kinds[2], LineKind::Code);
        assert_eq!(kinds[3], LineKind::Code);
        assert_eq!(kinds[4], LineKind::Fence);
        assert!(kinds[5].is_record_marker());
    }

    #[test]
    fn heading_title_strips_markers() {
        assert_eq!(heading_title("### Active"), Some("Active"));
        assert_eq!(heading_title("## Active Tasks ##"), Some("Active Tasks"));
        assert_eq!(heading_title("plain"), None);
    }
}
