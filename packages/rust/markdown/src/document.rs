//! Line-oriented document model.
//!
//! A [`Document`] is the ordered line sequence of one text file. Parsing and
//! rendering are lossless: `Document::parse(text).render() == text` for any
//! input, including CRLF line endings and a missing final newline.

use std::ops::Range;

/// An ordered sequence of lines, materialized for the duration of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl Document {
    /// Split `text` into lines. A final `\n` is remembered, not stored as an empty line.
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        let (body, trailing_newline) = match text.strip_suffix('\n') {
            Some(body) => (body, true),
            None => (text, false),
        };
        Self {
            lines: body.split('\n').map(String::from).collect(),
            trailing_newline,
        }
    }

    /// Build a newline-terminated document from lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        let trailing_newline = !lines.is_empty();
        Self {
            lines,
            trailing_newline,
        }
    }

    /// Join the lines back into file contents.
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn has_trailing_newline(&self) -> bool {
        self.trailing_newline
    }

    pub fn set_trailing_newline(&mut self, value: bool) {
        self.trailing_newline = value;
    }

    /// Lines in `range`, clamped to the document.
    pub fn slice(&self, range: Range<usize>) -> &[String] {
        let range = self.clamp(range);
        &self.lines[range]
    }

    /// Replace the lines in `range` (clamped) with `replacement`, returning the removed lines.
    pub fn splice<I>(&mut self, range: Range<usize>, replacement: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let range = self.clamp(range);
        self.lines.splice(range, replacement).collect()
    }

    /// Remove and return the lines in `range` (clamped).
    pub fn remove_range(&mut self, range: Range<usize>) -> Vec<String> {
        self.splice(range, std::iter::empty())
    }

    /// Insert `lines` before index `at` (clamped to the end).
    pub fn insert_lines<I>(&mut self, at: usize, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        let at = at.min(self.lines.len());
        self.splice(at..at, lines);
    }

    /// Append lines at the end; an empty document becomes newline-terminated.
    pub fn append_lines<I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        let was_empty = self.lines.is_empty();
        self.lines.extend(lines);
        if was_empty && !self.lines.is_empty() {
            self.trailing_newline = true;
        }
    }

    /// Overwrite a single line. Out-of-range indexes are ignored and reported as `false`.
    pub fn set_line(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.lines.get_mut(index) {
            Some(line) => {
                *line = value.into();
                true
            }
            None => false,
        }
    }

    /// Whether the last line is blank (or the document is empty).
    pub fn ends_with_blank(&self) -> bool {
        self.lines.last().is_none_or(|l| l.trim().is_empty())
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let end = range.end.min(self.lines.len());
        let start = range.start.min(end);
        start..end
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_render_is_lossless() {
        for text in [
            "",
            "\n",
            "one line",
            "one line\n",
            "a\n\nb\n\n",
            "crlf\r\nlines\r\n",
            "no final newline\nhere",
        ] {
            assert_eq!(Document::parse(text).render(), text, "input {text:?}");
        }
    }

    #[test]
    fn parse_counts_lines_without_phantom_tail() {
        let doc = Document::parse("a\nb\n");
        assert_eq!(doc.len(), 2);
        assert!(doc.has_trailing_newline());
        assert_eq!(doc.line(1), Some("b"));
    }

    #[test]
    fn splice_returns_removed_lines() {
        let mut doc = Document::parse("a\nb\nc\nd\n");
        let removed = doc.splice(1..3, vec!["x".to_string()]);
        assert_eq!(removed, vec!["b", "c"]);
        assert_eq!(doc.render(), "a\nx\nd\n");
    }

    #[test]
    fn ranges_are_clamped() {
        let mut doc = Document::parse("a\nb\n");
        assert_eq!(doc.slice(1..10), &["b".to_string()]);
        assert!(doc.remove_range(5..9).is_empty());
        doc.insert_lines(99, vec!["c".to_string()]);
        assert_eq!(doc.render(), "a\nb\nc\n");
    }

    #[test]
    fn append_to_empty_document_terminates_it() {
        let mut doc = Document::default();
        doc.append_lines(vec!["## Active Tasks".to_string()]);
        assert_eq!(doc.render(), "## Active Tasks\n");
    }

    #[test]
    fn set_line_out_of_range_is_reported() {
        let mut doc = Document::parse("a\n");
        assert!(doc.set_line(0, "b"));
        assert!(!doc.set_line(3, "c"));
        assert_eq!(doc.render(), "b\n");
    }
}
