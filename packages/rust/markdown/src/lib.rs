//! Line-structured markdown primitives for the record store.
//!
//! Documents are handled as plain line sequences. A small tagged-line grammar
//! (headings, checklist items, table rows, rules, fenced code) drives record
//! location, section lookup and summary-table parsing; nothing here renders
//! markdown or touches content it was not asked to change.

mod document;
mod line;
mod locate;
mod section;
mod table;
mod token;

pub use document::Document;
pub use line::{LineKind, classify, classify_lines, heading_title};
pub use locate::{RecordSpan, locate, record_starts};
pub use section::{
    BoldField, Section, field_value, find_field, find_section, parse_bold_field,
    replace_field_value,
};
pub use table::{
    DEFAULT_SECTION_DEPTH, SummaryTable, TABLE_HEADER, TABLE_SEPARATOR, TableLookup, append_row,
    escape_cell, lookup_table, read_rows, render_row, render_section, split_cells, upsert_row,
};
pub use token::{contains_token, first_identifier, has_identifier_with_prefix, scan_identifiers};

#[cfg(test)]
mod tests {
    use super::*;
    use repogov_shared::Identifier;
    use std::fs;

    fn fixture_path(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    fn load_fixture(name: &str) -> Document {
        let text = fs::read_to_string(fixture_path(name))
            .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"));
        Document::parse(&text)
    }

    #[test]
    fn backlog_fixture_records() {
        let doc = load_fixture("tasks/BACKLOG.md");
        let ids: Vec<String> = record_starts(&doc, "TASK")
            .into_iter()
            .map(|(_, id)| id.to_string())
            .collect();
        assert_eq!(ids, vec!["TASK-071", "TASK-072", "TASK-080"]);

        let span = locate(&doc, &Identifier::parse("TASK-071").unwrap()).unwrap();
        let record = doc.slice(span.content_range());
        assert_eq!(field_value(record, "Priority"), Some("P1"));
        assert!(record.last().unwrap().contains("Prose mentions"));
    }

    #[test]
    fn todo_fixture_sections() {
        let doc = load_fixture("tasks/TODO.md");
        let active = find_section(&doc, "Active Tasks").unwrap();
        // Ends at the `---` rule, before the template.
        assert_eq!(doc.line(active.end), Some("---"));
        let starts = record_starts(&doc, "TASK");
        assert_eq!(starts.len(), 2);
    }

    #[test]
    fn hitl_fixture_tables() {
        let doc = load_fixture("policy/HITL.md");
        let active = read_rows(&doc, "Active").unwrap();
        let archived = read_rows(&doc, "Archived").unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(archived.len(), 1);
        assert_eq!(active[1].status, "In Progress");
    }

    #[test]
    fn fixtures_render_losslessly() {
        for name in ["tasks/BACKLOG.md", "tasks/TODO.md", "policy/HITL.md"] {
            let text = fs::read_to_string(fixture_path(name)).unwrap();
            assert_eq!(Document::parse(&text).render(), text);
        }
    }
}
