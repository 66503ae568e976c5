//! Identifier token matching inside free text.
//!
//! A token only matches on identifier boundaries: `TASK-07` does not match
//! inside `TASK-071`, and `TASK-001` does not match inside `AS-TASK-001`.

use std::sync::LazyLock;

use regex::Regex;

use repogov_shared::Identifier;

/// Any `PREFIX-<digits>` token.
static ANY_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Z][A-Z0-9]*(?:-[A-Z][A-Z0-9]*)*-\d+").expect("identifier token regex")
});

/// Whether `line` contains `token` as a whole identifier.
pub fn contains_token(line: &str, token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    line.match_indices(token)
        .any(|(start, _)| on_boundary(line, start, start + token.len()))
}

/// Every identifier with the given prefix found in `text`, in order of appearance.
///
/// Numbers too large to represent are skipped, as is everything when the
/// prefix itself is not a valid identifier prefix.
pub fn scan_identifiers(text: &str, prefix: &str) -> Vec<Identifier> {
    let needle = format!("{prefix}-");
    let mut found = Vec::new();

    for (start, _) in text.match_indices(&needle) {
        let digits_start = start + needle.len();
        let digits_len = text[digits_start..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits_len == 0 {
            continue;
        }
        let end = digits_start + digits_len;
        if !on_boundary(text, start, end) {
            continue;
        }
        let parsed = text[digits_start..end]
            .parse::<u32>()
            .map_err(|e| e.to_string())
            .and_then(|number| {
                Identifier::new(prefix, number, digits_len).map_err(|e| e.to_string())
            });
        match parsed {
            Ok(id) => found.push(id),
            Err(e) => tracing::warn!(token = &text[start..end], error = %e, "skipping unusable identifier"),
        }
    }

    found
}

/// The first identifier on the line, whatever its prefix.
pub fn first_identifier(line: &str) -> Option<Identifier> {
    ANY_ID_RE
        .find_iter(line)
        .filter(|m| on_boundary(line, m.start(), m.end()))
        .find_map(|m| Identifier::parse(m.as_str()).ok())
}

/// Whether the line carries any identifier with the given prefix.
pub fn has_identifier_with_prefix(line: &str, prefix: &str) -> bool {
    !scan_identifiers(line, prefix).is_empty()
}

fn on_boundary(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start]
        .chars()
        .next_back()
        .is_none_or(|c| !(c.is_alphanumeric() || c == '-' || c == '_'));
    let after_ok = text[end..]
        .chars()
        .next()
        .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
    before_ok && after_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_respects_boundaries() {
        assert!(contains_token("- [ ] [TASK-071] Ship it", "TASK-071"));
        assert!(contains_token("TASK-071: done", "TASK-071"));
        assert!(!contains_token("- [ ] [TASK-0712] Other", "TASK-071"));
        assert!(!contains_token("see AS-TASK-071", "TASK-071"));
        assert!(!contains_token("TASK-071a", "TASK-071"));
        assert!(!contains_token("anything", ""));
    }

    #[test]
    fn token_found_after_earlier_partial_match() {
        assert!(contains_token("TASK-0712 then TASK-071", "TASK-071"));
    }

    #[test]
    fn scan_collects_numbers_and_widths() {
        let text = "|HITL-0001|Risk|\n|HITL-0003|Vendor|\nmentions XHITL-0099 and HITL-";
        let ids = scan_identifiers(text, "HITL");
        let numbers: Vec<u32> = ids.iter().map(Identifier::number).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert!(ids.iter().all(|id| id.width() == 4));
    }

    #[test]
    fn scan_skips_oversized_numbers() {
        let ids = scan_identifiers("TASK-99999999999 TASK-2", "TASK");
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].number(), 2);
    }

    #[test]
    fn first_identifier_on_line() {
        let id = first_identifier("### [WAIVER-0002] Lint exemption").unwrap();
        assert_eq!(id.to_string(), "WAIVER-0002");
        assert!(first_identifier("no ids here").is_none());
    }
}
