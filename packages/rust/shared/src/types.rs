//! Core domain types for the repogov record store.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RepoGovError, Result};

/// Default zero-padding width for allocated identifiers.
pub const DEFAULT_ID_WIDTH: usize = 4;

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// `PREFIX-<digits>`, where the prefix may itself be dash-separated (`AS-TASK-001`).
static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][A-Z0-9]*(?:-[A-Z][A-Z0-9]*)*)-(\d+)$").expect("identifier regex")
});

/// A record identifier such as `TASK-071`, `HITL-0003` or `WAIVER-0002`.
///
/// The width is the number of digits the identifier is rendered with; it only
/// affects formatting; numbers wider than the width are rendered in full.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    prefix: String,
    number: u32,
    width: usize,
}

impl Identifier {
    /// Build an identifier from its parts.
    pub fn new(prefix: impl Into<String>, number: u32, width: usize) -> Result<Self> {
        let prefix = prefix.into();
        if !is_valid_prefix(&prefix) {
            return Err(RepoGovError::validation(format!(
                "invalid identifier prefix '{prefix}': expected upper-case letters/digits"
            )));
        }
        Ok(Self {
            prefix,
            number,
            width,
        })
    }

    /// Parse `PREFIX-NNNN`, keeping the digit count as the width.
    pub fn parse(s: &str) -> Result<Self> {
        let caps = IDENTIFIER_RE.captures(s.trim()).ok_or_else(|| {
            RepoGovError::validation(format!("'{s}' is not an identifier of the form PREFIX-NNNN"))
        })?;
        let digits = &caps[2];
        let number = digits.parse::<u32>().map_err(|e| {
            RepoGovError::validation(format!("identifier '{s}' has an unusable number: {e}"))
        })?;
        Ok(Self {
            prefix: caps[1].to_string(),
            number,
            width: digits.len(),
        })
    }

    /// The prefix without the trailing dash (`TASK`).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The numeric suffix.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The zero-padding width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The identifier that follows this one in the same scope; `None` once
    /// the numeric space is exhausted.
    pub fn next(&self) -> Option<Self> {
        Some(Self {
            prefix: self.prefix.clone(),
            number: self.number.checked_add(1)?,
            width: self.width,
        })
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:0width$}", self.prefix, self.number, width = self.width)
    }
}

impl std::str::FromStr for Identifier {
    type Err = RepoGovError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = RepoGovError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.to_string()
    }
}

/// Check that a prefix looks like `TASK` or `AS-TASK`.
pub fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix.split('-').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
                && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        })
}

// ---------------------------------------------------------------------------
// SummaryRow
// ---------------------------------------------------------------------------

/// One row of an index summary table, mirrored from a detail file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Record identifier (`HITL-0003`).
    pub id: String,
    /// Category column.
    pub category: String,
    /// Status column (`Pending`, `In Progress`, ...).
    pub status: String,
    /// Free-text summary.
    pub summary: String,
    /// Root-relative path to the detail file.
    pub filepath: String,
}

impl SummaryRow {
    /// Cells in column order.
    pub fn cells(&self) -> [&str; 5] {
        [
            &self.id,
            &self.category,
            &self.status,
            &self.summary,
            &self.filepath,
        ]
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle of tasks and HITL items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Pending,
    InProgress,
    Completed,
    Archived,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Archived => "archived",
        };
        f.write_str(s)
    }
}

/// Lifecycle of waivers, relative to a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaiverState {
    Active,
    Expired,
}

impl std::fmt::Display for WaiverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Expired => "expired",
        })
    }
}

/// The status column vocabulary of the HITL index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitlStatus {
    Pending,
    InProgress,
    Blocked,
    Completed,
    Superseded,
}

impl HitlStatus {
    /// Parse the human-readable status (`In Progress`), case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in progress" | "in_progress" => Some(Self::InProgress),
            "blocked" => Some(Self::Blocked),
            "completed" => Some(Self::Completed),
            "superseded" => Some(Self::Superseded),
            _ => None,
        }
    }

    /// Human-readable label as written in the index table.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Blocked => "Blocked",
            Self::Completed => "Completed",
            Self::Superseded => "Superseded",
        }
    }

    /// Status glyph used in pull request summaries.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Pending => "⏳",
            Self::InProgress => "🔄",
            Self::Blocked => "🚫",
            Self::Completed => "✅",
            Self::Superseded => "↩️",
        }
    }

    /// Position on the shared lifecycle axis.
    pub fn lifecycle(self) -> LifecycleState {
        match self {
            Self::Pending => LifecycleState::Pending,
            Self::InProgress | Self::Blocked => LifecycleState::InProgress,
            Self::Completed => LifecycleState::Completed,
            Self::Superseded => LifecycleState::Archived,
        }
    }
}

impl std::fmt::Display for HitlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_parse_keeps_width() {
        let id = Identifier::parse("TASK-071").unwrap();
        assert_eq!(id.prefix(), "TASK");
        assert_eq!(id.number(), 71);
        assert_eq!(id.width(), 3);
        assert_eq!(id.to_string(), "TASK-071");
        assert_eq!(id.next().unwrap().to_string(), "TASK-072");
    }

    #[test]
    fn identifier_with_sub_prefix() {
        let id: Identifier = "AS-TASK-12".parse().unwrap();
        assert_eq!(id.prefix(), "AS-TASK");
        assert_eq!(id.number(), 12);
    }

    #[test]
    fn identifier_rejects_malformed_input() {
        assert!(Identifier::parse("task-1").is_err());
        assert!(Identifier::parse("TASK-").is_err());
        assert!(Identifier::parse("TASK071").is_err());
        assert!(Identifier::parse("TASK-99999999999").is_err());
        assert!(Identifier::new("hitl", 1, 4).is_err());
    }

    #[test]
    fn identifier_grows_past_its_width() {
        let id = Identifier::new("HITL", 9999, 4).unwrap();
        assert_eq!(id.next().unwrap().to_string(), "HITL-10000");
    }

    #[test]
    fn identifier_at_numeric_limit_has_no_successor() {
        let id = Identifier::new("TASK", u32::MAX, 3).unwrap();
        assert!(id.next().is_none());
    }

    #[test]
    fn identifier_converts_through_string() {
        let id = Identifier::new("WAIVER", 2, 4).unwrap();
        let s = String::from(id.clone());
        assert_eq!(s, "WAIVER-0002");
        assert_eq!(Identifier::try_from(s).unwrap(), id);
    }

    #[test]
    fn hitl_status_roundtrip() {
        for status in [
            HitlStatus::Pending,
            HitlStatus::InProgress,
            HitlStatus::Blocked,
            HitlStatus::Completed,
            HitlStatus::Superseded,
        ] {
            assert_eq!(HitlStatus::parse(status.label()), Some(status));
        }
        assert_eq!(HitlStatus::parse("unknown"), None);
        assert_eq!(
            HitlStatus::Superseded.lifecycle(),
            LifecycleState::Archived
        );
    }

    #[test]
    fn lifecycle_display_is_snake_case() {
        assert_eq!(LifecycleState::InProgress.to_string(), "in_progress");
        assert_eq!(WaiverState::Expired.to_string(), "expired");
    }
}
