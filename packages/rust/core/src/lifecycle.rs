//! Lifecycle classification from embedded field values.

use chrono::NaiveDate;
use tracing::warn;

use repogov_markdown::{Document, LineKind, RecordSpan, field_value};
use repogov_shared::{HitlStatus, LifecycleState, RepoGovError, Result, WaiverState};

/// Calendar date format used by every governance document.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A waiver is expired only when its expiration date is strictly before the
/// reference date: a waiver expiring today is still active.
pub fn classify_waiver(expiration: NaiveDate, reference: NaiveDate) -> WaiverState {
    if expiration < reference {
        WaiverState::Expired
    } else {
        WaiverState::Active
    }
}

/// Checkbox state maps directly onto pending / completed.
pub fn classify_checkbox(checked: bool) -> LifecycleState {
    if checked {
        LifecycleState::Completed
    } else {
        LifecycleState::Pending
    }
}

/// Map a `Status` field value. Unknown values yield `None`.
pub fn classify_status(value: &str) -> Option<LifecycleState> {
    if let Some(status) = HitlStatus::parse(value) {
        return Some(status.lifecycle());
    }
    match value.trim().to_ascii_lowercase().as_str() {
        "archived" => Some(LifecycleState::Archived),
        "done" => Some(LifecycleState::Completed),
        _ => None,
    }
}

/// Classify a located task record: a checklist record by its checkbox, a
/// heading record by its `Status` field (pending when absent or unknown).
pub fn classify_record(doc: &Document, span: &RecordSpan) -> LifecycleState {
    match span.kind {
        LineKind::Checklist { checked, .. } => classify_checkbox(checked),
        _ => match field_value(doc.slice(span.content_range()), "Status") {
            Some(value) => classify_status(value).unwrap_or_else(|| {
                warn!(status = value, "unknown status value; treating record as pending");
                LifecycleState::Pending
            }),
            None => LifecycleState::Pending,
        },
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        RepoGovError::validation(format!("'{value}' is not a YYYY-MM-DD date: {e}"))
    })
}
