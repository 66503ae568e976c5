//! Waiver files: creation and expiration checks.

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use repogov_markdown::{Document, field_value};
use repogov_shared::{Identifier, RepoGovError, Result, WaiverState};
use repogov_storage::WritePlan;

use crate::allocate::{Scope, allocate, numbers_in_names};
use crate::context::RepoContext;
use crate::lifecycle::{DATE_FORMAT, classify_waiver, parse_date};

pub const WAIVER_PREFIX: &str = "WAIVER";

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct NewWaiver {
    /// Policy or gate being waived.
    pub waives: String,
    pub why: String,
    pub scope: String,
    pub owner: String,
    /// `YYYY-MM-DD`.
    pub expiration: String,
    pub remediation: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatedWaiver {
    pub id: Identifier,
    pub path: PathBuf,
    pub plan: WritePlan,
}

/// A waiver file as read back for listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaiverSummary {
    pub file: String,
    pub waives: String,
    pub owner: String,
    pub expiration: NaiveDate,
    pub state: WaiverState,
}

#[instrument(skip_all, fields(waives = %waiver.waives))]
pub fn create(ctx: &RepoContext, waiver: &NewWaiver) -> Result<CreatedWaiver> {
    let expiration = parse_date(&waiver.expiration)?;
    if waiver.waives.trim().is_empty() {
        return Err(RepoGovError::validation("waiver must name what it waives"));
    }

    let dir = &ctx.paths.waivers_dir;
    let id = allocate(
        ctx,
        &[Scope::Directory(dir)],
        WAIVER_PREFIX,
        ctx.config.ids.waiver_width,
    )?;
    let path = dir.join(format!("{id}.md"));

    let mut plan = WritePlan::new();
    plan.push(&path, render(&id, waiver, expiration));
    info!(%id, "planned waiver");
    Ok(CreatedWaiver { id, path, plan })
}

/// Waiver file contents.
pub fn render(id: &Identifier, waiver: &NewWaiver, expiration: NaiveDate) -> String {
    let expiration = expiration.format(DATE_FORMAT).to_string();
    let mut fields = vec![
        ("Waiver ID", id.to_string()),
        ("Waives", waiver.waives.clone()),
        ("Why", waiver.why.clone()),
        ("Scope", waiver.scope.clone()),
        ("Owner", waiver.owner.clone()),
        ("Expiration", expiration.clone()),
    ];
    if let Some(plan) = &waiver.remediation {
        fields.push(("Remediation Plan", plan.clone()));
    }
    if let Some(link) = &waiver.link {
        fields.push(("Link", link.clone()));
    }

    let mut lines = vec![format!("# Waiver: {}", waiver.waives), String::new()];
    lines.extend(
        fields
            .into_iter()
            .map(|(name, value)| format!("**{name}**: {value}  ")),
    );
    lines.extend([
        String::new(),
        "**Notes**: Auto-generated waiver allowed for gate failures only.".to_string(),
        String::new(),
        "## Details".to_string(),
        String::new(),
        format!("- **Policy Being Waived**: {}", waiver.waives),
        format!("- **Justification**: {}", waiver.why),
        format!("- **Scope of Exception**: {}", waiver.scope),
        format!(
            "- **Remediation**: {}",
            waiver.remediation.as_deref().unwrap_or("To be determined")
        ),
        format!("- **Expiration Date**: {expiration}"),
        String::new(),
        "**Status**: Active".to_string(),
    ]);
    Document::from_lines(lines).render()
}

/// Read every `WAIVER-<digits>.md` file and classify it against `reference`.
///
/// Files without a parsable `Expiration` field are skipped.
pub fn scan(ctx: &RepoContext, reference: NaiveDate) -> Result<Vec<WaiverSummary>> {
    let dir = &ctx.paths.waivers_dir;
    let mut out = Vec::new();
    for name in ctx.store.list_dir(dir)? {
        if !name.ends_with(".md") || numbers_in_names([name.as_str()], WAIVER_PREFIX)?.is_empty() {
            continue;
        }
        let text = ctx.store.read_required(&dir.join(&name))?;
        let doc = Document::parse(&text);
        let lines = doc.lines();

        let Some(raw) = field_value(lines, "Expiration") else {
            warn!(file = %name, "waiver has no expiration date, skipping");
            continue;
        };
        let expiration = match parse_date(raw) {
            Ok(date) => date,
            Err(e) => {
                warn!(file = %name, error = %e, "waiver expiration unparsable, skipping");
                continue;
            }
        };

        let field = |n: &str| {
            field_value(lines, n)
                .filter(|v| !v.is_empty())
                .unwrap_or(UNKNOWN)
                .to_string()
        };
        out.push(WaiverSummary {
            file: name.clone(),
            waives: field("Waives"),
            owner: field("Owner"),
            expiration,
            state: classify_waiver(expiration, reference),
        });
    }
    Ok(out)
}

/// Waivers whose expiration is strictly before `reference`.
#[instrument(skip_all, fields(reference = %reference))]
pub fn check_expired(ctx: &RepoContext, reference: NaiveDate) -> Result<Vec<WaiverSummary>> {
    let expired: Vec<_> = scan(ctx, reference)?
        .into_iter()
        .filter(|w| w.state == WaiverState::Expired)
        .collect();
    if !expired.is_empty() {
        warn!(count = expired.len(), "expired waivers found");
    }
    Ok(expired)
}

/// Waivers still in force on `reference`.
pub fn list_active(ctx: &RepoContext, reference: NaiveDate) -> Result<Vec<WaiverSummary>> {
    Ok(scan(ctx, reference)?
        .into_iter()
        .filter(|w| w.state == WaiverState::Active)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use repogov_shared::RepoConfig;
    use repogov_storage::StoreOptions;
    use std::path::Path;

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("repogov-waiver-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn ctx(root: &Path) -> RepoContext {
        RepoContext::new(root, RepoConfig::default(), StoreOptions::default())
    }

    /// Temp root with the fixture waivers copied into `.repo/waivers`.
    fn seeded_root() -> PathBuf {
        let root = temp_root();
        let dir = root.join(".repo/waivers");
        std::fs::create_dir_all(&dir).unwrap();
        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures/waivers");
        for name in ["WAIVER-0001.md", "WAIVER-0003.md"] {
            std::fs::copy(fixtures.join(name), dir.join(name)).unwrap();
        }
        root
    }

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn request(expiration: &str) -> NewWaiver {
        NewWaiver {
            waives: "coverage threshold".to_string(),
            why: "legacy module".to_string(),
            scope: "packages/legacy".to_string(),
            owner: "data".to_string(),
            expiration: expiration.to_string(),
            remediation: None,
            link: None,
        }
    }

    #[test]
    fn create_allocates_after_highest_file() {
        let root = seeded_root();
        let created = create(&ctx(&root), &request("2025-02-01")).unwrap();
        assert_eq!(created.id.to_string(), "WAIVER-0004");
        assert_eq!(created.path, root.join(".repo/waivers/WAIVER-0004.md"));

        let text = created.plan.contents_for(&created.path).unwrap();
        assert!(text.starts_with("# Waiver: coverage threshold\n\n**Waiver ID**: WAIVER-0004  \n"));
        assert!(text.contains("**Expiration**: 2025-02-01  \n"));
        assert!(text.contains("- **Remediation**: To be determined\n"));
        assert!(text.ends_with("**Status**: Active\n"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn create_in_empty_directory_starts_at_one() {
        let root = temp_root();
        let created = create(&ctx(&root), &request("2025-02-01")).unwrap();
        assert_eq!(created.id.to_string(), "WAIVER-0001");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn invalid_expiration_is_rejected_before_allocation() {
        let root = temp_root();
        let err = create(&ctx(&root), &request("2025-02-30")).unwrap_err();
        assert!(matches!(err, RepoGovError::Validation { .. }));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn expiring_today_is_not_expired() {
        let root = seeded_root();
        let ctx = ctx(&root);
        let expired = check_expired(&ctx, date("2025-01-10")).unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].file, "WAIVER-0001.md");

        let active = list_active(&ctx, date("2025-01-10")).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].file, "WAIVER-0003.md");
        assert_eq!(active[0].owner, "data");
        assert_eq!(active[0].waives, "coverage threshold");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn files_without_expiration_are_skipped() {
        let root = seeded_root();
        let dir = root.join(".repo/waivers");
        std::fs::write(dir.join("WAIVER-0005.md"), "# Waiver: x\n\n**Owner**: a\n").unwrap();
        std::fs::write(dir.join("WAIVER-0006.md"), "**Expiration**: someday\n").unwrap();
        std::fs::write(dir.join("README.md"), "**Expiration**: 2000-01-01\n").unwrap();

        let all = scan(&ctx(&root), date("2025-01-10")).unwrap();
        let files: Vec<_> = all.iter().map(|w| w.file.as_str()).collect();
        assert_eq!(files, vec!["WAIVER-0001.md", "WAIVER-0003.md"]);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn absent_fields_read_as_unknown() {
        let root = temp_root();
        let dir = root.join(".repo/waivers");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("WAIVER-0002.md"), "**Expiration**: 2030-01-01\n").unwrap();

        let active = list_active(&ctx(&root), date("2025-01-10")).unwrap();
        assert_eq!(active[0].waives, "Unknown");
        assert_eq!(active[0].owner, "Unknown");
        let _ = std::fs::remove_dir_all(&root);
    }
}
