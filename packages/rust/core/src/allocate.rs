//! Sequential identifier allocation.
//!
//! The next identifier is always `max(existing) + 1`, never the first gap,
//! and `1` for an empty or missing scope. Allocation is a pure scan with no
//! reservation: two concurrent callers can be handed the same identifier.

use std::path::Path;

use regex::Regex;
use tracing::debug;

use repogov_markdown::scan_identifiers;
use repogov_shared::{Identifier, RepoGovError, Result};

use crate::context::RepoContext;

/// Where existing identifiers are read from.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// A directory of per-record files named `PREFIX-<digits>.ext`.
    Directory(&'a Path),
    /// A document with embedded `PREFIX-<digits>` tokens.
    Document(&'a Path),
}

/// Next identifier after the largest of `existing`.
pub fn next_after<I>(existing: I, prefix: &str, width: usize) -> Result<Identifier>
where
    I: IntoIterator<Item = u32>,
{
    let next = match existing.into_iter().max() {
        Some(u32::MAX) => {
            return Err(RepoGovError::validation(format!(
                "identifier space for {prefix} is exhausted"
            )));
        }
        Some(max) => max + 1,
        None => 1,
    };
    Identifier::new(prefix, next, width)
}

/// Numbers carried by file names of the form `PREFIX-<digits>` or `PREFIX-<digits>.ext`.
pub fn numbers_in_names<'a, I>(names: I, prefix: &str) -> Result<Vec<u32>>
where
    I: IntoIterator<Item = &'a str>,
{
    let pattern = format!(r"^{}-(\d+)(?:\.|$)", regex::escape(prefix));
    let re = Regex::new(&pattern)
        .map_err(|e| RepoGovError::validation(format!("unusable prefix '{prefix}': {e}")))?;
    Ok(names
        .into_iter()
        .filter_map(|name| re.captures(name))
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .collect())
}

/// Numbers carried by `PREFIX-<digits>` tokens anywhere in `text`.
pub fn numbers_in_text(text: &str, prefix: &str) -> Vec<u32> {
    scan_identifiers(text, prefix)
        .iter()
        .map(Identifier::number)
        .collect()
}

/// Collect every number in `scope`.
pub fn scan_scope(ctx: &RepoContext, scope: Scope<'_>, prefix: &str) -> Result<Vec<u32>> {
    match scope {
        Scope::Directory(dir) => {
            let names = ctx.store.list_dir(dir)?;
            numbers_in_names(names.iter().map(String::as_str), prefix)
        }
        Scope::Document(path) => Ok(ctx
            .store
            .read_optional(path)?
            .map(|text| numbers_in_text(&text, prefix))
            .unwrap_or_default()),
    }
}

/// Allocate the next identifier across the union of `scopes`.
pub fn allocate(
    ctx: &RepoContext,
    scopes: &[Scope<'_>],
    prefix: &str,
    width: usize,
) -> Result<Identifier> {
    let mut numbers = Vec::new();
    for scope in scopes {
        numbers.extend(scan_scope(ctx, *scope, prefix)?);
    }
    let id = next_after(numbers.iter().copied(), prefix, width)?;
    debug!(%id, existing = numbers.len(), "allocated identifier");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use repogov_shared::RepoConfig;
    use repogov_storage::StoreOptions;
    use std::path::PathBuf;

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("repogov-alloc-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn ctx(root: &Path) -> RepoContext {
        RepoContext::new(root, RepoConfig::default(), StoreOptions::default())
    }

    #[test]
    fn max_plus_one_not_first_gap() {
        let root = temp_root();
        let dir = root.join("waivers");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("PREFIX-0001.md"), "").unwrap();
        std::fs::write(dir.join("PREFIX-0003.md"), "").unwrap();

        let id = allocate(&ctx(&root), &[Scope::Directory(&dir)], "PREFIX", 4).unwrap();
        assert_eq!(id.to_string(), "PREFIX-0004");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn empty_waivers_directory_starts_at_one() {
        let root = temp_root();
        let dir = root.join(".repo/waivers");
        std::fs::create_dir_all(&dir).unwrap();
        let id = allocate(&ctx(&root), &[Scope::Directory(&dir)], "WAIVER", 4).unwrap();
        assert_eq!(id.to_string(), "WAIVER-0001");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_scopes_start_at_one() {
        let root = temp_root();
        let c = ctx(&root);
        let id = allocate(
            &c,
            &[
                Scope::Directory(&root.join("nope")),
                Scope::Document(&root.join("nope.md")),
            ],
            "HITL",
            4,
        )
        .unwrap();
        assert_eq!(id.to_string(), "HITL-0001");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn union_of_document_and_directory() {
        let root = temp_root();
        let index = root.join("HITL.md");
        std::fs::write(&index, "|HITL-0002|Risk|Pending|x|\nsee HITL-0001\n").unwrap();
        let dir = root.join("hitl");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("HITL-0005.md"), "").unwrap();

        let id = allocate(
            &ctx(&root),
            &[Scope::Document(&index), Scope::Directory(&dir)],
            "HITL",
            4,
        )
        .unwrap();
        assert_eq!(id.to_string(), "HITL-0006");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn file_names_must_match_prefix_exactly() {
        let names = ["WAIVER-0002.md", "WAIVER-0010", "XWAIVER-0099.md", "WAIVER-12a.md", "notes.md"];
        let numbers = numbers_in_names(names, "WAIVER").unwrap();
        assert_eq!(numbers, vec![2, 10]);
    }

    #[test]
    fn allocation_is_deterministic() {
        let a = next_after([1, 3], "TASK", 3).unwrap();
        let b = next_after([3, 1], "TASK", 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "TASK-004");
    }

    #[test]
    fn exhausted_space_is_an_error() {
        assert!(next_after([u32::MAX], "TASK", 3).is_err());
    }
}
