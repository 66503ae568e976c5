//! Repository and pull request discovery from the CI environment.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use repogov_shared::{RepoGovError, Result};

/// `git@github.com:owner/repo.git` and `https://github.com/owner/repo(.git)`.
static REMOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com[:/]([^/]+)/([^/]+?)(?:\.git)?$").expect("remote url regex")
});

/// An `owner/name` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    /// Parse `owner/name`.
    pub fn parse(slug: &str) -> Result<Self> {
        match slug.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(RepoGovError::config(format!(
                "repository '{slug}' is not of the form owner/name"
            ))),
        }
    }

    /// Extract the repository from a GitHub remote URL.
    pub fn from_remote_url(url: &str) -> Option<Self> {
        let caps = REMOTE_RE.captures(url.trim())?;
        Some(Self {
            owner: caps[1].to_string(),
            name: caps[2].to_string(),
        })
    }

    /// Resolve in order: configured slug, `GITHUB_REPOSITORY`, the `origin` remote.
    pub fn resolve(configured: &str, env_slug: Option<&str>, root: &Path) -> Result<Self> {
        if !configured.trim().is_empty() {
            return Self::parse(configured);
        }
        if let Some(slug) = env_slug.filter(|s| !s.trim().is_empty()) {
            return Self::parse(slug);
        }
        let url = origin_remote_url(root)?;
        Self::from_remote_url(&url).ok_or_else(|| {
            RepoGovError::config(format!("could not detect repository from remote '{url}'"))
        })
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// `git config --get remote.origin.url`, run inside `root`.
fn origin_remote_url(root: &Path) -> Result<String> {
    let output = std::process::Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["config", "--get", "remote.origin.url"])
        .output()
        .map_err(|e| RepoGovError::io(root, e))?;
    if !output.status.success() {
        return Err(RepoGovError::config(
            "could not detect repository; set [github] repository or GITHUB_REPOSITORY",
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[derive(Deserialize)]
struct EventPayload {
    pull_request: Option<EventPullRequest>,
}

#[derive(Deserialize)]
struct EventPullRequest {
    number: Option<u64>,
}

/// Pull request number from a GitHub Actions event payload file.
///
/// Payloads without a `pull_request.number` yield `None`.
pub fn pr_number_from_event(path: &Path) -> Result<Option<u64>> {
    let text = std::fs::read_to_string(path).map_err(|e| RepoGovError::io(path, e))?;
    let payload: EventPayload = serde_json::from_str(&text).map_err(|e| {
        RepoGovError::parse(format!("event payload {} is not JSON: {e}", path.display()))
    })?;
    Ok(payload.pull_request.and_then(|pr| pr.number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_slug() {
        let repo = Repository::parse("acme/widgets").unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.to_string(), "acme/widgets");
        assert!(Repository::parse("acme").is_err());
        assert!(Repository::parse("a/b/c").is_err());
    }

    #[test]
    fn remote_url_forms() {
        for url in [
            "git@github.com:acme/widgets.git",
            "https://github.com/acme/widgets.git",
            "https://github.com/acme/widgets",
        ] {
            let repo = Repository::from_remote_url(url).unwrap();
            assert_eq!(repo, Repository::parse("acme/widgets").unwrap(), "{url}");
        }
        assert!(Repository::from_remote_url("https://gitlab.com/acme/widgets").is_none());
    }

    #[test]
    fn configured_slug_wins() {
        let repo = Repository::resolve("acme/a", Some("acme/b"), Path::new(".")).unwrap();
        assert_eq!(repo.name, "a");
        let repo = Repository::resolve("", Some("acme/b"), Path::new(".")).unwrap();
        assert_eq!(repo.name, "b");
    }

    #[test]
    fn event_payload_number() {
        let dir = std::env::temp_dir().join(format!("repogov-event-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();

        let pr_event = dir.join("pr.json");
        std::fs::write(&pr_event, r#"{"action":"opened","pull_request":{"number":42}}"#).unwrap();
        assert_eq!(pr_number_from_event(&pr_event).unwrap(), Some(42));

        let push_event = dir.join("push.json");
        std::fs::write(&push_event, r#"{"ref":"refs/heads/main"}"#).unwrap();
        assert_eq!(pr_number_from_event(&push_event).unwrap(), None);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
