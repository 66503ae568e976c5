//! Pull request description access over the GitHub REST API.
//!
//! The record store only needs two calls: read the current description of a
//! pull request and replace it. [`PullRequestBodies`] is that seam; the
//! [`GithubClient`] implements it with `reqwest`. Failures surface as
//! [`RepoGovError::Remote`] and are never retried.

mod repo;

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use repogov_shared::{GithubConfig, RepoGovError, Result};

pub use repo::{Repository, pr_number_from_event};

const USER_AGENT: &str = concat!("repogov/", env!("CARGO_PKG_VERSION"));

const ACCEPT_V3: &str = "application/vnd.github.v3+json";

// ---------------------------------------------------------------------------
// Seam
// ---------------------------------------------------------------------------

/// `GetBody` / `SetBody` for numbered pull requests.
pub trait PullRequestBodies {
    /// Current description; an absent description reads as empty.
    fn get_body(&self, number: u64) -> impl Future<Output = Result<String>> + Send;

    /// Replace the description.
    fn set_body(&self, number: u64, body: &str) -> impl Future<Output = Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Settings for [`GithubClient`].
#[derive(Debug, Clone)]
pub struct GithubOptions {
    pub api_base: Url,
    pub token: String,
    pub timeout_secs: u64,
}

impl GithubOptions {
    /// Options from the `[github]` config section and a resolved token.
    pub fn from_config(config: &GithubConfig, token: String) -> Result<Self> {
        let api_base = Url::parse(&config.api_base).map_err(|e| {
            RepoGovError::config(format!("invalid github api_base '{}': {e}", config.api_base))
        })?;
        Ok(Self {
            api_base,
            token,
            timeout_secs: config.timeout_secs,
        })
    }
}

/// REST client bound to one repository.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    api_base: Url,
    repository: Repository,
}

#[derive(Deserialize)]
struct PullRequest {
    body: Option<String>,
}

impl GithubClient {
    pub fn new(repository: Repository, opts: &GithubOptions) -> Result<Self> {
        Ok(Self {
            client: build_client(opts)?,
            api_base: opts.api_base.clone(),
            repository,
        })
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    fn pull_url(&self, number: u64) -> Result<Url> {
        let path = format!(
            "repos/{}/{}/pulls/{number}",
            self.repository.owner, self.repository.name
        );
        let mut base = self.api_base.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        base.join(&path)
            .map_err(|e| RepoGovError::config(format!("cannot build pull request URL: {e}")))
    }
}

impl PullRequestBodies for GithubClient {
    #[instrument(skip_all, fields(repo = %self.repository, pr = number))]
    async fn get_body(&self, number: u64) -> Result<String> {
        let url = self.pull_url(number)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| RepoGovError::Remote(format!("{url}: {e}")))?;
        let response = check_status(response, &url)?;
        let pr: PullRequest = response
            .json()
            .await
            .map_err(|e| RepoGovError::Remote(format!("{url}: unreadable response: {e}")))?;
        let body = pr.body.unwrap_or_default();
        debug!(len = body.len(), "fetched pull request body");
        Ok(body)
    }

    #[instrument(skip_all, fields(repo = %self.repository, pr = number))]
    async fn set_body(&self, number: u64, body: &str) -> Result<()> {
        let url = self.pull_url(number)?;
        let response = self
            .client
            .patch(url.clone())
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await
            .map_err(|e| RepoGovError::Remote(format!("{url}: {e}")))?;
        check_status(response, &url)?;
        info!("updated pull request body");
        Ok(())
    }
}

/// Build a reqwest client with auth and API headers preset.
fn build_client(opts: &GithubOptions) -> Result<Client> {
    let mut headers = HeaderMap::new();
    let auth = HeaderValue::from_str(&format!("token {}", opts.token))
        .map_err(|_| RepoGovError::config("github token contains invalid header characters"))?;
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V3));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| RepoGovError::Remote(format!("failed to build HTTP client: {e}")))
}

fn check_status(response: reqwest::Response, url: &Url) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(RepoGovError::Remote(format!("{url}: HTTP {status}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GithubClient {
        let opts = GithubOptions {
            api_base: Url::parse(&server.uri()).unwrap(),
            token: "secret".to_string(),
            timeout_secs: 5,
        };
        GithubClient::new(Repository::parse("acme/widgets").unwrap(), &opts).unwrap()
    }

    #[tokio::test]
    async fn get_body_sends_token_and_reads_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/7"))
            .and(header("authorization", "token secret"))
            .and(header("accept", ACCEPT_V3))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "number": 7, "body": "Intro text" })),
            )
            .mount(&server)
            .await;

        let body = client_for(&server).get_body(7).await.unwrap();
        assert_eq!(body, "Intro text");
    }

    #[tokio::test]
    async fn null_body_reads_as_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "body": null })))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).get_body(8).await.unwrap(), "");
    }

    #[tokio::test]
    async fn set_body_patches_description() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/repos/acme/widgets/pulls/7"))
            .and(body_json(serde_json::json!({ "body": "new body" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "number": 7 })))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).set_body(7, "new body").await.unwrap();
    }

    #[tokio::test]
    async fn http_errors_are_remote_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/9"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server).get_body(9).await.unwrap_err();
        assert!(matches!(err, RepoGovError::Remote(ref msg) if msg.contains("401")));
    }

    #[test]
    fn pull_url_respects_base_path() {
        let opts = GithubOptions {
            api_base: Url::parse("https://ghe.example.com/api/v3").unwrap(),
            token: "t".to_string(),
            timeout_secs: 5,
        };
        let client = GithubClient::new(Repository::parse("acme/widgets").unwrap(), &opts).unwrap();
        assert_eq!(
            client.pull_url(3).unwrap().as_str(),
            "https://ghe.example.com/api/v3/repos/acme/widgets/pulls/3"
        );
    }
}
