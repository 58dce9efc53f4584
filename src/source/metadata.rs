// ABOUTME: Repository metadata lookups against the hosting provider.
// ABOUTME: GitHub REST implementation with a bounded request timeout.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use crate::config::GithubConfig;
use crate::types::RepoRef;

/// What validation needs to know about a remote repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RepoMetadata {
    pub private: bool,
}

/// Errors from a metadata lookup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("repository not found")]
    NotFound,

    #[error("{0}")]
    Unavailable(String),
}

/// Read-only oracle answering "does this repository exist, and is it private?".
#[async_trait]
pub trait MetadataOracle: Send + Sync {
    async fn fetch(&self, repo: &RepoRef) -> Result<RepoMetadata, MetadataError>;
}

/// Queries `GET {api_url}/repos/{owner}/{repo}`.
#[derive(Debug, Clone)]
pub struct GithubMetadata {
    client: reqwest::Client,
    api_url: String,
}

impl GithubMetadata {
    pub fn new(config: &GithubConfig) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(5)))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| MetadataError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn repo_url(&self, repo: &RepoRef) -> String {
        format!("{}/repos/{}/{}", self.api_url, repo.owner(), repo.repo())
    }
}

#[async_trait]
impl MetadataOracle for GithubMetadata {
    async fn fetch(&self, repo: &RepoRef) -> Result<RepoMetadata, MetadataError> {
        let url = self.repo_url(repo);
        tracing::debug!(%url, "fetching repository metadata");

        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MetadataError::Unavailable(format!("request to {url} timed out"))
                } else {
                    MetadataError::Unavailable(format!("request to {url} failed: {e}"))
                }
            })?;

        check_status(resp.status())?;

        resp.json::<RepoMetadata>()
            .await
            .map_err(|e| MetadataError::Unavailable(format!("unreadable metadata response: {e}")))
    }
}

/// 404 means the repository is unknown; any other non-2xx means the provider
/// could not answer.
fn check_status(status: StatusCode) -> Result<(), MetadataError> {
    if status == StatusCode::NOT_FOUND {
        return Err(MetadataError::NotFound);
    }
    if !status.is_success() {
        return Err(MetadataError::Unavailable(format!(
            "metadata request returned {status}"
        )));
    }
    Ok(())
}
