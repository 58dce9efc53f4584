// ABOUTME: Settings for the GitHub repository metadata API.
// ABOUTME: Base URL, request timeout, and User-Agent header.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_url: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            timeout: Duration::from_secs(5),
            user_agent: concat!("dockyard/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
