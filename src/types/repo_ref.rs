// ABOUTME: GitHub repository reference parsing and validation.
// ABOUTME: Accepts https://github.com/owner/repo with an optional .git suffix.

use std::fmt;
use thiserror::Error;

const GITHUB_PREFIX: &str = "https://github.com/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoRefError {
    #[error("repository URL cannot be empty")]
    Empty,

    #[error("only GitHub repositories over https are supported: {0}")]
    UnsupportedHost(String),

    #[error("repository URL must name exactly an owner and a repository: {0}")]
    InvalidPath(String),

    #[error("invalid character in repository URL: '{0}'")]
    InvalidChar(char),
}

/// A public GitHub repository, identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    owner: String,
    repo: String,
}

impl RepoRef {
    pub fn parse(input: &str) -> Result<Self, RepoRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RepoRefError::Empty);
        }

        let path = input
            .strip_prefix(GITHUB_PREFIX)
            .ok_or_else(|| RepoRefError::UnsupportedHost(input.to_string()))?;

        let path = path.strip_suffix('/').unwrap_or(path);
        let path = path.strip_suffix(".git").unwrap_or(path);

        let (owner, repo) = path
            .split_once('/')
            .ok_or_else(|| RepoRefError::InvalidPath(input.to_string()))?;

        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(RepoRefError::InvalidPath(input.to_string()));
        }

        for c in owner.chars().chain(repo.chars()) {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '.' {
                return Err(RepoRefError::InvalidChar(c));
            }
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// URL handed to `git clone`.
    pub fn clone_url(&self) -> String {
        format!("{}{}/{}.git", GITHUB_PREFIX, self.owner, self.repo)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
