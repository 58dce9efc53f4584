// ABOUTME: Durable application identifier.
// ABOUTME: Positive integer assigned once at creation and never reused.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApplicationIdError {
    #[error("application id must be greater than zero")]
    Zero,

    #[error("invalid application id: {0}")]
    NotANumber(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ApplicationId(u32);

impl ApplicationId {
    pub fn new(value: u32) -> Result<Self, ApplicationIdError> {
        if value == 0 {
            return Err(ApplicationIdError::Zero);
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Prefix shared by every resource named after this application.
    pub fn slug(self) -> String {
        format!("app-{}", self.0)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApplicationId {
    type Err = ApplicationIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| ApplicationIdError::NotANumber(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<u32> for ApplicationId {
    type Error = ApplicationIdError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ApplicationId> for u32 {
    fn from(id: ApplicationId) -> Self {
        id.0
    }
}
