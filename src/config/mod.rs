// ABOUTME: Configuration types and parsing for dockyard.yml.
// ABOUTME: Every field has a default; a missing config file means all defaults.

mod github;
mod init;

pub use github::GithubConfig;
pub use init::init_config;

use crate::deploy::{DEFAULT_BUILD_DESCRIPTOR, DEFAULT_DIAGNOSTIC_TAIL};
use crate::error::{Error, Result};
use crate::runtime::RuntimeConfig;
use crate::store::DEFAULT_INTERNAL_PORT_BASE;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "dockyard.yml";
pub const CONFIG_FILENAME_ALT: &str = "dockyard.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".dockyard/config.yml";

/// File holding application records, relative to `state_dir`.
pub const STORE_FILENAME: &str = "applications.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parent of every application's working tree.
    pub apps_dir: PathBuf,

    /// Application records and deploy locks.
    pub state_dir: PathBuf,

    pub runtime: RuntimeConfig,

    pub git_binary: String,

    pub github: GithubConfig,

    pub build: BuildConfig,

    pub ports: PortsConfig,

    /// Age after which a deploy lock is considered abandoned.
    #[serde(with = "humantime_serde")]
    pub lock_stale_after: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// File that must exist at the repository root.
    pub descriptor: String,
    /// Build output lines kept for failure reports.
    pub diagnostic_tail: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            descriptor: DEFAULT_BUILD_DESCRIPTOR.to_string(),
            diagnostic_tail: DEFAULT_DIAGNOSTIC_TAIL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PortsConfig {
    /// Application `n` publishes on host port `internal_base + n`.
    pub internal_base: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            internal_base: DEFAULT_INTERNAL_PORT_BASE,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            apps_dir: PathBuf::from("/opt/apps"),
            state_dir: PathBuf::from("/var/lib/dockyard"),
            runtime: RuntimeConfig::default(),
            git_binary: "git".to_string(),
            github: GithubConfig::default(),
            build: BuildConfig::default(),
            ports: PortsConfig::default(),
            lock_stale_after: Duration::from_secs(60 * 60),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty map.
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the first config file found in `dir`.
    pub fn discover(dir: &Path) -> Result<Self> {
        match Self::find(dir) {
            Some(path) => Self::load(&path),
            None => Err(Error::ConfigNotFound(dir.to_path_buf())),
        }
    }

    /// Like `discover`, but fall back to defaults when no file exists.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::find(dir) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    fn find(dir: &Path) -> Option<PathBuf> {
        [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    pub fn validate(&self) -> Result<()> {
        if self.build.diagnostic_tail == 0 {
            return Err(Error::InvalidConfig(
                "build.diagnostic_tail must be at least 1".to_string(),
            ));
        }
        if self.build.descriptor.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "build.descriptor cannot be empty".to_string(),
            ));
        }
        if self.ports.internal_base < 1024 {
            return Err(Error::InvalidConfig(format!(
                "ports.internal_base {} is below 1024",
                self.ports.internal_base
            )));
        }
        if self.github.timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "github.timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        self.state_dir.join(STORE_FILENAME)
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.state_dir.join("locks")
    }
}
