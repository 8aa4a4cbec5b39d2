// ABOUTME: Configuration types and parsing for imagewait.yml.
// ABOUTME: Merges file settings with command-line overrides into a WaitRequest.

mod env_value;
mod init;

pub use env_value::EnvValue;
pub use init::init_config;

use crate::error::{Error, Result};
use crate::types::{Credentials, Secret};
use crate::wait::{Backoff, DEFAULT_REGISTRY, DEFAULT_TIMEOUT, WaitRequest};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "imagewait.yml";
pub const CONFIG_FILENAME_ALT: &str = "imagewait.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".imagewait/config.yml";

/// Settings read from a config file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub registry: Option<String>,

    #[serde(default)]
    pub username: Option<EnvValue>,

    #[serde(default)]
    pub password: Option<EnvValue>,

    #[serde(default)]
    pub image: Option<String>,

    /// Seconds.
    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(default)]
    pub fail_after_timeout: Option<bool>,

    #[serde(default)]
    pub insecure: Option<bool>,

    #[serde(default)]
    pub backoff: BackoffConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackoffConfig {
    #[serde(default = "default_backoff_initial", with = "humantime_serde")]
    pub initial: Duration,

    #[serde(default = "default_backoff_step", with = "humantime_serde")]
    pub step: Duration,

    #[serde(default = "default_backoff_max", with = "humantime_serde")]
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: default_backoff_initial(),
            step: default_backoff_step(),
            max: default_backoff_max(),
        }
    }
}

fn default_backoff_initial() -> Duration {
    Backoff::DEFAULT_INITIAL
}

fn default_backoff_step() -> Duration {
    Backoff::DEFAULT_STEP
}

fn default_backoff_max() -> Duration {
    Backoff::DEFAULT_MAX
}

/// Values given on the command line. They win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub registry: Option<String>,
    pub username: Option<String>,
    pub password: Option<Secret>,
    pub image: Option<String>,
    pub timeout: Option<u64>,
    pub fail_after_timeout: Option<bool>,
    pub insecure: bool,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Look for a config file in `dir`. Having none is fine.
    pub fn discover(dir: &Path) -> Result<Option<Self>> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("Using config file {}", path.display());
                return Self::load(path).map(Some);
            }
        }

        Ok(None)
    }

    /// Combine with command-line overrides and validate.
    pub fn into_request(self, overrides: Overrides) -> Result<(WaitRequest, Backoff)> {
        let image = overrides
            .image
            .or(self.image)
            .ok_or(Error::MissingImage)?;

        let registry = overrides
            .registry
            .or(self.registry)
            .unwrap_or_else(|| DEFAULT_REGISTRY.to_string());
        if registry.is_empty() {
            return Err(Error::InvalidConfig("registry cannot be empty".to_string()));
        }
        if registry.contains("://") {
            return Err(Error::InvalidConfig(format!(
                "registry should be a host without a scheme: {}",
                registry
            )));
        }

        let username = match overrides.username {
            Some(username) => username,
            None => self
                .username
                .as_ref()
                .map(EnvValue::resolve)
                .transpose()?
                .unwrap_or_default(),
        };
        let password = match overrides.password {
            Some(password) => password,
            None => self
                .password
                .as_ref()
                .map(EnvValue::resolve)
                .transpose()?
                .map(Secret::from)
                .unwrap_or_default(),
        };

        let timeout = match overrides.timeout.or(self.timeout) {
            Some(0) => {
                return Err(Error::InvalidConfig(
                    "timeout must be a positive number of seconds".to_string(),
                ));
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        let backoff = Backoff::new(self.backoff.initial, self.backoff.step, self.backoff.max)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        let request = WaitRequest::new(image)
            .registry(registry)
            .credentials(Credentials::new(username, password))
            .timeout(timeout)
            .fail_after_timeout(
                overrides
                    .fail_after_timeout
                    .or(self.fail_after_timeout)
                    .unwrap_or(true),
            )
            .insecure(overrides.insecure || self.insecure.unwrap_or(false));

        Ok((request, backoff))
    }
}
