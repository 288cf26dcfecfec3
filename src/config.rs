//! Connection settings for a GoCD server.
//!
//! Settings are layered: a profile from the YAML config file
//! (`~/.gocd.conf`), then `GOCD_*` environment variables, then explicit
//! values from CLI flags or the provider configuration block.
//!
//! ```yaml
//! default:
//!   server: https://ci.example.com
//!   username: admin
//! staging:
//!   server: https://staging.example.com
//!   skip_ssl_check: true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default profile name in the config file.
pub const DEFAULT_PROFILE: &str = "default";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the server URL.
pub const ENV_SERVER: &str = "GOCD_SERVER";
/// Environment variable holding the username.
pub const ENV_USERNAME: &str = "GOCD_USERNAME";
/// Environment variable holding the password.
pub const ENV_PASSWORD: &str = "GOCD_PASSWORD";
/// Environment variable that disables TLS verification when truthy.
pub const ENV_SKIP_SSL_CHECK: &str = "GOCD_SKIP_SSL_CHECK";

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server URL, with or without the trailing `/go`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub skip_ssl_check: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Location of the config file in the user's home directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".gocd.conf"))
    }

    /// Load the file layer.
    ///
    /// A `path` or `profile` named explicitly must exist. Without them,
    /// the `default` profile of `~/.gocd.conf` is used when there is one.
    pub fn load(path: Option<&Path>, profile: Option<&str>) -> Result<Self> {
        let explicit_path = path.is_some();
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Ok(Self::default());
        };
        if !path.exists() {
            if explicit_path {
                return Err(Error::Configuration(format!("config file {} not found", path.display())));
            }
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let mut profiles = read_profiles(&path)?;
        match profile {
            Some(name) => profiles.remove(name).ok_or_else(|| {
                Error::Configuration(format!("profile '{}' not found in {}", name, path.display()))
            }),
            None => Ok(profiles.remove(DEFAULT_PROFILE).unwrap_or_default()),
        }
    }

    /// Overlay values from `GOCD_*` environment variables.
    pub fn with_env(self) -> Self {
        self.with_lookup(|key| std::env::var(key).ok())
    }

    fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(server) = non_empty(ENV_SERVER) {
            self.server = Some(server);
        }
        if let Some(username) = non_empty(ENV_USERNAME) {
            self.username = Some(username);
        }
        if let Some(password) = non_empty(ENV_PASSWORD) {
            self.password = Some(password);
        }
        if let Some(skip) = non_empty(ENV_SKIP_SSL_CHECK) {
            self.skip_ssl_check = is_truthy(&skip);
        }
        self
    }

    /// Overlay values that were given explicitly.
    pub fn merge(mut self, other: Config) -> Self {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.username.is_some() {
            self.username = other.username;
        }
        if other.password.is_some() {
            self.password = other.password;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        self.skip_ssl_check |= other.skip_ssl_check;
        self
    }

    /// Base URL of the API, always ending in `/go` and without a trailing slash.
    pub fn base_url(&self) -> Result<String> {
        let server = self
            .server
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "no GoCD server configured; set '--server' or {}",
                    ENV_SERVER
                ))
            })?;

        let trimmed = server.trim_end_matches('/');
        if trimmed.ends_with("/go") {
            Ok(trimmed.to_string())
        } else {
            Ok(format!("{}/go", trimmed))
        }
    }

    /// Request timeout in seconds.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

fn read_profiles(path: &Path) -> Result<BTreeMap<String, Config>> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_yaml::from_str(&content).map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
