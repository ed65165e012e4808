//! Configuration Module
//!
//! Connection settings for the source clients.
//! Config is stored in `~/.config/factgraph/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`GITHUB_TOKEN`, `PROMETHEUS_URL`, ...), including `.env`
//! 2. Config file (`~/.config/factgraph/config.toml` or `--config`)
//! 3. Defaults

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FactError, Result};
use crate::util::FETCH_TIMEOUT;

/// Default organisation owning the repositories facts point at
pub const DEFAULT_GITHUB_ORG: &str = "motain";
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FactConfig {
    #[serde(default)]
    pub github: GitHubSettings,
    #[serde(default)]
    pub prometheus: PrometheusSettings,
    #[serde(default)]
    pub http: HttpSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GitHubSettings {
    /// Organisation owning the repositories (GITHUB_ORG)
    pub org: Option<String>,
    /// API token (GITHUB_TOKEN)
    pub token: Option<String>,
    /// API base URL, for GitHub Enterprise or tests
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrometheusSettings {
    /// Query endpoint base URL (PROMETHEUS_URL)
    pub url: Option<String>,
    /// Bearer token (PROMETHEUS_TOKEN)
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HttpSettings {
    pub timeout_secs: Option<u64>,
}

impl FactConfig {
    /// Returns `~/.config/factgraph/` on Unix, `%APPDATA%/factgraph/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("factgraph")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from the default location; a missing file yields defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path; a missing file yields defaults,
    /// a malformed one is an error
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| FactError::Config {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| FactError::Config {
            reason: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Merge with process environment variables
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Merge with variables from `lookup`; non-empty values win over the file
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(org) = get("GITHUB_ORG") {
            self.github.org = Some(org);
        }
        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(url) = get("GITHUB_API_URL") {
            self.github.api_url = Some(url);
        }
        if let Some(url) = get("PROMETHEUS_URL") {
            self.prometheus.url = Some(url);
        }
        if let Some(token) = get("PROMETHEUS_TOKEN") {
            self.prometheus.token = Some(token);
        }
        if let Some(timeout) = get("FACTGRAPH_HTTP_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.http.timeout_secs = Some(timeout);
        }

        self
    }

    pub fn github_org(&self) -> &str {
        self.github.org.as_deref().unwrap_or(DEFAULT_GITHUB_ORG)
    }

    pub fn github_api_url(&self) -> &str {
        self.github.api_url.as_deref().unwrap_or(DEFAULT_GITHUB_API)
    }

    pub fn http_timeout(&self) -> Duration {
        self.http
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(FETCH_TIMEOUT)
    }
}

/// Resolves the `tokenVar` of a JSON API fact into a secret
pub trait TokenSource: Send + Sync {
    fn token(&self, var: &str) -> Option<String>;
}

impl FactConfig {
    /// Read an arbitrary variable: the environment first, then the matching config value
    pub fn get(&self, var: &str) -> Option<String> {
        std::env::var(var)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| match var {
                "GITHUB_TOKEN" => self.github.token.clone(),
                "PROMETHEUS_TOKEN" => self.prometheus.token.clone(),
                _ => None,
            })
    }
}

impl TokenSource for FactConfig {
    fn token(&self, var: &str) -> Option<String> {
        self.get(var)
    }
}

/// Fixed tokens, for tests and dry runs
impl TokenSource for HashMap<String, String> {
    fn token(&self, var: &str) -> Option<String> {
        self.get(var).cloned()
    }
}

/// Mask a secret for display: first N chars + asterisks
pub fn mask_secret(secret: &str, visible_chars: usize) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let visible: String = secret.chars().take(visible_chars).collect();
    format!("{}***", visible)
}
