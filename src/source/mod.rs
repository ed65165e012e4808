//! # Source Clients
//!
//! Thin clients for the three places an extract fact can read from:
//!
//! - [`SourceControl`] - file content and code search (`source: github`)
//! - [`JsonApi`] - authenticated GET against a JSON HTTP API (`source: jsonapi`)
//! - [`TimeSeries`] - instant queries against Prometheus (`source: prometheus`)
//!
//! The extractor only sees the traits. Real implementations share one
//! `reqwest::Client`; the [`mock`] module provides in-memory doubles.
//!
//! ```rust
//! use factgraph::source::mock::MockSourceControl;
//!
//! let github = MockSourceControl::new().with_file("svc", "Chart.yaml", "version: 1");
//! assert_eq!(github.files().len(), 1);
//! ```

mod github;
mod json_api;
pub mod mock;
mod prometheus;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::FactConfig;
use crate::error::{FactError, Result};
use crate::util::{CONNECT_TIMEOUT, REDIRECT_LIMIT, USER_AGENT};

pub use github::GitHubClient;
pub use json_api::HttpJsonApi;
pub use prometheus::PrometheusClient;

/// Repository file access and code search
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Raw content of `path` in `repo`. A missing file is [`FactError::NotFound`].
    async fn file_content(&self, repo: &str, path: &str) -> Result<String>;

    /// Paths of files in `repo` matching `query`
    async fn search(&self, repo: &str, query: &str) -> Result<Vec<String>>;
}

/// A GET request against a JSON API
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Generic JSON HTTP executor
#[async_trait]
pub trait JsonApi: Send + Sync {
    /// Execute the request and return the response body
    async fn execute(&self, request: ApiRequest) -> Result<Vec<u8>>;
}

/// Numeric time-series backend
#[async_trait]
pub trait TimeSeries: Send + Sync {
    /// Evaluate `query` at the current instant
    async fn instant_query(&self, query: &str) -> Result<f64>;
}

/// The three clients an extractor needs
#[derive(Clone)]
pub struct Sources {
    pub source_control: Arc<dyn SourceControl>,
    pub json_api: Arc<dyn JsonApi>,
    pub time_series: Arc<dyn TimeSeries>,
}

impl Sources {
    /// Real clients built from configuration
    pub fn from_config(config: &FactConfig) -> Result<Self> {
        let client = http_client(config.http_timeout())?;

        let github = GitHubClient::new(
            client.clone(),
            config.github_api_url(),
            config.github_org(),
            config.github.token.clone(),
        );
        let prometheus = PrometheusClient::new(
            client.clone(),
            config.prometheus.url.clone().unwrap_or_default(),
            config.prometheus.token.clone(),
        );

        Ok(Self {
            source_control: Arc::new(github),
            json_api: Arc::new(HttpJsonApi::new(client)),
            time_series: Arc::new(prometheus),
        })
    }

    /// In-memory clients with no data: every file is a soft miss
    pub fn empty() -> Self {
        Self {
            source_control: Arc::new(mock::MockSourceControl::new()),
            json_api: Arc::new(mock::MockJsonApi::new()),
            time_series: Arc::new(mock::MockTimeSeries::new()),
        }
    }
}

/// Shared HTTP client (connection pooling) for every source
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(REDIRECT_LIMIT))
        .user_agent(USER_AGENT)
        .build()
        .map_err(FactError::from)
}

/// Map a non-success response to an error, keeping 404s recognisable as soft misses
pub(crate) fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(FactError::HttpStatus {
        status: status.as_u16(),
        url: response.url().to_string(),
    })
}
