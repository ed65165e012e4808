//! Mock sources for testing
//!
//! In-memory implementations of the source traits. Every call is recorded
//! so tests can assert on the placeholder-substituted targets.
//! Unknown files are `NotFound` (soft miss); unknown URLs and queries fail.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{ApiRequest, JsonApi, SourceControl, TimeSeries};
use crate::error::{FactError, Result};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Source-control double keyed by `(repo, path)`
#[derive(Clone, Default)]
pub struct MockSourceControl {
    files: HashMap<(String, String), String>,
    search_results: HashMap<(String, String), Vec<String>>,
    /// Error message returned for every call when set
    failure: Option<String>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockSourceControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(
        mut self,
        repo: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.files.insert((repo.into(), path.into()), content.into());
        self
    }

    pub fn with_search(
        mut self,
        repo: impl Into<String>,
        query: impl Into<String>,
        paths: Vec<&str>,
    ) -> Self {
        self.search_results.insert(
            (repo.into(), query.into()),
            paths.into_iter().map(String::from).collect(),
        );
        self
    }

    /// Fail every call with a transport error
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn files(&self) -> Vec<(String, String)> {
        self.files.keys().cloned().collect()
    }

    /// Every `(repo, path)` or `(repo, query)` requested, in call order
    pub fn requests(&self) -> Vec<(String, String)> {
        lock(&self.requests).clone()
    }

    fn record(&self, repo: &str, target: &str) -> Result<()> {
        lock(&self.requests).push((repo.to_string(), target.to_string()));
        match &self.failure {
            Some(message) => Err(FactError::Query {
                reason: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SourceControl for MockSourceControl {
    async fn file_content(&self, repo: &str, path: &str) -> Result<String> {
        self.record(repo, path)?;
        self.files
            .get(&(repo.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| FactError::NotFound {
                resource: format!("{}/{}", repo, path),
            })
    }

    async fn search(&self, repo: &str, query: &str) -> Result<Vec<String>> {
        self.record(repo, query)?;
        Ok(self
            .search_results
            .get(&(repo.to_string(), query.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// JSON API double keyed by URL
#[derive(Clone, Default)]
pub struct MockJsonApi {
    responses: HashMap<String, Vec<u8>>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockJsonApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.into(), body.into());
        self
    }

    /// Sleep before answering every request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.requests).clone()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        lock(&self.requests).last().cloned()
    }
}

#[async_trait]
impl JsonApi for MockJsonApi {
    async fn execute(&self, request: ApiRequest) -> Result<Vec<u8>> {
        lock(&self.requests).push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .get(&request.url)
            .cloned()
            .ok_or(FactError::HttpStatus {
                status: 404,
                url: request.url,
            })
    }
}

/// Time-series double keyed by query string
#[derive(Clone, Default)]
pub struct MockTimeSeries {
    values: HashMap<String, f64>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockTimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, query: impl Into<String>, value: f64) -> Self {
        self.values.insert(query.into(), value);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }
}

#[async_trait]
impl TimeSeries for MockTimeSeries {
    async fn instant_query(&self, query: &str) -> Result<f64> {
        lock(&self.queries).push(query.to_string());
        self.values
            .get(query)
            .copied()
            .ok_or_else(|| FactError::Query {
                reason: format!("no data for query '{}'", query),
            })
    }
}
