//! Extractor - fetches and shapes data for `extract` tasks
//!
//! The single extract dependency (if any) decides how many fetches run:
//! - none, or a dependency without result: one fetch, empty placeholder
//! - scalar result: one fetch, placeholder = the value
//! - list result: one fetch per element, results flattened in order
//!
//! Fetched bytes are then shaped by the task's rule (`jsonpath`, `notempty`, raw).

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::task::Task;
use crate::ast::{Fact, Rule, Source};
use crate::config::TokenSource;
use crate::error::{FactError, Result};
use crate::source::{ApiRequest, JsonApi, SourceControl, Sources, TimeSeries};
use crate::util::{jsonpath, placeholder, toml_json};
use crate::value::{json_number, Value};

pub struct Extractor {
    source_control: Arc<dyn SourceControl>,
    json_api: Arc<dyn JsonApi>,
    time_series: Arc<dyn TimeSeries>,
    tokens: Arc<dyn TokenSource>,
}

impl Extractor {
    pub fn new(sources: Sources, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            source_control: sources.source_control,
            json_api: sources.json_api,
            time_series: sources.time_series,
            tokens,
        }
    }

    /// Run the task's fetches. `deps` holds only the extract-type dependencies.
    /// `Ok(None)` means no data (soft miss).
    pub async fn extract(
        &self,
        cancel: &CancellationToken,
        task: &Task,
        deps: &[Arc<Task>],
    ) -> Result<Option<Value>> {
        if deps.len() > 1 {
            return Err(FactError::TooManyDependencies { count: deps.len() });
        }

        let fact = task.fact();
        match deps.first().and_then(|dep| dep.result()) {
            None => self.fetch(cancel, fact, "").await,
            Some(Value::List(items)) => {
                if items.is_empty() {
                    return Err(FactError::DependencyResultMissing);
                }
                self.fan_out(cancel, fact, items).await.map(Some)
            }
            Some(value) => self.fetch(cancel, fact, &value.to_string()).await,
        }
    }

    /// One fetch per element, in order; lists are spliced, misses skipped
    async fn fan_out(
        &self,
        cancel: &CancellationToken,
        fact: &Fact,
        items: &[Value],
    ) -> Result<Value> {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            match self.fetch(cancel, fact, &item.to_string()).await? {
                Some(Value::List(values)) => results.extend(values),
                Some(value) => results.push(value),
                None => {}
            }
        }
        Ok(Value::List(results))
    }

    #[instrument(skip(self, cancel, fact), fields(task_id = %fact.id))]
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        fact: &Fact,
        dependency_value: &str,
    ) -> Result<Option<Value>> {
        let value = placeholder::unquote(dependency_value);

        let data = match fact.source {
            Some(Source::SourceControl) => {
                if fact.rule == Some(Rule::Search) {
                    let repo = placeholder::replace(&fact.repo, &value);
                    let matches = cancellable(
                        cancel,
                        self.source_control.search(&repo, &fact.search_string),
                    )
                    .await?;
                    return Ok(Some(Value::Bool(!matches.is_empty())));
                }
                self.fetch_file(cancel, fact, &value).await?
            }
            Some(Source::JsonApi) => Some(self.fetch_json_api(cancel, fact, &value).await?),
            Some(Source::TimeSeries) => Some(self.query_time_series(cancel, fact, &value).await?),
            other @ (None | Some(Source::Unknown)) => {
                return Err(FactError::UnknownSource {
                    source_name: other.map_or_else(|| "(none)".to_string(), |s| s.to_string()),
                })
            }
        };

        shape(fact, data)
    }

    /// File content at `filePath`; `None` when the file does not exist
    async fn fetch_file(
        &self,
        cancel: &CancellationToken,
        fact: &Fact,
        value: &str,
    ) -> Result<Option<Vec<u8>>> {
        let file_path = required(fact, &fact.file_path, "filePath")?;
        let is_toml = if fact.rule == Some(Rule::JsonPath) {
            json_capable_extension(file_path)?
        } else {
            false
        };

        let repo = placeholder::replace(&fact.repo, value);
        let path = placeholder::replace(file_path, value);

        let content = match cancellable(cancel, self.source_control.file_content(&repo, &path)).await {
            Ok(content) => content,
            Err(err) if err.is_not_found() => {
                debug!(%repo, %path, "file not found, no data");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        if is_toml {
            return toml_json::toml_to_json(&content).map(Some);
        }
        Ok(Some(content.into_bytes()))
    }

    async fn fetch_json_api(
        &self,
        cancel: &CancellationToken,
        fact: &Fact,
        value: &str,
    ) -> Result<Vec<u8>> {
        let uri = required(fact, &fact.uri, "uri")?;
        let mut request = ApiRequest::get(placeholder::replace(uri, value));

        if let Some(auth) = &fact.auth {
            let token = self.tokens.token(&auth.token_var).unwrap_or_default();
            request = request.with_header(auth.header.as_str(), token);
        }

        cancellable(cancel, self.json_api.execute(request)).await
    }

    async fn query_time_series(
        &self,
        cancel: &CancellationToken,
        fact: &Fact,
        value: &str,
    ) -> Result<Vec<u8>> {
        let query = required(fact, &fact.prometheus_query, "prometheusQuery")?;
        let query = placeholder::replace(query, value);
        let number = cancellable(cancel, self.time_series.instant_query(&query)).await?;

        Ok(json_number(number)?.into_bytes())
    }
}

/// Shape fetched bytes by rule
fn shape(fact: &Fact, data: Option<Vec<u8>>) -> Result<Option<Value>> {
    match fact.rule {
        Some(Rule::JsonPath) => {
            let Some(bytes) = data else {
                return Ok(None);
            };
            let path = required(fact, &fact.json_path, "jsonPath")?;
            let matches = jsonpath::query(path, &bytes)?;
            Ok(Some(Value::List(
                matches.into_iter().map(Value::from_json).collect(),
            )))
        }
        Some(Rule::NotEmpty) => Ok(Some(Value::Bool(data.is_some()))),
        _ => Ok(data.map(Value::Bytes)),
    }
}

/// `true` for `.toml`, `false` for `.json`, error for anything else
fn json_capable_extension(file_path: &str) -> Result<bool> {
    match Path::new(file_path).extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(false),
        Some("toml") => Ok(true),
        other => Err(FactError::UnsupportedExtension {
            extension: other.map(|e| format!(".{}", e)).unwrap_or_default(),
        }),
    }
}

fn required<'a>(fact: &Fact, value: &'a str, field: &'static str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(FactError::MissingField {
            task_id: fact.id.clone(),
            field,
        });
    }
    Ok(value)
}

/// Race a fetch against cancellation
async fn cancellable<T>(
    cancel: &CancellationToken,
    fetch: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        _ = cancel.cancelled() => Err(FactError::Cancelled),
        result = fetch => result,
    }
}
