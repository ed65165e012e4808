//! Prometheus HTTP API client (instant queries)

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{check_status, TimeSeries};
use crate::error::{FactError, Result};

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    result_type: String,
    #[serde(default)]
    result: serde_json::Value,
}

/// Vector sample: `{"metric": {...}, "value": [<ts>, "<value>"]}`
#[derive(Debug, Deserialize)]
struct Sample {
    value: (f64, String),
}

#[derive(Clone)]
pub struct PrometheusClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl PrometheusClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

/// Value of the last sample of a vector result; any other result type reads as zero
fn last_vector_value(data: QueryData) -> Result<f64> {
    if data.result_type != "vector" {
        debug!(result_type = %data.result_type, "result is not a vector");
        return Ok(0.0);
    }

    let samples: Vec<Sample> =
        serde_json::from_value(data.result).map_err(|e| FactError::Query {
            reason: format!("malformed vector result: {}", e),
        })?;

    match samples.last() {
        Some(sample) => sample.value.1.parse().map_err(|e| FactError::Query {
            reason: format!("sample value {:?} is not a number: {}", sample.value.1, e),
        }),
        None => Ok(0.0),
    }
}

#[async_trait]
impl TimeSeries for PrometheusClient {
    #[instrument(skip(self))]
    async fn instant_query(&self, query: &str) -> Result<f64> {
        if self.base_url.is_empty() {
            return Err(FactError::Config {
                reason: "PROMETHEUS_URL is not set".to_string(),
            });
        }

        let url = Url::parse_with_params(
            &format!("{}/api/v1/query", self.base_url),
            &[("query", query)],
        )
        .map_err(|e| FactError::Config {
            reason: format!("invalid Prometheus URL '{}': {}", self.base_url, e),
        })?;

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let body: QueryResponse = check_status(request.send().await?)?.json().await?;
        if body.status != "success" {
            return Err(FactError::Query {
                reason: body.error.unwrap_or(body.status),
            });
        }

        match body.data {
            Some(data) => last_vector_value(data),
            None => Ok(0.0),
        }
    }
}
