//! GitHub REST client: repository contents and code search

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{check_status, SourceControl};
use crate::error::{FactError, Result};

/// Media type returning file bodies undecoded
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct CodeSearchResponse {
    #[serde(default)]
    items: Vec<CodeSearchItem>,
}

#[derive(Debug, Deserialize)]
struct CodeSearchItem {
    path: String,
}

/// Source-control client scoped to one organisation
#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    org: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        org: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        let api_url: String = api_url.into();
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            org: org.into(),
            token,
        }
    }

    fn request(&self, url: &str, media_type: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url).header(ACCEPT, media_type);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl SourceControl for GitHubClient {
    #[instrument(skip(self), fields(org = %self.org))]
    async fn file_content(&self, repo: &str, path: &str) -> Result<String> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url,
            self.org,
            repo,
            path.trim_start_matches('/')
        );
        debug!(%url, "fetching file content");

        let response = self.request(&url, RAW_MEDIA_TYPE).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FactError::NotFound {
                resource: format!("{}/{}", repo, path),
            });
        }

        Ok(check_status(response)?.text().await?)
    }

    #[instrument(skip(self), fields(org = %self.org))]
    async fn search(&self, repo: &str, query: &str) -> Result<Vec<String>> {
        let q = format!("repo:{}/{} {}", self.org, repo, query);
        let url = Url::parse_with_params(&format!("{}/search/code", self.api_url), &[("q", q)])
            .map_err(|e| FactError::Config {
                reason: format!("invalid GitHub API URL '{}': {}", self.api_url, e),
            })?;

        let response = self.request(url.as_str(), JSON_MEDIA_TYPE).send().await?;
        let body: CodeSearchResponse = check_status(response)?.json().await?;

        Ok(body.items.into_iter().map(|item| item.path).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = GitHubClient::new(reqwest::Client::new(), "https://ghe.local/api/v3/", "acme", None);
        assert_eq!(client.api_url, "https://ghe.local/api/v3");
    }

    #[test]
    fn search_response_tolerates_missing_items() {
        let body: CodeSearchResponse = serde_json::from_str(r#"{"total_count": 0}"#).unwrap();
        assert!(body.items.is_empty());
    }
}
