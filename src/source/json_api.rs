//! JSON API client over reqwest

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::instrument;

use super::{check_status, ApiRequest, JsonApi};
use crate::error::Result;

#[derive(Clone)]
pub struct HttpJsonApi {
    client: reqwest::Client,
}

impl HttpJsonApi {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JsonApi for HttpJsonApi {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn execute(&self, request: ApiRequest) -> Result<Vec<u8>> {
        let mut builder = self
            .client
            .get(&request.url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = check_status(builder.send().await?)?;
        Ok(response.bytes().await?.to_vec())
    }
}
