// HTTP client for the btca server

use anyhow::{Context, Result};
use async_trait::async_trait;
use btca_session::{ModelConfigReader, QuestionRequest, QuestionStreamer, ResourceRegistry};
use btca_stream::{decode_response, EventStream};
use btca_types::{ModelConfig, Resource};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ResourcesResponse {
    #[serde(default)]
    resources: Vec<Resource>,
}

/// Talks to a running btca server: resources, model config and the
/// streaming question endpoint.
pub struct ServerClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ServerClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http_client
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("Failed to reach btca server at {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("btca server error ({}): {}", status, error_text);
        }

        response
            .json()
            .await
            .with_context(|| format!("Invalid response from {}", path))
    }
}

#[async_trait]
impl ResourceRegistry for ServerClient {
    async fn list_resources(&self) -> Result<Vec<Resource>> {
        let body: ResourcesResponse = self.get_json("/resources").await?;
        Ok(body.resources)
    }
}

#[async_trait]
impl QuestionStreamer for ServerClient {
    async fn ask_question_stream(&self, request: QuestionRequest) -> Result<EventStream> {
        tracing::debug!(resources = ?request.resources, "Opening question stream");

        let response = self
            .http_client
            .post(self.url("/question/stream"))
            .header(ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach btca server at {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("btca server error ({}): {}", status, error_text);
        }

        Ok(decode_response(response))
    }
}

#[async_trait]
impl ModelConfigReader for ServerClient {
    async fn get_model(&self) -> Result<ModelConfig> {
        self.get_json("/config").await
    }
}
