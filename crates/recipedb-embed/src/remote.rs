//! Remote embeddings API client (OpenAI-compatible `/v1/embeddings`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use recipedb_core::config::RemoteSettings;
use recipedb_core::traits::EmbeddingProvider;
use recipedb_core::{Error, Result};

use crate::pool::normalize_l2;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
    encoding_format: &'static str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct RemoteEmbedder {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    dim: usize,
    id: String,
}

impl RemoteEmbedder {
    /// Build a client; fails if no credential can be resolved.
    pub fn new(settings: &RemoteSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Configuration(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            api_key,
            dim: settings.dim,
            id: format!("remote:{}:d{}", settings.model, settings.dim),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let body = EmbeddingRequest { input: text, model: &self.model, encoding_format: "float" };
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::EmbeddingBackend(format!("request to {} failed: {e}", self.endpoint)))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::EmbeddingBackend(format!("reading response body: {e}")))?;
        if !status.is_success() {
            return Err(Error::EmbeddingBackend(format!(
                "embeddings API returned {status}: {}",
                String::from_utf8_lossy(&bytes)
            )));
        }

        let parsed: EmbeddingResponse = serde_json::from_slice(&bytes)
            .map_err(|e| Error::EmbeddingBackend(format!("malformed embeddings payload: {e}")))?;
        let v = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::EmbeddingBackend("embeddings payload has no data".into()))?;
        if v.len() != self.dim {
            return Err(Error::EmbeddingBackend(format!(
                "embeddings API returned {} dims, configured for {}",
                v.len(),
                self.dim
            )));
        }

        debug!(ms = start.elapsed().as_millis() as u64, "remote embedding");
        Ok(normalize_l2(v))
    }
}
