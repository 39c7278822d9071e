//! Embedding provider seam and an OpenAI-compatible client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use feedforge_shared::{EmbeddingSection, Result, resolve_api_key};

use crate::http;

/// One embedding vector tagged with the provider-reported position of its
/// input within the request batch.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEmbedding {
    pub index: usize,
    pub vector: Vec<f32>,
}

/// Text-to-vector service, consumed in caller-sized batches.
///
/// Implementations may return results in any order; callers re-sort by
/// [`IndexedEmbedding::index`].
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier the vectors come from.
    fn model(&self) -> &str;

    /// Embed one batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<IndexedEmbedding>>;
}

// ---------------------------------------------------------------------------
// OpenAI-compatible client
// ---------------------------------------------------------------------------

/// Async embeddings client for OpenAI-compatible `/embeddings` endpoints.
///
/// No retries happen here; a failed request surfaces immediately.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddings {
    client: Client,
    endpoint: Url,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbeddings {
    /// Build a client from explicit settings.
    pub fn new(api_key: &str, base_url: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http::build_client(api_key, timeout_secs)?,
            endpoint: http::endpoint(base_url, "embeddings")?,
            model: model.to_string(),
        })
    }

    /// Build a client from the `[embedding]` config section.
    ///
    /// Fails with `API_KEY_MISSING` when the configured env var is unset.
    pub fn from_config(section: &EmbeddingSection) -> Result<Self> {
        let api_key = resolve_api_key(&section.api_key_env)?;
        Self::new(
            &api_key,
            &section.base_url,
            &section.model,
            section.timeout_secs,
        )
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model, batch = texts.len()))]
    async fn embed(&self, texts: &[String]) -> Result<Vec<IndexedEmbedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let response: EmbeddingResponse =
            http::post_json(&self.client, &self.endpoint, &request).await?;

        debug!(returned = response.data.len(), "embedding batch received");

        Ok(response
            .data
            .into_iter()
            .map(|entry| IndexedEmbedding {
                index: entry.index,
                vector: entry.embedding,
            })
            .collect())
    }
}
