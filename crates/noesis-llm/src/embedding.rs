//! Embedding and similarity-search collaborator traits.
//!
//! Vector index internals are deliberately outside this crate — Noesis only
//! defines the seam. An unavailable or failed index yields an empty list,
//! never an error, so recall can degrade silently.

use noesis_core::MemoryMatch;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Embedding collaborator: text → vector. Failures yield `None`; the caller
/// treats a missing vector like a missing index.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Option<Vec<f32>>;
}

/// Similarity-search collaborator over whatever backing index is deployed.
///
/// Contract: ranked results, descending score; empty or unavailable index
/// returns `[]` and never raises.
#[async_trait::async_trait]
pub trait SimilarityIndex: Send + Sync {
    async fn search(&self, query: &str, k: usize, threshold: Option<f64>) -> Vec<MemoryMatch>;
}

/// Stand-in for a missing backing index. Always empty.
pub struct UnavailableIndex;

#[async_trait::async_trait]
impl SimilarityIndex for UnavailableIndex {
    async fn search(&self, _query: &str, _k: usize, _threshold: Option<f64>) -> Vec<MemoryMatch> {
        Vec::new()
    }
}

/// OpenAI-compatible embeddings endpoint.
pub struct OpenAiEmbeddings {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiEmbeddings {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_EMBEDDINGS_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let body = EmbeddingRequest {
            model: self.model.clone(),
            input: text.to_string(),
        };
        debug!("Embedding request: model={}", body.model);

        let response = match self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!("Embedding error {}", r.status());
                return None;
            }
            Err(e) => {
                warn!("Embedding request failed: {}", e);
                return None;
            }
        };

        let parsed: EmbeddingResponse = response.json().await.ok()?;
        parsed.data.into_iter().next().map(|d| d.embedding)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_index_is_always_empty() {
        let index = UnavailableIndex;
        assert!(index.search("anything", 5, None).await.is_empty());
        assert!(index.search("", 0, Some(0.9)).await.is_empty());
    }
}
