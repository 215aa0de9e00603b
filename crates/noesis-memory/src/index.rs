//! Store-backed similarity search: brute-force cosine over the summary
//! records, embedding query and candidates through the injected provider.
//! Fine at this store's scale; a real vector index can replace it behind
//! the same trait.

use crate::store::{LoadScope, MemoryStore};
use noesis_core::MemoryMatch;
use noesis_llm::{EmbeddingProvider, SimilarityIndex};
use std::sync::Arc;
use tracing::debug;

/// Newest summaries considered per query. Keeps per-query embedding calls
/// bounded as the store grows.
const CANDIDATE_WINDOW: usize = 200;

pub struct StoreIndex {
    embedding: Arc<dyn EmbeddingProvider>,
    store: Arc<MemoryStore>,
}

impl StoreIndex {
    pub fn new(embedding: Arc<dyn EmbeddingProvider>, store: Arc<MemoryStore>) -> Self {
        Self { embedding, store }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

#[async_trait::async_trait]
impl SimilarityIndex for StoreIndex {
    async fn search(&self, query: &str, k: usize, threshold: Option<f64>) -> Vec<MemoryMatch> {
        let Some(query_vec) = self.embedding.embed(query).await else {
            debug!("Embedding unavailable, recall degrades to empty");
            return Vec::new();
        };

        let summaries = self
            .store
            .load(CANDIDATE_WINDOW, LoadScope::Summaries)
            .await
            .1;

        let mut scored = Vec::new();
        for summary in summaries {
            let Some(candidate_vec) = self.embedding.embed(&summary.summary).await else {
                continue;
            };
            let score = cosine(&query_vec, &candidate_vec);
            if threshold.is_some_and(|t| score < t) {
                continue;
            }
            scored.push(MemoryMatch {
                id: summary.id.to_string(),
                score,
                summary: summary.summary,
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MemoryRecord;

    /// Maps known strings to fixed vectors so similarity is deterministic.
    struct KeywordEmbeddings;

    #[async_trait::async_trait]
    impl EmbeddingProvider for KeywordEmbeddings {
        async fn embed(&self, text: &str) -> Option<Vec<f32>> {
            if text.contains("rust") {
                Some(vec![1.0, 0.0])
            } else if text.contains("cooking") {
                Some(vec![0.0, 1.0])
            } else {
                Some(vec![0.7, 0.7])
            }
        }
    }

    struct NoEmbeddings;

    #[async_trait::async_trait]
    impl EmbeddingProvider for NoEmbeddings {
        async fn embed(&self, _text: &str) -> Option<Vec<f32>> {
            None
        }
    }

    async fn seeded_store() -> (tempfile::TempDir, Arc<MemoryStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::open(dir.path().join("memory")).unwrap());
        store
            .append(MemoryRecord::new("learning rust ownership", "ctx"))
            .await
            .unwrap();
        store
            .append(MemoryRecord::new("cooking pasta tonight", "ctx"))
            .await
            .unwrap();
        (dir, store)
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        assert!((cosine(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-9);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn ranks_semantically_closer_summary_first() {
        let (_dir, store) = seeded_store().await;
        let index = StoreIndex::new(Arc::new(KeywordEmbeddings), store);
        let matches = index.search("rust borrow checker", 5, None).await;
        assert_eq!(matches.len(), 2);
        assert!(matches[0].summary.contains("rust"));
        assert!(matches[0].score > matches[1].score);
    }

    #[tokio::test]
    async fn threshold_drops_weak_matches() {
        let (_dir, store) = seeded_store().await;
        let index = StoreIndex::new(Arc::new(KeywordEmbeddings), store);
        let matches = index.search("rust lifetimes", 5, Some(0.9)).await;
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn missing_embedding_degrades_to_empty() {
        let (_dir, store) = seeded_store().await;
        let index = StoreIndex::new(Arc::new(NoEmbeddings), store);
        assert!(index.search("anything", 5, None).await.is_empty());
    }
}
