//! Memory recall service — thin wrapper over the similarity index.
//!
//! Every non-empty recall is logged with the full ranked result so a later
//! audit can see exactly what context influenced an answer.

use crate::store::{MemoryStore, RecallEvent};
use chrono::Utc;
use noesis_core::MemoryMatch;
use noesis_llm::SimilarityIndex;
use std::sync::Arc;
use tracing::debug;

pub struct RecallService {
    index: Arc<dyn SimilarityIndex>,
    store: Arc<MemoryStore>,
    k: usize,
    score_threshold: Option<f64>,
}

impl RecallService {
    pub fn new(
        index: Arc<dyn SimilarityIndex>,
        store: Arc<MemoryStore>,
        k: usize,
        score_threshold: Option<f64>,
    ) -> Self {
        Self {
            index,
            store,
            k,
            score_threshold,
        }
    }

    /// Ranked matches for a query. An unavailable index yields an empty
    /// list; a configured threshold drops entries below it; results are
    /// ordered by descending score.
    pub async fn search(&self, component: &str, query: &str) -> Vec<MemoryMatch> {
        let mut matches = self.index.search(query, self.k, self.score_threshold).await;

        if let Some(threshold) = self.score_threshold {
            matches.retain(|m| m.score >= threshold);
        }
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if matches.is_empty() {
            debug!("Recall for '{}' returned nothing", component);
            return matches;
        }

        self.store
            .log_recall(&RecallEvent {
                timestamp: Utc::now(),
                component: component.to_string(),
                query: query.to_string(),
                matches: matches.clone(),
            })
            .await;

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noesis_llm::UnavailableIndex;

    struct FixedIndex(Vec<MemoryMatch>);

    #[async_trait::async_trait]
    impl SimilarityIndex for FixedIndex {
        async fn search(
            &self,
            _query: &str,
            _k: usize,
            _threshold: Option<f64>,
        ) -> Vec<MemoryMatch> {
            self.0.clone()
        }
    }

    fn matches() -> Vec<MemoryMatch> {
        vec![
            MemoryMatch {
                id: "low".into(),
                score: 0.3,
                summary: "weak".into(),
            },
            MemoryMatch {
                id: "high".into(),
                score: 0.9,
                summary: "strong".into(),
            },
        ]
    }

    fn store() -> (tempfile::TempDir, Arc<MemoryStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::open(dir.path().join("m")).unwrap());
        (dir, store)
    }

    #[tokio::test]
    async fn unavailable_index_returns_empty_without_error() {
        let (_dir, store) = store();
        let service = RecallService::new(Arc::new(UnavailableIndex), store.clone(), 5, None);
        assert!(service.search("test", "query").await.is_empty());
        // No recall event for an empty result.
        assert!(!store.root().join("recall.jsonl").exists());
    }

    #[tokio::test]
    async fn results_ranked_descending() {
        let (_dir, store) = store();
        let service = RecallService::new(Arc::new(FixedIndex(matches())), store, 5, None);
        let out = service.search("test", "query").await;
        assert_eq!(out[0].id, "high");
        assert_eq!(out[1].id, "low");
    }

    #[tokio::test]
    async fn threshold_filters_low_scores() {
        let (_dir, store) = store();
        let service = RecallService::new(Arc::new(FixedIndex(matches())), store, 5, Some(0.5));
        let out = service.search("test", "query").await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "high");
    }

    #[tokio::test]
    async fn nonempty_recall_is_logged() {
        let (_dir, store) = store();
        let service = RecallService::new(Arc::new(FixedIndex(matches())), store.clone(), 5, None);
        service.search("hub", "query").await;

        let raw = std::fs::read_to_string(store.root().join("recall.jsonl")).unwrap();
        let event: RecallEvent = serde_json::from_str(raw.lines().next().unwrap()).unwrap();
        assert_eq!(event.matches.len(), 2, "full ranked list, not top-1");
    }
}
