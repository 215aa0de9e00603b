//! Meta-learning reflection supervisor.
//!
//! `reflect` works off an explicit cycle handle and fails closed: until the
//! collaborator's reply parses as the expected JSON, nothing on disk
//! changes. The in-place patch of the cycle record runs first so a stale
//! handle aborts before any append.

use noesis_core::{CycleId, Error, Result};
use noesis_llm::GenerationProvider;
use noesis_memory::{MemoryRecord, MemoryStore, ProfileReflection};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const REFLECTION_SYSTEM_PROMPT: &str =
    "You are a compact meta-cognition engine. Reply ONLY with minimal JSON.";

/// Structured introspection for one reasoning cycle.
#[derive(Clone, Debug, Deserialize)]
pub struct Reflection {
    pub insight: String,
    pub behavioral_adjustment: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
}

pub struct ReflectionSupervisor {
    generation: Arc<dyn GenerationProvider>,
    store: Arc<MemoryStore>,
    relevance_score: f64,
}

impl ReflectionSupervisor {
    pub fn new(
        generation: Arc<dyn GenerationProvider>,
        store: Arc<MemoryStore>,
        relevance_score: f64,
    ) -> Self {
        Self {
            generation,
            store,
            relevance_score,
        }
    }

    /// Reflect on the identified cycle. On success the cycle's record is
    /// patched, a reflection record is appended, and the profile history
    /// grows by one entry. Any failure leaves all three untouched.
    pub async fn reflect(&self, cycle_id: &CycleId) -> Result<Reflection> {
        let record = self
            .store
            .get(cycle_id.as_uuid())
            .await
            .ok_or_else(|| Error::TraceNotFound(cycle_id.to_string()))?;

        let prompt = format!(
            "You are the meta-learning supervisor. Below is the system's most \
             recent reasoning trace.\n\n\
             REASONING SNAPSHOT:\n{}\n\n\
             Based on this trace, reflect on:\n\
             - What patterns or blindspots are emerging?\n\
             - How should behavior evolve?\n\
             - Which tags capture this episode?\n\n\
             Return ONLY compact JSON with keys:\n\
             - insight\n\
             - behavioral_adjustment\n\
             - tags (3-5 keywords)\n\
             - key_points (2-3 bullets of internal notes)\n\n\
             No markdown. No user-facing language.",
            record.context
        );

        let generated = self
            .generation
            .generate(&prompt, Some(REFLECTION_SYSTEM_PROMPT))
            .await;
        if generated.is_degraded() {
            return Err(Error::generation("reflection collaborator unavailable"));
        }

        let raw = generated.text().trim().to_string();
        let reflection: Reflection = serde_json::from_str(&raw)
            .map_err(|e| Error::ReflectionParse(format!("{}: {}", e, raw)))?;

        // Patch first: a stale cycle handle must abort before any append.
        self.store
            .patch_latest(
                cycle_id.as_uuid(),
                &reflection.tags,
                &reflection.insight,
                &reflection.behavioral_adjustment,
            )
            .await?;

        let reflection_record = MemoryRecord::new(raw.clone(), record.context.clone())
            .with_id(Uuid::new_v4())
            .with_insight(reflection.insight.clone())
            .with_adjustment(reflection.behavioral_adjustment.clone())
            .with_tags(reflection.tags.clone())
            .with_relevance(self.relevance_score);
        let reflection_id = reflection_record.id;
        self.store.append(reflection_record).await;

        self.store
            .append_profile_reflection(&ProfileReflection {
                id: reflection_id,
                timestamp: chrono::Utc::now(),
                insight: reflection.insight.clone(),
                behavioral_adjustment: reflection.behavioral_adjustment.clone(),
                tags: reflection.tags.clone(),
                meta_reflection: raw,
            })
            .await?;

        info!("Reflection complete for cycle {}", cycle_id);
        Ok(reflection)
    }
}
