//! Memory-retrieval agent. Recall itself runs before dispatch; this agent
//! reports what the bundle carries so the fused trace shows which memories
//! shaped the cycle.

use crate::agent::CognitiveAgent;
use noesis_core::{AgentThought, ContextBundle, Result};

pub struct MemoryRetriever;

#[async_trait::async_trait]
impl CognitiveAgent for MemoryRetriever {
    fn name(&self) -> &'static str {
        "memory_retriever"
    }

    async fn run(
        &self,
        context: &ContextBundle,
        _prior_thoughts: &[AgentThought],
    ) -> Result<AgentThought> {
        if context.memory_matches.is_empty() {
            return Ok(AgentThought::new(
                self.name(),
                0.4,
                "No relevant memories found for this input.",
            )?
            .with_reason("input did not match existing memories")
            .requires_memory(true));
        }

        let reasons: Vec<String> = context.memory_matches.iter().cloned().collect();
        Ok(AgentThought::new(
            self.name(),
            0.85,
            format!(
                "Retrieved {} relevant memory entries.",
                context.memory_matches.len()
            ),
        )?
        .with_reasons(reasons)
        .requires_memory(true)
        .with_flag("memories_retrieved", true))
    }
}
