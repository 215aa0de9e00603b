//! The uniform agent seam.

use noesis_core::{AgentThought, ContextBundle, Result};

/// Service-map key under which the goal tracker is injected.
pub const GOAL_TRACKER_SERVICE: &str = "goal_tracker";
/// Service-map key under which the task scheduler is injected.
pub const TASK_SCHEDULER_SERVICE: &str = "task_scheduler";

/// A cognitive agent. One implementation per reasoning specialty,
/// registered by name at startup and invoked once per round.
///
/// Collaborators an agent needs (generation, registries) are injected at
/// construction — a disabled stand-in when unavailable — so there is no
/// hidden load-time substitution. `run` receives the shared immutable
/// bundle and, in round 2, the full round-1 thought list, letting the agent
/// revise its position after seeing peers.
#[async_trait::async_trait]
pub trait CognitiveAgent: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        context: &ContextBundle,
        prior_thoughts: &[AgentThought],
    ) -> Result<AgentThought>;
}
