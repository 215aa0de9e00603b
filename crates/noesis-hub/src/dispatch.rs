//! Round dispatcher. Agents within a round run concurrently; a round's
//! result vector preserves enabled-list order so downstream fusion ties
//! break deterministically.

use noesis_agents::CognitiveAgent;
use noesis_core::{AgentThought, ContextBundle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct Dispatcher {
    agents: Vec<Arc<dyn CognitiveAgent>>,
    timeout: Duration,
    /// Verbose per-agent diagnostics, from `HubConfig::debug_mode`.
    debug: bool,
}

impl Dispatcher {
    pub fn new(agents: Vec<Arc<dyn CognitiveAgent>>, timeout: Duration, debug: bool) -> Self {
        Self {
            agents,
            timeout,
            debug,
        }
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Run one round. Every agent is spawned up front; results are
    /// collected in registration order. A failed, panicked, or timed-out
    /// agent is logged and excluded — the round never aborts.
    pub async fn run_round(
        &self,
        context: Arc<ContextBundle>,
        prior_thoughts: Arc<Vec<AgentThought>>,
        round: u8,
    ) -> Vec<AgentThought> {
        let mut handles = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            let agent = agent.clone();
            let context = context.clone();
            let prior = prior_thoughts.clone();
            let timeout = self.timeout;
            let verbose = self.debug;

            handles.push(tokio::spawn(async move {
                let name = agent.name();
                match tokio::time::timeout(timeout, agent.run(&context, &prior)).await {
                    Ok(Ok(thought)) => {
                        if verbose {
                            info!("Round {}: {}", round, thought.summary());
                        } else {
                            debug!(
                                "{} round {} -> confidence {:.2}",
                                name,
                                round,
                                thought.confidence()
                            );
                        }
                        Some(thought)
                    }
                    Ok(Err(e)) => {
                        warn!("Agent '{}' failed in round {}: {}", name, round, e);
                        None
                    }
                    Err(_) => {
                        warn!(
                            "Agent '{}' timed out after {:?} in round {}",
                            name, timeout, round
                        );
                        None
                    }
                }
            }));
        }

        let mut thoughts = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Some(thought)) => thoughts.push(thought),
                Ok(None) => {}
                Err(e) => warn!("Agent task panicked in round {}: {}", round, e),
            }
        }
        thoughts
    }
}
