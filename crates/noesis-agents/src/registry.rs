//! Explicit agent registry, populated once at startup.
//!
//! Registration order is preserved; the dispatcher resolves the enabled
//! list against it by name, so the config controls both membership and the
//! deterministic dispatch order fusion relies on.

use crate::agent::CognitiveAgent;
use crate::builtin::{GoalKeeper, MemoryRetriever, Reasoner, Scheduler};
use noesis_core::HubConfig;
use noesis_llm::GenerationProvider;
use std::sync::Arc;
use tracing::warn;

#[derive(Default)]
pub struct AgentRegistry {
    agents: Vec<Arc<dyn CognitiveAgent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in agent set, each wired to the given
    /// generation collaborator (a `DisabledGeneration` stand-in when the
    /// capability is unavailable).
    pub fn builtin(generation: Arc<dyn GenerationProvider>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Reasoner::new(generation.clone())));
        registry.register(Arc::new(GoalKeeper));
        registry.register(Arc::new(Scheduler::new(generation)));
        registry.register(Arc::new(MemoryRetriever));
        registry
    }

    /// Later registration under an existing name replaces the earlier
    /// agent in place, keeping its position.
    pub fn register(&mut self, agent: Arc<dyn CognitiveAgent>) {
        if let Some(existing) = self
            .agents
            .iter_mut()
            .find(|a| a.name() == agent.name())
        {
            warn!("Replacing registered agent '{}'", agent.name());
            *existing = agent;
            return;
        }
        self.agents.push(agent);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CognitiveAgent>> {
        self.agents.iter().find(|a| a.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    /// Agents to dispatch this cycle, in the config's enabled-list order.
    /// Names the registry does not know are logged and skipped.
    pub fn enabled(&self, config: &HubConfig) -> Vec<Arc<dyn CognitiveAgent>> {
        let mut enabled = Vec::new();
        for name in &config.agents_enabled {
            match self.get(name) {
                Some(agent) => enabled.push(agent),
                None => warn!("Enabled agent '{}' is not registered, skipping", name),
            }
        }
        enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noesis_core::{AgentThought, ContextBundle, Result};
    use noesis_llm::DisabledGeneration;

    struct Stub(&'static str);

    #[async_trait::async_trait]
    impl CognitiveAgent for Stub {
        fn name(&self) -> &'static str {
            self.0
        }
        async fn run(
            &self,
            _context: &ContextBundle,
            _prior: &[AgentThought],
        ) -> Result<AgentThought> {
            AgentThought::new(self.0, 0.5, "stub")
        }
    }

    #[test]
    fn builtin_set_registers_all_four() {
        let registry = AgentRegistry::builtin(Arc::new(DisabledGeneration));
        assert_eq!(
            registry.names(),
            vec!["reasoner", "goal_keeper", "task_scheduler", "memory_retriever"]
        );
    }

    #[test]
    fn enabled_follows_config_order_and_skips_unknown() {
        let registry = AgentRegistry::builtin(Arc::new(DisabledGeneration));
        let config = HubConfig {
            agents_enabled: vec![
                "memory_retriever".to_string(),
                "reasoner".to_string(),
                "nonexistent".to_string(),
            ],
            ..Default::default()
        };
        let enabled = registry.enabled(&config);
        let names: Vec<&str> = enabled.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["memory_retriever", "reasoner"]);
    }

    #[test]
    fn reregistering_replaces_in_place() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(Stub("first")));
        registry.register(Arc::new(Stub("second")));
        registry.register(Arc::new(Stub("first")));
        assert_eq!(registry.names(), vec!["first", "second"]);
    }
}
