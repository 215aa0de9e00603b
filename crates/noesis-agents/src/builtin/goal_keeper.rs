//! Goal-keeping agent. Watches the input for goal-like intent, records new
//! goals in the shared tracker, refreshes deadline-driven priorities, and
//! reports the active goal slate.

use crate::agent::{CognitiveAgent, GOAL_TRACKER_SERVICE};
use crate::goals::GoalTracker;
use noesis_core::{AgentThought, ContextBundle, Result};

const INTENT_VERBS: &[&str] = &["plan to", "want to", "goal is to", "need to", "i aim to"];

pub struct GoalKeeper;

#[async_trait::async_trait]
impl CognitiveAgent for GoalKeeper {
    fn name(&self) -> &'static str {
        "goal_keeper"
    }

    async fn run(
        &self,
        context: &ContextBundle,
        _prior_thoughts: &[AgentThought],
    ) -> Result<AgentThought> {
        let Some(tracker) = context.services.get::<GoalTracker>(GOAL_TRACKER_SERVICE) else {
            return Ok(AgentThought::new(
                self.name(),
                0.0,
                "Goal tracker service not available in context.",
            )?
            .with_reason("missing goal_tracker service")
            .with_flag("execution_blocked", true));
        };

        let input = context.user_input.to_lowercase();
        let mut reasons = Vec::new();

        let added = INTENT_VERBS.iter().any(|verb| input.contains(verb));
        if added {
            let id = tracker.add(context.user_input.clone(), 0.5, None);
            reasons.push(format!("detected goal-like intent, recorded as {}", id));
        }

        tracker.reprioritize();

        let active = tracker.active();
        let slate: Vec<String> = active
            .iter()
            .map(|g| format!("- {} (p={:.2})", g.description, g.priority))
            .collect();

        let content = if added {
            format!(
                "Added new goal and updated priorities.\nActive goals:\n{}",
                slate.join("\n")
            )
        } else {
            format!(
                "No new goals detected. Current active goals:\n{}",
                slate.join("\n")
            )
        };

        if reasons.is_empty() {
            reasons.push("goal tracking scan complete".to_string());
        }

        Ok(AgentThought::new(self.name(), 1.0, content)?
            .with_reasons(reasons)
            .requires_memory(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noesis_core::{HubConfig, ServiceMap};
    use std::sync::Arc;

    fn bundle_with_tracker(input: &str) -> (tempfile::TempDir, ContextBundle, Arc<GoalTracker>) {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(GoalTracker::open(dir.path().join("goals.json")).unwrap());
        let services = ServiceMap::new();
        services.insert(GOAL_TRACKER_SERVICE, tracker.clone());
        let context =
            ContextBundle::from_input(input, vec![], HubConfig::default()).with_services(services);
        (dir, context, tracker)
    }

    #[tokio::test]
    async fn missing_service_blocks_execution() {
        let context = ContextBundle::from_input("anything", vec![], HubConfig::default());
        let thought = GoalKeeper.run(&context, &[]).await.unwrap();
        assert_eq!(thought.confidence(), 0.0);
        assert!(thought.flag("execution_blocked"));
    }

    #[tokio::test]
    async fn intent_verb_records_a_goal() {
        let (_dir, context, tracker) = bundle_with_tracker("I plan to write a novel");
        let thought = GoalKeeper.run(&context, &[]).await.unwrap();
        assert_eq!(tracker.active().len(), 1);
        assert!(thought.content.starts_with("Added new goal"));
        assert_eq!(thought.confidence(), 1.0);
    }

    #[tokio::test]
    async fn plain_input_only_reports_slate() {
        let (_dir, context, tracker) = bundle_with_tracker("what is the weather");
        tracker.add("existing goal", 0.7, None);
        let thought = GoalKeeper.run(&context, &[]).await.unwrap();
        assert_eq!(tracker.active().len(), 1);
        assert!(thought.content.starts_with("No new goals detected"));
        assert!(thought.content.contains("existing goal"));
    }
}
