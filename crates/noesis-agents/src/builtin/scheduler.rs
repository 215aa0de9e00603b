//! Scheduling agent. Decays stored task relevance, extracts a concrete task
//! from the input when the generation collaborator can supply one, and
//! surfaces the tasks currently due.

use crate::agent::{CognitiveAgent, TASK_SCHEDULER_SERVICE};
use crate::tasks::TaskScheduler;
use noesis_core::{AgentThought, ContextBundle, Result};
use noesis_llm::GenerationProvider;
use std::sync::Arc;
use tracing::debug;

const DECAY_RATE: f64 = 0.05;
const DUE_THRESHOLD: f64 = 0.7;
const PARSED_TASK_RELEVANCE: f64 = 0.7;

pub struct Scheduler {
    generation: Arc<dyn GenerationProvider>,
}

impl Scheduler {
    pub fn new(generation: Arc<dyn GenerationProvider>) -> Self {
        Self { generation }
    }

    /// Ask the collaborator to pull a task out of free-form input. A
    /// degraded or empty reply means no task.
    async fn parse_task(&self, user_input: &str) -> Option<String> {
        let prompt = format!(
            "Extract the specific task or reminder from this input:\n\n{}\n\n\
             Return only the task, or an empty line if there is none.",
            user_input
        );
        let generated = self.generation.generate(&prompt, None).await;
        if generated.is_degraded() {
            debug!("Task parse skipped, generation degraded");
            return None;
        }
        let task = generated.text().trim().to_string();
        if task.is_empty() {
            None
        } else {
            Some(task)
        }
    }
}

#[async_trait::async_trait]
impl CognitiveAgent for Scheduler {
    fn name(&self) -> &'static str {
        "task_scheduler"
    }

    async fn run(
        &self,
        context: &ContextBundle,
        _prior_thoughts: &[AgentThought],
    ) -> Result<AgentThought> {
        let Some(scheduler) = context.services.get::<TaskScheduler>(TASK_SCHEDULER_SERVICE)
        else {
            return Ok(AgentThought::new(
                self.name(),
                0.0,
                "Task scheduler service not available in context.",
            )?
            .with_reason("missing task_scheduler service")
            .with_flag("execution_blocked", true));
        };

        scheduler.decay(DECAY_RATE);

        let mut lines = Vec::new();
        if context.config.features.commentary_enabled {
            if let Some(task) = self.parse_task(&context.user_input).await {
                scheduler.schedule(task.as_str(), PARSED_TASK_RELEVANCE);
                lines.push(format!("New task parsed and added: '{}'", task));
            }
        }

        let due = scheduler.due_above(DUE_THRESHOLD);
        if due.is_empty() {
            lines.push("No tasks due at the moment.".to_string());
        } else {
            lines.push("Tasks due now:".to_string());
            lines.extend(due.iter().map(|t| format!("- {}", t.task)));
        }

        Ok(AgentThought::new(self.name(), 1.0, lines.join("\n"))?
            .with_reason("task management")
            .with_reason("reminder prioritization")
            .requires_memory(true))
    }
}
