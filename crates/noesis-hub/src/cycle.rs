//! The cycle runner: recall, two dispatch rounds, fusion, conversational
//! synthesis, and persistence under a fresh cycle id.

use crate::dispatch::Dispatcher;
use crate::fusion::{fuse, FusionOutcome};
use crate::reflect::ReflectionSupervisor;
use noesis_agents::{
    AgentRegistry, GoalTracker, TaskScheduler, GOAL_TRACKER_SERVICE, TASK_SCHEDULER_SERVICE,
};
use noesis_core::{
    AgentThought, ContextBundle, CycleId, EthicalBoundaries, HubConfig, PersonaStyle, Result,
    ServiceMap, UserProfile,
};
use noesis_llm::{GenerationProvider, SimilarityIndex, FALLBACK_TEXT};
use noesis_memory::{MemoryRecord, MemoryStore, RecallService};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "hiya",
    "greetings",
    "good morning",
    "good evening",
];

/// What one call to [`Hub::run_cycle`] produces. A greeting bypass carries
/// no cycle id — nothing was dispatched or persisted.
#[derive(Clone, Debug)]
pub struct CycleOutcome {
    pub cycle_id: Option<CycleId>,
    pub response: String,
    pub thoughts: Vec<AgentThought>,
    pub diagnostics: String,
}

/// Per-cycle structured distillation, parsed leniently: this path is
/// best-effort, unlike the supervisor's fail-closed `reflect`.
#[derive(Debug, Deserialize)]
struct Distillation {
    insight: String,
    behavioral_adjustment: String,
    #[serde(default)]
    reflective_summary: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

pub struct Hub {
    config: HubConfig,
    generation: Arc<dyn GenerationProvider>,
    recall: RecallService,
    store: Arc<MemoryStore>,
    registry: AgentRegistry,
    services: ServiceMap,
    ethics: Arc<EthicalBoundaries>,
    profile: Arc<UserProfile>,
    persona: Arc<PersonaStyle>,
    reflector: ReflectionSupervisor,
}

impl Hub {
    pub fn new(
        config: HubConfig,
        generation: Arc<dyn GenerationProvider>,
        index: Arc<dyn SimilarityIndex>,
        store: Arc<MemoryStore>,
        registry: AgentRegistry,
    ) -> Result<Self> {
        let goal_tracker = Arc::new(GoalTracker::open(config.data_dir.join("goals.json"))?);
        let task_scheduler = Arc::new(TaskScheduler::open(config.data_dir.join("tasks.json"))?);

        let services = ServiceMap::new();
        services.insert(GOAL_TRACKER_SERVICE, goal_tracker);
        services.insert(TASK_SCHEDULER_SERVICE, task_scheduler);

        let recall = RecallService::new(
            index,
            store.clone(),
            config.recall.k,
            config.recall.score_threshold,
        );
        let reflector = ReflectionSupervisor::new(
            generation.clone(),
            store.clone(),
            config.reflection.relevance_score,
        );

        Ok(Self {
            config,
            generation,
            recall,
            store,
            registry,
            services,
            ethics: Arc::new(EthicalBoundaries::default()),
            profile: Arc::new(UserProfile::default()),
            persona: Arc::new(PersonaStyle::default()),
            reflector,
        })
    }

    pub fn with_profile(mut self, profile: Arc<UserProfile>) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_ethics(mut self, ethics: Arc<EthicalBoundaries>) -> Self {
        self.ethics = ethics;
        self
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn reflector(&self) -> &ReflectionSupervisor {
        &self.reflector
    }

    /// Run one full reasoning cycle for `user_input`.
    ///
    /// Greeting inputs bypass dispatch entirely and return a direct
    /// generated reply with an empty thought list. Everything else flows
    /// recall -> round 1 -> round 2 -> fusion -> conversational synthesis,
    /// then persists a narrative entry and a structured record under a
    /// fresh cycle id. Nothing on this path aborts the user response.
    pub async fn run_cycle(&self, user_input: &str) -> Result<CycleOutcome> {
        let trimmed = user_input.trim();
        if GREETINGS.contains(&trimmed.to_lowercase().as_str()) {
            let prompt = format!(
                "The user said: \"{}\". Respond casually and kindly.",
                trimmed
            );
            let response = self.generation.generate(&prompt, None).await;
            return Ok(CycleOutcome {
                cycle_id: None,
                response: response.text().trim().to_string(),
                thoughts: Vec::new(),
                diagnostics: "Direct response — agents skipped".to_string(),
            });
        }

        let snippets: Vec<String> = if self.config.features.search_enabled {
            self.recall
                .search("hub", trimmed)
                .await
                .into_iter()
                .map(|m| m.summary)
                .collect()
        } else {
            Vec::new()
        };

        let mut context = ContextBundle::from_input(trimmed, snippets.clone(), self.config.clone())
            .with_collaborators(
                self.ethics.clone(),
                self.profile.clone(),
                self.persona.clone(),
            )
            .with_services(self.services.clone());

        if self.config.agent_enabled("reasoner") {
            let goals: Vec<String> = self
                .services
                .get::<GoalTracker>(GOAL_TRACKER_SERVICE)
                .map(|tracker| {
                    tracker
                        .active()
                        .into_iter()
                        .map(|g| g.description)
                        .collect()
                })
                .unwrap_or_default();
            let prompt = build_dynamic_prompt(&snippets, &goals, &self.profile.recent_tags);
            context = context.with_dynamic_prompt("reasoner", prompt);
        }
        let context = Arc::new(context);

        let dispatcher = Dispatcher::new(
            self.registry.enabled(&self.config),
            Duration::from_millis(self.config.dispatch.agent_timeout_ms),
            self.config.debug_mode,
        );
        let round1 = dispatcher.run_round(context.clone(), Arc::new(Vec::new()), 1).await;
        let round2 = dispatcher
            .run_round(context, Arc::new(round1.clone()), 2)
            .await;

        let fusion = fuse(&round1, &round2).unwrap_or_else(|| FusionOutcome {
            primary: FALLBACK_TEXT.to_string(),
            diagnostics: "No agent thoughts survived dispatch".to_string(),
            thoughts: Vec::new(),
        });

        let trace = fusion
            .thoughts
            .iter()
            .map(|t| format!("[{}] {}", t.agent_name, t.content))
            .collect::<Vec<_>>()
            .join("\n");
        let final_prompt = format!(
            "The user said: \"{}\"\n\n\
             Here is a summary of internal system reasoning:\n{}\n\n\
             Based on the above, respond helpfully and conversationally — \
             not by repeating the analysis, but by responding naturally and \
             insightfully to the user. Voice: {}.",
            trimmed, trace, self.persona.voice
        );
        let response = self
            .generation
            .generate(&final_prompt, None)
            .await
            .into_text()
            .trim()
            .to_string();

        let cycle_id = CycleId::new();
        self.persist_cycle(&cycle_id, trimmed, &round1, &round2, &fusion, &response)
            .await;
        info!("Cycle {} complete ({} thoughts)", cycle_id, fusion.thoughts.len());

        Ok(CycleOutcome {
            cycle_id: Some(cycle_id),
            response,
            thoughts: fusion.thoughts,
            diagnostics: fusion.diagnostics,
        })
    }

    /// Narrative + structured persistence, then optional auto-reflection.
    /// Every failure here is logged and swallowed.
    async fn persist_cycle(
        &self,
        cycle_id: &CycleId,
        user_input: &str,
        round1: &[AgentThought],
        round2: &[AgentThought],
        fusion: &FusionOutcome,
        response: &str,
    ) {
        let narrative = format!(
            "# Reasoning Cycle {}\n**User Input:** {}\n\n## Round 1:\n{}\n\n\
             ## Round 2:\n{}\n\n## Final Response:\n{}\n\n## Diagnostics:\n{}\n",
            cycle_id,
            user_input,
            round_lines(round1),
            round_lines(round2),
            response,
            fusion.diagnostics,
        );
        self.store.append_narrative(&narrative).await;

        let trace = round2
            .iter()
            .map(|t| format!("[{}] → {}", t.agent_name, t.content))
            .collect::<Vec<_>>()
            .join("\n");
        let distilled = self
            .distill(user_input, &fusion.primary, &fusion.diagnostics, &trace)
            .await;

        let mut record = MemoryRecord::new(fusion.primary.clone(), trace)
            .with_id(cycle_id.as_uuid())
            .with_insight(distilled.insight)
            .with_adjustment(distilled.behavioral_adjustment)
            .with_tags(distilled.tags)
            .with_relevance(self.config.reflection.relevance_score);
        if let Some(summary) = distilled.reflective_summary {
            record = record.with_reflective_summary(summary);
        }

        let appended = self.store.append(record).await;
        if appended.is_none() {
            info!("Cycle {} content already stored, skipping reflection", cycle_id);
            return;
        }

        if self.config.reflection.auto_reflect {
            if let Err(e) = self.reflector.reflect(cycle_id).await {
                warn!("Auto-reflection for cycle {} failed: {}", cycle_id, e);
            }
        }
    }

    /// Ask the collaborator for a compact structured summary of the cycle.
    /// A degraded or malformed reply degrades to a raw-text summary with a
    /// parse-error tag instead of failing.
    async fn distill(
        &self,
        user_input: &str,
        fused: &str,
        diagnostics: &str,
        trace: &str,
    ) -> Distillation {
        let prompt = format!(
            "The user input was:\n\"{}\"\n\n\
             The final system response was:\n\"{}\"\n\n\
             Debug notes:\n{}\n\n\
             Internal agent reasoning trace:\n{}\n\n\
             Return a compact JSON with:\n\
             - insight\n\
             - behavioral_adjustment\n\
             - reflective_summary\n\
             - tags\n\
             (Only these keys. Be concise. No markdown. No explanation.)",
            user_input, fused, diagnostics, trace
        );
        let raw = self
            .generation
            .generate(&prompt, None)
            .await
            .into_text()
            .trim()
            .to_string();

        serde_json::from_str(&raw).unwrap_or_else(|_| Distillation {
            insight: "Failed to parse reflection".to_string(),
            behavioral_adjustment: "N/A".to_string(),
            reflective_summary: Some(raw),
            tags: vec!["parse_error".to_string()],
        })
    }
}

fn round_lines(thoughts: &[AgentThought]) -> String {
    thoughts
        .iter()
        .map(|t| format!("[{}] ({:.2}) {}", t.agent_name, t.confidence(), t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_dynamic_prompt(snippets: &[String], goals: &[String], recent_tags: &[String]) -> String {
    let mut guidance = String::from(
        "- Your role is to assess reasoning structure and planning logic.\n\
         - Highlight intent, contradictions, and value-alignment.\n",
    );
    if recent_tags.iter().any(|t| t == "confusion") {
        guidance.push_str("- The user appears uncertain. Be extra clear in your logic explanation.\n");
    }
    if recent_tags.iter().any(|t| t == "ethics") {
        guidance.push_str("- Ethical reasoning may be required. Review boundaries.\n");
    }
    if !goals.is_empty() {
        guidance.push_str("- Current user goals:\n");
        for goal in goals {
            guidance.push_str(&format!("  - {}\n", goal));
        }
    }

    let memory_blob = if snippets.is_empty() {
        "- None".to_string()
    } else {
        snippets
            .iter()
            .take(3)
            .map(|s| format!("- {}", s))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are the core reasoning agent of the cognition system.\n{}\n\
         Relevant recent memory:\n{}\n\n\
         Now, respond with insight based on the above.",
        guidance, memory_blob
    )
    .trim()
    .to_string()
}
