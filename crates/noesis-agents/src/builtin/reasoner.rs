//! Core reasoning agent. Scores its own confidence from structural cues in
//! the input, asks the generation collaborator to assess the user's logic,
//! and flags contradictions it spots across memory and peer thoughts.

use crate::agent::CognitiveAgent;
use noesis_core::{AgentThought, ContextBundle, Result};
use noesis_llm::GenerationProvider;
use std::sync::Arc;
use tracing::debug;

const CONDITIONAL_CUES: &[&str] = &["if", "then", "therefore", "because"];
const PLANNING_CUES: &[&str] = &[
    "plan",
    "should",
    "need to",
    "must",
    "goal",
    "strategy",
    "next step",
];
const ETHICS_CUES: &[&str] = &["should i", "right thing", "is it ethical", "ought to"];
const CONTRADICTION_CUES: &[&str] = &["not", "never", "impossible", "conflict", "disagree"];

pub struct Reasoner {
    generation: Arc<dyn GenerationProvider>,
}

impl Reasoner {
    pub fn new(generation: Arc<dyn GenerationProvider>) -> Self {
        Self { generation }
    }

    fn detect_conflict(input: &str, prior_thoughts: &[AgentThought]) -> bool {
        let in_input = CONTRADICTION_CUES.iter().any(|kw| input.contains(kw));
        let in_priors = prior_thoughts
            .iter()
            .any(|t| CONTRADICTION_CUES.iter().any(|kw| t.content.to_lowercase().contains(kw)));
        in_input || in_priors
    }

    fn build_prompt(&self, context: &ContextBundle) -> String {
        if let Some(prompt) = context.dynamic_prompt(self.name()) {
            return prompt.to_string();
        }
        let snippets: Vec<&str> = context
            .memory_matches
            .iter()
            .take(2)
            .map(String::as_str)
            .collect();
        format!(
            "You are the core reasoning faculty of a synthetic cognition system.\n\n\
             User input: \"{}\"\n\
             Relevant memories: {:?}\n\n\
             Assess the user's reasoning structure. Summarize their logic, \
             intent, or planning sequence.",
            context.user_input, snippets
        )
    }
}

#[async_trait::async_trait]
impl CognitiveAgent for Reasoner {
    fn name(&self) -> &'static str {
        "reasoner"
    }

    async fn run(
        &self,
        context: &ContextBundle,
        prior_thoughts: &[AgentThought],
    ) -> Result<AgentThought> {
        let input = context.user_input.to_lowercase();

        let has_conditional = CONDITIONAL_CUES.iter().any(|w| input.contains(w));
        let has_planning = PLANNING_CUES.iter().any(|w| input.contains(w));
        let has_ethics = ETHICS_CUES.iter().any(|w| input.contains(w));
        let conflict = Self::detect_conflict(&input, prior_thoughts);

        let mut reasons = Vec::new();
        if has_conditional {
            reasons.push("logical construct".to_string());
        }
        if has_planning {
            reasons.push("planning detected".to_string());
        }
        if has_ethics {
            reasons.push("moral reasoning".to_string());
        }
        if reasons.is_empty() {
            reasons.push("general reasoning".to_string());
        }
        if conflict {
            reasons.push("conflict in reasoning".to_string());
        }

        let mut confidence: f64 = 0.75;
        if has_conditional {
            confidence += 0.05;
        }
        if has_planning {
            confidence += 0.05;
        }
        if has_ethics {
            confidence += 0.02;
        }
        if conflict {
            confidence -= 0.1;
        }
        let confidence = confidence.clamp(0.5, 0.95);

        if !context.config.features.commentary_enabled {
            let content = format!("Structural read of the input: {}.", reasons.join(", "));
            return Ok(AgentThought::new(self.name(), confidence, content)?
                .with_reasons(reasons)
                .requires_memory(true)
                .with_flag("contradiction", conflict)
                .with_flag("insight", true));
        }

        let generated = self.generation.generate(&self.build_prompt(context), None).await;
        if generated.is_degraded() {
            debug!("Reasoner generation degraded, lowering confidence");
        }

        let mut thought = AgentThought::new(self.name(), confidence, generated.text())?
            .with_reasons(reasons)
            .requires_memory(true)
            .with_flag("contradiction", conflict)
            .with_flag("insight", true);

        if generated.is_degraded() {
            thought.set_confidence_clamped(0.5);
            thought = thought.with_flag("degraded", true);
        }
        Ok(thought)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noesis_core::HubConfig;
    use noesis_llm::{DisabledGeneration, Generated, TextStream};

    struct EchoProvider;

    #[async_trait::async_trait]
    impl GenerationProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }
        async fn generate(&self, prompt: &str, _system: Option<&str>) -> Generated {
            Generated::Text(format!("analysis of: {}", prompt.len()))
        }
        async fn stream(&self, _prompt: &str, _system: Option<&str>) -> TextStream {
            Box::pin(futures::stream::empty())
        }
    }

    fn bundle(input: &str) -> ContextBundle {
        ContextBundle::from_input(input, vec![], HubConfig::default())
    }

    #[tokio::test]
    async fn planning_input_raises_confidence() {
        let agent = Reasoner::new(Arc::new(EchoProvider));
        let thought = agent.run(&bundle("I plan to learn Rust"), &[]).await.unwrap();
        assert!((thought.confidence() - 0.80).abs() < 1e-9);
        assert!(thought.reasons.contains(&"planning detected".to_string()));
    }

    #[tokio::test]
    async fn contradiction_cue_lowers_confidence_and_flags() {
        let agent = Reasoner::new(Arc::new(EchoProvider));
        let thought = agent.run(&bundle("that is impossible"), &[]).await.unwrap();
        assert!(thought.flag("contradiction"));
        assert!((thought.confidence() - 0.65).abs() < 1e-9);
    }

    #[tokio::test]
    async fn conflict_detected_in_prior_thoughts() {
        let agent = Reasoner::new(Arc::new(EchoProvider));
        let prior = vec![AgentThought::new("peer", 0.6, "I disagree with that").unwrap()];
        let thought = agent.run(&bundle("tell me more"), &prior).await.unwrap();
        assert!(thought.flag("contradiction"));
    }

    #[tokio::test]
    async fn degraded_generation_floors_confidence() {
        let agent = Reasoner::new(Arc::new(DisabledGeneration));
        let thought = agent
            .run(&bundle("I plan to do this because it matters"), &[])
            .await
            .unwrap();
        assert_eq!(thought.confidence(), 0.5);
        assert!(thought.flag("degraded"));
        assert_eq!(thought.content, noesis_llm::FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn disabled_commentary_never_calls_generation() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingProvider(AtomicUsize);

        #[async_trait::async_trait]
        impl GenerationProvider for CountingProvider {
            fn name(&self) -> &str {
                "counting"
            }
            async fn generate(&self, _prompt: &str, _system: Option<&str>) -> Generated {
                self.0.fetch_add(1, Ordering::SeqCst);
                Generated::Text("unused".into())
            }
            async fn stream(&self, _prompt: &str, _system: Option<&str>) -> TextStream {
                Box::pin(futures::stream::empty())
            }
        }

        let provider = Arc::new(CountingProvider(AtomicUsize::new(0)));
        let agent = Reasoner::new(provider.clone());

        let mut config = HubConfig::default();
        config.features.commentary_enabled = false;
        let context = ContextBundle::from_input("I plan to learn Rust", vec![], config);

        let thought = agent.run(&context, &[]).await.unwrap();
        assert_eq!(provider.0.load(Ordering::SeqCst), 0);
        // Cue-based confidence survives; this is a deliberate toggle, not a
        // degraded collaborator.
        assert!((thought.confidence() - 0.80).abs() < 1e-9);
        assert!(!thought.flag("degraded"));
        assert!(thought.content.contains("planning detected"));
    }

    #[tokio::test]
    async fn dynamic_prompt_overrides_default() {
        struct CaptureProvider(std::sync::Mutex<String>);

        #[async_trait::async_trait]
        impl GenerationProvider for CaptureProvider {
            fn name(&self) -> &str {
                "capture"
            }
            async fn generate(&self, prompt: &str, _system: Option<&str>) -> Generated {
                *self.0.lock().unwrap() = prompt.to_string();
                Generated::Text("ok".into())
            }
            async fn stream(&self, _prompt: &str, _system: Option<&str>) -> TextStream {
                Box::pin(futures::stream::empty())
            }
        }

        let provider = Arc::new(CaptureProvider(std::sync::Mutex::new(String::new())));
        let agent = Reasoner::new(provider.clone());
        let context = bundle("hello world question")
            .with_dynamic_prompt("reasoner", "custom steering prompt");
        agent.run(&context, &[]).await.unwrap();
        assert_eq!(*provider.0.lock().unwrap(), "custom steering prompt");
    }
}
