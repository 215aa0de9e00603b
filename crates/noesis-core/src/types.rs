//! Shared data model: the per-cycle context packet and the uniform agent
//! output contract.

use crate::config::HubConfig;
use crate::error::{Error, Result};
use crate::services::ServiceMap;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

/// Identifier for one reasoning cycle. Handed from the cycle runner to the
/// memory store and the reflection supervisor so the record to patch is
/// located by id, never by directory-listing order.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CycleId(Uuid);

impl CycleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CycleId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// One ranked hit from the similarity index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryMatch {
    pub id: String,
    pub score: f64,
    pub summary: String,
}

/// Static ethical boundary list. Loading policy text is out of scope — the
/// bundle only carries the lines agents consult.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EthicalBoundaries {
    pub boundaries: Vec<String>,
}

impl EthicalBoundaries {
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }
}

/// Long-lived user profile shared read-only with agents.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub preferences: Vec<String>,
    pub recent_tags: Vec<String>,
}

/// Persona style guide — tone directives consulted when phrasing the final
/// response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersonaStyle {
    pub voice: String,
    pub directives: Vec<String>,
}

impl Default for PersonaStyle {
    fn default() -> Self {
        Self {
            voice: "warm, direct, reflective".to_string(),
            directives: vec![
                "respond naturally, never by repeating internal analysis".to_string(),
            ],
        }
    }
}

/// The immutable-per-cycle packet shared read-only by all agents.
///
/// Scalar fields never change after construction; the bundle is shared as
/// `Arc<ContextBundle>` and no mutating method exists. The one sanctioned
/// side channel is [`ServiceMap`], whose contents (goal tracker, task
/// scheduler) agents may mutate during a round.
#[derive(Clone, Debug)]
pub struct ContextBundle {
    pub user_input: String,
    /// Ordered memory-match summaries, highest similarity first.
    pub memory_matches: Vec<String>,
    /// Wall-clock timestamp, local time, human formatted.
    pub timestamp: String,
    /// UTC timestamp for persisted artifacts.
    pub timestamp_utc: DateTime<Utc>,
    pub config: HubConfig,
    pub ethics: Arc<EthicalBoundaries>,
    pub profile: Arc<UserProfile>,
    pub persona: Arc<PersonaStyle>,
    /// Keyed lookup for stateful registries (goal tracker, task scheduler).
    pub services: ServiceMap,
    /// Optional per-agent prompt overrides, keyed by agent name.
    pub dynamic_prompts: HashMap<String, String>,
}

impl ContextBundle {
    pub fn from_input(
        user_input: impl Into<String>,
        memory_matches: Vec<String>,
        config: HubConfig,
    ) -> Self {
        let now_utc = Utc::now();
        Self {
            user_input: user_input.into(),
            memory_matches,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            timestamp_utc: now_utc,
            config,
            ethics: Arc::new(EthicalBoundaries::default()),
            profile: Arc::new(UserProfile::default()),
            persona: Arc::new(PersonaStyle::default()),
            services: ServiceMap::new(),
            dynamic_prompts: HashMap::new(),
        }
    }

    pub fn with_collaborators(
        mut self,
        ethics: Arc<EthicalBoundaries>,
        profile: Arc<UserProfile>,
        persona: Arc<PersonaStyle>,
    ) -> Self {
        self.ethics = ethics;
        self.profile = profile;
        self.persona = persona;
        self
    }

    pub fn with_services(mut self, services: ServiceMap) -> Self {
        self.services = services;
        self
    }

    pub fn with_dynamic_prompt(
        mut self,
        agent: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        self.dynamic_prompts.insert(agent.into(), prompt.into());
        self
    }

    /// Prompt override for a given agent, if one was prebuilt this cycle.
    pub fn dynamic_prompt(&self, agent: &str) -> Option<&str> {
        self.dynamic_prompts.get(agent).map(String::as_str)
    }
}

/// The uniform structured output every cognitive agent must return.
///
/// Constructed once per agent per round. The constructor rejects confidence
/// outside [0.0, 1.0]; post-processing adjusts confidence only through the
/// clamping setter. Two thoughts from the same agent across rounds are
/// related only by `agent_name` equality.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "AgentThoughtWire")]
pub struct AgentThought {
    pub agent_name: String,
    confidence: f64,
    pub content: String,
    /// Short rationale phrases, in the order the agent produced them.
    pub reasons: Vec<String>,
    pub requires_memory: bool,
    /// Named boolean flags, e.g. contradiction / ethical_warning / insight.
    pub flags: BTreeMap<String, bool>,
}

/// Raw wire shape. Deserialization funnels through [`AgentThought::new`] so
/// inbound JSON cannot mint a thought the constructor would reject.
#[derive(Deserialize)]
struct AgentThoughtWire {
    agent_name: String,
    confidence: f64,
    content: String,
    #[serde(default)]
    reasons: Vec<String>,
    #[serde(default)]
    requires_memory: bool,
    #[serde(default)]
    flags: BTreeMap<String, bool>,
}

impl TryFrom<AgentThoughtWire> for AgentThought {
    type Error = Error;

    fn try_from(wire: AgentThoughtWire) -> Result<Self> {
        let mut thought = Self::new(wire.agent_name, wire.confidence, wire.content)?;
        thought.reasons = wire.reasons;
        thought.requires_memory = wire.requires_memory;
        thought.flags = wire.flags;
        Ok(thought)
    }
}

impl AgentThought {
    pub fn new(
        agent_name: impl Into<String>,
        confidence: f64,
        content: impl Into<String>,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) || confidence.is_nan() {
            return Err(Error::ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            agent_name: agent_name.into(),
            confidence,
            content: content.into(),
            reasons: Vec::new(),
            requires_memory: false,
            flags: BTreeMap::new(),
        })
    }

    pub fn with_reasons(mut self, reasons: Vec<String>) -> Self {
        self.reasons = reasons;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reasons.push(reason.into());
        self
    }

    pub fn requires_memory(mut self, requires: bool) -> Self {
        self.requires_memory = requires;
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Post-processing hook: adjust confidence, clamped into [0.0, 1.0].
    pub fn set_confidence_clamped(&mut self, confidence: f64) {
        self.confidence = confidence.clamp(0.0, 1.0);
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Readable one-liner for the narrative log and debug output.
    pub fn summary(&self) -> String {
        format!(
            "[{}] ({:.2}) {}",
            self.agent_name, self.confidence, self.content
        )
    }
}
