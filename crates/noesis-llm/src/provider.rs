//! Generation provider trait and the explicit success/degraded outcome type.

use futures::Stream;
use std::pin::Pin;

/// Fixed string substituted whenever the generation collaborator fails.
/// Callers always receive usable (if degraded) text.
pub const FALLBACK_TEXT: &str = "[Fallback] Reasoning unavailable.";

/// Outcome of a generation call. Replaces exception-driven fallback strings
/// scattered per call site: every caller consumes this uniformly and can
/// tell a real completion from the degraded substitute.
#[derive(Clone, Debug, PartialEq)]
pub enum Generated {
    Text(String),
    /// The collaborator failed; carries the fixed fallback string.
    Degraded(String),
}

impl Generated {
    pub fn degraded() -> Self {
        Self::Degraded(FALLBACK_TEXT.to_string())
    }

    pub fn text(&self) -> &str {
        match self {
            Generated::Text(s) | Generated::Degraded(s) => s,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Generated::Degraded(_))
    }

    pub fn into_text(self) -> String {
        match self {
            Generated::Text(s) | Generated::Degraded(s) => s,
        }
    }
}

/// Stream of response text chunks. A degraded stream yields the fallback
/// string as its only chunk.
pub type TextStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Text-generation collaborator.
///
/// Implementations must not raise: any transport or service failure resolves
/// to `Generated::Degraded` so no caller on the cycle path ever aborts.
#[async_trait::async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Generated;

    async fn stream(&self, prompt: &str, system_prompt: Option<&str>) -> TextStream;
}

/// Stand-in supplied to agents whose generation capability is disabled or
/// unavailable. Always degraded, never an import-time substitution.
pub struct DisabledGeneration;

#[async_trait::async_trait]
impl GenerationProvider for DisabledGeneration {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str, _system_prompt: Option<&str>) -> Generated {
        Generated::degraded()
    }

    async fn stream(&self, _prompt: &str, _system_prompt: Option<&str>) -> TextStream {
        Box::pin(futures::stream::once(async {
            FALLBACK_TEXT.to_string()
        }))
    }
}
