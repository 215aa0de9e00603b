//! Error taxonomy for Noesis
//!
//! The propagation policy is asymmetric by design: nothing on the per-agent
//! or per-cycle path may abort the response to the user. Agent failures are
//! excluded and logged, degraded generation is substituted with fallback
//! text, store write failures are swallowed. The single fail-closed
//! operation is the reflection pass (`ReflectionParse`), which must never
//! mutate persisted state from malformed data.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("agent '{agent}' failed in round {round}: {message}")]
    AgentExecution {
        agent: String,
        round: u8,
        message: String,
    },

    #[error("agent '{agent}' timed out after {timeout_ms}ms in round {round}")]
    AgentTimeout {
        agent: String,
        round: u8,
        timeout_ms: u64,
    },

    #[error("generation service error: {0}")]
    Generation(String),

    #[error("recall index unavailable: {0}")]
    RecallUnavailable(String),

    #[error("reflection response not parsable: {0}")]
    ReflectionParse(String),

    #[error("no interaction trace found for cycle {0}")]
    TraceNotFound(String),

    #[error("memory store write failed: {0}")]
    StoreWrite(String),

    #[error("confidence {0} outside [0.0, 1.0]")]
    ConfidenceOutOfRange(f64),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn agent_execution(
        agent: impl Into<String>,
        round: u8,
        message: impl Into<String>,
    ) -> Self {
        Self::AgentExecution {
            agent: agent.into(),
            round,
            message: message.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    pub fn store_write(message: impl Into<String>) -> Self {
        Self::StoreWrite(message.into())
    }
}
