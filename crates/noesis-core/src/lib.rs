//! Core types for Noesis — shared by every other crate, depends on none.

pub mod config;
pub mod error;
pub mod services;
pub mod types;

pub use config::HubConfig;
pub use error::{Error, Result};
pub use services::ServiceMap;
pub use types::{
    AgentThought, ContextBundle, CycleId, EthicalBoundaries, MemoryMatch, PersonaStyle,
    UserProfile,
};
