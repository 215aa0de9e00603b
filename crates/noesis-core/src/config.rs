//! Hub configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Agent identifiers to run each cycle, in dispatch order.
    pub agents_enabled: Vec<String>,
    /// Verbose per-agent diagnostics.
    pub debug_mode: bool,
    /// Feature toggles.
    pub features: FeatureConfig,
    /// Memory recall parameters.
    pub recall: RecallConfig,
    /// Dispatch parameters.
    pub dispatch: DispatchConfig,
    /// Reflection parameters.
    pub reflection: ReflectionConfig,
    /// Model selection for the generation collaborator.
    pub models: ModelConfig,
    /// Root directory for all persisted state.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Allow agents to request generated commentary.
    pub commentary_enabled: bool,
    /// Allow memory recall before dispatch.
    pub search_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    /// Top-k nearest entries requested from the similarity index.
    pub k: usize,
    /// Entries scoring below this are excluded. None keeps all top-k.
    pub score_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Per-agent invocation timeout in milliseconds. A timed-out agent is
    /// excluded from the round, same as any other failure.
    pub agent_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionConfig {
    /// Run the reflection pass automatically after each cycle.
    pub auto_reflect: bool,
    /// Relevance score assigned to reflection records.
    pub relevance_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Chat completion model.
    pub generation: String,
    /// Embedding model for the similarity index.
    pub embedding: String,
}

// ============================================================
// Defaults
// ============================================================

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            agents_enabled: vec![
                "reasoner".to_string(),
                "goal_keeper".to_string(),
                "task_scheduler".to_string(),
                "memory_retriever".to_string(),
            ],
            debug_mode: false,
            features: FeatureConfig::default(),
            recall: RecallConfig::default(),
            dispatch: DispatchConfig::default(),
            reflection: ReflectionConfig::default(),
            models: ModelConfig::default(),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            commentary_enabled: true,
            search_enabled: true,
        }
    }
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            k: 5,
            score_threshold: None,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            agent_timeout_ms: 30_000,
        }
    }
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            auto_reflect: true,
            relevance_score: 0.85,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            generation: "gpt-4o-mini".to_string(),
            embedding: "text-embedding-3-small".to_string(),
        }
    }
}

// ============================================================
// Loading
// ============================================================

impl HubConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {} — using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {} — using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the current config as TOML (for generating a default file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn agent_enabled(&self, name: &str) -> bool {
        self.agents_enabled.iter().any(|a| a == name)
    }
}
