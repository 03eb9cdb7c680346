//! Engine configuration types for Chorus.
//!
//! `EngineConfig` represents the top-level `chorus.toml` that controls the
//! sliding window, group-chat policy, the default LLM provider, the optional
//! remote memory backend, and the persona list.

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, GroupChatConfig};
use crate::error::ConfigError;
use crate::llm::LlmConfig;

/// Top-level configuration for the engine.
///
/// Loaded from `{data_dir}/chorus.toml`. All sections have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub group_chat: GroupChatConfig,

    /// Shared default provider for personas without an override.
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    /// Personas, in registration order.
    #[serde(default)]
    pub agents: Vec<Agent>,
}

/// Sliding window sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum live turns kept per session after every append.
    #[serde(default = "default_short_term_window")]
    pub short_term_window: usize,
    /// Live window length at which compaction runs.
    #[serde(default = "default_compress_threshold")]
    pub compress_threshold: usize,
}

fn default_short_term_window() -> usize {
    20
}

fn default_compress_threshold() -> usize {
    16
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            short_term_window: default_short_term_window(),
            compress_threshold: default_compress_threshold(),
        }
    }
}

/// Long-term memory settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Base URL of a remote memory service; local heuristics only when unset.
    #[serde(default)]
    pub remote_url: Option<String>,
    /// Environment variable holding the remote service's bearer token.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_memory_timeout_secs")]
    pub timeout_secs: u64,
    /// Records retrieved per context build.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

fn default_memory_timeout_secs() -> u64 {
    10
}

fn default_search_limit() -> usize {
    5
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            api_key_env: None,
            timeout_secs: default_memory_timeout_secs(),
            search_limit: default_search_limit(),
        }
    }
}

impl EngineConfig {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context.short_term_window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "context.short_term_window",
                reason: "must be greater than 0".to_string(),
            });
        }

        let threshold = self.group_chat.chain_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidValue {
                field: "group_chat.chain_threshold",
                reason: format!("{threshold} is outside [0, 1]"),
            });
        }

        let defaults = self.agents.iter().filter(|a| a.is_default).count();
        if defaults > 1 {
            return Err(ConfigError::InvalidValue {
                field: "agents",
                reason: format!("{defaults} agents are marked default, at most one allowed"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default_values() {
        let config = EngineConfig::default();
        assert_eq!(config.context.short_term_window, 20);
        assert_eq!(config.context.compress_threshold, 16);
        assert_eq!(config.memory.search_limit, 5);
        assert!(config.memory.remote_url.is_none());
        assert!(config.agents.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_engine_config_deserialize_empty() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.context, ContextConfig::default());
        assert!(!config.group_chat.enabled);
    }

    #[test]
    fn test_engine_config_deserialize_with_values() {
        let toml_str = r#"
[context]
short_term_window = 12
compress_threshold = 10

[group_chat]
enabled = true
agent_interaction = true
max_agent_chain = 2
chain_threshold = 0.8

[memory]
remote_url = "http://localhost:8765"
api_key_env = "MEMORY_TOKEN"

[[agents]]
id = "helper"
name = "Helper"
system_prompt = "You are helpful."
is_default = true

[[agents]]
id = "coder"
name = "Coder"
system_prompt = "You write code."
triggers = ["rust", "compile"]

[agents.llm_override]
provider_type = "anthropic"
model = "claude-sonnet-4-20250514"
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.context.short_term_window, 12);
        assert!(config.group_chat.agent_interaction);
        assert_eq!(config.group_chat.max_agent_chain, 2);
        assert_eq!(config.group_chat.chain_delay_ms, 1000);
        assert_eq!(config.memory.timeout_secs, 10);
        assert_eq!(config.agents.len(), 2);
        assert!(config.agents[0].is_default);
        assert_eq!(config.agents[1].triggers.len(), 2);
        assert!(config.agents[1].llm_override.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = EngineConfig::default();
        config.context.short_term_window = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("short_term_window"));
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        let mut config = EngineConfig::default();
        config.group_chat.chain_threshold = 1.5;
        assert!(config.validate().is_err());
        config.group_chat.chain_threshold = -0.1;
        assert!(config.validate().is_err());
        config.group_chat.chain_threshold = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_two_defaults() {
        let mut config = EngineConfig::default();
        config.agents = vec![
            Agent::new("a", "A", "a").as_default(),
            Agent::new("b", "B", "b").as_default(),
        ];
        assert!(config.validate().is_err());
    }
}
