//! Persona and group-chat policy types for Chorus.
//!
//! An `Agent` is a named system-prompt configuration the engine can select
//! to answer a message. `GroupChatConfig` is the global policy deciding
//! whether personas may answer each other.

use serde::{Deserialize, Serialize};

use crate::llm::LlmConfig;

/// A persona the engine can route messages to.
///
/// Immutable after registration; re-registering the same `id` replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    /// Short blurb shown to other personas in the group-chat roster.
    #[serde(default)]
    pub description: Option<String>,
    pub system_prompt: String,
    /// Keywords that route a message to this persona (case-insensitive).
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Provider configuration used instead of the shared default.
    #[serde(default)]
    pub llm_override: Option<LlmConfig>,
    #[serde(default)]
    pub is_default: bool,
}

impl Agent {
    /// Minimal persona with no triggers and no provider override.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            system_prompt: system_prompt.into(),
            triggers: Vec::new(),
            llm_override: None,
            is_default: false,
        }
    }

    pub fn with_triggers<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggers = triggers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_llm_override(mut self, config: LlmConfig) -> Self {
        self.llm_override = Some(config);
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// Global policy for persona-to-persona follow-ups.
///
/// Read-only to the chain controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupChatConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Whether one persona's answer may trigger another persona.
    #[serde(default)]
    pub agent_interaction: bool,
    /// Chained responses allowed after the first (depth 0) response.
    #[serde(default = "default_max_agent_chain")]
    pub max_agent_chain: u32,
    /// Probability in [0, 1] that a matching persona actually chains.
    #[serde(default = "default_chain_threshold")]
    pub chain_threshold: f64,
    /// Pause before each chained response, in milliseconds.
    #[serde(default = "default_chain_delay_ms")]
    pub chain_delay_ms: u64,
}

fn default_max_agent_chain() -> u32 {
    3
}

fn default_chain_threshold() -> f64 {
    0.5
}

fn default_chain_delay_ms() -> u64 {
    1000
}

impl Default for GroupChatConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            agent_interaction: false,
            max_agent_chain: default_max_agent_chain(),
            chain_threshold: default_chain_threshold(),
            chain_delay_ms: default_chain_delay_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_builder() {
        let agent = Agent::new("coder", "Coder", "You write code.")
            .with_triggers(["rust", "bug"])
            .with_description("Answers programming questions")
            .as_default();
        assert_eq!(agent.triggers, vec!["rust".to_string(), "bug".to_string()]);
        assert!(agent.is_default);
        assert!(agent.llm_override.is_none());
    }

    #[test]
    fn test_agent_deserialize_minimal() {
        let agent: Agent = toml::from_str(
            r#"
id = "poet"
name = "Poet"
system_prompt = "You answer in verse."
"#,
        )
        .unwrap();
        assert!(agent.triggers.is_empty());
        assert!(!agent.is_default);
        assert!(agent.description.is_none());
    }

    #[test]
    fn test_group_chat_defaults() {
        let config = GroupChatConfig::default();
        assert!(!config.enabled);
        assert!(!config.agent_interaction);
        assert_eq!(config.max_agent_chain, 3);
        assert!((config.chain_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.chain_delay_ms, 1000);
    }
}
