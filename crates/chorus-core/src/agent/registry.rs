//! Persona registry and selector.
//!
//! `AgentRegistry` holds the personas in registration order together with
//! one LLM provider per persona override and a shared default provider.
//! It is populated at startup and then shared read-only behind an `Arc`.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info};

use chorus_types::agent::{Agent, GroupChatConfig};
use chorus_types::chat::{MessageRole, Turn};
use chorus_types::config::EngineConfig;
use chorus_types::error::RegistryError;
use chorus_types::llm::LlmConfig;

use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::factory::ProviderFactory;

use super::prompt;

/// `@word` mentions. Only the first one in a message is considered.
static MENTION: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"@(\w+)").ok());

/// Which selection rule picked an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    Trigger,
    Mention,
    Continuity,
    Default,
}

/// Registered personas plus their LLM providers.
pub struct AgentRegistry {
    agents: Vec<Arc<Agent>>,
    group_chat: GroupChatConfig,
    default_llm: LlmConfig,
    default_provider: Arc<BoxLlmProvider>,
    overrides: HashMap<String, Arc<BoxLlmProvider>>,
    factory: Arc<dyn ProviderFactory>,
}

impl AgentRegistry {
    /// Empty registry whose shared provider is built from `default_llm`.
    pub fn new(
        group_chat: GroupChatConfig,
        default_llm: LlmConfig,
        factory: Arc<dyn ProviderFactory>,
    ) -> Result<Self, RegistryError> {
        let default_provider =
            factory
                .create(&default_llm)
                .map_err(|e| RegistryError::Provider {
                    agent_id: "default".to_string(),
                    message: e.to_string(),
                })?;

        Ok(Self {
            agents: Vec::new(),
            group_chat,
            default_llm,
            default_provider: Arc::new(default_provider),
            overrides: HashMap::new(),
            factory,
        })
    }

    /// Registry populated with every persona in `config.agents`, in order.
    pub fn from_config(
        config: &EngineConfig,
        factory: Arc<dyn ProviderFactory>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new(config.group_chat.clone(), config.llm.clone(), factory)?;
        for agent in &config.agents {
            registry.register(agent.clone())?;
        }
        Ok(registry)
    }

    /// Add a persona, or replace the one with the same id in place.
    ///
    /// The override provider (if any) is built here; a failing build leaves
    /// the registry unchanged.
    pub fn register(&mut self, agent: Agent) -> Result<(), RegistryError> {
        if agent.id.trim().is_empty() {
            return Err(RegistryError::InvalidAgent("agent id is empty".to_string()));
        }
        if agent.name.trim().is_empty() {
            return Err(RegistryError::InvalidAgent(format!(
                "agent '{}' has an empty name",
                agent.id
            )));
        }
        if agent.is_default {
            let existing = self
                .agents
                .iter()
                .find(|a| a.is_default && a.id != agent.id);
            if let Some(existing) = existing {
                return Err(RegistryError::DuplicateDefault {
                    existing: existing.id.clone(),
                    new: agent.id.clone(),
                });
            }
        }

        let provider = match &agent.llm_override {
            Some(config) => Some(self.factory.create(config).map_err(|e| {
                RegistryError::Provider {
                    agent_id: agent.id.clone(),
                    message: e.to_string(),
                }
            })?),
            None => None,
        };

        match provider {
            Some(provider) => {
                self.overrides.insert(agent.id.clone(), Arc::new(provider));
            }
            None => {
                self.overrides.remove(&agent.id);
            }
        }

        let agent = Arc::new(agent);
        match self.agents.iter().position(|a| a.id == agent.id) {
            Some(pos) => {
                debug!(agent_id = %agent.id, "Replacing registered agent");
                self.agents[pos] = agent;
            }
            None => {
                info!(agent_id = %agent.id, name = %agent.name, "Registered agent");
                self.agents.push(agent);
            }
        }
        Ok(())
    }

    /// Personas in registration order.
    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    pub fn get(&self, agent_id: &str) -> Option<Arc<Agent>> {
        self.agents.iter().find(|a| a.id == agent_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn group_chat(&self) -> &GroupChatConfig {
        &self.group_chat
    }

    /// The persona marked default, else the first registered one.
    pub fn default_agent(&self) -> Result<Arc<Agent>, RegistryError> {
        self.agents
            .iter()
            .find(|a| a.is_default)
            .or_else(|| self.agents.first())
            .cloned()
            .ok_or(RegistryError::Empty)
    }

    /// Pick the persona that should answer `content`.
    pub fn select_agent(&self, content: &str, context: &[Turn]) -> Result<Arc<Agent>, RegistryError> {
        self.select_agent_with_reason(content, context)
            .map(|(agent, _)| agent)
    }

    /// Like [`select_agent`](Self::select_agent), also reporting which rule matched.
    ///
    /// Rules, first match wins: trigger keyword, `@mention`, the persona that
    /// authored the most recent attributed assistant turn, the default.
    pub fn select_agent_with_reason(
        &self,
        content: &str,
        context: &[Turn],
    ) -> Result<(Arc<Agent>, SelectionReason), RegistryError> {
        if self.agents.is_empty() {
            return Err(RegistryError::Empty);
        }

        let lowered = content.to_lowercase();

        for agent in &self.agents {
            let hit = agent
                .triggers
                .iter()
                .filter(|t| !t.is_empty())
                .any(|t| lowered.contains(&t.to_lowercase()));
            if hit {
                return Ok((Arc::clone(agent), SelectionReason::Trigger));
            }
        }

        if let Some(word) = first_mention(content) {
            let word = word.to_lowercase();
            if let Some(agent) = self
                .agents
                .iter()
                .find(|a| a.name.to_lowercase().contains(&word))
            {
                return Ok((Arc::clone(agent), SelectionReason::Mention));
            }
        }

        let last_speaker = context
            .iter()
            .rev()
            .find(|t| t.role == MessageRole::Assistant && t.agent_id.is_some())
            .and_then(|t| t.agent_id.as_deref());
        if let Some(agent) = last_speaker.and_then(|id| self.get(id)) {
            return Ok((agent, SelectionReason::Continuity));
        }

        Ok((self.default_agent()?, SelectionReason::Default))
    }

    /// Provider for `agent_id`: its override if one was registered, else
    /// the shared default.
    pub fn get_llm_provider(&self, agent_id: &str) -> Arc<BoxLlmProvider> {
        self.overrides
            .get(agent_id)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default_provider))
    }

    /// LLM settings in effect for `agent`.
    pub fn llm_config<'a>(&'a self, agent: &'a Agent) -> &'a LlmConfig {
        agent.llm_override.as_ref().unwrap_or(&self.default_llm)
    }

    /// The agent's system prompt, with the group-chat roster when enabled.
    pub fn build_multi_agent_system_prompt(&self, agent: &Agent, include_roster: bool) -> String {
        prompt::build_multi_agent_system_prompt(agent, &self.agents, &self.group_chat, include_roster)
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.agents.iter().map(|a| &a.id).collect::<Vec<_>>())
            .field("group_chat", &self.group_chat)
            .field("default_provider", &self.default_provider)
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The word after the first `@` in `content`.
fn first_mention(content: &str) -> Option<&str> {
    MENTION
        .as_ref()?
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{agent_turn, silent_factory, user_turn};
    use chorus_types::llm::LlmError;

    fn registry() -> AgentRegistry {
        AgentRegistry::new(
            GroupChatConfig::default(),
            LlmConfig::default(),
            Arc::new(silent_factory),
        )
        .unwrap()
    }

    /// A (trigger "foo") and B (default).
    fn a_and_b() -> AgentRegistry {
        let mut registry = registry();
        registry
            .register(Agent::new("a", "Alpha", "You are A.").with_triggers(["foo"]))
            .unwrap();
        registry
            .register(Agent::new("b", "Beta", "You are B.").as_default())
            .unwrap();
        registry
    }

    #[test]
    fn test_trigger_wins() {
        let registry = a_and_b();
        let (agent, reason) = registry.select_agent_with_reason("hello FOO", &[]).unwrap();
        assert_eq!(agent.id, "a");
        assert_eq!(reason, SelectionReason::Trigger);
    }

    #[test]
    fn test_mention_selects_by_name_substring() {
        let registry = a_and_b();
        let (agent, reason) = registry.select_agent_with_reason("@B hi", &[]).unwrap();
        assert_eq!(agent.id, "b");
        assert_eq!(reason, SelectionReason::Mention);

        let agent = registry.select_agent("hey @alph what's up", &[]).unwrap();
        assert_eq!(agent.id, "a");
    }

    #[test]
    fn test_trigger_beats_mention() {
        let registry = a_and_b();
        let agent = registry.select_agent("@beta tell me about foo", &[]).unwrap();
        assert_eq!(agent.id, "a");
    }

    #[test]
    fn test_only_first_mention_counts() {
        let registry = a_and_b();
        // "@nobody" matches no name, so selection falls through to the default.
        let (agent, reason) = registry
            .select_agent_with_reason("@nobody ask @alpha", &[])
            .unwrap();
        assert_eq!(agent.id, "b");
        assert_eq!(reason, SelectionReason::Default);
    }

    #[test]
    fn test_continuity_follows_last_attributed_speaker() {
        let registry = a_and_b();
        let context = vec![
            user_turn("hi"),
            agent_turn("hello from A", "a"),
            user_turn("and then?"),
        ];
        let (agent, reason) = registry.select_agent_with_reason("hello", &context).unwrap();
        assert_eq!(agent.id, "a");
        assert_eq!(reason, SelectionReason::Continuity);
    }

    #[test]
    fn test_continuity_with_unregistered_speaker_falls_back_to_default() {
        let registry = a_and_b();
        let context = vec![agent_turn("old", "a"), agent_turn("gone", "retired")];
        let (agent, reason) = registry.select_agent_with_reason("hello", &context).unwrap();
        assert_eq!(agent.id, "b");
        assert_eq!(reason, SelectionReason::Default);
    }

    #[test]
    fn test_no_context_selects_default() {
        let registry = a_and_b();
        assert_eq!(registry.select_agent("hello", &[]).unwrap().id, "b");
    }

    #[test]
    fn test_first_registered_when_no_default() {
        let mut registry = registry();
        registry.register(Agent::new("x", "Xeno", "x")).unwrap();
        registry.register(Agent::new("y", "Yak", "y")).unwrap();
        assert_eq!(registry.select_agent("hello", &[]).unwrap().id, "x");
    }

    #[test]
    fn test_empty_registry_is_an_error() {
        let registry = registry();
        assert!(matches!(
            registry.select_agent("hello", &[]),
            Err(RegistryError::Empty)
        ));
        assert!(matches!(registry.default_agent(), Err(RegistryError::Empty)));
    }

    #[test]
    fn test_second_default_is_rejected() {
        let mut registry = a_and_b();
        let err = registry
            .register(Agent::new("c", "Gamma", "c").as_default())
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateDefault { ref existing, ref new } if existing == "b" && new == "c"
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_reregistering_replaces_in_place() {
        let mut registry = a_and_b();
        registry
            .register(Agent::new("a", "Alpha Prime", "Updated.").with_triggers(["bar"]))
            .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.agents()[0].name, "Alpha Prime");
        assert_eq!(registry.select_agent("bar", &[]).unwrap().id, "a");
        assert_eq!(registry.select_agent("foo", &[]).unwrap().id, "b");

        // The default may re-register itself.
        registry
            .register(Agent::new("b", "Beta", "Still B.").as_default())
            .unwrap();
    }

    #[test]
    fn test_invalid_agents_are_rejected() {
        let mut registry = registry();
        assert!(matches!(
            registry.register(Agent::new(" ", "Name", "p")),
            Err(RegistryError::InvalidAgent(_))
        ));
        assert!(matches!(
            registry.register(Agent::new("id", "", "p")),
            Err(RegistryError::InvalidAgent(_))
        ));
    }

    #[test]
    fn test_override_provider_is_per_agent() {
        let mut registry = a_and_b();
        let special = LlmConfig {
            name: "special".to_string(),
            ..LlmConfig::default()
        };
        registry
            .register(Agent::new("c", "Gamma", "c").with_llm_override(special.clone()))
            .unwrap();

        assert_eq!(registry.get_llm_provider("c").name(), "special");
        assert_eq!(
            registry.get_llm_provider("a").name(),
            LlmConfig::default().name
        );
        assert_eq!(
            registry.get_llm_provider("unknown").name(),
            LlmConfig::default().name
        );

        let gamma = registry.get("c").unwrap();
        assert_eq!(registry.llm_config(&gamma), &special);
        let alpha = registry.get("a").unwrap();
        assert_eq!(registry.llm_config(&alpha), &LlmConfig::default());
    }

    #[test]
    fn test_failing_override_leaves_registry_unchanged() {
        let factory = |config: &LlmConfig| -> Result<BoxLlmProvider, LlmError> {
            if config.name == "broken" {
                Err(LlmError::AuthenticationFailed)
            } else {
                silent_factory(config)
            }
        };
        let mut registry =
            AgentRegistry::new(GroupChatConfig::default(), LlmConfig::default(), Arc::new(factory))
                .unwrap();

        let broken = LlmConfig {
            name: "broken".to_string(),
            ..LlmConfig::default()
        };
        let err = registry
            .register(Agent::new("c", "Gamma", "c").with_llm_override(broken))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Provider { ref agent_id, .. } if agent_id == "c"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_from_config_registers_in_order() {
        let mut config = EngineConfig::default();
        config.agents = vec![
            Agent::new("one", "One", "1"),
            Agent::new("two", "Two", "2").as_default(),
        ];
        let registry = AgentRegistry::from_config(&config, Arc::new(silent_factory)).unwrap();
        let ids: Vec<&str> = registry.agents().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["one", "two"]);
        assert_eq!(registry.default_agent().unwrap().id, "two");
    }
}
