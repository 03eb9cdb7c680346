//! `chorus agents`: list the registered personas.

use console::style;

use chorus_core::agent::registry::AgentRegistry;

use super::chat::mention_hint;
use crate::state::AppState;

/// One roster row as JSON.
fn agent_json(registry: &AgentRegistry, agent_id: &str) -> Option<serde_json::Value> {
    let agent = registry.get(agent_id)?;
    let llm = registry.llm_config(&agent);
    Some(serde_json::json!({
        "id": agent.id,
        "name": agent.name,
        "description": agent.description,
        "is_default": agent.is_default,
        "triggers": agent.triggers,
        "provider": llm.name,
        "model": llm.model,
    }))
}

pub fn list_agents(state: &AppState, json: bool) {
    let registry = state.engine.registry();

    if json {
        let rows: Vec<serde_json::Value> = registry
            .agents()
            .iter()
            .filter_map(|a| agent_json(registry, &a.id))
            .collect();
        println!("{}", serde_json::Value::Array(rows));
        return;
    }

    println!();
    for agent in registry.agents() {
        let llm = registry.llm_config(agent);
        let marker = if agent.is_default {
            format!(" {}", style("(default)").green())
        } else {
            String::new()
        };
        println!(
            "  {} {}{}  {}",
            style(mention_hint(&agent.name)).cyan().bold(),
            agent.name,
            marker,
            style(format!("{}/{}", llm.name, llm.model)).dim()
        );
        if let Some(description) = &agent.description {
            println!("      {description}");
        }
        if !agent.triggers.is_empty() {
            println!(
                "      {} {}",
                style("triggers:").dim(),
                agent.triggers.join(", ")
            );
        }
    }

    let group = registry.group_chat();
    println!();
    println!(
        "  {} group chat {}, chaining {} (max {} hops)",
        style("*").cyan(),
        if group.enabled { "on" } else { "off" },
        if group.agent_interaction { "on" } else { "off" },
        group.max_agent_chain
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chorus_core::llm::box_provider::BoxLlmProvider;
    use chorus_core::llm::factory::ProviderFactory;
    use chorus_infra::llm::openai_compat::OpenAiCompatibleProvider;
    use chorus_types::agent::{Agent, GroupChatConfig};
    use chorus_types::llm::{LlmConfig, LlmError};

    #[test]
    fn test_json_row_reports_effective_model() {
        let factory: Arc<dyn ProviderFactory> =
            Arc::new(|config: &LlmConfig| -> Result<BoxLlmProvider, LlmError> {
                let provider = OpenAiCompatibleProvider::new(
                    config.name.clone(),
                    "http://127.0.0.1:9".to_string(),
                    None,
                    config.model.clone(),
                );
                Ok(BoxLlmProvider::new(provider))
            });
        let mut registry =
            AgentRegistry::new(GroupChatConfig::default(), LlmConfig::default(), factory).unwrap();

        let local = LlmConfig {
            name: "ollama".to_string(),
            model: "llama3".to_string(),
            ..LlmConfig::default()
        };
        registry
            .register(Agent::new("coder", "Coder", "You code.").with_llm_override(local))
            .unwrap();

        let row = agent_json(&registry, "coder").unwrap();
        assert_eq!(row["model"], "llama3");
        assert_eq!(row["provider"], "ollama");
        assert_eq!(row["is_default"], false);
        assert!(agent_json(&registry, "missing").is_none());

        // The printed hint routes to the persona it is listed for.
        let message = format!("{} can you look at this?", mention_hint("Coder"));
        assert_eq!(registry.select_agent(&message, &[]).unwrap().id, "coder");
    }
}
