//! Group-chat system prompt builder.
//!
//! Layout when the roster is included:
//! ```text
//! {agent.system_prompt}
//!
//! You are {agent.name}, one of several assistants in this group chat.
//! The other assistants are:
//! - {name}: {description}
//! - {name}
//! Mention an assistant as @name to address them directly.
//! ```

use std::sync::Arc;

use chorus_types::agent::{Agent, GroupChatConfig};

/// The agent's own prompt, plus a roster of the other personas when group
/// chat is enabled, more than one persona is registered and
/// `include_roster` is set.
pub fn build_multi_agent_system_prompt(
    agent: &Agent,
    agents: &[Arc<Agent>],
    group_chat: &GroupChatConfig,
    include_roster: bool,
) -> String {
    let mut prompt = agent.system_prompt.clone();
    if !(include_roster && group_chat.enabled && agents.len() > 1) {
        return prompt;
    }

    let others: Vec<&Arc<Agent>> = agents.iter().filter(|a| a.id != agent.id).collect();
    if others.is_empty() {
        return prompt;
    }

    prompt.push_str(&format!(
        "\n\nYou are {}, one of several assistants in this group chat.\nThe other assistants are:",
        agent.name
    ));
    for other in others {
        match other.description.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(description) => prompt.push_str(&format!("\n- {}: {}", other.name, description)),
            None => prompt.push_str(&format!("\n- {}", other.name)),
        }
    }
    prompt.push_str("\nMention an assistant as @name to address them directly.");
    prompt
}
