//! Interactive chat loop on stdin.
//!
//! Every line goes through [`ConversationEngine::handle_message`]; each
//! persona reply (direct and chained) is printed under its name. Ctrl+C
//! cancels pending chains and ends the session after the current reply.
//!
//! [`ConversationEngine::handle_message`]: chorus_core::agent::engine::ConversationEngine::handle_message

use std::io::Write;
use std::sync::Arc;

use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use chorus_core::agent::engine::{AgentReply, ConversationEngine, IncomingMessage};
use chorus_types::chat::{MessageRole, SessionKey};

use super::commands::{self, ChatCommand};
use crate::state::AppState;

/// Platform name used for CLI session keys.
pub const CLI_PLATFORM: &str = "cli";

/// Session id for `user_id` unless one was given explicitly.
pub fn session_id_for(session: Option<String>, user_id: &str) -> String {
    session.unwrap_or_else(|| SessionKey::new(CLI_PLATFORM, user_id, None).to_string())
}

/// First `max` characters of `content` on one line, with an ellipsis when cut.
pub fn preview(content: &str, max: usize) -> String {
    let flat = content.replace('\n', " ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

/// How to address a persona: `@` plus the leading word characters of its
/// name. Mentions are matched case-insensitively against agent names.
pub fn mention_hint(name: &str) -> String {
    let word: String = name
        .trim()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    format!("@{}", word.to_lowercase())
}

fn print_reply(reply: &AgentReply) {
    let arrow = if reply.depth > 0 { "\u{21aa} " } else { "" };
    println!();
    println!(
        "  {}{} {}",
        arrow,
        style(&reply.agent_name).cyan().bold(),
        style(">").dim()
    );
    for line in reply.content.lines() {
        println!("  {line}");
    }
    println!();
}

pub async fn run_chat_loop(
    state: &AppState,
    session: Option<String>,
    user_id: &str,
) -> anyhow::Result<()> {
    let engine = Arc::clone(&state.engine);
    let session_id = session_id_for(session, user_id);

    let default_name = engine
        .registry()
        .default_agent()
        .map(|a| a.name.clone())
        .unwrap_or_default();
    println!();
    println!(
        "  {} {} ({} personas, default {})",
        style("Chorus").bold(),
        style(&session_id).dim(),
        engine.registry().len(),
        style(default_name).cyan()
    );
    println!("  {}", style("Type /help for commands, Ctrl+D to exit.").dim());
    println!();

    let cancel = engine.cancellation_token();
    {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                engine.shutdown();
            }
        });
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  {} ", style("You >").green().bold());
        std::io::stdout().flush()?;

        let line = tokio::select! {
            _ = cancel.cancelled() => None,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            println!("\n  {}", style("Session ended.").dim());
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        if let Some(cmd) = commands::parse(text) {
            if run_command(&engine, &session_id, user_id, cmd).await {
                break;
            }
            continue;
        }

        let message = IncomingMessage::new(session_id.clone(), user_id, text);
        match engine.handle_message(message).await {
            Ok(replies) => replies.iter().for_each(print_reply),
            Err(e) => {
                tracing::debug!(error = %e, "Message failed");
                println!("\n  {} {e}\n", style("!").red().bold());
            }
        }

        if cancel.is_cancelled() {
            println!("  {}", style("Session ended.").dim());
            break;
        }
    }

    Ok(())
}

/// Run one slash command. Returns true when the loop should exit.
async fn run_command(
    engine: &ConversationEngine,
    session_id: &str,
    user_id: &str,
    cmd: ChatCommand,
) -> bool {
    match cmd {
        ChatCommand::Help => commands::print_help(),
        ChatCommand::Exit => {
            println!("\n  {}", style("Session ended.").dim());
            return true;
        }
        ChatCommand::Reset => {
            engine.clear_session(session_id).await;
            println!("\n  {} Conversation cleared.\n", style("*").cyan().bold());
        }
        ChatCommand::Stats => {
            let stats = engine.context().get_stats(session_id);
            println!(
                "\n  {} turns in window, {} summaries\n",
                stats.message_count, stats.summary_count
            );
        }
        ChatCommand::History => {
            println!();
            for turn in engine.context().get_context(session_id) {
                let label = match turn.role {
                    MessageRole::User => style("You".to_string()).green(),
                    MessageRole::Assistant => {
                        let name = turn
                            .agent_id
                            .as_deref()
                            .and_then(|id| engine.registry().get(id))
                            .map(|a| a.name.clone())
                            .unwrap_or_else(|| "Assistant".to_string());
                        style(name).cyan()
                    }
                    MessageRole::System => style("Summary".to_string()).dim(),
                };
                println!("  {} {}", label.bold(), preview(&turn.content, 100));
            }
            println!();
        }
        ChatCommand::Memories => {
            let memories = engine.memory().store().get_all_memories(user_id).await;
            println!();
            if memories.is_empty() {
                println!("  {}", style("Nothing remembered yet.").dim());
            }
            for memory in memories {
                println!(
                    "  {} {}",
                    style(&memory.id).dim(),
                    preview(&memory.content, 80)
                );
            }
            println!();
        }
        ChatCommand::Forget(id) => {
            engine.memory().store().delete_memory(&id).await;
            println!("\n  {} Forgot {}\n", style("*").cyan().bold(), style(id).dim());
        }
        ChatCommand::Agents => {
            println!();
            for agent in engine.registry().agents() {
                println!("  {} {}", style(mention_hint(&agent.name)).cyan(), agent.name);
            }
            println!();
        }
        ChatCommand::Unknown(name) => {
            println!(
                "\n  {} Unknown command: {}. Type /help for available commands.\n",
                style("?").yellow().bold(),
                style(name).dim()
            );
        }
    }
    false
}
