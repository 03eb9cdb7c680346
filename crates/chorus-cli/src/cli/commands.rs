//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and give in-chat access to the session window,
//! the user's memories, and the persona roster.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Exit the chat session.
    Exit,
    /// Drop the session window and its summaries.
    Reset,
    /// Show window and summary counts.
    Stats,
    /// Show the live context, summary first.
    History,
    /// List every memory stored for the user.
    Memories,
    /// Delete one memory by id.
    Forget(String),
    /// List the personas.
    Agents,
    /// Unknown command or missing argument.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(' ') {
        Some((cmd, arg)) => (cmd.to_lowercase(), arg.trim()),
        None => (trimmed.to_lowercase(), ""),
    };

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/reset" | "/clear" => Some(ChatCommand::Reset),
        "/stats" => Some(ChatCommand::Stats),
        "/history" => Some(ChatCommand::History),
        "/memories" | "/mem" => Some(ChatCommand::Memories),
        "/forget" if arg.is_empty() => {
            Some(ChatCommand::Unknown("/forget requires a memory id".to_string()))
        }
        "/forget" => Some(ChatCommand::Forget(arg.to_string())),
        "/agents" => Some(ChatCommand::Agents),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (name, about) in [
        ("/help", "Show this help message"),
        ("/exit", "End the chat session"),
        ("/reset", "Forget this session's conversation"),
        ("/stats", "Show window and summary counts"),
        ("/history", "Show the current context"),
        ("/memories", "List what is remembered about you"),
        ("/forget <id>", "Delete one memory"),
        ("/agents", "List the personas"),
    ] {
        println!("  {:<14} {}", style(name).cyan(), about);
    }
    println!();
    println!("  {}", style("Mention a persona with @name to address it.").dim());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exit() {
        assert_eq!(parse("/exit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/q"), Some(ChatCommand::Exit));
        assert_eq!(parse("  /QUIT "), Some(ChatCommand::Exit));
    }

    #[test]
    fn test_parse_forget() {
        assert_eq!(
            parse("/forget 0192-abc"),
            Some(ChatCommand::Forget("0192-abc".to_string()))
        );
        assert!(matches!(parse("/forget"), Some(ChatCommand::Unknown(_))));
        assert!(matches!(parse("/forget   "), Some(ChatCommand::Unknown(_))));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(parse("/clear"), Some(ChatCommand::Reset));
        assert_eq!(parse("/mem"), Some(ChatCommand::Memories));
        assert_eq!(parse("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn test_parse_not_command() {
        assert_eq!(parse("hello @coder"), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse("/dance now"),
            Some(ChatCommand::Unknown("/dance".to_string()))
        );
    }
}
