//! CLI command definitions for the `chorus` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod agents;
pub mod chat;
pub mod commands;
pub mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Talk to a group of AI personas that remember you.
#[derive(Parser)]
#[command(name = "chorus", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory holding chorus.toml (default: ~/.chorus).
    #[arg(long, global = true, env = "CHORUS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log as JSON lines on stderr.
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat on stdin.
    Chat {
        /// Session id (default: cli:<user>).
        #[arg(long)]
        session: Option<String>,

        /// User id memories are stored under.
        #[arg(long, default_value = "local")]
        user: String,
    },

    /// List the configured personas.
    #[command(alias = "ls")]
    Agents,

    /// Print the effective configuration as TOML.
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_defaults() {
        let cli = Cli::try_parse_from(["chorus", "chat"]).unwrap();
        match cli.command {
            Commands::Chat { session, user } => {
                assert!(session.is_none());
                assert_eq!(user, "local");
            }
            _ => panic!("expected chat"),
        }
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "chorus", "chat", "--session", "s1", "--user", "alice", "-vv", "--json-logs",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::Chat { session: Some(ref s), .. } if s == "s1"));
    }

    #[test]
    fn test_agents_alias() {
        let cli = Cli::try_parse_from(["chorus", "ls", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Agents));
        assert!(cli.json);
    }
}
