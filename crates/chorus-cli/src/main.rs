//! Chorus CLI entry point.
//!
//! Binary name: `chorus`
//!
//! Parses CLI arguments, sets up tracing, wires the conversation engine from
//! `chorus.toml`, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;

use chorus_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        verbosity: cli.verbose,
        json: cli.json_logs,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init(cli.data_dir.clone()).await?;

    match cli.command {
        Commands::Chat { session, user } => {
            cli::chat::run_chat_loop(&state, session, &user).await?;
        }
        Commands::Agents => {
            cli::agents::list_agents(&state, cli.json);
        }
        Commands::Config => {
            cli::config::show_config(&state)?;
        }
    }

    Ok(())
}
