//! ferry: chat with an agent that drives MCP tools.

use anyhow::{Context, Result};
use clap::Parser;
use ferry_app::config::AppConfig;
use ferry_app::repl::{Repl, ReplOutcome};
use ferry_mcp::{McpConnection, ToolCatalog, ToolGateway};
use ferry_runtime::{DecisionMaker, LlmDecisionClient, PlanningLoop, ToolExecutor};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(
    name = "ferry",
    about = "Conversational agent for MCP tool servers",
    version
)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "FERRY_CONFIG", default_value = "ferry.yaml")]
    config: PathBuf,

    /// Override the MCP server base URL
    #[arg(long)]
    mcp_url: Option<String>,

    /// Override the decision ceiling per input
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so replies on stdout stay readable.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load(&cli.config)?;
    config.apply_env_overrides();
    if let Some(url) = cli.mcp_url {
        config.mcp.base_url = url;
    }
    if let Some(max_iterations) = cli.max_iterations {
        config.agent.max_iterations = max_iterations;
    }
    config.validate().context("Invalid configuration")?;

    let connection = match McpConnection::open(&config.mcp).await {
        Ok(connection) => connection,
        Err(e) => {
            error!("Failed to connect to MCP server at {}: {}", config.mcp.base_url, e);
            std::process::exit(1);
        }
    };

    let correlator = connection.correlator();
    let catalog = ToolCatalog::load(&*correlator)
        .await
        .context("Failed to load MCP tools")?;
    if catalog.is_empty() {
        warn!("MCP server exposes no tools; the agent will refuse to run");
    }
    let gateway = Arc::new(ToolGateway::new(Arc::new(catalog), correlator));

    let api_key = config.api_key();
    if api_key.is_none() {
        warn!("{} is not set; calling the model without credentials", config.llm.api_key_env);
    }
    let decider = Arc::new(
        LlmDecisionClient::new(&config.llm.endpoint, &config.llm.model, config.llm.max_retries)
            .with_api_key(api_key),
    );

    info!("Using model {}", decider.model());
    let mut repl = Repl::new(PlanningLoop::new(
        decider,
        gateway,
        config.agent.max_iterations,
    ));

    let result = run_repl(&mut repl).await;
    connection.close();
    result
}

async fn run_repl<M, E>(repl: &mut Repl<M, E>) -> Result<()>
where
    M: DecisionMaker,
    E: ToolExecutor,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("ferry ready. Type /help for commands.");

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                info!("Interrupted");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };

        match repl.handle_line(&line).await {
            ReplOutcome::Ignored => {}
            ReplOutcome::Reply(text) | ReplOutcome::Notice(text) | ReplOutcome::Error(text) => {
                println!("{}\n", text);
            }
            ReplOutcome::Quit => break,
        }
    }

    println!("Goodbye.");
    Ok(())
}
