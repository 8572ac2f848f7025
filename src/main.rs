use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mcp_research_crew::{
    agents::AgentClient,
    config::Config,
    memory::SqliteStorage,
    server::{AppState, McpServer},
};

#[derive(Parser)]
#[command(name = "mcp-research-crew", version, about = "Adaptive research pipeline MCP server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the MCP server over stdio (default)
    Serve,
    /// Run a single research query and print the result as JSON
    Query {
        /// The research question
        text: String,
    },
    /// Show recent query history
    History {
        /// Maximum number of entries to show
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Show persistence statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "MCP Research Crew Server starting..."
    );

    // Initialize storage
    let storage = match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    // Initialize agent client
    let client = match AgentClient::from_config(&config) {
        Ok(c) => {
            info!(base_url = %config.langbase.base_url, "Agent client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize agent client");
            return Err(e.into());
        }
    };

    let command = cli.command.unwrap_or(Command::Serve);

    // Provisioning is only needed when a command will call the pipes
    if matches!(command, Command::Serve | Command::Query { .. }) {
        info!("Ensuring crew role pipes exist...");
        if let Err(e) = client.ensure_role_pipes().await {
            error!(error = %e, "Failed to ensure role pipes exist");
            return Err(e.into());
        }
    }

    let state = Arc::new(AppState::new(config, storage, client));

    match command {
        Command::Serve => {
            let server = McpServer::new(state);
            info!("Server ready, waiting for requests on stdin...");

            if let Err(e) = server.run().await {
                error!(error = %e, "Server error");
                return Err(e.into());
            }

            info!("Server shutdown complete");
        }
        Command::Query { text } => {
            let result = state.service.run(&text).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::History { limit } => {
            let history = state.service.history(limit).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Command::Stats => {
            let stats = state.service.memory_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        mcp_research_crew::config::LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        mcp_research_crew::config::LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
