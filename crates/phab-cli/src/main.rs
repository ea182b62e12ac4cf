//! phab - command-line interface for phab-tools.
//!
//! Drives the same tool handlers the MCP server exposes, so CLI output and
//! tool output stay identical.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use phab_conduit::ClientManager;
use phab_core::Config;
use phab_mcp::handlers::ToolHandler;
use phab_mcp::McpServer;

#[derive(Parser)]
#[command(name = "phab")]
#[command(author, version, about = "Phabricator tools and MCP server", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdio
    Serve,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show a Maniphest task with its comments
    Task {
        /// Task ID (with or without 'T' prefix)
        id: String,
    },

    /// Show a Differential revision with its comments
    Revision {
        /// Revision ID (with or without 'D' prefix)
        id: String,

        /// Correlate comments with code changes
        #[arg(long)]
        detailed: bool,
    },

    /// Analyze review feedback with code context
    Feedback {
        /// Revision ID (with or without 'D' prefix)
        revision_id: String,

        /// Lines of code context around each comment
        #[arg(long, default_value_t = 7)]
        context_lines: usize,

        /// Emit the raw JSON report instead of markdown
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set a configuration value (conduit.url or conduit.token)
    Set { key: String, value: String },

    /// Show the current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Logs go to stderr; stdout belongs to the MCP transport and command output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve => {
            let source = Arc::new(ClientManager::new());
            McpServer::new(source).run().await?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Set { key, value } => {
                let mut config = Config::load()?;
                config.set(&key, &value)?;
                config.save()?;
                println!("Set {}", key);
            }
            ConfigCommands::Show => {
                let config = Config::load()?;
                match &config.conduit {
                    Some(conduit) => {
                        println!("conduit.url = {}", conduit.url);
                        println!(
                            "conduit.token = {}",
                            if conduit.token.is_some() { "(set)" } else { "(unset)" }
                        );
                    }
                    None => println!("No configuration found. Run `phab config set conduit.token <token>`."),
                }
            }
        },
        Commands::Task { id } => {
            run_tool("get_task", json!({ "task_id": id })).await?;
        }
        Commands::Revision { id, detailed } => {
            let tool = if detailed {
                "get_differential_detailed"
            } else {
                "get_differential"
            };
            run_tool(tool, json!({ "revision_id": id })).await?;
        }
        Commands::Feedback {
            revision_id,
            context_lines,
            json,
        } => {
            let format = if json { "json" } else { "markdown" };
            run_tool(
                "get_review_feedback",
                json!({
                    "revision_id": revision_id,
                    "context_lines": context_lines,
                    "format": format,
                }),
            )
            .await?;
        }
    }

    Ok(())
}

/// Execute one tool through the shared handler and print its output.
async fn run_tool(name: &str, arguments: serde_json::Value) -> anyhow::Result<()> {
    let handler = ToolHandler::new(Arc::new(ClientManager::new()));
    let result = handler.execute(name, Some(arguments)).await;

    if result.is_error == Some(true) {
        anyhow::bail!("{}", result.text_content());
    }

    println!("{}", result.text_content());
    Ok(())
}
