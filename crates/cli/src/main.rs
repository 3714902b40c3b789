//! promptward CLI: the main entry point.
//!
//! Commands:
//! - `init`       : Write a default config file
//! - `build`      : Assemble a prompt from a context file
//! - `invoke`     : Assemble a prompt and send it through a call site
//! - `reports`    : Read persisted prompt reports
//! - `policies`   : Show the active policy table
//! - `compliance` : Run the rogue-prompt scan and print the compliance report
//! - `doctor`     : Validate config and run the startup self-check
//! - `serve`      : Start the HTTP API server

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "promptward",
    about = "promptward: prompt governance and assembly engine",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ~/.promptward/config.toml)
    #[arg(short, long, global = true, env = "PROMPTWARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Assemble a prompt and print its messages and report
    Build {
        /// JSON file holding the request context
        #[arg(long)]
        context: PathBuf,

        /// Print the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Assemble a prompt and send it to the model through a call site
    Invoke {
        /// JSON file holding the request context
        #[arg(long)]
        context: PathBuf,

        /// Call site to invoke under (e.g. PLANNER)
        #[arg(long)]
        site: String,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,
    },

    /// Read persisted prompt reports
    Reports {
        #[command(subcommand)]
        command: ReportsCommand,
    },

    /// Show the active policy table
    Policies,

    /// Run the rogue-prompt scan and print the compliance report
    Compliance {
        /// Directory to scan (default: compliance.scan_root, then the current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate config and run the registry/policy self-check
    Doctor,

    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum ReportsCommand {
    /// Most recent reports, newest first
    Recent {
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },

    /// One report as JSON
    Show { prompt_id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Init { force } => commands::init::run(config_path, force)?,
        Commands::Build { context, json } => commands::build::run(config_path, &context, json).await?,
        Commands::Invoke { context, site, model } => {
            commands::invoke::run(config_path, &context, &site, model.as_deref()).await?
        }
        Commands::Reports { command } => match command {
            ReportsCommand::Recent { limit } => commands::reports::recent(config_path, limit).await?,
            ReportsCommand::Show { prompt_id } => commands::reports::show(config_path, &prompt_id).await?,
        },
        Commands::Policies => commands::policies::run(config_path)?,
        Commands::Compliance { root, json } => commands::compliance::run(config_path, root, json)?,
        Commands::Doctor => commands::doctor::run(config_path)?,
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
    }

    Ok(())
}
