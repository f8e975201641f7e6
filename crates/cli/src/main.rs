//! DiabeCare CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the HTTP API
//! - `chat`    — Send one chat message (uses the history file)
//! - `analyze` — One-shot health report
//! - `memory`  — Show or clear the chat history
//! - `doctor`  — Diagnose configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use diabecare_config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "diabecare",
    about = "DiabeCare — diabetes assistant backed by Groq",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./diabecare.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send a single chat message
    Chat {
        #[arg(short, long)]
        message: String,
    },

    /// Analyze blood sugar, medication and activity data
    Analyze {
        /// Blood sugar reading in mg/dL
        #[arg(short, long)]
        sugar: Option<String>,

        /// Medications taken
        #[arg(short, long)]
        medication: Option<String>,

        /// Daily activities and food
        #[arg(short, long)]
        activity: Option<String>,
    },

    /// Inspect or clear the chat history
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Diagnose configuration and history file
    Doctor {
        /// Also check that the provider endpoint answers
        #[arg(long)]
        check_provider: bool,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
enum MemoryAction {
    /// Print the stored turns
    Show,
    /// Delete the history file
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // A missing .env is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    let load = || AppConfig::load(config_path).map_err(|e| format!("Failed to load config: {e}"));

    match cli.command {
        Commands::Serve { host, port } => commands::serve::run(load()?, host, port).await?,
        Commands::Chat { message } => commands::chat::run(&load()?, &message).await?,
        Commands::Analyze {
            sugar,
            medication,
            activity,
        } => commands::analyze::run(&load()?, sugar, medication, activity).await?,
        Commands::Memory { action } => match action {
            MemoryAction::Show => commands::memory::show(&load()?).await?,
            MemoryAction::Clear => commands::memory::clear(&load()?).await?,
        },
        Commands::Doctor { check_provider } => {
            commands::doctor::run(config_path, check_provider).await?
        }
    }

    Ok(())
}
