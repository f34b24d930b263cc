//! Synaxarion CLI, the main entry point.
//!
//! Commands:
//! - `serve`   Start the HTTP API server
//! - `ask`     Ask the router a question, or chat interactively
//! - `ingest`  Scrape and index one or all knowledge domains
//! - `query`   Show what retrieval returns for a question
//! - `config`  Show or initialize the configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "synaxarion",
    about = "Synaxarion: question answering over the lives of the saints",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a question
    Ask {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Scrape sources and rebuild a domain's index
    Ingest {
        /// Only this domain (default: every configured domain)
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Run retrieval only and print the grounding text
    Query {
        /// The question to retrieve passages for
        text: String,

        /// Domain to search (default: the configured default domain)
        #[arg(short, long)]
        domain: Option<String>,

        /// Number of passages
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print similarity scores and sources instead of grounding text
        #[arg(long)]
        scores: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Ask { message } => commands::ask::run(message).await?,
        Commands::Ingest { domain } => commands::ingest::run(domain).await?,
        Commands::Query {
            text,
            domain,
            top_k,
            scores,
        } => commands::query::run(&text, domain.as_deref(), top_k, scores).await?,
        Commands::Config { init } => commands::config_cmd::run(init).await?,
    }

    Ok(())
}
