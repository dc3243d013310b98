use anyhow::Context;
use clap::{Parser, Subcommand};
use deckgen::{run_generate, run_validate, GenConfig, OpenAiClient};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "deckgen", about = "Generate policy tabletop decks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a deck directory from a YAML config
    Generate {
        /// Config file, merged over the built-in defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output deck directory
        #[arg(long)]
        out: PathBuf,
    },
    /// Validate an existing deck directory
    Validate {
        #[arg(long)]
        deck: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Command::Generate { config, out } => {
            let config = match config {
                Some(path) => GenConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => GenConfig::default(),
            };
            let mut client = OpenAiClient::from_env(&config.runtime)?;
            if client.is_dummy() {
                info!("OPENAI_API_KEY not set, generating placeholder cards");
            }
            if config.runtime.cache_requests {
                client = client.with_cache_dir(out.join("cache"));
            }

            let report = run_generate(&config, &client, &out).await?;
            info!(
                "Deck written to {} ({} warnings)",
                out.display(),
                report.warning_count
            );
        }
        Command::Validate { deck } => {
            let report = run_validate(&deck)?;
            info!(
                "{} is valid ({} warnings)",
                deck.display(),
                report.warning_count
            );
        }
    }

    Ok(())
}
