//! CLI for the HR policy assistant

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hr_policy_assistant::config::Settings;
use hr_policy_assistant::pipeline::{build_embedder, Assistant};
use hr_policy_assistant::retriever::{EmbeddingIndex, DEFAULT_COLLECTION};
use hr_policy_assistant::seed;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hr-assistant")]
#[command(about = "Answers HR policy questions from indexed policy documents", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "0.0.0.0:3000")]
        addr: String,
    },
    /// Index policy documents (the built-in samples unless --file is given)
    Seed {
        /// JSON file with a list of {"id", "text"} objects
        #[arg(long)]
        file: Option<String>,
    },
    /// Answer one question and exit
    Ask {
        query: String,
    },
    /// List indexed document IDs
    List,
    /// Write a snapshot and truncate the write-ahead log
    Checkpoint,
}

fn open_index(settings: &Settings) -> Result<EmbeddingIndex> {
    settings.validate()?;
    let index = EmbeddingIndex::open(
        &settings.index_path,
        DEFAULT_COLLECTION,
        build_embedder(settings)?,
    )
    .with_context(|| format!("opening index at {}", settings.index_path.display()))?;
    Ok(index)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = cli.settings;

    match cli.command {
        Commands::Serve { addr } => {
            hr_policy_assistant::server::start(&addr, &settings).await?;
        }
        Commands::Seed { file } => {
            let documents = match file {
                Some(path) => seed::load_documents(&path)
                    .with_context(|| format!("loading documents from {path}"))?,
                None => seed::sample_documents(),
            };
            let index = open_index(&settings)?;
            let written = index.index(&documents).await?;
            index.checkpoint()?;
            println!("Indexed {} documents ({} total)", written, index.len());
        }
        Commands::Ask { query } => {
            let assistant = Assistant::from_settings(&settings)?;
            let answer = assistant.answer(&query).await?;
            println!("{}", answer.reply);
        }
        Commands::List => {
            let ids = open_index(&settings)?.list_ids();
            if ids.is_empty() {
                println!("No documents indexed");
            } else {
                println!("Document IDs ({} total):", ids.len());
                for id in ids {
                    println!("  - {}", id);
                }
            }
        }
        Commands::Checkpoint => {
            let index = open_index(&settings)?;
            index.checkpoint()?;
            println!("Checkpointed {} documents", index.len());
        }
    }
    Ok(())
}
