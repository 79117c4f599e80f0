//! Command-line interface for the catalog retrieval engine.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use relicdex::config::CONFIG_FILE;
use relicdex::{RetrievalEngine, Settings};

#[derive(Parser)]
#[command(name = "relicdex", version, about = "Semantic search over a museum artifact catalog")]
struct Cli {
    /// Path of the configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the corpus from the catalog source, or load existing artifacts
    Build {
        /// Delete existing artifacts and rebuild from the source file
        #[arg(long)]
        force: bool,
    },

    /// Search the corpus
    Search {
        /// Query text
        query: String,

        /// Number of results to return
        #[arg(long, short = 'k')]
        top_k: Option<usize>,

        /// Ranking mode
        #[arg(long, value_enum, default_value_t = SearchMode::Normal)]
        mode: SearchMode,

        /// Blend weight for the image signal (enhanced mode only)
        #[arg(long)]
        image_weight: Option<f32>,
    },

    /// Show engine status and corpus size
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum SearchMode {
    /// Vector similarity only
    Normal,
    /// Vector similarity blended with image-recognition overlap
    Enhanced,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            if let Some(re) = e.downcast_ref::<relicdex::RetrievalError>() {
                for suggestion in re.recovery_suggestions() {
                    eprintln!("  hint: {suggestion}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings = Settings::load_from(&cli.config)?;

    match cli.command {
        Command::Build { force } => {
            let engine = RetrievalEngine::new(settings)?;
            let rebuilt = engine.build(force)?;
            let status = if rebuilt { "rebuilt" } else { "loaded" };
            println!(
                "{}",
                json!({
                    "status": status,
                    "documents": engine.corpus_size(),
                })
            );
            Ok(ExitCode::SUCCESS)
        }

        Command::Search {
            query,
            top_k,
            mode,
            image_weight,
        } => {
            let top_k = top_k.unwrap_or(settings.search.default_top_k);
            let image_weight = image_weight.unwrap_or(settings.search.image_weight);
            let engine = RetrievalEngine::new(settings)?;
            engine.build(false)?;

            if !engine.is_ready() {
                eprintln!("Error: corpus is empty; run 'relicdex build' with a non-empty source");
                return Ok(ExitCode::FAILURE);
            }

            let results = match mode {
                SearchMode::Normal => engine.search_normal(&query, top_k)?,
                SearchMode::Enhanced => engine.search_enhanced(&query, top_k, image_weight)?,
            };
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(ExitCode::SUCCESS)
        }

        Command::Status => {
            let engine = RetrievalEngine::new(settings)?;
            engine.load();
            println!(
                "{}",
                json!({
                    "ready": engine.is_ready(),
                    "documents": engine.corpus_size(),
                    "artifacts_exist": engine.artifacts_exist(),
                })
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}
