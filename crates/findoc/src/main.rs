use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use findoc::extract::Extractor;
use findoc::models::pipeline_result::PipelineResult;
use findoc::{Analyzer, Credentials};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "findoc", about = "Financial document analyzer")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/findoc.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a PDF through the full stage chain
    Analyze {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = findoc::agents::DEFAULT_QUERY)]
        query: String,

        /// Print the full result as JSON instead of the report text
        #[arg(long)]
        json: bool,
    },

    /// Analyze the sample document in the documents directory
    AnalyzeSample {
        #[arg(short, long, default_value = findoc::agents::DEFAULT_QUERY)]
        query: String,

        #[arg(long)]
        json: bool,
    },

    /// Print the extracted text of a PDF without calling an LLM
    Extract {
        #[arg(short, long)]
        file: PathBuf,

        /// Page budget, 0 for all pages. Defaults to the configured budget.
        #[arg(long)]
        max_pages: Option<usize>,

        /// Take the first pages instead of prioritizing financial statements
        #[arg(long)]
        no_focus: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = findoc::load_config(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;

    match cli.command {
        Command::Extract {
            file,
            max_pages,
            no_focus,
        } => {
            let extractor = Extractor::new(config.extractor.clone());
            let max_pages = max_pages.unwrap_or(config.extractor.default_max_pages);
            let result = extractor
                .extract(&file, max_pages, !no_focus)
                .with_context(|| format!("Failed to extract {}", file.display()))?;
            if result.is_truncated() {
                info!(
                    total_pages = result.total_pages,
                    extracted = result.selected_pages.len(),
                    "Printing a subset of pages"
                );
            }
            println!("{result}");
        }
        Command::Analyze { file, query, json } => {
            let analyzer = build_analyzer(&config)?;
            let result = analyzer
                .analyze_file(&file, &query)
                .await
                .context("Error processing financial document")?;
            print_result(&result, json)?;
        }
        Command::AnalyzeSample { query, json } => {
            let analyzer = build_analyzer(&config)?;
            let result = analyzer
                .analyze_sample(&query)
                .await
                .context("Error processing financial document")?;
            print_result(&result, json)?;
        }
    }

    Ok(())
}

fn build_analyzer(config: &findoc::models::config::FindocConfig) -> Result<Analyzer> {
    Analyzer::from_config(config, &Credentials::from_env()).context("Failed to build analyzer")
}

fn print_result(result: &PipelineResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!("{}", result.report);
    }
    Ok(())
}
