//! rustarxiv - arXiv research assistant
//!
//! Searches arXiv for a topic, summarizes each abstract through a
//! local → cloud → extractive fallback chain, and writes a Markdown reading
//! list plus an optional JSON record.
//!
//! ## Usage
//!
//! ```bash
//! rustarxiv search "LLM agents" --max-results 5
//! GROQ_API_KEY=... rustarxiv summarize "We propose ..."
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rustarxiv::{
    arxiv::{ArxivClient, Paper, SearchOptions},
    config::{CloudModelConfig, LocalModelConfig, SummarizerConfig, DEFAULT_MIN_USABLE_CHARS},
    report,
    summarize::{AttemptStatus, Summarizer},
};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Topic used when the user just presses Enter
const DEFAULT_TOPIC: &str = "AI for open science";

/// Answers that count as "yes" at the JSON prompt
const YES_ANSWERS: &[&str] = &["y", "yes", "д", "да"];

// ============================================================================
// CLI Definition
// ============================================================================

/// arXiv research assistant
#[derive(Parser)]
#[command(name = "rustarxiv")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search arXiv, summarize the results and save them
    Search {
        /// Topic to search for (asked interactively when omitted)
        topic: Option<String>,

        /// Number of papers to fetch
        #[arg(long, default_value = "3")]
        max_results: usize,

        /// Directory for papers.md / papers.json / papers.csv
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Skip summarization
        #[arg(long)]
        no_summary: bool,

        /// Always write papers.json without asking
        #[arg(long, conflicts_with = "no_json")]
        json: bool,

        /// Never write papers.json
        #[arg(long)]
        no_json: bool,

        /// Also write papers.csv
        #[arg(long)]
        csv: bool,

        #[command(flatten)]
        models: ModelArgs,
    },

    /// Summarize a single text (argument or stdin) and show which backend answered
    Summarize {
        /// Text to summarize; read from stdin when omitted
        text: Option<String>,

        #[command(flatten)]
        models: ModelArgs,
    },
}

/// Summarization backend settings
#[derive(Args)]
struct ModelArgs {
    /// Local model server (Ollama) base URL
    #[arg(long, default_value = rustarxiv::config::DEFAULT_OLLAMA_URL)]
    ollama_url: String,

    /// Local model name
    #[arg(long, default_value = "phi3")]
    local_model: String,

    /// Local model timeout in seconds (default: wait indefinitely)
    #[arg(long)]
    local_timeout: Option<u64>,

    /// Groq API base URL (key is read from GROQ_API_KEY)
    #[arg(long, default_value = rustarxiv::config::DEFAULT_GROQ_URL)]
    groq_url: String,

    /// Groq model name
    #[arg(long, default_value = "llama-3.1-8b-instant")]
    cloud_model: String,

    /// Model answers must be longer than this many characters
    #[arg(long, default_value_t = DEFAULT_MIN_USABLE_CHARS)]
    min_summary_chars: usize,
}

impl ModelArgs {
    fn into_config(self) -> SummarizerConfig {
        SummarizerConfig {
            min_usable_chars: self.min_summary_chars,
            local: LocalModelConfig {
                base_url: self.ollama_url,
                model: self.local_model,
                timeout: self.local_timeout.map(Duration::from_secs),
                ..Default::default()
            },
            cloud: CloudModelConfig {
                base_url: self.groq_url,
                model: self.cloud_model,
                ..CloudModelConfig::from_env()
            },
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Search {
            topic,
            max_results,
            output,
            no_summary,
            json,
            no_json,
            csv,
            models,
        } => {
            let json_choice = match (json, no_json) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            run_search(topic, max_results, output, no_summary, json_choice, csv, models).await
        }
        Commands::Summarize { text, models } => run_summarize(text, models).await,
    }
}

// ============================================================================
// Search
// ============================================================================

async fn run_search(
    topic: Option<String>,
    max_results: usize,
    output_dir: PathBuf,
    no_summary: bool,
    json_choice: Option<bool>,
    write_csv: bool,
    models: ModelArgs,
) -> Result<()> {
    print_banner();

    let topic = match topic {
        Some(t) if !t.trim().is_empty() => t.trim().to_string(),
        _ => {
            let answer =
                prompt_line("Enter a topic (in English, e.g. 'LLM agents' or 'soft robotics'): ")?;
            if answer.is_empty() {
                println!("→ Using default topic: '{}'", DEFAULT_TOPIC);
                DEFAULT_TOPIC.to_string()
            } else {
                answer
            }
        }
    };

    print_rule(&format!("Query: {}", topic));
    println!("Searching arXiv for: {} ...", topic);

    let options = SearchOptions {
        max_results,
        ..Default::default()
    };
    let client = ArxivClient::new()?;

    let mut papers: Vec<Paper> = match client.search(&topic, &options).await {
        Ok(papers) => papers,
        Err(e) => {
            println!("arXiv search failed: {}", e);
            println!("Tips:");
            println!("  • Wait a minute or two and try again");
            println!("  • Use a more specific query (e.g. 'LLM agents robotics')");
            println!("  • Avoid running many searches in a row");
            Vec::new()
        }
    };

    if papers.is_empty() {
        println!("Nothing found - try another topic.");
    } else {
        println!("\nLatest on arXiv:");
        print!("{}", report::render_table(&papers));
    }

    if !no_summary && !papers.is_empty() {
        let config = models.into_config();
        let summarizer = Summarizer::from_config(&config).context("Invalid summarizer settings")?;
        if config.cloud.api_key.is_none() {
            info!("GROQ_API_KEY not set, cloud summaries disabled");
        }

        println!("\n--- Summaries ---");
        let total = papers.len();
        for (idx, paper) in papers.iter_mut().enumerate() {
            let digest = summarizer.summarize(&paper.abstract_text).await;
            println!("{}/{} {}", idx + 1, total, digest.tagged());
            paper.digest = Some(digest);
        }
    }

    std::fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

    let md_path = output_dir.join("papers.md");
    report::write_markdown(&md_path, &papers).context("Failed to write Markdown report")?;
    println!("\nSaved: {}", md_path.display());

    let json_path = output_dir.join("papers.json");
    let mut json_saved = false;
    if !papers.is_empty() {
        let save_json = match json_choice {
            Some(choice) => choice,
            None => {
                println!();
                let answer = prompt_line("Save the data as JSON for further analysis? (y/n): ")?;
                is_yes(&answer)
            }
        };

        if save_json {
            report::write_json(&json_path, &papers).context("Failed to write JSON record")?;
            println!("Saved: {}", json_path.display());
            json_saved = true;
        } else {
            println!("→ Skipping JSON.");
        }

        if write_csv {
            let csv_path = output_dir.join("papers.csv");
            report::write_csv(&csv_path, &papers).context("Failed to write CSV sheet")?;
            println!("Saved: {}", csv_path.display());
        }
    }

    print_next_steps(&md_path, json_saved.then_some(json_path.as_path()));
    Ok(())
}

// ============================================================================
// Single-text summarization
// ============================================================================

async fn run_summarize(text: Option<String>, models: ModelArgs) -> Result<()> {
    let text = match text {
        Some(t) => t,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read text from stdin")?;
            buf
        }
    };

    if text.trim().is_empty() {
        warn!("Empty input, nothing to summarize");
    }

    let config = models.into_config();
    let summarizer = Summarizer::from_config(&config).context("Invalid summarizer settings")?;
    let (result, attempts) = summarizer.summarize_traced(&text).await;

    println!("{}", result.tagged());
    for attempt in attempts {
        let status = match attempt.status {
            AttemptStatus::Succeeded => "succeeded",
            AttemptStatus::Unavailable => "unavailable",
            AttemptStatus::Failed => "failed",
        };
        println!("  {:<10} {}", attempt.backend.to_string(), status);
    }

    Ok(())
}

// ============================================================================
// Terminal helpers
// ============================================================================

fn print_banner() {
    println!("==============================================");
    println!("  rustarxiv {} - research assistant", env!("CARGO_PKG_VERSION"));
    println!("  arXiv search, summaries, Markdown + JSON");
    println!("==============================================");
}

fn print_rule(title: &str) {
    println!("\n---------------- {} ----------------", title);
}

fn print_next_steps(md_path: &Path, json_path: Option<&Path>) {
    println!("\nDone! What next?");
    for line in next_steps(md_path, json_path) {
        println!("  • {}", line);
    }
}

/// Hints for the closing message. `json_path` is set only when this run wrote it.
fn next_steps(md_path: &Path, json_path: Option<&Path>) -> Vec<String> {
    let mut steps = vec![format!("Read {} for a structured overview", md_path.display())];
    if let Some(json_path) = json_path {
        steps.push(format!("{} is ready for scripts and agents", json_path.display()));
    }
    steps
}

/// Print `question` and read one trimmed line. EOF reads as an empty answer.
fn prompt_line(question: &str) -> Result<String> {
    print!("{}", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn is_yes(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    YES_ANSWERS.contains(&answer.as_str())
}
