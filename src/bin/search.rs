//! `hadith_search search`
//!
//! Asks the local model which hadiths match a query.
//!
//! Usage (single query):
//!   cargo run --bin search -- "patience in hardship"
//!
//! Usage (interactive REPL):
//!   cargo run --bin search
//!
//! Print the raw response envelope:
//!   cargo run --bin search -- --json --limit 5 "honesty in trade"

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hadith_search::{Config, SearchEngine, SearchOptions, SearchResponse};

#[derive(Parser, Debug)]
#[command(name = "search", version, about = "Search hadith collections with a local LLM as relevance judge")]
struct Args {
    /// Query words; omit to start an interactive prompt
    query: Vec<String>,

    /// Maximum number of results (hard-capped at 12)
    #[arg(long, short = 'n', value_name = "N")]
    limit: Option<usize>,

    /// JSON config file; environment variables apply when absent
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Collection root directory
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Model name passed to the inference service
    #[arg(long)]
    model: Option<String>,

    /// Inference service base URL
    #[arg(long, value_name = "URL")]
    ollama_url: Option<String>,

    /// Print the response envelope as JSON
    #[arg(long)]
    json: bool,

    /// Logging verbosity when RUST_LOG is unset
    #[arg(long, default_value = "warn", value_name = "LEVEL")]
    log_level: String,
}

fn setup_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?
            .with_env(),
        None => Config::from_env(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(url) = &args.ollama_url {
        config.ollama_url = url.clone();
    }
    Ok(config)
}

fn print_response(response: &SearchResponse, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    println!("\nQuery: '{}'", response.query);
    if !response.success {
        println!(
            "  Search failed: {} ({} ms)",
            response.error.as_deref().unwrap_or("unknown"),
            response.metadata.duration
        );
        return Ok(());
    }
    if response.results.is_empty() {
        println!("  No results found. ({} ms)", response.metadata.duration);
        return Ok(());
    }

    for r in &response.results {
        let record = &r.record;
        println!("  [{:.2}] {}  {}", r.rank_score, record.id, record.section_title);
        if !record.attribution.is_empty() {
            println!("         {}", record.attribution);
        }
        println!("         {}", record.translated_text);
    }
    println!(
        "  {} results in {} ms ({})",
        response.results.len(),
        response.metadata.duration,
        response.metadata.model.as_deref().unwrap_or("-")
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level);

    let config = build_config(&args)?;
    let engine = SearchEngine::new(config);
    let options = SearchOptions { limit: args.limit };

    // ── Single query from CLI args ──────────────────────────────────────────
    if !args.query.is_empty() {
        let query = args.query.join(" ");
        let response = engine.search(&query, options).await;
        print_response(&response, args.json)?;
        if !response.success {
            std::process::exit(1);
        }
        return Ok(());
    }

    // ── Interactive REPL ────────────────────────────────────────────────────
    println!("Type a query and press Enter. Ctrl-D / empty line to exit.");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }
        let response = engine.search(line.trim(), options).await;
        print_response(&response, args.json)?;
    }

    Ok(())
}
