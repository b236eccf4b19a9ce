use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hadith_search::{Config, InitState, SearchEngine, SearchOptions, SearchResponse};

#[derive(Parser, Debug)]
#[command(name = "server", version, about = "HTTP front end for hadith search")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// JSON config file; environment variables apply when absent
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Logging verbosity when RUST_LOG is unset
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    log_level: String,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct HealthResponse {
    state: InitState,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<usize>,
    model: String,
}

type AppState = Arc<SearchEngine>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .init();

    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?
            .with_env(),
        None => Config::from_env(),
    };
    let state: AppState = Arc::new(SearchEngine::new(config));

    let app = Router::new()
        .route("/api/search", get(search_api))
        .route("/api/health", get(health_api))
        .with_state(state);

    let listener = TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("binding {}", args.addr))?;
    info!("server running at http://{}", args.addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn search_api(
    State(engine): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<SearchResponse> {
    let options = SearchOptions {
        limit: params.limit,
    };
    Json(engine.search(&params.q, options).await)
}

async fn health_api(State(engine): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        state: engine.state(),
        records: engine.corpus().map(|c| c.len()),
        model: engine.config().model.clone(),
    })
}
