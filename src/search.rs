use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::Config;
use crate::corpus::{load_corpus, Corpus, LoadReport};
use crate::error::SearchError;
use crate::extract::extract_results;
use crate::llm::InferenceClient;
use crate::prompt::build_prompt;
use crate::record::SearchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InitState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SearchOptions {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    /// Wall-clock milliseconds for the whole call.
    pub duration: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// The one shape every search call returns, success or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub results: Vec<SearchResult>,
    pub metadata: SearchMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct Loaded {
    corpus: Arc<Corpus>,
    report: LoadReport,
}

/// Process-wide search context: owns the inference client and the lazily
/// built corpus. Construct once and share by reference or `Arc`.
pub struct SearchEngine {
    config: Config,
    client: InferenceClient,
    loaded: OnceCell<Result<Loaded, SearchError>>,
    state: Mutex<InitState>,
}

impl SearchEngine {
    pub fn new(config: Config) -> Self {
        let client = InferenceClient::new(&config);
        SearchEngine {
            config,
            client,
            loaded: OnceCell::new(),
            state: Mutex::new(InitState::Uninitialized),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> InitState {
        self.state.lock().map(|s| *s).unwrap_or(InitState::Failed)
    }

    fn set_state(&self, next: InitState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    /// The corpus, once initialization has succeeded.
    pub fn corpus(&self) -> Option<Arc<Corpus>> {
        match self.loaded.get() {
            Some(Ok(loaded)) => Some(Arc::clone(&loaded.corpus)),
            _ => None,
        }
    }

    pub fn load_report(&self) -> Option<&LoadReport> {
        match self.loaded.get() {
            Some(Ok(loaded)) => Some(&loaded.report),
            _ => None,
        }
    }

    /// Probe the service, then load the corpus. Runs at most once per
    /// engine; concurrent callers wait on the same attempt and a failure
    /// is kept for every later call.
    async fn ensure_ready(&self) -> Result<Arc<Corpus>, SearchError> {
        let loaded = self
            .loaded
            .get_or_init(|| async {
                self.set_state(InitState::Initializing);
                let outcome = self.initialize().await;
                match &outcome {
                    Ok(loaded) => {
                        info!(records = loaded.corpus.len(), "search engine ready");
                        self.set_state(InitState::Ready);
                    }
                    Err(e) => {
                        warn!(error = %e, "search engine initialization failed");
                        self.set_state(InitState::Failed);
                    }
                }
                outcome
            })
            .await;

        match loaded {
            Ok(loaded) => Ok(Arc::clone(&loaded.corpus)),
            Err(e) => Err(e.clone()),
        }
    }

    async fn initialize(&self) -> Result<Loaded, SearchError> {
        self.client.check_health().await?;

        let root = self.config.data_dir.clone();
        let collections = self.config.collections.clone();
        let (corpus, report) =
            tokio::task::spawn_blocking(move || load_corpus(&root, &collections))
                .await
                .map_err(|e| SearchError::Initialization(e.to_string()))?;

        if corpus.is_empty() {
            warn!(data_dir = %self.config.data_dir.display(), "corpus is empty; every search will return no results");
        }
        Ok(Loaded {
            corpus: Arc::new(corpus),
            report,
        })
    }

    async fn run(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        if query.is_empty() {
            return Err(SearchError::InvalidQuery);
        }
        let corpus = self.ensure_ready().await?;

        let prompt = build_prompt(query, &self.config.collections);
        let text = self.client.generate(&prompt).await?;
        Ok(extract_results(&text, &corpus, limit))
    }

    /// Run one search. Never fails: every outcome is folded into the
    /// returned envelope.
    pub async fn search(&self, query: &str, options: SearchOptions) -> SearchResponse {
        let started = Instant::now();
        let query = query.trim();
        let limit = options.limit.unwrap_or(self.config.default_limit);

        let outcome = self.run(query, limit).await;
        let duration = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(results) => {
                info!(query, results = results.len(), duration_ms = duration, "search complete");
                SearchResponse {
                    success: true,
                    query: query.to_string(),
                    metadata: SearchMetadata {
                        total: Some(results.len()),
                        duration,
                        model: Some(self.client.model().to_string()),
                    },
                    results,
                    error: None,
                }
            }
            Err(e) => {
                warn!(query, error = %e, duration_ms = duration, "search failed");
                SearchResponse {
                    success: false,
                    query: query.to_string(),
                    results: Vec::new(),
                    metadata: SearchMetadata {
                        total: None,
                        duration,
                        model: None,
                    },
                    error: Some(e.code().to_string()),
                }
            }
        }
    }
}
