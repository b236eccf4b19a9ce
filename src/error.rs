use thiserror::Error;

/// Failures that end a search call. Everything finer-grained (bad files,
/// missing collections, hallucinated ids) only reduces coverage and never
/// shows up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Health check failed: transport error, non-2xx status or timeout.
    #[error("inference service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Generation stream ended without producing any text.
    #[error("inference service returned an empty response")]
    EmptyResponse,

    /// Generation request or its body stream failed.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("query must not be empty")]
    InvalidQuery,

    /// The corpus loading task did not run to completion.
    #[error("initialization failed: {0}")]
    Initialization(String),
}

impl SearchError {
    /// Stable identifier placed in the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::ServiceUnavailable(_) => "ServiceUnavailable",
            SearchError::EmptyResponse => "EmptyResponse",
            SearchError::Transport(_) => "Transport",
            SearchError::InvalidQuery => "InvalidQuery",
            SearchError::Initialization(_) => "Initialization",
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        SearchError::Transport(e.to_string())
    }
}
