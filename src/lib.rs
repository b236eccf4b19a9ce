//! Hadith retrieval that asks a local LLM which records match a query.
//!
//! The corpus is loaded into memory once; each search prompts the model for
//! a list of record ids, parses its streamed answer, and keeps only ids the
//! corpus actually contains, ranked by the order the model listed them.

pub mod config;
pub mod constants;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod llm;
pub mod prompt;
pub mod record;
pub mod search;
pub mod stream;

pub use config::Config;
pub use error::SearchError;
pub use search::{InitState, SearchEngine, SearchOptions, SearchResponse};
