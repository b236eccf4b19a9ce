use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::constants::{MAX_RESULTS, RANK_SCORE_STEP};
use crate::corpus::Corpus;
use crate::record::SearchResult;

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+:\d+:\d+").expect("id pattern is valid"));

/// Every `collection:chapter:item` token in `text`, first occurrence only,
/// in the order the model wrote them.
pub fn scan_ids(text: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    ID_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Synthetic confidence for the result at `position`.
///
/// Rounded to hundredths so the value is the double nearest the decimal
/// score and serializes without float noise.
pub fn rank_score(position: usize) -> f64 {
    ((1.0 - RANK_SCORE_STEP * position as f64) * 100.0).round() / 100.0
}

/// Turn generated text into ranked results. Ids unknown to the corpus are
/// dropped; mention order is the ranking.
pub fn extract_results(text: &str, corpus: &Corpus, limit: usize) -> Vec<SearchResult> {
    let cap = limit.min(MAX_RESULTS);

    scan_ids(text)
        .into_iter()
        .filter_map(|id| {
            let record = corpus.get(id);
            if record.is_none() {
                debug!(id, "model returned unknown id");
            }
            record
        })
        .take(cap)
        .enumerate()
        .map(|(position, record)| SearchResult {
            record: record.clone(),
            rank_score: rank_score(position),
        })
        .collect()
}
