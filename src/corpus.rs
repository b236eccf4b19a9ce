use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::record::{chapter_from_stem, parse_chapter, Record};

/// The full, read-only record set with an id lookup.
#[derive(Debug, Default)]
pub struct Corpus {
    records: Vec<Record>,
    by_id: HashMap<String, usize>,
}

impl Corpus {
    /// Builds a corpus, keeping the first record for any repeated id.
    /// Returns the corpus and the number of duplicates dropped.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> (Self, usize) {
        let mut corpus = Corpus::default();
        let mut duplicates = 0;
        for record in records {
            if corpus.by_id.contains_key(&record.id) {
                duplicates += 1;
                continue;
            }
            corpus.by_id.insert(record.id.clone(), corpus.records.len());
            corpus.records.push(record);
        }
        (corpus, duplicates)
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.by_id.get(id).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record count per collection, in first-seen order.
    pub fn collection_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for record in &self.records {
            match counts.iter_mut().find(|(name, _)| *name == record.collection) {
                Some((_, n)) => *n += 1,
                None => counts.push((record.collection.clone(), 1)),
            }
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// What the loader managed to read, and what it had to give up on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records kept per collection, in load order.
    pub collections: Vec<(String, usize)>,
    /// Collections whose directory was absent or unreadable.
    pub missing_collections: Vec<String>,
    pub skipped_files: Vec<SkippedFile>,
    /// Items rejected by the translation filter.
    pub rejected_items: usize,
    pub duplicate_ids: usize,
}

impl LoadReport {
    pub fn total_records(&self) -> usize {
        self.collections.iter().map(|(_, n)| n).sum()
    }

    pub fn is_degraded(&self) -> bool {
        !self.missing_collections.is_empty() || !self.skipped_files.is_empty()
    }
}

/// Chapter files in `dir`, ordered by numeric stem then name.
fn chapter_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort_by(|a, b| {
        chapter_from_stem(a)
            .unwrap_or(u32::MAX)
            .cmp(&chapter_from_stem(b).unwrap_or(u32::MAX))
            .then_with(|| a.cmp(b))
    });
    Ok(files)
}

/// Walk `root/<collection>/*.json` for every collection and assemble the
/// corpus. Never fails: unreadable pieces are recorded in the report and
/// loading carries on with whatever remains.
pub fn load_corpus<S: AsRef<str>>(root: &Path, collections: &[S]) -> (Corpus, LoadReport) {
    let mut report = LoadReport::default();
    let mut records: Vec<Record> = Vec::new();

    let mut seen = HashSet::new();
    let collections = collections
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| seen.insert(*c));

    for collection in collections {
        let dir = root.join(collection);

        let files = match chapter_files(&dir) {
            Ok(files) => files,
            Err(e) => {
                warn!(collection, dir = %dir.display(), error = %e, "collection unavailable, loaded 0 records");
                report.missing_collections.push(collection.to_string());
                report.collections.push((collection.to_string(), 0));
                continue;
            }
        };

        let before = records.len();
        for path in files {
            match parse_chapter(&path, collection) {
                Ok(parsed) => {
                    report.rejected_items += parsed.rejected;
                    records.extend(parsed.records);
                }
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping chapter file");
                    report.skipped_files.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let loaded = records.len() - before;
        info!(collection, records = loaded, "loaded collection");
        report.collections.push((collection.to_string(), loaded));
    }

    let (corpus, duplicates) = Corpus::from_records(records);
    if duplicates > 0 {
        warn!(duplicates, "dropped records with repeated ids");
        // Attribute the drop so per-collection counts sum to the corpus size
        for (name, count) in report.collections.iter_mut() {
            *count = corpus.records.iter().filter(|r| &r.collection == name).count();
        }
    }
    report.duplicate_ids = duplicates;

    info!(
        total = corpus.len(),
        skipped_files = report.skipped_files.len(),
        missing = report.missing_collections.len(),
        "corpus ready"
    );
    (corpus, report)
}
