use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::MIN_TRANSLATION_LEN;

/// A single retrievable hadith report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub collection: String,
    pub chapter_number: u32,
    pub item_number: u32,
    pub source_text: String,
    pub translated_text: String,
    pub attribution: String,
    pub section_title: String,
}

/// A record paired with its order-derived confidence proxy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(flatten)]
    pub record: Record,
    pub rank_score: f64,
}

pub fn compose_id(collection: &str, chapter: u32, item: u32) -> String {
    format!("{collection}:{chapter}:{item}")
}

// On-disk chapter file layout

#[derive(Debug, Default, Deserialize)]
struct ChapterFile {
    #[serde(default)]
    chapter: ChapterMeta,
    #[serde(default)]
    hadiths: Vec<RawHadith>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChapterMeta {
    id: Option<u32>,
    #[serde(default)]
    english: String,
    #[serde(default)]
    arabic: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHadith {
    id: Option<u32>,
    id_in_book: Option<u32>,
    #[serde(default)]
    arabic: String,
    english: Option<RawTranslation>,
    chapter_id: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTranslation {
    text: Option<String>,
    #[serde(default)]
    narrator: String,
}

/// Records parsed from one chapter file plus how many items the
/// translation filter rejected.
#[derive(Debug, Default)]
pub struct ParsedChapter {
    pub records: Vec<Record>,
    pub rejected: usize,
}

/// Why a chapter file contributed nothing.
#[derive(Debug, thiserror::Error)]
pub enum ChapterError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed chapter file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Numeric chapter derived from a file stem such as `12.json`, if any.
pub fn chapter_from_stem(path: &Path) -> Option<u32> {
    path.file_stem()?.to_str()?.parse().ok()
}

/// Parse the chapter file at `path` into records of `collection`.
pub fn parse_chapter(path: &Path, collection: &str) -> Result<ParsedChapter, ChapterError> {
    let content = fs::read_to_string(path)?;
    let file: ChapterFile = serde_json::from_str(&content)?;
    Ok(chapter_records(file, collection, chapter_from_stem(path)))
}

fn chapter_records(file: ChapterFile, collection: &str, stem_chapter: Option<u32>) -> ParsedChapter {
    let ChapterFile { chapter, hadiths } = file;

    let section_title = if chapter.english.trim().is_empty() {
        chapter.arabic.trim().to_string()
    } else {
        chapter.english.trim().to_string()
    };

    let mut parsed = ParsedChapter::default();
    for raw in hadiths {
        let Some(english) = raw.english else {
            parsed.rejected += 1;
            continue;
        };
        let text = english.text.unwrap_or_default();
        // Filters out empty and placeholder translations
        if text.chars().count() <= MIN_TRANSLATION_LEN {
            parsed.rejected += 1;
            continue;
        }

        let Some(chapter_number) = raw.chapter_id.or(chapter.id).or(stem_chapter) else {
            parsed.rejected += 1;
            continue;
        };
        let Some(item_number) = raw.id_in_book.or(raw.id) else {
            parsed.rejected += 1;
            continue;
        };

        parsed.records.push(Record {
            id: compose_id(collection, chapter_number, item_number),
            collection: collection.to_string(),
            chapter_number,
            item_number,
            source_text: raw.arabic.trim().to_string(),
            translated_text: text,
            attribution: english.narrator.trim().to_string(),
            section_title: section_title.clone(),
        });
    }
    parsed
}
