//! Verse search over cached Bible corpora

use crate::cache::CorpusCache;
use crate::error::CorpusError;
use crate::highlight;
use crate::model::{Bible, Verse, VerseRef};
use crate::text::{find_matches, normalize, TextHighlight};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub highlight_results: bool,
    /// Zero or negative means no cap.
    pub max_results: i64,
    /// Exact match on the first component of the verse id.
    pub book_filter: Option<String>,
    /// Exact match on the second component of the verse id.
    pub chapter_filter: Option<String>,
}

impl SearchOptions {
    pub fn limit(&self) -> Option<usize> {
        usize::try_from(self.max_results).ok().filter(|&n| n > 0)
    }

    fn admits(&self, verse_ref: Option<VerseRef<'_>>) -> bool {
        if let Some(book) = &self.book_filter {
            if verse_ref.map(|r| r.book_id) != Some(book.as_str()) {
                return false;
            }
        }
        if let Some(chapter) = &self.chapter_filter {
            if verse_ref.map(|r| r.chapter_id) != Some(chapter.as_str()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub bible_id: String,
    pub book_id: String,
    pub chapter_id: String,
    pub verse: Verse,
    /// Match spans in `verse.text`, as UTF-8 byte offsets.
    pub highlights: Vec<TextHighlight>,
}

impl SearchResult {
    /// Verse text with every match wrapped in `<mark>` tags.
    pub fn highlighted_text(&self) -> String {
        highlight::render(&self.verse.text, &self.highlights)
    }
}

/// Search one already-resolved Bible.
///
/// Verses are scanned in document order and the scan stops as soon as the
/// result cap is reached, so capped results are always a prefix of the
/// uncapped ones. Verses whose id lacks a chapter component never match.
pub fn search_bible(
    bible: &Bible,
    query: &str,
    options: &SearchOptions,
) -> Result<Vec<SearchResult>, CorpusError> {
    if query.trim().is_empty() {
        return Err(CorpusError::InvalidArgument("Search text cannot be empty".to_string()));
    }

    let limit = options.limit();
    let mut results = Vec::new();

    for verse in bible.verses() {
        let verse_ref = VerseRef::parse(&verse.id);
        if !options.admits(verse_ref) {
            continue;
        }

        let highlights = find_matches(&verse.text, query, options.case_sensitive);
        if highlights.is_empty() {
            continue;
        }
        let Some(verse_ref) = verse_ref else {
            trace!("Skipping verse with malformed id '{}'", verse.id);
            continue;
        };

        results.push(SearchResult {
            bible_id: bible.id.clone(),
            book_id: verse_ref.book_id.to_string(),
            chapter_id: verse_ref.chapter_id.to_string(),
            verse: verse.clone(),
            highlights,
        });

        if limit.is_some_and(|n| results.len() >= n) {
            break;
        }
    }

    Ok(results)
}

pub struct SearchEngine {
    cache: Arc<CorpusCache>,
}

impl SearchEngine {
    pub fn new(cache: Arc<CorpusCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<CorpusCache> {
        &self.cache
    }

    pub async fn search(
        &self,
        bible_id: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, CorpusError> {
        if query.trim().is_empty() {
            return Err(CorpusError::InvalidArgument("Search text cannot be empty".to_string()));
        }

        let start = std::time::Instant::now();
        let bible = self.cache.get_corpus(bible_id).await?;
        let results = search_bible(&bible, query, options)?;

        debug!(
            bible_id,
            normalized_query = %normalize(query, options.case_sensitive),
            hits = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search complete"
        );
        Ok(results)
    }
}
