//! Application state management

use crate::cache::{CacheStats, CorpusCache};
use crate::codec::{DocumentCodec, JsonCodec};
use crate::config::Config;
use crate::error::CorpusError;
use crate::model::{Bible, Book, Chapter, Verse};
use crate::search::{SearchEngine, SearchOptions, SearchResult};
use crate::storage::{DocumentStore, FsDocumentStore};
use std::sync::Arc;
use tracing::info;

/// Application state holding configuration, the corpus cache and the search engine
pub struct AppState {
    pub config: Config,
    pub search_engine: SearchEngine,
    store: Arc<dyn DocumentStore>,
    codec: Arc<dyn DocumentCodec>,
}

impl AppState {
    /// Initialize application state over the configured bibles directory
    pub fn new(config: Config) -> Result<Self, CorpusError> {
        let codec: Arc<dyn DocumentCodec> = Arc::new(JsonCodec);
        let store = Arc::new(FsDocumentStore::new(config.bibles_dir(), codec.extension()));
        Self::with_parts(config, store, codec)
    }

    /// State over any store, reading and writing JSON documents.
    pub fn with_store(config: Config, store: Arc<dyn DocumentStore>) -> Result<Self, CorpusError> {
        Self::with_parts(config, store, Arc::new(JsonCodec))
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn DocumentStore>,
        codec: Arc<dyn DocumentCodec>,
    ) -> Result<Self, CorpusError> {
        config.validate()?;
        let cache = Arc::new(CorpusCache::new(Arc::clone(&store), Arc::clone(&codec)));

        Ok(Self {
            config,
            search_engine: SearchEngine::new(cache),
            store,
            codec,
        })
    }

    fn cache(&self) -> &CorpusCache {
        self.search_engine.cache()
    }

    pub async fn get_all_bibles(&self) -> Result<Vec<Arc<Bible>>, CorpusError> {
        self.cache().get_all_corpora().await
    }

    pub async fn get_bible(&self, bible_id: &str) -> Result<Arc<Bible>, CorpusError> {
        self.cache().get_corpus(bible_id).await
    }

    pub async fn get_book(&self, bible_id: &str, book_id: &str) -> Result<Book, CorpusError> {
        let bible = self.get_bible(bible_id).await?;
        bible.book(book_id).cloned().ok_or_else(|| {
            CorpusError::NotFound(format!("Book '{}' was not found in Bible '{}'.", book_id, bible_id))
        })
    }

    pub async fn get_chapter(
        &self,
        bible_id: &str,
        book_id: &str,
        chapter_id: &str,
    ) -> Result<Chapter, CorpusError> {
        let book = self.get_book(bible_id, book_id).await?;
        book.chapter(chapter_id).cloned().ok_or_else(|| {
            CorpusError::NotFound(format!(
                "Chapter '{}' was not found in book '{}' of Bible '{}'.",
                chapter_id, book_id, bible_id
            ))
        })
    }

    /// Verses of a chapter whose ids are listed, in chapter order. Unknown ids are ignored.
    pub async fn get_verses(
        &self,
        bible_id: &str,
        book_id: &str,
        chapter_id: &str,
        verse_ids: &[&str],
    ) -> Result<Vec<Verse>, CorpusError> {
        let chapter = self.get_chapter(bible_id, book_id, chapter_id).await?;
        Ok(chapter
            .verses
            .into_iter()
            .filter(|v| verse_ids.contains(&v.id.as_str()))
            .collect())
    }

    /// Search a Bible, falling back to the configured default options.
    pub async fn search(
        &self,
        bible_id: &str,
        query: &str,
        options: Option<SearchOptions>,
    ) -> Result<Vec<SearchResult>, CorpusError> {
        let options = options.unwrap_or_else(|| self.config.default_search_options());
        self.search_engine.search(bible_id, query, &options).await
    }

    pub fn render_result(&self, result: &SearchResult, options: &SearchOptions) -> String {
        if options.highlight_results {
            result.highlighted_text()
        } else {
            result.verse.text.clone()
        }
    }

    /// Persist a Bible to the store and drop the cache so the next read sees it.
    pub async fn import_bible(&self, bible: &Bible) -> Result<(), CorpusError> {
        if bible.id.trim().is_empty() {
            return Err(CorpusError::InvalidArgument("Bible id cannot be empty".to_string()));
        }
        if bible.id.contains(['/', '\\']) || bible.id.starts_with('.') {
            return Err(CorpusError::InvalidArgument(format!("Bible id '{}' is not a valid file name", bible.id)));
        }

        let name = format!("{}.{}", bible.id, self.codec.extension());
        let bytes = self
            .codec
            .encode(bible)
            .map_err(|e| CorpusError::Storage(format!("{:#}", e)))?;
        self.store
            .write_document(&name, &bytes)
            .await
            .map_err(|e| CorpusError::Storage(format!("Failed to store {}: {:#}", name, e)))?;

        info!("Imported Bible '{}' as {}", bible.id, name);
        self.cache().invalidate().await;
        Ok(())
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache().stats().await
    }
}
