//! Corpus cache: bulk-loads every Bible in a document store once, then serves reads

use crate::codec::DocumentCodec;
use crate::error::CorpusError;
use crate::model::Bible;
use crate::storage::DocumentStore;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

#[derive(Default)]
struct CacheState {
    corpora: HashMap<String, Arc<Bible>>,
    populated: bool,
    /// Completed load attempts, successful or not.
    attempts: u64,
    last_failure: Option<CorpusError>,
    loaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub corpora: usize,
    pub populated: bool,
    pub load_attempts: u64,
    pub loaded_at: Option<DateTime<Utc>>,
}

pub struct CorpusCache {
    store: Arc<dyn DocumentStore>,
    codec: Arc<dyn DocumentCodec>,
    state: RwLock<CacheState>,
    /// Serializes bulk loads so concurrent first callers share one load.
    load_gate: Mutex<()>,
}

impl CorpusCache {
    pub fn new(store: Arc<dyn DocumentStore>, codec: Arc<dyn DocumentCodec>) -> Self {
        Self {
            store,
            codec,
            state: RwLock::new(CacheState::default()),
            load_gate: Mutex::new(()),
        }
    }

    /// Make sure the cache is populated, bulk-loading on first use.
    ///
    /// Callers that queued behind an in-flight load adopt its outcome rather
    /// than starting another one. After a failed load the cache is empty and
    /// the next call retries.
    pub async fn ensure_loaded(&self) -> Result<(), CorpusError> {
        let observed = {
            let state = self.state.read().await;
            if state.populated {
                return Ok(());
            }
            state.attempts
        };

        let _gate = self.load_gate.lock().await;

        {
            let state = self.state.read().await;
            if state.populated {
                return Ok(());
            }
            if state.attempts != observed {
                if let Some(err) = &state.last_failure {
                    return Err(err.clone());
                }
            }
        }

        let outcome = self.bulk_load().await;

        let mut state = self.state.write().await;
        state.attempts += 1;
        match outcome {
            Ok(corpora) => {
                info!("Loaded {} corpora", corpora.len());
                state.corpora = corpora;
                state.populated = true;
                state.last_failure = None;
                state.loaded_at = Some(Utc::now());
                Ok(())
            }
            Err(e) => {
                let err = CorpusError::load_failure(e);
                warn!("Corpus load failed, cache cleared: {}", err);
                state.corpora.clear();
                state.populated = false;
                state.last_failure = Some(err.clone());
                state.loaded_at = None;
                Err(err)
            }
        }
    }

    async fn bulk_load(&self) -> Result<HashMap<String, Arc<Bible>>> {
        let names = self
            .store
            .list_documents()
            .await
            .context("Failed to list Bible documents")?;
        debug!("Bulk loading {} documents", names.len());

        let mut corpora: HashMap<String, Arc<Bible>> = HashMap::with_capacity(names.len());
        for name in &names {
            let bytes = self.store.read_document(name).await?;
            let bible = self
                .codec
                .decode(&bytes)
                .with_context(|| format!("Failed to parse {}", name))?;
            if bible.id.trim().is_empty() {
                bail!("Document {} has no Bible id", name);
            }

            // Declared id is the key; on collision the later document wins.
            if corpora.contains_key(&bible.id) {
                warn!("Bible id '{}' in {} replaces an earlier document", bible.id, name);
            }
            corpora.insert(bible.id.clone(), Arc::new(bible));
        }

        Ok(corpora)
    }

    /// Read access to a populated cache.
    ///
    /// An `invalidate` can land between the load and the read; the guard is
    /// only handed out once it observes a populated cache.
    async fn loaded(&self) -> Result<RwLockReadGuard<'_, CacheState>, CorpusError> {
        loop {
            self.ensure_loaded().await?;
            let state = self.state.read().await;
            if state.populated {
                return Ok(state);
            }
            debug!("Cache invalidated after load, loading again");
        }
    }

    pub async fn get_corpus(&self, id: &str) -> Result<Arc<Bible>, CorpusError> {
        let state = self.loaded().await?;
        state
            .corpora
            .get(id)
            .cloned()
            .ok_or_else(|| CorpusError::bible_not_found(id))
    }

    /// Every cached Bible, ordered by id.
    pub async fn get_all_corpora(&self) -> Result<Vec<Arc<Bible>>, CorpusError> {
        let state = self.loaded().await?;
        let mut all: Vec<Arc<Bible>> = state.corpora.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    /// Drop everything; the next access bulk-loads again.
    pub async fn invalidate(&self) {
        let _gate = self.load_gate.lock().await;
        let mut state = self.state.write().await;
        state.corpora.clear();
        state.populated = false;
        state.loaded_at = None;
        debug!("Corpus cache invalidated");
    }

    pub async fn reload(&self) -> Result<(), CorpusError> {
        self.invalidate().await;
        self.ensure_loaded().await
    }

    pub async fn stats(&self) -> CacheStats {
        let state = self.state.read().await;
        CacheStats {
            corpora: state.corpora.len(),
            populated: state.populated,
            load_attempts: state.attempts,
            loaded_at: state.loaded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::storage::MemoryDocumentStore;
    use std::time::Duration;

    fn bible_json(id: &str, name: &str) -> String {
        format!(
            r#"{{"id":"{id}","name":"{name}","language":"en","version":"V","copyright":"","isRightToLeft":false,
               "books":[{{"id":"GEN","name":"Genesis","abbreviation":"Gen","number":1,
               "chapters":[{{"id":"1","number":1,"verses":[{{"id":"GEN.1.1","number":1,"text":"In the beginning"}}]}}]}}]}}"#
        )
    }

    fn cache_over(store: Arc<MemoryDocumentStore>) -> CorpusCache {
        CorpusCache::new(store, Arc::new(JsonCodec))
    }

    #[tokio::test]
    async fn repeated_lookups_load_once() {
        let store = Arc::new(MemoryDocumentStore::new().with_document("kjv.json", bible_json("kjv", "KJV")));
        let cache = cache_over(store.clone());

        let first = cache.get_corpus("kjv").await.unwrap();
        let second = cache.get_corpus("kjv").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.list_calls(), 1);

        let stats = cache.stats().await;
        assert!(stats.populated);
        assert_eq!(stats.corpora, 1);
        assert_eq!(stats.load_attempts, 1);
        assert!(stats.loaded_at.is_some());
    }

    #[tokio::test]
    async fn keyed_by_declared_id_not_file_name() {
        let store = Arc::new(MemoryDocumentStore::new().with_document("english.json", bible_json("web", "WEB")));
        let cache = cache_over(store);

        assert_eq!(cache.get_corpus("web").await.unwrap().name, "WEB");
        assert_eq!(
            cache.get_corpus("english").await.unwrap_err(),
            CorpusError::bible_not_found("english")
        );
    }

    #[tokio::test]
    async fn id_collision_last_loaded_wins() {
        let store = Arc::new(
            MemoryDocumentStore::new()
                .with_document("a.json", bible_json("kjv", "First"))
                .with_document("b.json", bible_json("kjv", "Second")),
        );
        let cache = cache_over(store);
        assert_eq!(cache.get_corpus("kjv").await.unwrap().name, "Second");
        assert_eq!(cache.get_all_corpora().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_document_clears_cache_and_retry_succeeds() {
        let store = Arc::new(
            MemoryDocumentStore::new()
                .with_document("kjv.json", bible_json("kjv", "KJV"))
                .with_document("broken.json", "{ not json"),
        );
        let cache = cache_over(store.clone());

        let err = cache.get_corpus("kjv").await.unwrap_err();
        assert!(matches!(err, CorpusError::LoadFailure(ref msg) if msg.contains("broken.json")));
        let stats = cache.stats().await;
        assert!(!stats.populated);
        assert_eq!(stats.corpora, 0);

        store.put("broken.json", bible_json("asv", "ASV"));
        assert_eq!(cache.get_all_corpora().await.unwrap().len(), 2);
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn blank_id_fails_the_load() {
        let store = Arc::new(MemoryDocumentStore::new().with_document("x.json", bible_json(" ", "Nameless")));
        let cache = cache_over(store);
        assert!(matches!(cache.ensure_loaded().await, Err(CorpusError::LoadFailure(_))));
    }

    #[tokio::test]
    async fn empty_store_loads_empty_cache() {
        let store = Arc::new(MemoryDocumentStore::new());
        let cache = cache_over(store.clone());
        assert!(cache.get_all_corpora().await.unwrap().is_empty());
        assert!(matches!(cache.get_corpus("kjv").await, Err(CorpusError::NotFound(_))));
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn invalidate_triggers_fresh_load() {
        let store = Arc::new(MemoryDocumentStore::new().with_document("kjv.json", bible_json("kjv", "KJV")));
        let cache = cache_over(store.clone());
        cache.ensure_loaded().await.unwrap();

        store.put("kjv.json", bible_json("kjv", "KJV (revised)"));
        assert_eq!(cache.get_corpus("kjv").await.unwrap().name, "KJV");

        cache.invalidate().await;
        assert!(!cache.stats().await.populated);
        assert_eq!(cache.get_corpus("kjv").await.unwrap().name, "KJV (revised)");
        assert_eq!(store.list_calls(), 2);

        cache.reload().await.unwrap();
        assert_eq!(store.list_calls(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_access_shares_one_load() {
        let store = Arc::new(MemoryDocumentStore::new().with_document("kjv.json", bible_json("kjv", "KJV")));
        let cache = Arc::new(cache_over(store.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_corpus("kjv").await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().id, "kjv");
        }
        assert_eq!(store.list_calls(), 1);
    }

    /// Sleeps before listing so other callers can queue behind the load.
    struct SlowStore {
        inner: MemoryDocumentStore,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl DocumentStore for SlowStore {
        async fn list_documents(&self) -> Result<Vec<String>> {
            tokio::time::sleep(self.delay).await;
            self.inner.list_documents().await
        }

        async fn read_document(&self, name: &str) -> Result<Vec<u8>> {
            self.inner.read_document(name).await
        }

        async fn write_document(&self, name: &str, bytes: &[u8]) -> Result<()> {
            self.inner.write_document(name, bytes).await
        }
    }

    fn slow_store(inner: MemoryDocumentStore, delay_ms: u64) -> Arc<SlowStore> {
        Arc::new(SlowStore { inner, delay: Duration::from_millis(delay_ms) })
    }

    #[tokio::test]
    async fn concurrent_failure_is_shared() {
        let store = slow_store(MemoryDocumentStore::new().with_document("broken.json", "[]"), 10);
        let cache = CorpusCache::new(store.clone(), Arc::new(JsonCodec));

        let (a, b) = tokio::join!(cache.ensure_loaded(), cache.ensure_loaded());
        assert!(matches!(a, Err(CorpusError::LoadFailure(_))));
        assert_eq!(a, b);
        assert_eq!(store.inner.list_calls(), 1);
        assert_eq!(cache.stats().await.load_attempts, 1);

        // A later call is not concurrent with the failed load, so it retries.
        assert!(cache.ensure_loaded().await.is_err());
        assert_eq!(store.inner.list_calls(), 2);
    }

    #[tokio::test]
    async fn abandoned_load_leaves_cache_usable() {
        let store = slow_store(MemoryDocumentStore::new().with_document("kjv.json", bible_json("kjv", "KJV")), 50);
        let cache = CorpusCache::new(store.clone(), Arc::new(JsonCodec));

        let abandoned = tokio::time::timeout(Duration::from_millis(5), cache.ensure_loaded()).await;
        assert!(abandoned.is_err());
        let stats = cache.stats().await;
        assert!(!stats.populated);
        assert_eq!(stats.corpora, 0);
        assert_eq!(stats.load_attempts, 0);

        assert_eq!(cache.get_corpus("kjv").await.unwrap().name, "KJV");
        // The abandoned attempt was dropped before it reached the store.
        assert_eq!(store.inner.list_calls(), 1);
        assert_eq!(cache.stats().await.load_attempts, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn lookups_racing_invalidate_never_miss() {
        let store = Arc::new(MemoryDocumentStore::new().with_document("kjv.json", bible_json("kjv", "KJV")));
        let cache = Arc::new(cache_over(store));

        let invalidator = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                for _ in 0..200 {
                    cache.invalidate().await;
                    tokio::task::yield_now().await;
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    for _ in 0..200 {
                        assert_eq!(cache.get_corpus("kjv").await.unwrap().id, "kjv");
                        assert_eq!(cache.get_all_corpora().await.unwrap().len(), 1);
                    }
                })
            })
            .collect();

        invalidator.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }
}
