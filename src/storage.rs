//! Raw document access for Bible corpora
//!
//! Stores only move bytes around; decoding is the codec's job.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Names of every document in the store, in the order they should be loaded.
    async fn list_documents(&self) -> Result<Vec<String>>;

    async fn read_document(&self, name: &str) -> Result<Vec<u8>>;

    async fn write_document(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

fn check_document_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        bail!("Invalid document name {:?}", name);
    }
    Ok(())
}

/// A directory of document files sharing one extension.
///
/// Documents are listed in file-name order. A missing directory lists as empty.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    dir: PathBuf,
    extension: String,
}

impl FsDocumentStore {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn list_documents(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to list {:?}", self.dir));
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Failed to list {:?}", self.dir))?
        {
            let path = entry.path();
            let matches_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension));
            if !matches_ext {
                continue;
            }
            // Follows symlinks, unlike `DirEntry::file_type`.
            let metadata = tokio::fs::metadata(&path)
                .await
                .with_context(|| format!("Failed to stat {:?}", path))?;
            if !metadata.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    async fn read_document(&self, name: &str) -> Result<Vec<u8>> {
        check_document_name(name)?;
        let path = self.dir.join(name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))
    }

    async fn write_document(&self, name: &str, bytes: &[u8]) -> Result<()> {
        check_document_name(name)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {:?}", self.dir))?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", path))
    }
}

/// In-process store, listed in insertion order.
///
/// Counts listing passes so callers can observe how often a bulk load ran.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<Vec<(String, Vec<u8>)>>,
    list_calls: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.put(name, bytes);
        self
    }

    /// Insert or replace a document. A replaced document keeps its position.
    pub fn put(&self, name: &str, bytes: impl Into<Vec<u8>>) {
        let bytes = bytes.into();
        let mut docs = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        match docs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = bytes,
            None => docs.push((name.to_string(), bytes)),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_documents(&self) -> Result<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let docs = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(docs.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn read_document(&self, name: &str) -> Result<Vec<u8>> {
        let docs = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        match docs.iter().find(|(n, _)| n == name) {
            Some((_, bytes)) => Ok(bytes.clone()),
            None => bail!("Document {:?} does not exist", name),
        }
    }

    async fn write_document(&self, name: &str, bytes: &[u8]) -> Result<()> {
        check_document_name(name)?;
        self.put(name, bytes);
        Ok(())
    }
}
