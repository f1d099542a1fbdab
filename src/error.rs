//! Error types for Verselight

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorpusError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to load corpus: {0}")]
    LoadFailure(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CorpusError {
    pub fn bible_not_found(bible_id: &str) -> Self {
        CorpusError::NotFound(format!("Bible with ID '{}' was not found.", bible_id))
    }

    /// Collapse an internal load error chain into a `LoadFailure`.
    pub fn load_failure(err: anyhow::Error) -> Self {
        CorpusError::LoadFailure(format!("{:#}", err))
    }
}

impl serde::Serialize for CorpusError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
