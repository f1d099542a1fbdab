//! (De)serialization of Bible documents, kept separate from storage

use crate::model::Bible;
use anyhow::{Context, Result};

pub trait DocumentCodec: Send + Sync {
    /// File extension (without the dot) of documents this codec reads.
    fn extension(&self) -> &'static str;

    fn decode(&self, bytes: &[u8]) -> Result<Bible>;

    fn encode(&self, bible: &Bible) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl DocumentCodec for JsonCodec {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Bible> {
        serde_json::from_slice(bytes).context("Invalid Bible JSON")
    }

    fn encode(&self, bible: &Bible) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(bible)
            .with_context(|| format!("Failed to serialize Bible '{}'", bible.id))
    }
}
