//! Verselight - Bible verse search and highlighting
//!
//! Backend library providing corpus loading, verse search and match highlighting.

// Text primitives come first as search and highlight build on them
pub mod text;
pub mod highlight;
pub mod model;
pub mod codec;
pub mod storage;
pub mod cache;
pub mod search;
pub mod config;
pub mod error;
pub mod state;

pub use cache::{CacheStats, CorpusCache};
pub use codec::{DocumentCodec, JsonCodec};
pub use config::{get_data_dir, Config};
pub use error::CorpusError;
pub use highlight::{render, render_with, Markers};
pub use model::{Bible, Book, Chapter, Verse, VerseRef};
pub use search::{search_bible, SearchEngine, SearchOptions, SearchResult};
pub use state::AppState;
pub use storage::{DocumentStore, FsDocumentStore, MemoryDocumentStore};
pub use text::{find_matches, normalize, TextHighlight};
