//! Application configuration and data directory resolution

use crate::error::CorpusError;
use crate::search::SearchOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";
const BIBLES_DIR: &str = "bibles";
const DATA_DIR_ENV: &str = "VERSELIGHT_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filled from the directory the settings were loaded from.
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub default_language: String,
    pub max_search_results: i64,
    pub case_sensitive: bool,
    pub highlight_results: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            default_language: "en".to_string(),
            max_search_results: 100,
            case_sensitive: false,
            highlight_results: true,
        }
    }
}

impl Config {
    /// Load `settings.json` from `data_dir`. A missing file means defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(SETTINGS_FILE);
        let mut config = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes)
                .with_context(|| format!("Invalid settings file {:?}", path))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", path)),
        };
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CorpusError> {
        if self.default_language.trim().is_empty() {
            return Err(CorpusError::InvalidArgument(
                "Default language must be specified.".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bibles_dir(&self) -> PathBuf {
        self.data_dir.join(BIBLES_DIR)
    }

    pub fn default_search_options(&self) -> SearchOptions {
        SearchOptions {
            case_sensitive: self.case_sensitive,
            highlight_results: self.highlight_results,
            max_results: self.max_search_results,
            book_filter: None,
            chapter_filter: None,
        }
    }
}

/// Resolve the data directory.
///
/// `VERSELIGHT_DATA_DIR` wins; debug builds then prefer a local `data`
/// folder that already holds bibles; otherwise the platform data dir.
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }

    #[cfg(debug_assertions)]
    {
        let dev_paths = [PathBuf::from("data"), PathBuf::from("../data")];
        for path in &dev_paths {
            if path.join(BIBLES_DIR).is_dir() {
                return path.canonicalize().unwrap_or_else(|_| path.clone());
            }
        }
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("Verselight");
    }

    PathBuf::from("data")
}
