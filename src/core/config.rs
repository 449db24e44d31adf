//! core::config
//!
//! Store configuration schema and loading.
//!
//! # Overview
//!
//! A [`StoreConfig`] carries everything the resolver and object layers need
//! that is not derivable from a request: the materialization store root, the
//! optional URI-prefix allow-list, the raw-object cache capacity, and the
//! store-lock acquisition timeout.
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. A TOML config file, if one is loaded
//! 3. Direct field assignment by the embedding application
//!
//! # Default store root
//!
//! `~/.gander/repos`, falling back to `$TMPDIR/gander` when no home
//! directory can be determined.
//!
//! # Example
//!
//! ```
//! use gander::core::config::StoreConfig;
//!
//! let mut config = StoreConfig::default();
//! config.allowed_prefixes = vec!["https://github.com/".to_string()];
//!
//! assert!(config.is_allowed("https://github.com/kofron/gander.git"));
//! assert!(!config.is_allowed("https://example.com/other.git"));
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default timeout for store-lock acquisition.
///
/// Generous because the lock holder may legitimately be mid-clone.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(600);

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

/// On-disk TOML schema. All fields optional; absent fields keep defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoreConfigFile {
    store_dir: Option<PathBuf>,
    allowed_prefixes: Option<Vec<String>>,
    raw_cache_limit: Option<usize>,
    lock_timeout_secs: Option<u64>,
}

/// Configuration for the materialization store and caches.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory of the materialization store. Shared across processes.
    pub store_dir: PathBuf,

    /// Literal URI prefixes admitted by [`StoreConfig::is_allowed`].
    /// An empty list admits every URI.
    pub allowed_prefixes: Vec<String>,

    /// Maximum number of memoized raw objects. `None` means unbounded;
    /// `Some(n)` evicts in insertion order once `n` entries are cached.
    pub raw_cache_limit: Option<usize>,

    /// How long to wait for the cross-process store lock before giving up.
    pub lock_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            allowed_prefixes: Vec::new(),
            raw_cache_limit: None,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

fn default_store_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".gander").join("repos"),
        None => std::env::temp_dir().join("gander"),
    }
}

impl StoreConfig {
    /// Load configuration from a TOML file, merged over defaults.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ReadError`] if the file cannot be read
    /// - [`ConfigError::ParseError`] if the file is not valid TOML or
    ///   contains unknown keys
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|message| ConfigError::ParseError {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse configuration from a TOML string, merged over defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, String> {
        let file: StoreConfigFile = toml::from_str(text).map_err(|e| e.to_string())?;
        let mut config = Self::default();
        if let Some(store_dir) = file.store_dir {
            config.store_dir = store_dir;
        }
        if let Some(allowed_prefixes) = file.allowed_prefixes {
            config.allowed_prefixes = allowed_prefixes;
        }
        if let Some(raw_cache_limit) = file.raw_cache_limit {
            config.raw_cache_limit = Some(raw_cache_limit);
        }
        if let Some(secs) = file.lock_timeout_secs {
            config.lock_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Check a URI against the allow-list.
    ///
    /// An empty allow-list admits everything; otherwise the URI must start
    /// with one of the configured literal prefixes.
    pub fn is_allowed(&self, uri: &str) -> bool {
        self.allowed_prefixes.is_empty()
            || self.allowed_prefixes.iter().any(|p| uri.starts_with(p))
    }
}
