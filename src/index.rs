//! index
//!
//! Working-index enumeration for non-bare repositories.
//!
//! Bare clones (every remote materialization) have no index; all operations
//! here report [`Error::Unavailable`] for them. Locally linked repositories
//! expose their real index.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::error;

use crate::core::model::Index;
use crate::core::types::Token;
use crate::errors::Error;
use crate::resolver::Resolver;

/// Reader for the working index.
pub struct WorkingIndex {
    resolver: Arc<Resolver>,
}

impl WorkingIndex {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        Self { resolver }
    }

    /// The index with its entries and last-modified time.
    ///
    /// # Errors
    ///
    /// - [`Error::Unavailable`] on a bare repository
    /// - [`Error::IoFailure`] if the index cannot be read
    pub fn index(&self, token: &Token) -> Result<Index, Error> {
        let handle = self.resolver.handle(token)?;
        let git = handle.lock().expect("repository handle poisoned");

        let entries = git.index_entries().map_err(|e| {
            error!(token = %token, error = %e, "index enumeration failed");
            e
        })?;
        let last_modified: DateTime<Utc> = git.index_mtime()?.into();

        Ok(Index {
            entries,
            last_modified,
        })
    }

    /// Rendered index contents, one entry per line as
    /// `<mode> <id> <stage>\t<path>`.
    pub fn index_contents(&self, token: &Token) -> Result<String, Error> {
        let index = self.index(token)?;
        let mut rendered = String::new();
        for entry in &index.entries {
            rendered.push_str(&format!(
                "{} {} {}\t{}\n",
                entry.mode, entry.id, entry.stage, entry.path
            ));
        }
        Ok(rendered)
    }

    /// When the index file was last modified.
    pub fn index_last_modified(&self, token: &Token) -> Result<DateTime<Utc>, Error> {
        let handle = self.resolver.handle(token)?;
        let git = handle.lock().expect("repository handle poisoned");
        git.index_mtime().map(DateTime::<Utc>::from).map_err(|e| {
            error!(token = %token, error = %e, "index mtime lookup failed");
            e
        })
    }
}
