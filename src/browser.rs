//! browser
//!
//! The facade consumed by the transport layer.
//!
//! A [`Browser`] wires the resolver, object reader, reference reader, and
//! index reader over one shared [`Resolver`] context. It is the only place
//! the URI allow-list is enforced: a URI that fails the check never reaches
//! token derivation, let alone materialization.
//!
//! # Example
//!
//! ```no_run
//! use gander::{Browser, StoreConfig};
//!
//! let browser = Browser::new(StoreConfig::default())?;
//! let token = browser.get_token("https://github.com/kaitoy/sbi.git")?;
//! for commit in browser.get_commits(&token)? {
//!     println!("{} -> {}", commit.id, commit.tree_id);
//! }
//! # Ok::<(), gander::Error>(())
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::StoreConfig;
use crate::core::model::{Branch, Commit, Index, SymbolicReference, Tag, Tree};
use crate::core::types::{Oid, Token};
use crate::errors::Error;
use crate::index::WorkingIndex;
use crate::objects::Objects;
use crate::refs::Refs;
use crate::resolver::Resolver;

/// Facade over the repository browsing core.
///
/// Construct one per process (or one per isolated store in tests) and share
/// it freely; every operation takes `&self`.
pub struct Browser {
    resolver: Arc<Resolver>,
    objects: Objects,
    refs: Refs,
    index: WorkingIndex,
}

impl Browser {
    /// Build a browser over the configured store.
    pub fn new(config: StoreConfig) -> Result<Self, Error> {
        let resolver = Arc::new(Resolver::new(config)?);
        Ok(Self {
            objects: Objects::new(resolver.clone()),
            refs: Refs::new(resolver.clone()),
            index: WorkingIndex::new(resolver.clone()),
            resolver,
        })
    }

    /// The resolver backing this browser.
    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    // =========================================================================
    // Repository Resolution
    // =========================================================================

    /// Resolve a repository URI to its token, materializing on first use.
    ///
    /// # Errors
    ///
    /// - [`Error::PermissionDenied`] if the URI fails the allow-list
    /// - Everything [`Resolver::get_token`] can raise
    pub fn get_token(&self, uri: &str) -> Result<Token, Error> {
        if !self.resolver.config().is_allowed(uri) {
            return Err(Error::PermissionDenied {
                message: format!("URI '{}' is not in the configured allow-list", uri),
            });
        }
        self.resolver.get_token(uri)
    }

    // =========================================================================
    // Objects
    // =========================================================================

    /// All commits reachable from any ref.
    pub fn get_commits(&self, token: &Token) -> Result<Vec<Commit>, Error> {
        self.objects.commits(token)
    }

    /// The given tree objects with entries partitioned into subtrees and
    /// blobs.
    pub fn get_trees(&self, token: &Token, ids: &[Oid]) -> Result<Vec<Tree>, Error> {
        self.objects.trees(token, ids)
    }

    /// Human-readable contents of an object.
    pub fn get_contents(&self, token: &Token, id: &Oid) -> Result<String, Error> {
        self.objects.contents(token, id)
    }

    // =========================================================================
    // References
    // =========================================================================

    /// Local branches.
    pub fn get_branches(&self, token: &Token) -> Result<Vec<Branch>, Error> {
        self.refs.branches(token)
    }

    /// Tags, annotated and lightweight.
    pub fn get_tags(&self, token: &Token) -> Result<Vec<Tag>, Error> {
        self.refs.tags(token)
    }

    /// The well-known symbolic refs present in the repository.
    pub fn get_symbolic_refs(&self, token: &Token) -> Result<Vec<SymbolicReference>, Error> {
        self.refs.symbolic_refs(token)
    }

    /// Raw contents of a loose ref file.
    pub fn get_ref_contents(&self, token: &Token, ref_full_name: &str) -> Result<String, Error> {
        self.refs.ref_contents(token, ref_full_name)
    }

    // =========================================================================
    // Working Index
    // =========================================================================

    /// The working index of a non-bare repository.
    pub fn get_index(&self, token: &Token) -> Result<Index, Error> {
        self.index.index(token)
    }

    /// Rendered index contents.
    pub fn get_index_contents(&self, token: &Token) -> Result<String, Error> {
        self.index.index_contents(token)
    }

    /// Last-modified time of the index file.
    pub fn get_index_last_modified(&self, token: &Token) -> Result<DateTime<Utc>, Error> {
        self.index.index_last_modified(token)
    }
}
