//! resolver
//!
//! Repository resolution and materialization.
//!
//! This module turns an arbitrary repository URI into a locally
//! materialized, cached, concurrency-safe handle:
//!
//! - [`token`] derives the stable token that identifies the repository
//! - [`Resolver::get_token`] materializes the repository under the token
//!   (symlink for local paths, bare clone for remote URLs)
//! - [`Resolver::handle`] opens and caches a shared handle per token
//!
//! # Concurrency
//!
//! Materialization of one token is serialized at two levels: an in-process
//! per-token mutex (multiple requests for the same *new* token may arrive
//! concurrently) and an advisory file lock in the store ([`lock::StoreLock`],
//! because multiple processes may share one store directory). The existence
//! re-check happens *inside* both locks; lock-then-verify, never
//! verify-then-lock. Materializations of different tokens proceed fully in
//! parallel.
//!
//! # Ownership
//!
//! The resolver is an explicit context object, constructed once and passed
//! to every component that needs it. It owns every handle it opens for its
//! own lifetime; there is no collector-driven cleanup.

pub mod token;

mod lock;

pub use lock::StoreLock;
pub use token::{derive, Derived};

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, error};

use crate::core::config::StoreConfig;
use crate::core::types::Token;
use crate::errors::Error;
use crate::git::Git;

#[cfg(unix)]
use std::os::unix::fs::symlink;
#[cfg(windows)]
use std::os::windows::fs::symlink_dir as symlink;

/// Resolves URIs to tokens and tokens to repository handles.
///
/// All shared state lives here: the ready-token set, the per-token clone
/// mutexes, and the handle cache. One instance serves the whole process;
/// separate instances (e.g. in tests) are fully isolated apart from the
/// on-disk store they point at.
pub struct Resolver {
    config: StoreConfig,
    /// Tokens whose materialization is known complete.
    ready: Mutex<HashSet<Token>>,
    /// Per-token mutexes serializing in-process clone attempts.
    clone_locks: Mutex<HashMap<Token, Arc<Mutex<()>>>>,
    /// Open repository handles, shared across callers.
    handles: Mutex<HashMap<Token, Arc<Mutex<Git>>>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("store_dir", &self.config.store_dir)
            .finish()
    }
}

impl Resolver {
    /// Create a resolver over the configured store, creating the store root
    /// if needed.
    ///
    /// # Errors
    ///
    /// [`Error::IoFailure`] or [`Error::PermissionDenied`] if the store root
    /// cannot be created.
    pub fn new(config: StoreConfig) -> Result<Self, Error> {
        fs::create_dir_all(&config.store_dir).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => Error::PermissionDenied {
                message: format!("cannot create store root {}", config.store_dir.display()),
            },
            _ => Error::io(
                format!("creating store root {}", config.store_dir.display()),
                &e,
            ),
        })?;
        Ok(Self {
            config,
            ready: Mutex::new(HashSet::new()),
            clone_locks: Mutex::new(HashMap::new()),
            handles: Mutex::new(HashMap::new()),
        })
    }

    /// The configuration this resolver was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Path a token materializes at inside the store.
    pub fn repo_path(&self, token: &Token) -> PathBuf {
        self.config.store_dir.join(token.as_str())
    }

    // =========================================================================
    // Token Resolution
    // =========================================================================

    /// Derive the token for `uri` and ensure its repository is materialized.
    ///
    /// Idempotent: repeat calls (sequential or concurrent) for the same URI
    /// return the same token and materialize at most once.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if a local path does not exist
    /// - [`Error::PermissionDenied`] if the store or symlink cannot be written
    /// - [`Error::ProtocolFailure`] if cloning the remote fails
    /// - [`Error::IoFailure`] for any other filesystem failure
    pub fn get_token(&self, uri: &str) -> Result<Token, Error> {
        let derived = token::derive(uri);

        // Fast path: already known ready, no disk access.
        if self
            .ready
            .lock()
            .expect("ready set poisoned")
            .contains(&derived.token)
        {
            return Ok(derived.token);
        }

        if derived.is_local {
            self.materialize_local(&derived)?;
        } else {
            self.materialize_remote(uri, &derived)?;
        }

        self.ready
            .lock()
            .expect("ready set poisoned")
            .insert(derived.token.clone());
        Ok(derived.token)
    }

    // =========================================================================
    // Materialization
    // =========================================================================

    /// Materialize a local repository as `<store>/<token>` -> absolute path.
    fn materialize_local(&self, derived: &Derived) -> Result<(), Error> {
        let source = Path::new(&derived.canonical);
        if !source.exists() {
            return Err(Error::NotFound {
                what: format!("local repository path {}", derived.canonical),
            });
        }

        let link = self.repo_path(&derived.token);
        match symlink(source, &link) {
            Ok(()) => {
                debug!(token = %derived.token, path = %derived.canonical, "linked local repository");
                Ok(())
            }
            // Another call (or process) linked it first; the mapping
            // token -> path is stable, so the existing link is equivalent.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                error!(token = %derived.token, error = %e, "symlink refused");
                Err(Error::PermissionDenied {
                    message: format!(
                        "insufficient privileges to link local repository {}",
                        derived.canonical
                    ),
                })
            }
            Err(e) => {
                error!(token = %derived.token, error = %e, "symlink failed");
                Err(Error::io(
                    format!("linking local repository {}", derived.canonical),
                    &e,
                ))
            }
        }
    }

    /// Materialize a remote repository as a bare clone of `uri`.
    ///
    /// Serialized per token by the in-process mutex and the store file lock.
    /// The clone lands in a temporary directory and is renamed into place,
    /// so a failed clone never looks ready to a later attempt.
    fn materialize_remote(&self, uri: &str, derived: &Derived) -> Result<(), Error> {
        let token_mutex = {
            let mut locks = self.clone_locks.lock().expect("clone lock table poisoned");
            locks
                .entry(derived.token.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _in_process = token_mutex.lock().expect("clone mutex poisoned");

        let dest = self.repo_path(&derived.token);
        let lock_path = self
            .config
            .store_dir
            .join(format!("{}.lock", derived.token));
        let _store_lock = StoreLock::acquire(&lock_path, self.config.lock_timeout)?;

        // Verify after locking: another thread or process may have cloned
        // while we waited for the locks.
        if dest.exists() {
            debug!(token = %derived.token, "repository already materialized");
            return Ok(());
        }

        let staging = self
            .config
            .store_dir
            .join(format!(".{}.clone", derived.token));
        if staging.exists() {
            // Leftover from a crashed clone attempt; we hold the lock, so
            // nobody else is using it.
            fs::remove_dir_all(&staging)
                .map_err(|e| Error::io(format!("clearing stale clone dir for {}", derived.token), &e))?;
        }

        debug!(token = %derived.token, uri, "cloning remote repository");
        if let Err(e) = Git::clone_bare(uri, &staging) {
            error!(token = %derived.token, uri, error = %e, "clone failed");
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        fs::rename(&staging, &dest)
            .map_err(|e| Error::io(format!("publishing clone for {}", derived.token), &e))?;
        debug!(token = %derived.token, "clone materialized");
        Ok(())
    }

    // =========================================================================
    // Handle Cache
    // =========================================================================

    /// Get the shared handle for a token, opening it on first use.
    ///
    /// Handles are cached for the resolver's lifetime and shared across
    /// callers. Open failures are returned and not cached.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if nothing is materialized under the token
    /// - [`Error::IoFailure`] if the repository cannot be opened
    pub fn handle(&self, token: &Token) -> Result<Arc<Mutex<Git>>, Error> {
        let mut handles = self.handles.lock().expect("handle cache poisoned");
        if let Some(handle) = handles.get(token) {
            return Ok(handle.clone());
        }

        let path = self.repo_path(token);
        let git = Git::open_store(&path).map_err(|e| {
            error!(token = %token, error = %e, "failed to open repository handle");
            match e {
                Error::NotFound { .. } => Error::NotFound {
                    what: format!("repository for token {}", token),
                },
                other => other,
            }
        })?;

        let handle = Arc::new(Mutex::new(git));
        handles.insert(token.clone(), handle.clone());
        Ok(handle)
    }
}
