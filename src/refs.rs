//! refs
//!
//! Reference enumeration: branches, tags, symbolic refs, and loose-ref file
//! contents. A thin pass-through over the handle cache; all decoding lives
//! in the git doorway.

use std::sync::Arc;

use tracing::error;

use crate::core::model::{Branch, SymbolicReference, Tag};
use crate::core::types::Token;
use crate::errors::Error;
use crate::resolver::Resolver;

/// Reader for repository references.
pub struct Refs {
    resolver: Arc<Resolver>,
}

impl Refs {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        Self { resolver }
    }

    /// Local branches with their target commits.
    pub fn branches(&self, token: &Token) -> Result<Vec<Branch>, Error> {
        let handle = self.resolver.handle(token)?;
        let git = handle.lock().expect("repository handle poisoned");
        git.branches().map_err(|e| {
            error!(token = %token, error = %e, "branch enumeration failed");
            e
        })
    }

    /// Tags, annotated and lightweight.
    pub fn tags(&self, token: &Token) -> Result<Vec<Tag>, Error> {
        let handle = self.resolver.handle(token)?;
        let git = handle.lock().expect("repository handle poisoned");
        git.tags().map_err(|e| {
            error!(token = %token, error = %e, "tag enumeration failed");
            e
        })
    }

    /// The well-known symbolic refs that exist in the repository
    /// (HEAD, ORIG_HEAD, FETCH_HEAD, MERGE_HEAD).
    pub fn symbolic_refs(&self, token: &Token) -> Result<Vec<SymbolicReference>, Error> {
        let handle = self.resolver.handle(token)?;
        let git = handle.lock().expect("repository handle poisoned");
        git.symbolic_refs().map_err(|e| {
            error!(token = %token, error = %e, "symbolic ref enumeration failed");
            e
        })
    }

    /// Raw contents of a loose ref file under the git directory,
    /// e.g. `refs/heads/main`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no such ref file exists (packed refs have no
    ///   loose file)
    /// - [`Error::IoFailure`] if the file cannot be read
    pub fn ref_contents(&self, token: &Token, ref_full_name: &str) -> Result<String, Error> {
        let handle = self.resolver.handle(token)?;
        let path = {
            let git = handle.lock().expect("repository handle poisoned");
            git.git_dir().join(ref_full_name)
        };

        if !path.exists() {
            return Err(Error::NotFound {
                what: format!("ref {} in repository {}", ref_full_name, token),
            });
        }
        let bytes = std::fs::read(&path).map_err(|e| {
            error!(token = %token, refname = ref_full_name, error = %e, "ref read failed");
            Error::io(format!("reading ref {}", ref_full_name), &e)
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
