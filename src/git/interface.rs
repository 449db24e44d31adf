//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in the
//! crate. All repository interactions flow through this interface, which
//! returns structured results and normalizes errors into the crate taxonomy.
//!
//! # Architecture
//!
//! The [`Git`] struct is the only way to interact with a materialized
//! repository. No other module should import `git2` directly. This ensures:
//!
//! - Consistent error handling across all Git operations
//! - Strong type guarantees at the boundary
//! - Read-only semantics: nothing in this interface mutates a repository
//!
//! # Example
//!
//! ```ignore
//! use gander::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open_store(Path::new("/var/lib/gander/repos/<token>"))?;
//! let commits = git.commits()?;
//! println!("{} commits reachable from refs", commits.len());
//! ```

use std::path::Path;
use std::time::SystemTime;

use crate::core::model::{Branch, Commit, IndexEntry, SymbolicReference, Tag};
use crate::core::types::Oid;
use crate::errors::Error;

/// The symbolic references probed by [`Git::symbolic_refs`].
const SYMBOLIC_REFS: [&str; 4] = ["HEAD", "ORIG_HEAD", "FETCH_HEAD", "MERGE_HEAD"];

/// Mask and shift for the merge-stage bits of an index entry's flags.
const INDEX_STAGE_MASK: u16 = 0x3000;
const INDEX_STAGE_SHIFT: u16 = 12;

/// The type tag of a raw object in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    fn from_git2(kind: git2::ObjectType, oid: &Oid) -> Result<Self, Error> {
        match kind {
            git2::ObjectType::Blob => Ok(ObjectKind::Blob),
            git2::ObjectType::Tree => Ok(ObjectKind::Tree),
            git2::ObjectType::Commit => Ok(ObjectKind::Commit),
            git2::ObjectType::Tag => Ok(ObjectKind::Tag),
            other => Err(Error::IoFailure {
                context: format!("reading object {}", oid),
                message: format!("object store returned unexpected type '{}'", other),
            }),
        }
    }

    /// Lowercase name as used in `git cat-file -t` output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw (type, bytes) pair read from the object store.
///
/// Immutable once read; objects are content-addressed, so a given id always
/// yields the same payload.
#[derive(Debug, Clone)]
pub struct RawObject {
    /// The object's type tag.
    pub kind: ObjectKind,
    /// The full decompressed payload.
    pub data: Vec<u8>,
}

/// The Git interface.
///
/// One instance wraps one opened repository. Instances are owned by the
/// resolver's handle cache and shared behind a mutex; `git2` repository
/// handles are `Send` but not `Sync`, so individual operations serialize on
/// that mutex.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Opening and Cloning
    // =========================================================================

    /// Open the repository materialized at `path`.
    ///
    /// Accepts both bare clones and (symlinked) worktree repositories.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if nothing is materialized at `path`
    /// - [`Error::IoFailure`] for any other open failure
    pub fn open_store(path: &Path) -> Result<Self, Error> {
        match git2::Repository::open(path) {
            Ok(repo) => Ok(Self { repo }),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Err(Error::NotFound {
                what: format!("repository at {}", path.display()),
            }),
            Err(e) => Err(Error::IoFailure {
                context: format!("opening repository at {}", path.display()),
                message: e.message().to_string(),
            }),
        }
    }

    /// Bare-clone `uri` into `into`.
    ///
    /// The destination must not exist yet. Callers are expected to clone
    /// into a temporary directory and atomically rename, so a failed clone
    /// never masquerades as a ready repository.
    ///
    /// # Errors
    ///
    /// [`Error::ProtocolFailure`] for any clone failure (network, protocol,
    /// or local I/O during the transfer).
    pub fn clone_bare(uri: &str, into: &Path) -> Result<(), Error> {
        git2::build::RepoBuilder::new()
            .bare(true)
            .clone(uri, into)
            .map_err(|e| Error::ProtocolFailure {
                uri: uri.to_string(),
                message: e.message().to_string(),
            })?;
        Ok(())
    }

    /// Path of the repository's git directory.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Whether the repository is a bare clone.
    pub fn is_bare(&self) -> bool {
        self.repo.is_bare()
    }

    // =========================================================================
    // Raw Objects
    // =========================================================================

    /// Read a raw (type, bytes) pair from the object store.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no object has this id
    /// - [`Error::IoFailure`] for underlying read failures
    pub fn raw_object(&self, oid: &Oid) -> Result<RawObject, Error> {
        let id = git2::Oid::from_str(oid.as_str()).map_err(Error::from)?;
        let odb = self.repo.odb()?;
        let object = odb.read(id).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound => Error::NotFound {
                what: format!("object {}", oid),
            },
            _ => Error::IoFailure {
                context: format!("reading object {}", oid),
                message: e.message().to_string(),
            },
        })?;

        Ok(RawObject {
            kind: ObjectKind::from_git2(object.kind(), oid)?,
            data: object.data().to_vec(),
        })
    }

    // =========================================================================
    // Commits
    // =========================================================================

    /// Enumerate every commit reachable from any ref.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when no ref points at a commit, i.e. the
    /// repository has an unborn HEAD. An empty repository is an error by
    /// contract, never an empty list.
    pub fn commits(&self) -> Result<Vec<Commit>, Error> {
        let mut walk = self.repo.revwalk()?;
        let mut pushed = false;

        for reference in self.repo.references()? {
            let reference = reference?;
            // Peeling skips refs that do not resolve to a commit (e.g. tags
            // of blobs) the same way `git log --all` does.
            if let Ok(commit) = reference.peel_to_commit() {
                walk.push(commit.id())?;
                pushed = true;
            }
        }
        if let Ok(head) = self.repo.head() {
            if let Ok(commit) = head.peel_to_commit() {
                walk.push(commit.id())?;
                pushed = true;
            }
        }

        if !pushed {
            return Err(Error::NotFound {
                what: "commits (the repository has an unborn HEAD)".to_string(),
            });
        }

        let mut commits = Vec::new();
        for oid in walk {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(Commit {
                id: commit.id().to_string(),
                parent_ids: commit.parent_ids().map(|p| p.to_string()).collect(),
                tree_id: commit.tree_id().to_string(),
            });
        }
        Ok(commits)
    }

    // =========================================================================
    // References
    // =========================================================================

    /// Enumerate local branches with their target commits.
    pub fn branches(&self) -> Result<Vec<Branch>, Error> {
        let mut branches = Vec::new();
        for entry in self.repo.branches(Some(git2::BranchType::Local))? {
            let (branch, _) = entry?;
            let reference = branch.get();
            let target = match reference.target() {
                Some(oid) => oid,
                None => continue,
            };
            branches.push(Branch {
                name: ref_name(reference),
                commit_id: target.to_string(),
            });
        }
        Ok(branches)
    }

    /// Enumerate tags, distinguishing annotated from lightweight ones.
    pub fn tags(&self) -> Result<Vec<Tag>, Error> {
        let mut tags = Vec::new();
        for entry in self.repo.references_glob("refs/tags/*")? {
            let reference = entry?;
            let target = match reference.target() {
                Some(oid) => oid,
                None => continue,
            };
            let tag = match self.repo.find_tag(target) {
                Ok(annotated) => {
                    let commit_id = reference
                        .peel_to_commit()
                        .map(|c| c.id())
                        .unwrap_or_else(|_| annotated.target_id());
                    Tag {
                        name: ref_name(&reference),
                        object_id: Some(target.to_string()),
                        commit_id: commit_id.to_string(),
                    }
                }
                Err(_) => Tag {
                    name: ref_name(&reference),
                    object_id: None,
                    commit_id: target.to_string(),
                },
            };
            tags.push(tag);
        }
        Ok(tags)
    }

    /// Probe the well-known symbolic refs (HEAD, ORIG_HEAD, FETCH_HEAD,
    /// MERGE_HEAD). Absent refs are skipped, not errors.
    pub fn symbolic_refs(&self) -> Result<Vec<SymbolicReference>, Error> {
        let mut refs = Vec::new();
        for name in SYMBOLIC_REFS {
            let reference = match self.repo.find_reference(name) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let target = if let Some(target_ref) = reference.symbolic_target() {
                target_ref.to_string()
            } else if let Some(oid) = reference.target() {
                oid.to_string()
            } else {
                continue;
            };
            refs.push(SymbolicReference {
                name: name.to_string(),
                target,
            });
        }
        Ok(refs)
    }

    // =========================================================================
    // Working Index
    // =========================================================================

    /// Enumerate the entries of the working index.
    ///
    /// # Errors
    ///
    /// [`Error::Unavailable`] on a bare repository (no index).
    pub fn index_entries(&self) -> Result<Vec<IndexEntry>, Error> {
        if self.repo.is_bare() {
            return Err(Error::Unavailable {
                message: "the repository is bare and has no index".to_string(),
            });
        }

        let index = self.repo.index()?;
        let mut entries = Vec::with_capacity(index.len());
        for entry in index.iter() {
            entries.push(IndexEntry {
                id: entry.id.to_string(),
                path: String::from_utf8_lossy(&entry.path).into_owned(),
                mode: format!("{:o}", entry.mode),
                stage: u32::from((entry.flags & INDEX_STAGE_MASK) >> INDEX_STAGE_SHIFT),
            });
        }
        Ok(entries)
    }

    /// Last-modified time of the index file.
    ///
    /// # Errors
    ///
    /// - [`Error::Unavailable`] on a bare repository
    /// - [`Error::IoFailure`] when the index file is missing or unreadable
    pub fn index_mtime(&self) -> Result<SystemTime, Error> {
        if self.repo.is_bare() {
            return Err(Error::Unavailable {
                message: "the repository is bare and has no index".to_string(),
            });
        }

        let path = self.repo.path().join("index");
        let metadata = std::fs::metadata(&path)
            .map_err(|e| Error::io(format!("reading metadata of {}", path.display()), &e))?;
        metadata
            .modified()
            .map_err(|e| Error::io(format!("reading mtime of {}", path.display()), &e))
    }
}

/// Full ref name, tolerating non-UTF-8 names.
fn ref_name(reference: &git2::Reference<'_>) -> String {
    match reference.name() {
        Some(name) => name.to_string(),
        None => String::from_utf8_lossy(reference.name_bytes()).into_owned(),
    }
}
