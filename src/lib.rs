//! Gander - a core library for browsing a Git repository's object graph
//!
//! Gander turns an arbitrary repository URI into a stable opaque token,
//! materializes the repository into a shared on-disk store (symlink for local
//! paths, bare clone for remote URLs), and exposes the repository's commits,
//! trees, references, and working index as flat records suitable for a
//! request/response boundary. The transport layer (routing, serialization,
//! HTTP semantics) is deliberately not part of this crate.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`browser`] - Facade consumed by the transport layer
//! - [`resolver`] - Token derivation, materialization, locking, handle cache
//! - [`objects`] - Raw object access and tree decoding
//! - [`refs`] - Branch/tag/symbolic-reference enumeration
//! - [`index`] - Working-index enumeration
//! - [`git`] - Single interface for all Git operations
//! - [`core`] - Domain types, models, and configuration
//! - [`errors`] - Crate-wide error taxonomy
//!
//! # Correctness Invariants
//!
//! Gander maintains the following invariants:
//!
//! 1. Equal canonical URIs always derive equal tokens
//! 2. At most one clone executes per token, process-wide and store-wide
//! 3. A token is marked ready only after its repository fully materialized
//! 4. Cached raw objects are immutable and keyed by content id

pub mod browser;
pub mod core;
pub mod errors;
pub mod git;
pub mod index;
pub mod objects;
pub mod refs;
pub mod resolver;

pub use crate::browser::Browser;
pub use crate::core::config::StoreConfig;
pub use crate::errors::{Error, ErrorKind};
