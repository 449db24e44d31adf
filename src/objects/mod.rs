//! objects
//!
//! Object store access: raw reads, tree decoding, and the commit/tree/
//! contents projections built on them.
//!
//! # Caching
//!
//! Raw (type, bytes) pairs are memoized per (token, object id). Objects are
//! content-addressed and immutable, so a cached value is always correct;
//! the cache is bounded by explicit configuration
//! ([`StoreConfig::raw_cache_limit`](crate::core::config::StoreConfig)) and
//! evicts in insertion order when full.

pub mod tree;

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tracing::{debug, error};

use crate::core::model::{Commit, Tree};
use crate::core::types::{Oid, Token};
use crate::errors::Error;
use crate::git::{ObjectKind, RawObject};
use crate::resolver::Resolver;

/// Bounded memoization of raw object reads.
///
/// Keys are (token, id); values are shared so a cached payload is never
/// copied per reader. Eviction is FIFO over insertion order, which keeps
/// the policy trivial to reason about and to test.
struct RawCache {
    limit: Option<usize>,
    map: HashMap<(Token, Oid), Arc<RawObject>>,
    order: VecDeque<(Token, Oid)>,
}

impl RawCache {
    fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &(Token, Oid)) -> Option<Arc<RawObject>> {
        self.map.get(key).cloned()
    }

    fn insert(&mut self, key: (Token, Oid), value: Arc<RawObject>) {
        if let Some(limit) = self.limit {
            if limit == 0 {
                return;
            }
            while self.map.len() >= limit {
                match self.order.pop_front() {
                    Some(oldest) => {
                        self.map.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
        if self.map.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
    }
}

/// Reader for commits, trees, and object contents.
pub struct Objects {
    resolver: Arc<Resolver>,
    cache: Mutex<RawCache>,
}

impl Objects {
    /// Create a reader over a resolver; cache capacity comes from the
    /// resolver's configuration.
    pub fn new(resolver: Arc<Resolver>) -> Self {
        let limit = resolver.config().raw_cache_limit;
        Self {
            resolver,
            cache: Mutex::new(RawCache::new(limit)),
        }
    }

    // =========================================================================
    // Raw Access
    // =========================================================================

    /// Fetch the raw (type, bytes) pair for an object, memoized per
    /// (token, id).
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the object does not exist
    /// - [`Error::IoFailure`] for underlying read failures
    pub fn raw(&self, token: &Token, id: &Oid) -> Result<Arc<RawObject>, Error> {
        let key = (token.clone(), id.clone());
        if let Some(hit) = self.cache.lock().expect("raw cache poisoned").get(&key) {
            return Ok(hit);
        }

        let handle = self.resolver.handle(token)?;
        let raw = {
            let git = handle.lock().expect("repository handle poisoned");
            git.raw_object(id).map_err(|e| {
                error!(token = %token, oid = %id, error = %e, "raw object read failed");
                e
            })?
        };
        debug!(token = %token, oid = %id, kind = %raw.kind, "read raw object");

        let raw = Arc::new(raw);
        self.cache
            .lock()
            .expect("raw cache poisoned")
            .insert(key, raw.clone());
        Ok(raw)
    }

    // =========================================================================
    // Projections
    // =========================================================================

    /// Human-readable contents of an object.
    ///
    /// Trees render one line per entry as `<mode> <tree|blob> <id> <name>`;
    /// every other kind renders its payload as text.
    pub fn contents(&self, token: &Token, id: &Oid) -> Result<String, Error> {
        let raw = self.raw(token, id)?;
        if raw.kind != ObjectKind::Tree {
            return Ok(String::from_utf8_lossy(&raw.data).into_owned());
        }

        let mut rendered = String::new();
        for entry in tree::decode(&raw.data)? {
            let kind = if entry.is_tree() { "tree" } else { "blob" };
            rendered.push_str(&format!(
                "{} {} {} {}\n",
                entry.mode, kind, entry.id, entry.name
            ));
        }
        Ok(rendered)
    }

    /// Every commit reachable from any ref, as id / parents / tree triples.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] on a repository with no commits (unborn HEAD).
    pub fn commits(&self, token: &Token) -> Result<Vec<Commit>, Error> {
        let handle = self.resolver.handle(token)?;
        let git = handle.lock().expect("repository handle poisoned");
        git.commits().map_err(|e| {
            error!(token = %token, error = %e, "commit enumeration failed");
            e
        })
    }

    /// Fetch and decode the given tree objects.
    ///
    /// Each tree's entries are partitioned into id -> name mappings for
    /// subtrees and blobs.
    ///
    /// # Errors
    ///
    /// - [`Error::WrongType`] if any id names a non-tree object (reported
    ///   with the id and the actual type)
    /// - [`Error::NotFound`] if any id does not exist
    pub fn trees(&self, token: &Token, ids: &[Oid]) -> Result<Vec<Tree>, Error> {
        let mut trees = Vec::with_capacity(ids.len());
        for id in ids {
            let raw = self.raw(token, id)?;
            if raw.kind != ObjectKind::Tree {
                error!(token = %token, oid = %id, actual = %raw.kind, "object is not a tree");
                return Err(Error::WrongType {
                    oid: id.to_string(),
                    expected: "tree",
                    actual: raw.kind.as_str().to_string(),
                });
            }

            let mut subtrees = BTreeMap::new();
            let mut blobs = BTreeMap::new();
            for entry in tree::decode(&raw.data)? {
                if entry.is_tree() {
                    subtrees.insert(entry.id, entry.name);
                } else {
                    blobs.insert(entry.id, entry.name);
                }
            }
            trees.push(Tree {
                id: id.to_string(),
                trees: subtrees,
                blobs,
            });
        }
        Ok(trees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_blob(byte: u8) -> Arc<RawObject> {
        Arc::new(RawObject {
            kind: ObjectKind::Blob,
            data: vec![byte],
        })
    }

    fn key(n: u8) -> (Token, Oid) {
        let hex = format!("{:02x}", n).repeat(20);
        (Token::new(hex.clone()).unwrap(), Oid::new(hex).unwrap())
    }

    #[test]
    fn unbounded_cache_keeps_everything() {
        let mut cache = RawCache::new(None);
        for n in 0..50 {
            cache.insert(key(n), raw_blob(n));
        }
        assert!(cache.get(&key(0)).is_some());
        assert!(cache.get(&key(49)).is_some());
    }

    #[test]
    fn bounded_cache_evicts_in_insertion_order() {
        let mut cache = RawCache::new(Some(2));
        cache.insert(key(1), raw_blob(1));
        cache.insert(key(2), raw_blob(2));
        cache.insert(key(3), raw_blob(3));

        assert!(cache.get(&key(1)).is_none());
        assert!(cache.get(&key(2)).is_some());
        assert!(cache.get(&key(3)).is_some());
    }

    #[test]
    fn reinserting_same_key_does_not_grow_order() {
        let mut cache = RawCache::new(Some(2));
        cache.insert(key(1), raw_blob(1));
        cache.insert(key(1), raw_blob(1));
        cache.insert(key(2), raw_blob(2));

        assert!(cache.get(&key(1)).is_some());
        assert!(cache.get(&key(2)).is_some());
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let mut cache = RawCache::new(Some(0));
        cache.insert(key(1), raw_blob(1));
        assert!(cache.get(&key(1)).is_none());
    }
}
