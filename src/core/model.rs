//! core::model
//!
//! Flat projection records served to the transport layer.
//!
//! Each record is built once per request from decoded repository data and
//! never mutated afterwards. All fields hold rendered strings so a transport
//! layer can serialize them without touching Git types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A commit, reduced to its position in the object graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit object id (40 hex chars).
    pub id: String,
    /// Parent commit ids, in recorded order. Empty for root commits.
    pub parent_ids: Vec<String>,
    /// Id of the tree the commit snapshots.
    pub tree_id: String,
}

/// A tree, with its entries partitioned by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Tree object id.
    pub id: String,
    /// Subtree entries: object id -> directory name.
    pub trees: BTreeMap<String, String>,
    /// Blob entries: object id -> file name.
    pub blobs: BTreeMap<String, String>,
}

/// A local branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Full ref name, e.g. `refs/heads/main`.
    pub name: String,
    /// Id of the commit the branch points at.
    pub commit_id: String,
}

/// A tag, lightweight or annotated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Full ref name, e.g. `refs/tags/v1.0`.
    pub name: String,
    /// Id of the tag object for annotated tags, `None` for lightweight tags.
    pub object_id: Option<String>,
    /// Id of the commit the tag (after peeling) points at.
    pub commit_id: String,
}

/// A symbolic reference such as HEAD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolicReference {
    /// Reference name, e.g. `HEAD`.
    pub name: String,
    /// Target ref name when attached, target commit id when detached.
    pub target: String,
}

/// The working index of a non-bare repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Entries in index order.
    pub entries: Vec<IndexEntry>,
    /// When the index file was last modified.
    pub last_modified: DateTime<Utc>,
}

/// One entry of the working index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Id of the staged blob.
    pub id: String,
    /// Path of the file relative to the worktree root.
    pub path: String,
    /// File mode as an octal string, e.g. `100644`.
    pub mode: String,
    /// Merge stage (0 for a normal entry, 1-3 during conflicts).
    pub stage: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_serializes_flat() {
        let commit = Commit {
            id: "a".repeat(40),
            parent_ids: vec!["b".repeat(40)],
            tree_id: "c".repeat(40),
        };
        let json = serde_json::to_value(&commit).unwrap();
        assert_eq!(json["id"], "a".repeat(40));
        assert_eq!(json["parent_ids"][0], "b".repeat(40));
        assert_eq!(json["tree_id"], "c".repeat(40));
    }

    #[test]
    fn lightweight_tag_has_no_object_id() {
        let tag = Tag {
            name: "refs/tags/v1".into(),
            object_id: None,
            commit_id: "d".repeat(40),
        };
        let json = serde_json::to_value(&tag).unwrap();
        assert!(json["object_id"].is_null());
    }

    #[test]
    fn tree_maps_are_ordered_by_id() {
        let mut trees = BTreeMap::new();
        trees.insert("b".repeat(40), "later".to_string());
        trees.insert("a".repeat(40), "earlier".to_string());
        let tree = Tree {
            id: "c".repeat(40),
            trees,
            blobs: BTreeMap::new(),
        };
        let ids: Vec<&String> = tree.trees.keys().collect();
        assert!(ids[0] < ids[1]);
    }
}
