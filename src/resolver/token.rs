//! resolver::token
//!
//! Pure token derivation: repository URI -> stable opaque identifier.
//!
//! # Canonical form
//!
//! A URI that parses as an absolute URL canonicalizes to
//! `<host> + "/" + <path>` and classifies as **remote** (the URL path keeps
//! its leading slash, so remote canonical forms contain a double slash; this
//! is deliberate and must not change, because it is what existing tokens
//! were derived from). Anything else is treated as a filesystem path,
//! absolutized and lexically normalized, and classifies as **local**.
//!
//! The token is the lowercase-hex SHA-1 of the canonical form's UTF-8 bytes.
//!
//! # Known classification gaps (kept for token stability)
//!
//! - `file://` URLs parse as URLs and therefore classify as remote; they are
//!   cloned rather than symlinked.
//! - SSH scp syntax (`git@host:path`) does not parse as a URL and therefore
//!   classifies as a local path, which subsequently fails materialization.

use std::path::{Component, Path, PathBuf};

use sha1::{Digest, Sha1};
use url::Url;

use crate::core::types::Token;

/// The outcome of token derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derived {
    /// The stable token for this URI.
    pub token: Token,
    /// The canonical form the token was hashed from. For local URIs this is
    /// the absolute normalized path.
    pub canonical: String,
    /// Whether the URI names a local filesystem path.
    pub is_local: bool,
}

/// Derive the token for a repository URI.
///
/// Pure and deterministic: equal canonical forms always yield equal tokens.
pub fn derive(uri: &str) -> Derived {
    let (canonical, is_local) = match Url::parse(uri) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default();
            (format!("{}/{}", host, url.path()), false)
        }
        Err(_) => (absolutize(Path::new(uri)).display().to_string(), true),
    };

    let mut hasher = Sha1::new();
    hasher.update(canonical.as_bytes());
    let digest: [u8; 20] = hasher.finalize().into();

    Derived {
        token: Token::from_digest(&digest),
        canonical,
        is_local,
    }
}

/// Make a path absolute and lexically normalized, without touching the
/// filesystem (the path is not required to exist yet).
fn absolutize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("/"))
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
