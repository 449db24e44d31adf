//! errors
//!
//! Crate-wide error taxonomy.
//!
//! Every failure in materialization, handle opening, or object decoding is
//! surfaced to the caller with enough context (token, object id, operation)
//! to log and diagnose. Nothing is silently swallowed or retried here; the
//! transport layer maps [`ErrorKind`] onto its own status categories.

use thiserror::Error;

/// Errors raised by the browser core.
///
/// The variants form a closed taxonomy. Higher layers should match on
/// [`Error::kind`] rather than on display strings.
#[derive(Debug, Error)]
pub enum Error {
    /// An object, reference, or path does not exist.
    #[error("not found: {what}")]
    NotFound {
        /// Description of what was looked up
        what: String,
    },

    /// An object exists but is not the expected kind.
    #[error("object {oid} is not a {expected} (it is a {actual})")]
    WrongType {
        /// The object id that was looked up
        oid: String,
        /// The kind the caller asked for
        expected: &'static str,
        /// The kind the object actually has
        actual: String,
    },

    /// The repository cannot serve this operation (e.g. no index on a bare
    /// clone).
    #[error("operation unavailable: {message}")]
    Unavailable {
        /// Description of the unsatisfied requirement
        message: String,
    },

    /// A local filesystem or object-store read failed.
    #[error("I/O failure while {context}: {message}")]
    IoFailure {
        /// The operation that was underway
        context: String,
        /// The underlying error text
        message: String,
    },

    /// A clone or fetch against the remote failed.
    #[error("protocol failure for {uri}: {message}")]
    ProtocolFailure {
        /// The remote URI involved
        uri: String,
        /// The underlying error text
        message: String,
    },

    /// Insufficient privilege to create a symlink or write the store.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Description of the refused action
        message: String,
    },
}

/// Discriminant of [`Error`], for transport-layer status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    WrongType,
    Unavailable,
    IoFailure,
    ProtocolFailure,
    PermissionDenied,
}

impl Error {
    /// Build an [`Error::IoFailure`] from an `std::io::Error` with context.
    pub fn io(context: impl Into<String>, err: &std::io::Error) -> Self {
        Error::IoFailure {
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// The taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::WrongType { .. } => ErrorKind::WrongType,
            Error::Unavailable { .. } => ErrorKind::Unavailable,
            Error::IoFailure { .. } => ErrorKind::IoFailure,
            Error::ProtocolFailure { .. } => ErrorKind::ProtocolFailure,
            Error::PermissionDenied { .. } => ErrorKind::PermissionDenied,
        }
    }
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::UnbornBranch => Error::NotFound {
                what: err.message().to_string(),
            },
            git2::ErrorCode::BareRepo => Error::Unavailable {
                message: err.message().to_string(),
            },
            _ => Error::IoFailure {
                context: "git object store access".to_string(),
                message: err.message().to_string(),
            },
        }
    }
}
