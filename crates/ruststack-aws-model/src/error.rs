//! Errors raised while loading or querying a service model.

use std::path::PathBuf;

/// Errors produced by [`ServiceModel`](crate::ServiceModel) loading and lookups.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The model document is not valid botocore JSON.
    #[error("invalid service model JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The model file could not be read.
    #[error("failed to read service model {}: {source}", path.display())]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A shape reference points at a shape the model does not define.
    #[error("shape {name} referenced by {referenced_by} is not defined")]
    UnknownShape {
        /// Missing shape name.
        name: String,
        /// Shape or operation holding the dangling reference.
        referenced_by: String,
    },

    /// A shape is structurally incomplete (e.g. a list without `member`).
    #[error("shape {name} is invalid: {reason}")]
    InvalidShape {
        /// Offending shape.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// `metadata.protocol` names a protocol this codec layer does not speak.
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// No operation with this name exists in the service.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// No operation is bound to this HTTP method and path.
    #[error("no operation matches {method} {path}")]
    NoMatchingOperation {
        /// Request method.
        method: String,
        /// Request path without the query string.
        path: String,
    },
}

/// A header name or value that cannot be placed in an HTTP message.
#[derive(Debug, thiserror::Error)]
#[error("invalid header {name}: {value:?}")]
pub struct InvalidHeader {
    /// Header name as requested.
    pub name: String,
    /// Rejected value.
    pub value: String,
}
