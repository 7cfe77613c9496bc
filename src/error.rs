//! Error types for the metior library surface.
//!
//! Backends report failures as `anyhow::Error`; the engine wraps them in
//! [`Error::Backend`] without altering the chain so callers can still see
//! the original cause.

use thiserror::Error;

use crate::vcs::Capability;

/// Errors returned by the registry and the repository engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A query needs a capability the backend does not declare.
    #[error("the {backend} backend does not support {capability}")]
    UnsupportedOperation {
        backend: String,
        capability: Capability,
    },

    /// No backend is registered under this name.
    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    /// The backend failed while fetching raw history.
    #[error("the {backend} backend failed to load history")]
    Backend {
        backend: String,
        #[source]
        source: anyhow::Error,
    },

    /// A raw commit record is missing a required field.
    #[error("invalid commit record {id:?}: {reason}")]
    InvalidRecord { id: String, reason: String },
}

impl Error {
    pub(crate) fn backend(backend: &str, source: anyhow::Error) -> Self {
        Error::Backend {
            backend: backend.to_string(),
            source,
        }
    }
}

/// Result type alias for metior operations.
pub type Result<T> = std::result::Result<T, Error>;
