//! Error types for the admission engine

use thiserror::Error;

/// Main error type for codec, patch and server operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The admitted object bytes could not be decoded into a Pod
    #[error("failed to decode object: {0}")]
    Decode(#[source] serde_json::Error),

    /// A Pod could not be serialized back to bytes
    #[error("failed to encode object: {0}")]
    Encode(#[source] serde_json::Error),

    /// The JSON Patch between two snapshots could not be produced
    #[error("failed to create JSON patch: {0}")]
    Patch(String),

    /// TLS material could not be loaded
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// The HTTPS listener failed
    #[error("server error: {0}")]
    Server(String),

    /// The tracing subscriber could not be installed
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

impl Error {
    /// Create a patch error with the given message
    pub fn patch(msg: impl Into<String>) -> Self {
        Self::Patch(msg.into())
    }

    /// Create a TLS configuration error with the given message
    pub fn tls(msg: impl Into<String>) -> Self {
        Self::Tls(msg.into())
    }

    /// Create a server error with the given message
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    /// Whether this error was caused by the caller's input rather than by the engine
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Error::Decode(_))
    }
}
