//! Common error types for DriveRelay.

use thiserror::Error;

/// Top-level error type for DriveRelay operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Authorization-code exchange rejected by the identity provider.
    /// Surfaced as a login failure; never retried.
    #[error("Auth exchange failed: {0}")]
    AuthExchange(String),

    /// No refresh credential present; the caller must log in.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Refresh credential invalid or expired. Terminal for the session;
    /// forces a full re-authentication.
    #[error("Refresh credential rejected")]
    RefreshRejected,

    /// Access credential rejected by the Drive service. Triggers the
    /// one-shot refresh-and-retry protocol in the request gateway.
    #[error("Access credential rejected")]
    Unauthorized,

    /// Requested file is a native editor document without binary content.
    #[error("Unsupported export: {0}")]
    UnsupportedExport(String),

    /// Any other external-service failure.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether this error represents a rejected access credential, i.e.
    /// the one condition the request gateway is allowed to retry after.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized)
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
