// ABOUTME: Registry client error types with SNAFU pattern.
// ABOUTME: Connection, authentication, and tag-listing failures with a kind() accessor.

use snafu::Snafu;
use std::time::Duration;

/// Errors from talking to a registry.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RegistryError {
    #[snafu(display("invalid registry url {url}: {message}"))]
    InvalidUrl { url: String, message: String },

    #[snafu(display("request to {url} failed: {source}"))]
    Request { url: String, source: reqwest::Error },

    #[snafu(display("registry at {url} rejected the credentials"))]
    Unauthorized { url: String },

    #[snafu(display("repository not found at {url}"))]
    NotFound { url: String },

    #[snafu(display("unexpected status {status} from {url}"))]
    UnexpectedStatus { url: String, status: u16 },

    #[snafu(display("token request to {realm} failed: {message}"))]
    Token { realm: String, message: String },

    #[snafu(display("could not decode response from {url}: {message}"))]
    Decode { url: String, message: String },

    #[snafu(display("tag query for {repository} did not finish within {}ms", elapsed.as_millis()))]
    QueryTimedOut {
        repository: String,
        elapsed: Duration,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryErrorKind {
    /// Bad registry address.
    InvalidUrl,
    /// Network or TLS failure.
    Transport,
    /// Credentials missing or rejected.
    Unauthorized,
    /// Repository does not exist (yet).
    NotFound,
    /// Registry answered with something we could not use.
    Protocol,
    /// Tag query was cut off by the poller.
    TimedOut,
}

impl RegistryError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> RegistryErrorKind {
        match self {
            RegistryError::InvalidUrl { .. } => RegistryErrorKind::InvalidUrl,
            RegistryError::Request { .. } => RegistryErrorKind::Transport,
            RegistryError::Unauthorized { .. } | RegistryError::Token { .. } => {
                RegistryErrorKind::Unauthorized
            }
            RegistryError::NotFound { .. } => RegistryErrorKind::NotFound,
            RegistryError::UnexpectedStatus { .. } | RegistryError::Decode { .. } => {
                RegistryErrorKind::Protocol
            }
            RegistryError::QueryTimedOut { .. } => RegistryErrorKind::TimedOut,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
