// ABOUTME: Error types for waiting on an image tag.
// ABOUTME: Covers malformed images, registry login failures, and timeouts.

use crate::registry::RegistryError;
use crate::types::ParseImageRefError;
use std::time::Duration;

/// Errors that end a wait.
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    /// The image string could not be split into repository and tag.
    #[error(transparent)]
    InvalidImageFormat(#[from] ParseImageRefError),

    /// Connecting or logging in to the registry failed.
    #[error("could not connect/log in to registry: {0}")]
    Connection(#[source] RegistryError),

    /// The tag did not show up before the deadline.
    #[error(
        "ran into timeout after {}s, tried to access image {attempts} times but couldn't find it",
        .timeout.as_secs()
    )]
    Timeout { attempts: u32, timeout: Duration },

    /// The caller cancelled the wait.
    #[error("wait interrupted")]
    Interrupted,
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitErrorKind {
    InvalidImageFormat,
    Connection,
    Timeout,
    Interrupted,
}

impl WaitError {
    pub fn kind(&self) -> WaitErrorKind {
        match self {
            WaitError::InvalidImageFormat(_) => WaitErrorKind::InvalidImageFormat,
            WaitError::Connection(_) => WaitErrorKind::Connection,
            WaitError::Timeout { .. } => WaitErrorKind::Timeout,
            WaitError::Interrupted => WaitErrorKind::Interrupted,
        }
    }
}
