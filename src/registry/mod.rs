// ABOUTME: Registry collaborator traits and the HTTP implementation.
// ABOUTME: The poller only needs "connect" and "list tags" from a registry.

mod auth;
mod error;
mod http;

pub use auth::Challenge;
pub use error::{RegistryError, RegistryErrorKind, Result};
pub use http::{HttpConnector, HttpRegistry};

use crate::types::Credentials;
use async_trait::async_trait;

/// Lists the tags published under a repository.
#[async_trait]
pub trait TagLister: Send + Sync {
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>>;
}

/// Opens an authenticated session against a registry endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    type Client: TagLister;

    /// Connect and log in. Failures here are never retried.
    async fn connect(&self, url: &str, credentials: &Credentials) -> Result<Self::Client>;
}
