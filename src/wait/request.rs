// ABOUTME: Per-invocation wait request with builder-style setters.
// ABOUTME: Holds registry, credentials, image string, timeout, and timeout policy.

use crate::types::Credentials;
use std::time::Duration;

pub const DEFAULT_REGISTRY: &str = "registry.hub.docker.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Everything needed to wait for one image tag.
#[derive(Debug, Clone)]
pub struct WaitRequest {
    /// Registry host, optionally with a port (no scheme).
    pub registry: String,
    /// Login for the registry. Empty means anonymous.
    pub credentials: Credentials,
    /// Image string as given by the user, e.g. `app:v2`.
    pub image: String,
    /// How long to keep polling.
    pub timeout: Duration,
    /// Whether running out of time is an error or just `exists = false`.
    pub fail_after_timeout: bool,
    /// Talk plain HTTP instead of HTTPS.
    pub insecure: bool,
}

impl WaitRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            registry: DEFAULT_REGISTRY.to_string(),
            credentials: Credentials::anonymous(),
            image: image.into(),
            timeout: DEFAULT_TIMEOUT,
            fail_after_timeout: true,
            insecure: false,
        }
    }

    pub fn registry(mut self, registry: impl Into<String>) -> Self {
        self.registry = registry.into();
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn fail_after_timeout(mut self, fail: bool) -> Self {
        self.fail_after_timeout = fail;
        self
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Registry base URL with the transport scheme prefixed.
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.insecure { "http" } else { "https" };
        format!("{}://{}", scheme, self.registry)
    }
}
