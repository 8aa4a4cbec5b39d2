// ABOUTME: Waiting for an image tag to become available in a registry.
// ABOUTME: Request, backoff policy, polling loop, and outcome interpretation.

mod backoff;
mod error;
mod outcome;
mod poller;
mod request;

pub use backoff::{Backoff, BackoffError};
pub use error::{WaitError, WaitErrorKind};
pub use outcome::{PollOutcome, WaitResult};
pub use poller::RegistryPoller;
pub use request::{DEFAULT_REGISTRY, DEFAULT_TIMEOUT, WaitRequest};
