// ABOUTME: Registry polling loop that waits for an image tag to appear.
// ABOUTME: Connects once, then lists tags with a linear backoff until found or out of time.

use super::backoff::Backoff;
use super::error::WaitError;
use super::outcome::{PollOutcome, WaitResult};
use super::request::WaitRequest;
use crate::registry::{Connector, RegistryError, TagLister};
use crate::types::ImageRef;
use std::time::Duration;
use tokio::time::{Instant, sleep_until, timeout_at};

/// Upper bound on any interval added to the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Loop bookkeeping for one poll.
#[derive(Debug)]
struct PollState {
    retries: u32,
    deadline: Instant,
    last_error: Option<String>,
}

impl PollState {
    fn new(timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            retries: 0,
            deadline: now
                .checked_add(timeout.min(FAR_FUTURE))
                .unwrap_or(now),
            last_error: None,
        }
    }

    /// Checked against the monotonic clock, not the number of sleeps.
    fn timeout_elapsed(&self) -> bool {
        Instant::now() >= self.deadline
    }

    fn attempts(&self) -> u32 {
        self.retries + 1
    }
}

/// Waits for image tags to show up in a registry.
#[derive(Debug, Clone)]
pub struct RegistryPoller<C> {
    connector: C,
    backoff: Backoff,
}

impl<C: Connector> RegistryPoller<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            backoff: Backoff::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Wait for the tag and apply the fail-after-timeout policy.
    pub async fn wait(&self, request: &WaitRequest) -> Result<WaitResult, WaitError> {
        self.poll(request).await.into_result(request)
    }

    /// Connect, parse the image, then poll until found or timed out.
    pub async fn poll(&self, request: &WaitRequest) -> PollOutcome {
        let url = request.endpoint_url();
        tracing::debug!("Connecting to registry {}", url);

        let client = match self.connector.connect(&url, &request.credentials).await {
            Ok(client) => client,
            Err(e) => return PollOutcome::Failed(WaitError::Connection(e)),
        };

        let image = match ImageRef::parse(&request.image) {
            Ok(image) => image,
            Err(e) => return PollOutcome::Failed(e.into()),
        };

        self.poll_tags(&client, image, request.timeout).await
    }

    async fn poll_tags(
        &self,
        client: &C::Client,
        image: ImageRef,
        timeout: Duration,
    ) -> PollOutcome {
        let mut state = PollState::new(timeout);
        tracing::info!("Waiting up to {}s for {}", timeout.as_secs(), image);

        loop {
            let delay = self.backoff.delay(state.retries).min(FAR_FUTURE);

            // A hung query may run past the deadline by at most one backoff interval.
            let started = Instant::now();
            let cutoff = state.deadline.max(started + delay);
            let result = match timeout_at(cutoff, client.list_tags(image.repository())).await {
                Ok(result) => result,
                Err(_) => Err(RegistryError::QueryTimedOut {
                    repository: image.repository().to_string(),
                    elapsed: started.elapsed(),
                }),
            };

            match result {
                Ok(tags) if tags.iter().any(|t| t == image.tag()) => {
                    tracing::info!("Found {} after {} retries", image, state.retries);
                    return PollOutcome::Found {
                        image,
                        retries: state.retries,
                    };
                }
                Ok(_) => {
                    tracing::debug!(
                        "Tag {} not listed yet (attempt {})",
                        image.tag(),
                        state.attempts()
                    );
                }
                Err(e) => {
                    tracing::warn!("Tag query failed (attempt {}): {}", state.attempts(), e);
                    state.last_error = Some(e.to_string());
                }
            }

            if state.timeout_elapsed() {
                tracing::warn!(
                    "Gave up on {} after {} attempts",
                    image,
                    state.attempts()
                );
                return PollOutcome::TimedOut {
                    attempts: state.attempts(),
                    last_error: state.last_error,
                };
            }

            sleep_until((Instant::now() + delay).min(state.deadline)).await;
            state.retries += 1;
        }
    }
}
