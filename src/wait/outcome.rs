// ABOUTME: Poll outcomes and how they map to the caller-facing result.
// ABOUTME: Applies the fail-after-timeout policy; hard failures always propagate.

use super::error::WaitError;
use super::request::WaitRequest;
use crate::types::ImageRef;
use chrono::Utc;
use serde::Serialize;

/// Terminal state of one poll.
#[derive(Debug)]
pub enum PollOutcome {
    /// The tag is listed. `retries` counts the failed checks before it appeared.
    Found { image: ImageRef, retries: u32 },
    /// The deadline passed first. `attempts` counts every tag query made.
    TimedOut {
        attempts: u32,
        last_error: Option<String>,
    },
    /// Connecting or parsing failed; nothing was retried.
    Failed(WaitError),
}

/// What the caller gets back from a wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitResult {
    pub exists: bool,
    pub full_image: Option<String>,
    /// Changes on every call.
    pub id: String,
}

impl PollOutcome {
    pub fn into_result(self, request: &WaitRequest) -> Result<WaitResult, WaitError> {
        match self {
            PollOutcome::Found { image, .. } => Ok(WaitResult {
                exists: true,
                full_image: Some(image.full_reference(&request.registry)),
                id: invocation_id(),
            }),
            PollOutcome::TimedOut { attempts, .. } if request.fail_after_timeout => {
                Err(WaitError::Timeout {
                    attempts,
                    timeout: request.timeout,
                })
            }
            PollOutcome::TimedOut { .. } => Ok(WaitResult {
                exists: false,
                full_image: None,
                id: invocation_id(),
            }),
            PollOutcome::Failed(err) => Err(err),
        }
    }
}

fn invocation_id() -> String {
    Utc::now().timestamp_micros().to_string()
}
