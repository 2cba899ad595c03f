//! Deadline-bounded polling
//!
//! Observations are taken at a fixed interval until the target holds or a
//! monotonic deadline passes. Slow observations eat into the budget
//! instead of extending it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// How long and how often to poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PollSettings {
    pub timeout: Duration,
    pub interval: Duration,
    /// Consecutive unexpected observations tolerated before giving up
    pub unexpected_limit: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            interval: Duration::from_secs(10),
            unexpected_limit: 3,
        }
    }
}

impl PollSettings {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            ..Default::default()
        }
    }
}

/// The outcome of one observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation<T> {
    /// The target holds
    Converged(T),
    /// A recognised intermediate state, keep polling
    Pending(String),
    /// A state outside the vocabulary, tolerated only briefly
    Unexpected(String),
}

/// Poll `observe` until it converges.
///
/// Transient fetch errors count as pending observations; any other error
/// is returned at once. Fails with [`Error::UnexpectedState`] once
/// `unexpected_limit` unexpected observations arrive in a row, and with
/// [`Error::ConvergenceTimeout`] carrying the last observation when the
/// deadline passes.
pub async fn poll_until<T, F, Fut>(what: &str, settings: &PollSettings, mut observe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Observation<T>>>,
{
    let deadline = Instant::now() + settings.timeout;
    let mut unexpected = 0;

    loop {
        let last = match observe().await {
            Ok(Observation::Converged(value)) => return Ok(value),
            Ok(Observation::Pending(state)) => {
                unexpected = 0;
                state
            }
            Ok(Observation::Unexpected(state)) => {
                unexpected += 1;
                if unexpected >= settings.unexpected_limit {
                    return Err(Error::UnexpectedState {
                        what: what.to_string(),
                        last: state,
                    });
                }
                state
            }
            Err(e) if e.is_transient() => {
                debug!(what, error = %e, "transient error while polling");
                e.to_string()
            }
            Err(e) => return Err(e),
        };

        let now = Instant::now();
        if now >= deadline {
            return Err(Error::ConvergenceTimeout {
                what: what.to_string(),
                timeout: settings.timeout,
                last,
            });
        }
        debug!(what, last = %last, "not converged yet");
        tokio::time::sleep(settings.interval.min(deadline - now)).await;
    }
}
