/// Startup sequencing
///
/// Runs a fallible startup step until it succeeds or the
/// attempt budget runs out, sleeping a fixed delay between attempts. Readiness
/// is only checked here, once, before the HTTP listener is bound.

use crate::config::StartupConfig;
use std::{future::Future, time::Duration};
use thiserror::Error;

/// Bounded, fixed-delay retry parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// A budget of zero attempts is treated as one
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&StartupConfig::default())
    }
}

impl From<&StartupConfig> for RetryPolicy {
    fn from(config: &StartupConfig) -> Self {
        Self::new(config.max_attempts, config.retry_delay())
    }
}

/// Where the sequencer currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupState {
    /// Running attempt number `k` (1-based)
    Attempting(u32),
    Ready,
    Failed,
}

/// Attempt budget exhausted; carries the error from the last attempt
#[derive(Debug, Error)]
#[error("startup step still failing after {attempts} attempts")]
pub struct StartupError<E: std::error::Error + 'static> {
    pub attempts: u32,
    #[source]
    pub source: E,
}

/// Bounded retry state machine
#[derive(Debug, Clone)]
pub struct StartupSequencer {
    policy: RetryPolicy,
    state: StartupState,
}

impl StartupSequencer {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: StartupState::Attempting(1),
        }
    }

    pub fn state(&self) -> StartupState {
        self.state
    }

    /// Apply the outcome of the current attempt and return the new state
    ///
    /// Terminal states absorb further outcomes.
    pub fn advance(&mut self, succeeded: bool) -> StartupState {
        self.state = match self.state {
            StartupState::Attempting(_) if succeeded => StartupState::Ready,
            StartupState::Attempting(k) if k < self.policy.max_attempts => {
                StartupState::Attempting(k + 1)
            }
            StartupState::Attempting(_) => StartupState::Failed,
            terminal => terminal,
        };
        self.state
    }

    /// Drive `attempt` until it succeeds or the budget is spent
    ///
    /// `attempt` receives the 1-based attempt number. Returns the number of the
    /// attempt that succeeded, or the last error once every attempt has failed.
    pub async fn run<F, Fut, E>(mut self, mut attempt: F) -> Result<u32, StartupError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: std::error::Error + 'static,
    {
        let max_attempts = self.policy.max_attempts;
        let mut current = match self.state {
            StartupState::Attempting(k) => k,
            _ => 1,
        };

        loop {
            tracing::debug!(attempt = current, max_attempts, "Running startup step");

            let err = match attempt(current).await {
                Ok(()) => {
                    self.advance(true);
                    tracing::debug!(attempt = current, "Startup step succeeded");
                    return Ok(current);
                }
                Err(err) => err,
            };

            match self.advance(false) {
                StartupState::Attempting(next) => {
                    tracing::warn!(
                        "⏳ Not ready yet (attempt {}/{}): {}",
                        current,
                        max_attempts,
                        err
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    current = next;
                }
                _ => {
                    tracing::error!(
                        "❌ Giving up after {} attempts: {}",
                        current,
                        err
                    );
                    return Err(StartupError {
                        attempts: current,
                        source: err,
                    });
                }
            }
        }
    }
}
