//! Generic retry executor with pluggable backoff.
//!
//! ## Algorithm
//! 1. Invoke the operation (attempt 1)
//! 2. On success, return the value
//! 3. On a non-retryable error, return it immediately
//! 4. On a retryable error with attempts left, wait for the backoff delay
//!    (racing the cancellation token) and try again
//! 5. After the final attempt, return the last error unchanged
//!
//! The executor knows nothing about what it retries and keeps no state
//! between invocations, so one instance can serve every I/O boundary.

use crate::cancel::CancellationToken;
use crate::error::{ClassifiedError, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Rule mapping an attempt number to the wait before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    Fixed,
    Linear,
    #[default]
    Exponential,
}

/// Retry configuration, validated on construction.
///
/// Deserializes from `{max_attempts, backoff, base_delay_ms, max_delay_ms}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RetryPolicySettings")]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: BackoffStrategy,
    base_delay: Duration,
    max_delay: Duration,
}

/// Raw, unvalidated shape of a [`RetryPolicy`] as it appears in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicySettings {
    pub max_attempts: u32,
    #[serde(default)]
    pub backoff: BackoffStrategy,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl TryFrom<RetryPolicySettings> for RetryPolicy {
    type Error = ClassifiedError;

    fn try_from(settings: RetryPolicySettings) -> Result<Self> {
        RetryPolicy::new(
            settings.max_attempts,
            settings.backoff,
            Duration::from_millis(settings.base_delay_ms),
            Duration::from_millis(settings.max_delay_ms),
        )
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        backoff: BackoffStrategy,
        base_delay: Duration,
        max_delay: Duration,
    ) -> Result<Self> {
        if max_attempts == 0 {
            return Err(ClassifiedError::internal("retry policy needs max_attempts >= 1"));
        }
        if max_delay < base_delay {
            return Err(ClassifiedError::builder(
                ErrorKind::Internal,
                "retry policy needs max_delay >= base_delay",
            )
            .context(json!({
                "base_delay_ms": base_delay.as_millis() as u64,
                "max_delay_ms": max_delay.as_millis() as u64,
            }))
            .build());
        }
        Ok(Self {
            max_attempts,
            backoff,
            base_delay,
            max_delay,
        })
    }

    /// Exponential, 3 attempts, 100ms base, 1s cap. Used for candidate
    /// resolution, related lookups and feedback writes.
    pub fn standard() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::Exponential,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
        }
    }

    /// Linear, 2 attempts, 50ms base, 200ms cap. For latency-sensitive,
    /// best-effort lookups such as suggestions.
    pub fn fast_best_effort() -> Self {
        Self {
            max_attempts: 2,
            backoff: BackoffStrategy::Linear,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(200),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> BackoffStrategy {
        self.backoff
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Wait after failed attempt `attempt` (1-based), clamped to `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let raw = match self.backoff {
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::Linear => self.base_delay.saturating_mul(attempt),
            BackoffStrategy::Exponential => {
                let factor = 2u32.checked_pow(attempt - 1).unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(factor)
            }
        };
        raw.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Runs operations under a [`RetryPolicy`].
///
/// ## Usage
/// ```ignore
/// let executor = RetryExecutor::new().with_cancellation(token);
/// let rows = executor
///     .execute("load_candidates", &RetryPolicy::standard(), || async move {
///         source.candidates(scope, query, 30).await.map_err(ClassifiedError::from)
///     })
///     .await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    cancel: Option<CancellationToken>,
}

impl RetryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make pending waits end as soon as `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Invoke `operation` until it succeeds, fails permanently, or runs out of attempts.
    pub async fn execute<T, F, Fut>(
        &self,
        operation_name: &str,
        policy: &RetryPolicy,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            if self.is_cancelled() {
                return Err(cancelled(operation_name, attempt - 1, None));
            }

            let err = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation_name, attempt);
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                debug!(
                    "{} failed with non-retryable {} on attempt {}",
                    operation_name,
                    err.kind(),
                    attempt
                );
                return Err(err);
            }
            if attempt >= policy.max_attempts() {
                warn!(
                    "{} exhausted {} attempts: {}",
                    operation_name,
                    policy.max_attempts(),
                    err
                );
                return Err(err);
            }

            let delay = policy.delay_for_attempt(attempt);
            warn!(
                "{} attempt {}/{} failed ({}), retrying in {:?}",
                operation_name,
                attempt,
                policy.max_attempts(),
                err,
                delay
            );

            match &self.cancel {
                Some(token) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = token.cancelled() => {
                            return Err(cancelled(operation_name, attempt, Some(&err)));
                        }
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
            attempt += 1;
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

fn cancelled(
    operation_name: &str,
    attempts: u32,
    last_error: Option<&ClassifiedError>,
) -> ClassifiedError {
    ClassifiedError::builder(
        ErrorKind::Cancelled,
        format!("{operation_name} cancelled after {attempts} attempt(s)"),
    )
    .context(json!({
        "operation": operation_name,
        "attempts": attempts,
        "last_error": last_error.map(ToString::to_string),
    }))
    .build()
}
