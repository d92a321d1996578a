// SPDX-FileCopyrightText: 2026 Maitre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry with backoff, shared by the draft generator, the gateway
//! send path, and the publish step.
//!
//! Retry behavior lives in one [`RetryPolicy`] value object so the attempt
//! bound and backoff schedule are testable in isolation instead of being
//! scattered as ad hoc loops.

use std::future::Future;
use std::time::Duration;

use maitre_core::MaitreError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A bounded-attempt retry policy with exponential backoff.
///
/// `max_attempts` counts the initial call, so `max_attempts = 3` means at
/// most two retries. Only errors reporting [`MaitreError::is_transient`]
/// are retried; permanent failures surface immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff_ms: u64,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            backoff_factor: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            backoff_factor: 1,
        }
    }

    /// A policy with `max_attempts` attempts and the default backoff curve.
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// The delay to sleep before retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_factor.max(1) as u64;
        let exp = retry.saturating_sub(1).min(16);
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor.pow(exp)))
    }

    /// Runs `op`, retrying transient failures up to the attempt bound.
    ///
    /// `what` names the operation in retry log lines.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, MaitreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MaitreError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.backoff_for(attempt - 1);
                warn!(what, attempt, delay_ms = delay.as_millis() as u64, "retrying after transient error");
                tokio::time::sleep(delay).await;
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < attempts => {
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| MaitreError::Internal(format!(
            "{what}: retry loop exited without an error"
        ))))
    }
}
