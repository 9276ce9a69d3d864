//! Quality-gated retry loop.
//!
//! Every generation stage wraps its backend calls in this loop. The loop owns
//! exactly one decision: retry, accept, or give up, based on the returned
//! quality score and a bounded retry budget. Two exhaustion outcomes are
//! deliberately asymmetric:
//!
//! - repeated backend *errors* exhaust the budget and fail the unit (no
//!   artifact is fabricated),
//! - repeated *below-threshold* results exhaust the budget and accept the
//!   last artifact anyway, flagged so the caller surfaces a warning rather
//!   than an error. A low-but-nonzero-quality artifact is still usable;
//!   a failed backend call produced nothing.
//!
//! Backoff policy is caller-supplied so cheap items can use a small fixed
//! delay while expensive items use exponential backoff.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::backend::GenerationSample;
use crate::error::BackendError;
use crate::pipeline::cancel::CancelToken;

/// Delay policy between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// The same delay before every retry.
    Fixed(Duration),
    /// `base * 2^attempt` before retrying attempt `attempt + 1`.
    Exponential { base: Duration },
}

impl Backoff {
    /// Returns the delay to sleep after the given zero-based attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential { base } => *base * 2u32.saturating_pow(attempt),
        }
    }
}

/// Policy for one quality-gated retry loop invocation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Minimum quality score for immediate acceptance.
    pub quality_threshold: f64,
    /// Number of retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay policy between attempts.
    pub backoff: Backoff,
}

/// Result of a successful loop invocation: exactly one accepted artifact.
#[derive(Debug)]
pub struct Accepted {
    /// The accepted artifact sample.
    pub sample: GenerationSample,
    /// Zero-based count of retries consumed; never exceeds `max_retries`.
    pub iterations: u32,
    /// True when the artifact was accepted on budget exhaustion with a
    /// score still below the threshold.
    pub below_threshold: bool,
    /// Messages from transient backend errors absorbed along the way.
    pub transient_errors: Vec<String>,
}

/// Errors produced by the retry loop itself.
#[derive(Debug, Error)]
pub enum RetryError {
    /// Every attempt errored; the retry budget is spent.
    #[error("Generation failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    /// The run was cancelled while the loop was sleeping or generating.
    #[error("Generation cancelled")]
    Cancelled,
}

/// Runs one generation unit under the quality gate.
///
/// `generate` is invoked with the zero-based attempt index; it must be safe
/// to call repeatedly for the same unit. The loop sleeps `backoff.delay(n)`
/// after attempt `n` before retrying, and observes `cancel` at both
/// suspension points.
///
/// # Errors
///
/// Returns `RetryError::Exhausted` when the final attempt errors, and
/// `RetryError::Cancelled` when the run-scoped cancel signal fires.
pub async fn generate_with_quality_gate<F, Fut>(
    mut generate: F,
    policy: &RetryPolicy,
    cancel: &CancelToken,
) -> Result<Accepted, RetryError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<GenerationSample, BackendError>>,
{
    let mut transient_errors = Vec::new();
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        let outcome = tokio::select! {
            result = generate(attempt) => result,
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
        };

        match outcome {
            Ok(sample) if sample.quality_score >= policy.quality_threshold => {
                tracing::debug!(
                    artifact_id = %sample.artifact_id,
                    quality_score = sample.quality_score,
                    iterations = attempt,
                    "Artifact accepted at threshold"
                );
                return Ok(Accepted {
                    sample,
                    iterations: attempt,
                    below_threshold: false,
                    transient_errors,
                });
            }
            Ok(sample) => {
                if attempt >= policy.max_retries {
                    tracing::warn!(
                        artifact_id = %sample.artifact_id,
                        quality_score = sample.quality_score,
                        threshold = policy.quality_threshold,
                        retries_used = attempt,
                        "Retry budget spent, accepting below-threshold artifact"
                    );
                    return Ok(Accepted {
                        sample,
                        iterations: attempt,
                        below_threshold: true,
                        transient_errors,
                    });
                }
                tracing::debug!(
                    artifact_id = %sample.artifact_id,
                    quality_score = sample.quality_score,
                    threshold = policy.quality_threshold,
                    next_attempt = attempt + 1,
                    "Quality below threshold, retrying"
                );
            }
            Err(err) => {
                if attempt >= policy.max_retries {
                    return Err(RetryError::Exhausted {
                        attempts: attempt + 1,
                        last_error: err.to_string(),
                    });
                }
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    error = %err,
                    "Transient backend error, will retry"
                );
                transient_errors.push(err.to_string());
            }
        }

        let delay = policy.backoff.delay(attempt);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
        }
        attempt += 1;
    }
}
