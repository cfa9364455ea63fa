use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Bounded retry with a fixed wait between attempts
///
/// An operation is attempted once, then retried up to `max_retries` more
/// times. The loop is explicit so the attempt count is always known.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first
    pub max_retries: u32,
    /// Wait between two attempts
    pub delay: Duration,
}

/// Result of a retried operation together with the number of attempts made
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Runs `op` until it succeeds or `max_retries + 1` attempts have failed
    ///
    /// `op` receives the 1-based attempt number. No wait happens after the
    /// final failed attempt.
    ///
    /// # Arguments
    ///
    /// * `label` - Name of the unit of work, used in log lines
    /// * `op` - Produces a fresh future per attempt
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> RetryOutcome<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match op(attempt).await {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        label,
                        attempt,
                        max_attempts,
                        e,
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => {
                    return RetryOutcome {
                        result: Err(e),
                        attempts: attempt,
                    }
                }
            }
        }
    }
}
