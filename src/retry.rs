use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Exponential backoff policy for oracle requests
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    pub fn with_max_delay(self, max_delay: Duration) -> Self {
        Self { max_delay, ..self }
    }

    /// Three attempts waiting 1s then 2s; a whole document's batch is one
    /// request, so a failed locale is worth a couple of retries.
    pub fn oracle_call() -> Self {
        Self::new(3, Duration::from_secs(1)).with_max_delay(Duration::from_secs(5))
    }

    /// Waits between consecutive attempts, in order.
    fn backoff_schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts.max(1) - 1).map(move |retry| {
            self.initial_delay
                .mul_f64(self.backoff_multiplier.powi(retry as i32))
                .min(self.max_delay)
        })
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::oracle_call()
    }
}

/// Run `operation` until it succeeds, `should_retry` rejects the error, or the
/// attempts run out. The last error is returned on failure.
///
/// `max_attempts == 0` behaves like 1.
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let total = config.max_attempts.max(1);
    let mut schedule = config.backoff_schedule();
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}/{}", operation_name, attempt, total);
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        if !should_retry(&error) {
            return Err(error);
        }

        let Some(wait) = schedule.next() else {
            warn!("{} failed after {} attempt(s): {}", operation_name, total, error);
            return Err(error);
        };

        warn!(
            "{} failed (attempt {}/{}), retrying in {:?}: {}",
            operation_name, attempt, total, wait, error
        );
        sleep(wait).await;
        attempt += 1;
    }
}
