use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Result of a single upstream attempt
#[derive(Debug)]
pub enum AttemptOutcome<T, E> {
    Success(T),
    /// Worth another attempt if the budget allows
    Retryable(E),
    /// Retrying cannot help; stop immediately
    Fatal(E),
}

/// Async sleep abstraction so backoff can be tested without real delays
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Bounded exponential backoff settings for one logical upstream call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound for each attempt; the in-flight request is dropped on expiry
    pub timeout: Duration,
    /// Extra random delay as a fraction of the computed delay (0.0 disables)
    pub jitter_ratio: f64,
    /// Retry 4xx responses other than 408/429 as well
    pub retry_client_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(2000),
            timeout: Duration::from_secs(10),
            jitter_ratio: 0.0,
            retry_client_errors: false,
        }
    }
}

impl RetryPolicy {
    /// Same policy with a route-specific retry budget and attempt timeout
    pub fn with_budget(&self, max_retries: u32, timeout: Duration) -> Self {
        Self {
            max_retries,
            timeout,
            ..self.clone()
        }
    }

    /// Deterministic delay before retry number `retry` (0-based)
    ///
    /// 200ms, 400ms, 800ms, 1600ms, then capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// `delay_for` plus up to `jitter_ratio` of random extra delay
    pub fn jittered_delay(&self, retry: u32) -> Duration {
        let delay = self.delay_for(retry);
        if self.jitter_ratio <= 0.0 {
            return delay;
        }
        let extra = rand::thread_rng().gen_range(0.0..self.jitter_ratio);
        delay + delay.mul_f64(extra)
    }

    /// Whether an HTTP status from the upstream is worth retrying
    pub fn is_retryable_status(&self, status: u16) -> bool {
        match status {
            408 | 429 => true,
            400..=499 => self.retry_client_errors,
            _ => true,
        }
    }
}

/// Drive `attempt` until it succeeds, fails fatally, or the retry budget is spent
///
/// `attempt` receives the 0-based attempt number. The last error is returned
/// once retries are exhausted.
pub async fn run_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut attempt: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AttemptOutcome<T, E>>,
{
    let mut retry = 0;
    loop {
        match attempt(retry).await {
            AttemptOutcome::Success(value) => return Ok(value),
            AttemptOutcome::Fatal(err) => return Err(err),
            AttemptOutcome::Retryable(err) => {
                if retry >= policy.max_retries {
                    return Err(err);
                }
                let delay = policy.jittered_delay(retry);
                tracing::debug!(
                    "Attempt {} failed ({}), retrying in {}ms",
                    retry + 1,
                    err,
                    delay.as_millis()
                );
                sleeper.sleep(delay).await;
                retry += 1;
            }
        }
    }
}
