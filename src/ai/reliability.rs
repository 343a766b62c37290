//! Timeout and throttling retry around any [`AiClient`].

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::ai::{AiClient, AiClientMetadata, AiError, REQUEST_TIMEOUT};

/// Pauses between attempts after a throttled or timed-out request.
pub const DEFAULT_RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(8),
    Duration::from_secs(16),
    Duration::from_secs(32),
];

/// Decorator that bounds each attempt by a timeout and retries throttling.
///
/// Only [`AiError::RateLimitExceeded`] and [`AiError::Timeout`] are retried;
/// every other failure is returned immediately. After the last delay is used
/// the final error is returned.
pub struct ReliableAiClient {
    inner: Box<dyn AiClient>,
    timeout: Duration,
    retry_delays: Vec<Duration>,
}

impl ReliableAiClient {
    /// Wraps `inner` with the default timeout and retry schedule.
    pub fn new(inner: Box<dyn AiClient>) -> Self {
        Self {
            inner,
            timeout: REQUEST_TIMEOUT,
            retry_delays: DEFAULT_RETRY_DELAYS.to_vec(),
        }
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the pauses between attempts; one attempt is made per delay plus
    /// the initial one.
    #[must_use]
    pub fn with_retry_delays(mut self, retry_delays: Vec<Duration>) -> Self {
        self.retry_delays = retry_delays;
        self
    }

    /// Total attempts made before giving up.
    pub fn max_attempts(&self) -> usize {
        self.retry_delays.len() + 1
    }

    async fn attempt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        match tokio::time::timeout(
            self.timeout,
            self.inner.send_request(system_prompt, user_prompt),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AiError::Timeout {
                seconds: self.timeout.as_secs(),
            }
            .into()),
        }
    }
}

fn is_retryable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<AiError>()
        .is_some_and(AiError::is_retryable)
}

impl AiClient for ReliableAiClient {
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let max_attempts = self.max_attempts();
            let mut delays = self.retry_delays.iter();
            let mut attempt = 1;

            loop {
                let err = match self.attempt(system_prompt, user_prompt).await {
                    Ok(response) => return Ok(response),
                    Err(err) => err,
                };

                if !is_retryable(&err) {
                    return Err(err);
                }
                let Some(delay) = delays.next() else {
                    return Err(err.context(format!("Giving up after {max_attempts} attempts")));
                };

                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient AI failure, retrying"
                );
                tokio::time::sleep(*delay).await;
                attempt += 1;
                debug!(attempt, "Retrying AI request");
            }
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        self.inner.get_metadata()
    }
}
