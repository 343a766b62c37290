//! Generation failures.

use thiserror::Error;

/// Errors raised at the model boundary.
#[derive(Error, Debug)]
pub enum AiError {
    /// The model service rejected or failed the request.
    #[error("AI request failed: {0}")]
    ApiRequestFailed(String),

    /// The model service is throttling requests.
    #[error("Rate limit exceeded. Please try again later")]
    RateLimitExceeded,

    /// A single attempt did not complete within the configured timeout.
    #[error("AI request timed out after {seconds}s")]
    Timeout {
        /// Timeout that expired, in seconds.
        seconds: u64,
    },

    /// The rendered prompt does not fit in the model's input window.
    #[error(
        "Prompt too large: estimated {estimated_tokens} tokens exceeds {max_tokens} token limit for model {model}"
    )]
    PromptTooLarge {
        /// Estimated prompt size in tokens.
        estimated_tokens: usize,
        /// Available input tokens for the model.
        max_tokens: usize,
        /// Model identifier.
        model: String,
    },

    /// Network connectivity error.
    #[error("Network error: {0}")]
    NetworkError(String),
}

impl AiError {
    /// Returns true for failures worth retrying after a pause.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_and_timeouts_are_retryable() {
        assert!(AiError::RateLimitExceeded.is_retryable());
        assert!(AiError::Timeout { seconds: 300 }.is_retryable());
        assert!(!AiError::ApiRequestFailed("HTTP 400".to_string()).is_retryable());
        assert!(!AiError::NetworkError("refused".to_string()).is_retryable());
    }

    #[test]
    fn prompt_too_large_message_names_model() {
        let err = AiError::PromptTooLarge {
            estimated_tokens: 900,
            max_tokens: 500,
            model: "mock-model".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("900"));
        assert!(msg.contains("mock-model"));
    }
}
