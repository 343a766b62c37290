//! Context-window check for rendered prompts.
//!
//! A chunk only helps if its rendered prompt still fits the model. Before a
//! request is sent the system prompt and user prompt are sized under a
//! [`SizeMeasure`] and compared with what the model's window leaves after
//! reserving room for the response.

use anyhow::Result;

use crate::ai::{AiClientMetadata, AiError};
use crate::chunk::SizeMeasure;

/// Outcome of a successful window check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PromptFit {
    /// Measured size of system plus user prompt.
    pub used: usize,
    /// Input room left once the response is reserved.
    pub window: usize,
}

impl PromptFit {
    /// Room still free in the window.
    pub fn headroom(&self) -> usize {
        self.window - self.used
    }
}

/// A model's input window, measured in the units of `measure`.
pub(crate) struct TokenBudget<'m> {
    model: String,
    window: usize,
    measure: &'m dyn SizeMeasure,
}

impl<'m> TokenBudget<'m> {
    /// Input window of the client described by `metadata`: its context
    /// length minus the response reservation.
    pub fn for_client(metadata: &AiClientMetadata, measure: &'m dyn SizeMeasure) -> Self {
        Self {
            model: metadata.model.clone(),
            window: metadata
                .max_context_length
                .saturating_sub(metadata.max_response_length),
            measure,
        }
    }

    /// Sizes the prompt pair, failing with [`AiError::PromptTooLarge`] when
    /// it does not fit.
    pub fn check(&self, system_prompt: &str, user_prompt: &str) -> Result<PromptFit> {
        let used = self.measure.measure(system_prompt) + self.measure.measure(user_prompt);
        if used > self.window {
            return Err(AiError::PromptTooLarge {
                estimated_tokens: used,
                max_tokens: self.window,
                model: self.model.clone(),
            }
            .into());
        }
        Ok(PromptFit {
            used,
            window: self.window,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::chunk::{CharCount, TokenEstimate, DEFAULT_CHUNK_SIZE};

    fn metadata(context: usize, response: usize) -> AiClientMetadata {
        AiClientMetadata {
            provider: "test".to_string(),
            model: "test-model".to_string(),
            max_context_length: context,
            max_response_length: response,
        }
    }

    #[test]
    fn window_excludes_response_reservation() {
        let budget = TokenBudget::for_client(&metadata(1_000, 400), &CharCount);
        let fit = budget.check("system", "user").unwrap();
        assert_eq!(fit, PromptFit { used: 10, window: 600 });
        assert_eq!(fit.headroom(), 590);
    }

    #[test]
    fn prompt_at_the_window_edge_fits() {
        let budget = TokenBudget::for_client(&metadata(100, 0), &CharCount);
        assert!(budget.check("", &"x".repeat(100)).is_ok());

        let err = budget.check("s", &"x".repeat(100)).unwrap_err();
        match err.downcast_ref::<AiError>() {
            Some(AiError::PromptTooLarge {
                estimated_tokens,
                max_tokens,
                model,
            }) => {
                assert_eq!(*estimated_tokens, 101);
                assert_eq!(*max_tokens, 100);
                assert_eq!(model, "test-model");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn default_chunk_fits_a_typical_window_in_tokens() {
        let budget = TokenBudget::for_client(&metadata(200_000, 8_192), &TokenEstimate);
        let chunk = "+".repeat(DEFAULT_CHUNK_SIZE);
        let fit = budget.check("You review diffs.", &chunk).unwrap();
        // 8000 chars is about 2515 tokens.
        assert!(fit.used < 3_000);
    }

    #[test]
    fn response_larger_than_context_leaves_no_window() {
        let budget = TokenBudget::for_client(&metadata(100, 200), &CharCount);
        assert!(budget.check("a", "b").is_err());
        assert!(budget.check("", "").is_ok());
    }
}
