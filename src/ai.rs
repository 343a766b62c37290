//! Generation port: the opaque model boundary, prompt templates, semantic
//! functions, and the reliability decorator.

pub mod error;
pub mod function;
pub mod reliability;
pub mod template;
pub(crate) mod token_budget;

#[cfg(test)]
pub(crate) mod test_utils;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Result;

pub use error::AiError;
pub use function::{ContextVariables, GenerationService, Generator, SemanticFunction};
pub use reliability::ReliableAiClient;
pub use template::PromptTemplate;

/// Per-attempt timeout for model calls.
///
/// Set to 5 minutes to accommodate large prompts and long model responses
/// while preventing indefinite hangs.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Metadata about an AI client implementation.
#[derive(Clone, Debug)]
pub struct AiClientMetadata {
    /// Service provider name.
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Maximum context length supported.
    pub max_context_length: usize,
    /// Maximum token response length supported.
    pub max_response_length: usize,
}

/// Text-generation service reached through an opaque boundary.
///
/// Implementations own transport, authentication, and model selection. The
/// pipeline only ever sends a system prompt plus a rendered user prompt and
/// receives the completion text.
pub trait AiClient: Send + Sync {
    /// Sends a request to the model and returns the raw completion.
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    /// Returns metadata about the client implementation.
    fn get_metadata(&self) -> AiClientMetadata;
}
