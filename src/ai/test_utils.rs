//! Shared test utilities for the generation port.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;

use crate::ai::{AiClient, AiClientMetadata};

fn mock_metadata() -> AiClientMetadata {
    AiClientMetadata {
        provider: "Mock".to_string(),
        model: "mock-model".to_string(),
        max_context_length: 200_000,
        max_response_length: 8_192,
    }
}

/// Mock AI client with a pre-programmed queue of responses.
///
/// Responses are returned in FIFO order. When the queue is exhausted,
/// subsequent calls return `Err("no more mock responses")`. Every call records
/// the `(system_prompt, user_prompt)` pair; use
/// [`prompt_handle`](Self::prompt_handle) to read them after the client has
/// been moved into a generator.
pub(crate) struct ConfigurableMockAiClient {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    metadata: AiClientMetadata,
    recorded_prompts: Arc<Mutex<Vec<(String, String)>>>,
}

impl ConfigurableMockAiClient {
    /// Creates a new mock client that will return the given responses in order.
    pub(crate) fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            metadata: mock_metadata(),
            recorded_prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns a new mock client with a custom context window size.
    pub(crate) fn with_context_length(mut self, max_context_length: usize) -> Self {
        self.metadata.max_context_length = max_context_length;
        self
    }

    /// Returns a handle for inspecting the response queue.
    pub(crate) fn response_handle(&self) -> ResponseQueueHandle {
        ResponseQueueHandle {
            responses: self.responses.clone(),
        }
    }

    /// Returns a handle for inspecting which prompts were sent.
    pub(crate) fn prompt_handle(&self) -> PromptRecordHandle {
        PromptRecordHandle {
            recorded_prompts: self.recorded_prompts.clone(),
        }
    }
}

/// Shared handle to a mock client's response queue.
pub(crate) struct ResponseQueueHandle {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
}

impl ResponseQueueHandle {
    /// Returns the number of unconsumed responses remaining in the queue.
    pub(crate) fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

/// Shared handle to a mock client's recorded prompts.
#[derive(Clone)]
pub(crate) struct PromptRecordHandle {
    recorded_prompts: Arc<Mutex<Vec<(String, String)>>>,
}

impl PromptRecordHandle {
    /// Returns all recorded `(system_prompt, user_prompt)` pairs.
    pub(crate) fn prompts(&self) -> Vec<(String, String)> {
        self.recorded_prompts.lock().unwrap().clone()
    }

    /// Returns only the recorded user prompts.
    pub(crate) fn user_prompts(&self) -> Vec<String> {
        self.prompts().into_iter().map(|(_, user)| user).collect()
    }

    /// Returns the number of AI requests that were made.
    pub(crate) fn request_count(&self) -> usize {
        self.recorded_prompts.lock().unwrap().len()
    }
}

impl AiClient for ConfigurableMockAiClient {
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        let responses = self.responses.clone();
        let recorded = self.recorded_prompts.clone();
        let sys = system_prompt.to_string();
        let usr = user_prompt.to_string();
        Box::pin(async move {
            recorded.lock().unwrap().push((sys, usr));
            responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no more mock responses")))
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        self.metadata.clone()
    }
}

/// Mock AI client that derives its response from the user prompt.
///
/// Responds with `"<tag>[<user_prompt>]"` after an optional delay, so results
/// are deterministic regardless of call order.
pub(crate) struct EchoMockAiClient {
    tag: String,
    delay: Duration,
    recorded_prompts: Arc<Mutex<Vec<(String, String)>>>,
}

impl EchoMockAiClient {
    /// Creates an echo client prefixing responses with `tag`.
    pub(crate) fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            delay: Duration::ZERO,
            recorded_prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sleeps for `delay` before each response.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns a handle for inspecting which prompts were sent.
    pub(crate) fn prompt_handle(&self) -> PromptRecordHandle {
        PromptRecordHandle {
            recorded_prompts: self.recorded_prompts.clone(),
        }
    }
}

impl AiClient for EchoMockAiClient {
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            self.recorded_prompts
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_prompt.to_string()));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(format!("{}[{user_prompt}]", self.tag))
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        mock_metadata()
    }
}

/// Mock AI client that answers with the first `1 / divisor` of the user
/// prompt's characters, modelling a model that always shortens its input.
pub(crate) struct ShrinkingMockAiClient {
    divisor: usize,
    recorded_prompts: Arc<Mutex<Vec<(String, String)>>>,
}

impl ShrinkingMockAiClient {
    /// Creates a client keeping `1 / divisor` of each prompt.
    pub(crate) fn new(divisor: usize) -> Self {
        Self {
            divisor: divisor.max(1),
            recorded_prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns a handle for inspecting which prompts were sent.
    pub(crate) fn prompt_handle(&self) -> PromptRecordHandle {
        PromptRecordHandle {
            recorded_prompts: self.recorded_prompts.clone(),
        }
    }
}

impl AiClient for ShrinkingMockAiClient {
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            self.recorded_prompts
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_prompt.to_string()));
            let keep = user_prompt.chars().count() / self.divisor;
            Ok(user_prompt.chars().take(keep).collect())
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        mock_metadata()
    }
}
