//! Context variables, semantic functions, and the generators that run them.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::ai::token_budget::TokenBudget;
use crate::ai::{AiClient, PromptTemplate};
use crate::chunk::TokenEstimate;

/// Template name of [`ContextVariables::input`].
pub const INPUT_VARIABLE: &str = "input";
/// Template name of [`ContextVariables::previous_results`].
pub const PREVIOUS_RESULTS_VARIABLE: &str = "previousresults";
/// Template name of [`ContextVariables::prompt`].
pub const PROMPT_VARIABLE: &str = "prompt";

/// Named values threaded through generation calls.
///
/// The three variables the pipeline itself writes are typed fields; anything
/// else a template references (`instructions`, `resultformat`, ...) lives in
/// a name-keyed map. Names are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextVariables {
    /// The chunk or paragraph currently being processed.
    pub input: String,
    /// Result of the previous chunk in rolling mode.
    pub previous_results: String,
    /// The captured prompt handed to the condenser.
    pub prompt: String,
    extra: HashMap<String, String>,
}

impl ContextVariables {
    /// Creates a context with the given input and nothing else set.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a variable by template name.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match name.to_ascii_lowercase().as_str() {
            INPUT_VARIABLE => self.input = value,
            PREVIOUS_RESULTS_VARIABLE => self.previous_results = value,
            PROMPT_VARIABLE => self.prompt = value,
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }

    /// Looks up a variable by template name.
    pub fn get(&self, name: &str) -> Option<&str> {
        match name.to_ascii_lowercase().as_str() {
            INPUT_VARIABLE => Some(self.input.as_str()),
            PREVIOUS_RESULTS_VARIABLE => Some(self.previous_results.as_str()),
            PROMPT_VARIABLE => Some(self.prompt.as_str()),
            other => self.extra.get(other).map(String::as_str),
        }
    }
}

/// A named prompt: a system prompt plus a user prompt template.
#[derive(Debug, Clone)]
pub struct SemanticFunction {
    name: String,
    system_prompt: String,
    template: PromptTemplate,
}

impl SemanticFunction {
    /// Creates a semantic function.
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            template: PromptTemplate::new(template),
        }
    }

    /// Function name, used in logs and error context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// System prompt sent alongside every rendered user prompt.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Renders the user prompt against `context`.
    pub fn render(&self, context: &ContextVariables) -> String {
        self.template.render(context)
    }
}

/// Where a [`Generator`] sends its rendered prompt.
#[derive(Clone)]
pub enum GenerationService {
    /// Calls the model.
    Model(Arc<dyn AiClient>),
    /// Returns the rendered prompt verbatim without touching any model.
    PromptCapture,
}

impl std::fmt::Debug for GenerationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Model(client) => f
                .debug_tuple("Model")
                .field(&client.get_metadata().model)
                .finish(),
            Self::PromptCapture => f.write_str("PromptCapture"),
        }
    }
}

/// A semantic function bound to a generation service.
#[derive(Debug, Clone)]
pub struct Generator {
    function: Arc<SemanticFunction>,
    service: GenerationService,
}

impl Generator {
    /// Binds `function` to `service`.
    pub fn new(function: SemanticFunction, service: GenerationService) -> Self {
        Self {
            function: Arc::new(function),
            service,
        }
    }

    /// Binds `function` to a model client.
    pub fn with_model(function: SemanticFunction, client: Arc<dyn AiClient>) -> Self {
        Self::new(function, GenerationService::Model(client))
    }

    /// Returns the same function bound to [`GenerationService::PromptCapture`].
    #[must_use]
    pub fn prompt_capture(&self) -> Self {
        Self {
            function: Arc::clone(&self.function),
            service: GenerationService::PromptCapture,
        }
    }

    /// The bound semantic function.
    pub fn function(&self) -> &SemanticFunction {
        &self.function
    }

    /// Renders the function against `context` and generates a completion.
    ///
    /// Model-bound generators validate the prompt against the client's
    /// context window first, failing with `AiError::PromptTooLarge` before
    /// any request is sent.
    pub async fn generate(&self, context: &ContextVariables) -> Result<String> {
        let user_prompt = self.function.render(context);
        let name = self.function.name();

        match &self.service {
            GenerationService::PromptCapture => {
                debug!(
                    function = name,
                    prompt_len = user_prompt.len(),
                    "Captured rendered prompt"
                );
                Ok(user_prompt)
            }
            GenerationService::Model(client) => {
                let system_prompt = self.function.system_prompt();
                let fit = TokenBudget::for_client(&client.get_metadata(), &TokenEstimate)
                    .check(system_prompt, &user_prompt)
                    .with_context(|| format!("Prompt for {name} does not fit the model"))?;
                debug!(
                    function = name,
                    estimated_tokens = fit.used,
                    window_tokens = fit.window,
                    headroom_tokens = fit.headroom(),
                    "Sending generation request"
                );

                let response = client
                    .send_request(system_prompt, &user_prompt)
                    .await
                    .with_context(|| format!("Generation failed for {name}"))?;
                debug!(
                    function = name,
                    response_len = response.len(),
                    "Received generation response"
                );
                Ok(response)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ai::test_utils::ConfigurableMockAiClient;
    use crate::ai::AiError;

    fn summarize() -> SemanticFunction {
        SemanticFunction::new(
            "Summarize",
            "You summarize diffs.",
            "Diff:\n{{$input}}\nPrevious: {{$previousresults}}",
        )
    }

    #[test]
    fn context_names_are_case_insensitive() {
        let mut context = ContextVariables::new("x");
        context.set("PreviousResults", "earlier");
        context.set("Instructions", "be brief");
        assert_eq!(context.previous_results, "earlier");
        assert_eq!(context.get("INPUT"), Some("x"));
        assert_eq!(context.get("instructions"), Some("be brief"));
        assert_eq!(context.get("unknown"), None);
    }

    #[tokio::test]
    async fn model_generation_sends_rendered_prompt() {
        let mock = ConfigurableMockAiClient::new(vec![Ok("summary".to_string())]);
        let prompts = mock.prompt_handle();
        let generator = Generator::with_model(summarize(), Arc::new(mock));

        let result = generator.generate(&ContextVariables::new("+line")).await.unwrap();

        assert_eq!(result, "summary");
        let recorded = prompts.prompts();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0, "You summarize diffs.");
        assert_eq!(recorded[0].1, "Diff:\n+line\nPrevious: ");
    }

    #[tokio::test]
    async fn prompt_capture_never_touches_the_model() {
        let mock = ConfigurableMockAiClient::new(vec![]);
        let prompts = mock.prompt_handle();
        let generator = Generator::with_model(summarize(), Arc::new(mock)).prompt_capture();

        let captured = generator.generate(&ContextVariables::default()).await.unwrap();

        assert_eq!(captured, "Diff:\n\nPrevious: ");
        assert_eq!(prompts.request_count(), 0);
    }

    #[tokio::test]
    async fn oversized_prompt_fails_before_request() {
        let mock = ConfigurableMockAiClient::new(vec![Ok("unused".to_string())])
            .with_context_length(8_200);
        let prompts = mock.prompt_handle();
        let generator = Generator::with_model(summarize(), Arc::new(mock));

        // window = 8_200 - 8_192 = 8 tokens
        let err = generator
            .generate(&ContextVariables::new("x".repeat(1_000)))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AiError>(),
            Some(AiError::PromptTooLarge { .. })
        ));
        assert_eq!(prompts.request_count(), 0);
    }

    #[tokio::test]
    async fn model_errors_propagate_with_context() {
        let mock = ConfigurableMockAiClient::new(vec![Err(AiError::RateLimitExceeded.into())]);
        let generator = Generator::with_model(summarize(), Arc::new(mock));

        let err = generator.generate(&ContextVariables::new("x")).await.unwrap_err();

        assert!(err.to_string().contains("Summarize"));
        assert!(matches!(
            err.downcast_ref::<AiError>(),
            Some(AiError::RateLimitExceeded)
        ));
    }
}
