//! Commit message, pull request description and review feedback generation.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::ai::{AiClient, ContextVariables, Generator, ReliableAiClient, SemanticFunction};
use crate::chunk::chunk_commit_info;
use crate::config::PipelineConfig;
use crate::pipeline::{AggregationMode, ChunkProcessor, Condenser};
use crate::skills::prompts;

/// Delimiter tag for commit message partial results.
pub const COMMIT_MESSAGE_RESULT_TAG: &str = "CommitMessageResult";
/// Delimiter tag for pull request description partial results.
pub const PULL_REQUEST_DESCRIPTION_RESULT_TAG: &str = "PullRequestDescriptionResult";
/// Delimiter tag for dynamic task partial results.
pub const DYNAMIC_RESULT_TAG: &str = "DynamicResult";

/// Generates commit and pull request text from diff output of any size.
pub struct PullRequestSkill {
    client: Arc<dyn AiClient>,
    config: PipelineConfig,
    cancel: CancellationToken,
}

impl PullRequestSkill {
    /// Creates a skill calling `client` directly, with default settings.
    pub fn new(client: Arc<dyn AiClient>) -> Self {
        Self {
            client,
            config: PipelineConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a skill from `config`, wrapping `client` with the configured
    /// timeout and throttling retry.
    pub fn from_config(client: Box<dyn AiClient>, config: PipelineConfig) -> Result<Self> {
        config.validate().context("Invalid pipeline configuration")?;
        let client = ReliableAiClient::new(client)
            .with_timeout(config.request_timeout)
            .with_retry_delays(config.retry_delays.clone());
        Ok(Self {
            client: Arc::new(client),
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the configuration without touching the client.
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the token that stops generation between chunks.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Generates a commit message from `git diff` or `git show` output.
    pub async fn generate_commit_message(&self, diff: &str) -> Result<String> {
        let mut context = ContextVariables::default()
            .with("resultformat", prompts::DEFAULT_COMMIT_RESULT_FORMAT);
        self.run(
            "CommitMessageGenerator",
            prompts::COMMIT_MESSAGE_TEMPLATE,
            diff,
            &AggregationMode::condense(COMMIT_MESSAGE_RESULT_TAG),
            &mut context,
        )
        .await
    }

    /// Generates a pull request description, condensing per-chunk drafts.
    pub async fn generate_pr_description(&self, diff: &str) -> Result<String> {
        self.run(
            "PullRequestDescriptionGenerator",
            prompts::PULL_REQUEST_DESCRIPTION_TEMPLATE,
            diff,
            &AggregationMode::condense(PULL_REQUEST_DESCRIPTION_RESULT_TAG),
            &mut ContextVariables::default(),
        )
        .await
    }

    /// Generates a pull request description by extending one draft chunk by
    /// chunk.
    pub async fn generate_pr_description_rolling(&self, diff: &str) -> Result<String> {
        self.run(
            "PullRequestDescriptionGeneratorRolling",
            prompts::PULL_REQUEST_DESCRIPTION_ROLLING_TEMPLATE,
            diff,
            &AggregationMode::Rolling,
            &mut ContextVariables::default(),
        )
        .await
    }

    /// Generates independent review feedback per chunk, joined in order.
    pub async fn generate_pr_feedback(&self, diff: &str) -> Result<String> {
        self.run(
            "PullRequestFeedbackGenerator",
            prompts::PULL_REQUEST_FEEDBACK_TEMPLATE,
            diff,
            &AggregationMode::Aggregate,
            &mut ContextVariables::default(),
        )
        .await
    }

    /// Carries out free-form `instructions` against the diff.
    pub async fn generate_dynamic(&self, diff: &str, instructions: &str) -> Result<String> {
        debug!(instructions, "Generating dynamic result");
        let mut context = ContextVariables::default().with("instructions", instructions);
        self.run(
            "DynamicGenerator",
            prompts::DYNAMIC_TEMPLATE,
            diff,
            &AggregationMode::condense(DYNAMIC_RESULT_TAG),
            &mut context,
        )
        .await
    }

    async fn run(
        &self,
        name: &str,
        template: &str,
        diff: &str,
        mode: &AggregationMode,
        context: &mut ContextVariables,
    ) -> Result<String> {
        let chunks = chunk_commit_info(diff, self.config.chunk_size)
            .with_context(|| format!("Failed to chunk input for {name}"))?;
        info!(
            function = name,
            input_len = diff.len(),
            chunk_count = chunks.len(),
            "Running skill"
        );

        let function = SemanticFunction::new(name, prompts::DIFF_SYSTEM_PROMPT, template);
        let generator = Generator::with_model(function, Arc::clone(&self.client));
        self.processor()
            .process(&generator, &chunks, mode, context)
            .await
    }

    fn processor(&self) -> ChunkProcessor {
        let condense_function = SemanticFunction::new(
            "Condenser",
            prompts::CONDENSER_SYSTEM_PROMPT,
            prompts::CONDENSER_TEMPLATE,
        );
        let condenser = Condenser::new(Generator::with_model(
            condense_function,
            Arc::clone(&self.client),
        ))
        .with_chunk_size(self.config.chunk_size)
        .with_max_passes(self.config.max_condense_passes);

        ChunkProcessor::new(condenser)
            .with_aggregate_concurrency(self.config.aggregate_concurrency)
            .with_cancellation(self.cancel.clone())
    }
}
