//! Runs a generator over a chunk sequence in one of three aggregation modes.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::ai::{ContextVariables, Generator};
use crate::pipeline::{Condenser, PipelineError};

/// How per-chunk results become the final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationMode {
    /// Independent generation per chunk; results joined with `\n`.
    Aggregate,
    /// Each chunk sees the previous chunk's result as `previousresults`;
    /// the last result is the answer.
    Rolling,
    /// Independent generation per chunk, then condensed with delimiters
    /// carrying `result_tag`.
    Condense {
        /// Tag placed in the delimiter between partial results.
        result_tag: String,
    },
}

impl AggregationMode {
    /// Shorthand for [`AggregationMode::Condense`].
    pub fn condense(result_tag: impl Into<String>) -> Self {
        Self::Condense {
            result_tag: result_tag.into(),
        }
    }
}

/// Drives generation over chunks.
pub struct ChunkProcessor {
    condenser: Condenser,
    aggregate_concurrency: usize,
    cancel: CancellationToken,
}

impl ChunkProcessor {
    /// Creates a processor that condenses through `condenser`, sharing its
    /// cancellation token.
    pub fn new(condenser: Condenser) -> Self {
        let cancel = condenser.cancellation_token().clone();
        Self {
            condenser,
            aggregate_concurrency: 1,
            cancel,
        }
    }

    /// Sets how many aggregate-mode generations may run at once. Result
    /// order is unaffected.
    #[must_use]
    pub fn with_aggregate_concurrency(mut self, concurrency: usize) -> Self {
        self.aggregate_concurrency = concurrency.max(1);
        self
    }

    /// Sets the token checked before every generation call, for both the
    /// processor and its condenser.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.condenser = self.condenser.with_cancellation(cancel.clone());
        self.cancel = cancel;
        self
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled.into());
        }
        Ok(())
    }

    /// Runs `generator` over `chunks` and aggregates the results per `mode`.
    ///
    /// Zero chunks yield an empty string in every mode without any call.
    pub async fn process<S: AsRef<str> + Sync>(
        &self,
        generator: &Generator,
        chunks: &[S],
        mode: &AggregationMode,
        context: &mut ContextVariables,
    ) -> Result<String> {
        info!(
            function = generator.function().name(),
            chunk_count = chunks.len(),
            ?mode,
            "Processing chunks"
        );

        match mode {
            AggregationMode::Aggregate => self.aggregate(generator, chunks, context).await,
            AggregationMode::Rolling => self.rolling(generator, chunks, context).await,
            AggregationMode::Condense { result_tag } => {
                self.condense(generator, chunks, result_tag, context).await
            }
        }
    }

    async fn aggregate<S: AsRef<str> + Sync>(
        &self,
        generator: &Generator,
        chunks: &[S],
        context: &ContextVariables,
    ) -> Result<String> {
        let results: Vec<String> = stream::iter(chunks.iter().enumerate())
            .map(|(index, chunk)| {
                let mut chunk_context = context.clone();
                chunk_context.input = chunk.as_ref().to_string();
                async move {
                    self.check_cancelled()?;
                    debug!(chunk = index + 1, "Generating aggregate result");
                    generator
                        .generate(&chunk_context)
                        .await
                        .with_context(|| format!("Failed on chunk {}", index + 1))
                }
            })
            .buffered(self.aggregate_concurrency)
            .try_collect()
            .await?;

        Ok(results.join("\n"))
    }

    async fn rolling<S: AsRef<str>>(
        &self,
        generator: &Generator,
        chunks: &[S],
        context: &mut ContextVariables,
    ) -> Result<String> {
        context.previous_results.clear();

        for (index, chunk) in chunks.iter().enumerate() {
            self.check_cancelled()?;
            debug!(chunk = index + 1, "Generating rolling result");
            context.input = chunk.as_ref().to_string();
            let result = generator
                .generate(context)
                .await
                .with_context(|| format!("Failed on chunk {}", index + 1))?;
            context.previous_results = result;
        }

        Ok(context.previous_results.clone())
    }

    async fn condense<S: AsRef<str>>(
        &self,
        generator: &Generator,
        chunks: &[S],
        result_tag: &str,
        context: &mut ContextVariables,
    ) -> Result<String> {
        let mut results = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            self.check_cancelled()?;
            debug!(chunk = index + 1, "Generating partial result");
            context.input = chunk.as_ref().to_string();
            let result = generator
                .generate(context)
                .await
                .with_context(|| format!("Failed on chunk {}", index + 1))?;
            results.push(result);
        }

        if results.len() <= 1 {
            return Ok(results.pop().unwrap_or_default());
        }

        let mut capture_context = context.clone();
        capture_context.input.clear();
        context.prompt = generator.prompt_capture().generate(&capture_context).await?;

        self.condenser.condense(results, result_tag, context).await
    }
}
