//! Recursive condensing of partial results into one.
//!
//! Each pass joins the current results with a tagged delimiter, re-splits the
//! blob into paragraphs that fit one generation call, and generates one
//! condensed result per paragraph. The loop ends when a pass sees a single
//! paragraph, or fails once the pass cap is reached.

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ai::{ContextVariables, Generator};
use crate::chunk::{
    split_plain_text_lines, split_plain_text_paragraphs, CharCount, SizeMeasure,
    DEFAULT_CHUNK_SIZE,
};
use crate::pipeline::PipelineError;

/// Default cap on condense passes.
pub const DEFAULT_MAX_CONDENSE_PASSES: usize = 10;

/// Line size is this fraction of the chunk size when re-splitting a blob.
const LINE_SIZE_DIVISOR: usize = 8;

/// Returns the delimiter placed between and after results tagged `tag`.
pub fn result_delimiter(tag: &str) -> String {
    format!("\n ====={tag}=====\n")
}

/// Joins results with the tag delimiter, including a trailing delimiter.
fn join_results(results: &[String], delimiter: &str) -> String {
    let mut blob = results.join(delimiter);
    blob.push_str(delimiter);
    blob
}

/// Merges many partial results into one through repeated generation.
pub struct Condenser {
    generator: Generator,
    chunk_size: usize,
    measure: Arc<dyn SizeMeasure>,
    max_passes: usize,
    cancel: CancellationToken,
}

impl Condenser {
    /// Creates a condenser that runs `generator` once per paragraph.
    ///
    /// The generator's template sees the paragraph as `{{$input}}` and the
    /// captured prompt of the originating function as `{{$prompt}}`.
    pub fn new(generator: Generator) -> Self {
        Self {
            generator,
            chunk_size: DEFAULT_CHUNK_SIZE,
            measure: Arc::new(CharCount),
            max_passes: DEFAULT_MAX_CONDENSE_PASSES,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the paragraph size limit.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the measure used when re-splitting results.
    #[must_use]
    pub fn with_measure(mut self, measure: Arc<dyn SizeMeasure>) -> Self {
        self.measure = measure;
        self
    }

    /// Sets the pass cap.
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Sets the token checked before every generation call.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Condenses `results` into a single string.
    ///
    /// No results yields an empty string and a single result is returned
    /// unchanged; neither calls the model. Leaves the last paragraph in
    /// `context.input`.
    pub async fn condense(
        &self,
        results: Vec<String>,
        result_tag: &str,
        context: &mut ContextVariables,
    ) -> Result<String> {
        let mut results = results;
        if results.len() <= 1 {
            return Ok(results.pop().unwrap_or_default());
        }

        let delimiter = result_delimiter(result_tag);
        let measure = self.measure.as_ref();
        let line_size = self.chunk_size / LINE_SIZE_DIVISOR;

        for pass in 1..=self.max_passes {
            let blob = join_results(&results, &delimiter);
            let lines = split_plain_text_lines(&blob, line_size, measure);
            let paragraphs = split_plain_text_paragraphs(&lines, self.chunk_size, measure);
            debug!(
                pass,
                result_count = results.len(),
                paragraph_count = paragraphs.len(),
                result_tag,
                "Starting condense pass"
            );

            if paragraphs.len() > 1 {
                warn!(
                    pass,
                    paragraph_count = paragraphs.len(),
                    result_tag,
                    "Condensing {} paragraphs",
                    paragraphs.len()
                );
            }

            let previous_count = results.len();
            let mut condensed = Vec::with_capacity(paragraphs.len());
            for paragraph in paragraphs {
                if self.cancel.is_cancelled() {
                    return Err(PipelineError::Cancelled.into());
                }
                context.input = paragraph;
                condensed.push(self.generator.generate(context).await?);
            }

            if condensed.len() <= 1 {
                info!(passes = pass, result_tag, "Condensed results");
                return Ok(condensed.pop().unwrap_or_default());
            }
            if condensed.len() >= previous_count {
                warn!(
                    pass,
                    previous_count,
                    result_count = condensed.len(),
                    "Condense pass did not reduce the number of results"
                );
            }
            results = condensed;
        }

        Err(PipelineError::CondenseDidNotConverge {
            passes: self.max_passes,
            remaining: results.len(),
        }
        .into())
    }
}
