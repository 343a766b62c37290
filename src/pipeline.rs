//! Per-chunk generation and recursive condensing of partial results.

pub mod condenser;
pub mod error;
pub mod processor;

pub use condenser::{Condenser, DEFAULT_MAX_CONDENSE_PASSES};
pub use error::PipelineError;
pub use processor::{AggregationMode, ChunkProcessor};
