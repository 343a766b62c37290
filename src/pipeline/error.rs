//! Pipeline control-flow failures.

use thiserror::Error;

/// Errors raised by the chunk processor and condenser themselves.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The cancellation token fired before the next generation call.
    #[error("Operation cancelled")]
    Cancelled,

    /// Condensing still had several results after the pass cap.
    #[error("Condensing did not converge after {passes} passes ({remaining} results remain)")]
    CondenseDidNotConverge {
        /// Passes performed.
        passes: usize,
        /// Results left when the cap was hit.
        remaining: usize,
    },
}
