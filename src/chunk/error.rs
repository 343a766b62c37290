//! Chunking failures.

use thiserror::Error;

/// A header that must stay whole cannot fit in a chunk.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    /// A commit identifier line is longer than the maximum chunk size.
    #[error("Commit header is {header_len} characters, exceeding the maximum chunk size of {max_chunk_size}")]
    CommitHeaderTooLong {
        /// Header length in characters.
        header_len: usize,
        /// Configured maximum chunk size.
        max_chunk_size: usize,
    },

    /// A file-diff header plus its commit header exceed the maximum chunk size.
    #[error("Diff header for {path} needs {required} characters, exceeding the maximum chunk size of {max_chunk_size}")]
    FileHeaderTooLong {
        /// Path of the file whose header overflowed.
        path: String,
        /// Commit header plus file-diff header length in characters.
        required: usize,
        /// Configured maximum chunk size.
        max_chunk_size: usize,
    },

    /// The carried-forward headers fill the chunk, leaving no room for content.
    #[error("Carried headers take {carried_len} of {max_chunk_size} characters, leaving no room for content")]
    NoRoomForContent {
        /// Length of the carried-forward prefix in characters.
        carried_len: usize,
        /// Configured maximum chunk size.
        max_chunk_size: usize,
    },
}
