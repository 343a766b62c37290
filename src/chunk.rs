//! Bounded chunking of diff output and plain text.

pub mod error;
pub mod measure;
pub mod packer;
pub mod text;

pub use error::ChunkError;
pub use measure::{CharCount, SizeMeasure, TokenEstimate};
pub use packer::{chunk_commit_info, pack, Chunk};
pub use text::{split_plain_text_lines, split_plain_text_paragraphs};

/// Default maximum chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 8000;
