//! Greedy packing of commits and file diffs into size-bounded chunks.
//!
//! Units are appended to a buffer in input order. When the next piece does
//! not fit, the buffer is sealed into a [`Chunk`] and restarted with the
//! headers that give the remaining content its context: the commit header
//! when a commit's message or a new file diff continues, and the commit
//! header plus file-diff header when a file body is split mid-way. Those
//! repeated headers are recorded as the chunk's carried prefix so the
//! original content can be recovered.

use anyhow::Result;
use tracing::debug;

use crate::chunk::ChunkError;
use crate::git::diff_split::{split_commits, CommitUnit};

/// A bounded slice of diff output, possibly prefixed by carried headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    text: String,
    carried_bytes: usize,
}

impl Chunk {
    /// Full chunk text, carried prefix included.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The chunk text without its carried prefix.
    pub fn content(&self) -> &str {
        &self.text[self.carried_bytes..]
    }

    /// The carried-forward headers at the start of the chunk.
    pub fn carried(&self) -> &str {
        &self.text[..self.carried_bytes]
    }

    /// Chunk size in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

impl AsRef<str> for Chunk {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Splits raw diff/show output into commits and packs them into chunks of at
/// most `max_chunk_size` characters.
pub fn chunk_commit_info(text: &str, max_chunk_size: usize) -> Result<Vec<Chunk>> {
    pack(&split_commits(text), max_chunk_size)
}

/// Packs commits into chunks of at most `max_chunk_size` characters.
///
/// Chunk content order equals input order. Headers are never split; a header
/// that cannot fit fails with a [`ChunkError`]. Empty input produces no
/// chunks.
pub fn pack(commits: &[CommitUnit], max_chunk_size: usize) -> Result<Vec<Chunk>> {
    let mut packer = Packer::new(max_chunk_size);

    for commit in commits {
        packer.push_commit(commit)?;
    }

    let chunks = packer.finish();
    debug!(
        commit_count = commits.len(),
        chunk_count = chunks.len(),
        max_chunk_size,
        "Packed diff into chunks"
    );
    Ok(chunks)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset just past the first `n` characters of `text`.
fn byte_offset(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}

/// Chunk being assembled.
#[derive(Default)]
struct Buffer {
    text: String,
    chars: usize,
    carried_bytes: usize,
}

impl Buffer {
    fn has_content(&self) -> bool {
        self.text.len() > self.carried_bytes
    }

    fn push(&mut self, text: &str, chars: usize) {
        self.text.push_str(text);
        self.chars += chars;
    }

    fn reset_to(&mut self, carried: &str) {
        self.text.clear();
        self.text.push_str(carried);
        self.chars = char_len(carried);
        self.carried_bytes = carried.len();
    }
}

struct Packer {
    max: usize,
    buffer: Buffer,
    chunks: Vec<Chunk>,
}

impl Packer {
    fn new(max: usize) -> Self {
        Self {
            max,
            buffer: Buffer::default(),
            chunks: Vec::new(),
        }
    }

    fn room(&self) -> usize {
        self.max.saturating_sub(self.buffer.chars)
    }

    /// Seals the buffer into a chunk if it holds anything beyond carried
    /// headers, then clears it.
    fn seal(&mut self) {
        if self.buffer.has_content() {
            let buffer = std::mem::take(&mut self.buffer);
            self.chunks.push(Chunk {
                text: buffer.text,
                carried_bytes: buffer.carried_bytes,
            });
        } else {
            self.buffer.reset_to("");
        }
    }

    fn push_commit(&mut self, commit: &CommitUnit) -> Result<()> {
        let header_len = char_len(&commit.header);
        if header_len > self.max {
            return Err(ChunkError::CommitHeaderTooLong {
                header_len,
                max_chunk_size: self.max,
            }
            .into());
        }
        if self.buffer.chars + header_len > self.max {
            self.seal();
        }
        self.buffer.push(&commit.header, header_len);
        self.stream(&commit.message, &commit.header)?;

        let mut carried = String::new();
        for file_diff in &commit.file_diffs {
            let fd_header_len = char_len(&file_diff.header);
            if self.buffer.chars + fd_header_len > self.max {
                self.seal();
                self.buffer.reset_to(&commit.header);
                if header_len + fd_header_len > self.max {
                    return Err(ChunkError::FileHeaderTooLong {
                        path: file_diff.path.clone(),
                        required: header_len + fd_header_len,
                        max_chunk_size: self.max,
                    }
                    .into());
                }
            }
            self.buffer.push(&file_diff.header, fd_header_len);

            carried.clear();
            carried.push_str(&commit.header);
            carried.push_str(&file_diff.header);
            self.stream(&file_diff.body, &carried)?;
        }

        Ok(())
    }

    /// Appends `text`, sealing and restarting with `carried` as often as
    /// needed.
    fn stream(&mut self, text: &str, carried: &str) -> Result<()> {
        let mut rest = text;
        let mut rest_chars = char_len(rest);

        while rest_chars > 0 {
            let room = self.room();
            if rest_chars <= room {
                self.buffer.push(rest, rest_chars);
                break;
            }

            if room > 0 {
                let split = byte_offset(rest, room);
                self.buffer.push(&rest[..split], room);
                rest = &rest[split..];
                rest_chars -= room;
            }

            self.seal();
            self.buffer.reset_to(carried);
            if self.room() == 0 {
                return Err(ChunkError::NoRoomForContent {
                    carried_len: self.buffer.chars,
                    max_chunk_size: self.max,
                }
                .into());
            }
        }

        Ok(())
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.seal();
        self.chunks
    }
}
