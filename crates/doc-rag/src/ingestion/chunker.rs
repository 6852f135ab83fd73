//! Fixed-size overlapping text chunking with segment and offset tracking

use std::iter::FusedIterator;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, Segment};

/// Text chunker with configurable size and overlap
///
/// Lengths are counted in chars. Chunks never span two segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    /// Maximum chunk length in characters
    max_len: usize,
    /// Characters shared by consecutive chunks of one segment
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; `overlap` must be smaller than `max_len`
    pub fn new(max_len: usize, overlap: usize) -> Result<Self> {
        if overlap >= max_len {
            return Err(Error::InvalidChunkConfig { max_len, overlap });
        }
        Ok(Self { max_len, overlap })
    }

    /// Create from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Maximum chunk length in characters
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Overlap between consecutive chunks in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between the starts of consecutive chunks
    pub fn stride(&self) -> usize {
        self.max_len - self.overlap
    }

    /// Lazily chunk the given segments in order
    ///
    /// The returned iterator is `Clone`; calling this again starts over.
    pub fn chunks<'a>(&self, segments: &'a [Segment]) -> Chunks<'a> {
        Chunks {
            segments,
            max_len: self.max_len,
            stride: self.stride(),
            segment_idx: 0,
            byte_pos: 0,
            char_pos: 0,
            next_index: 0,
        }
    }

    /// Number of chunks produced for a segment of `char_len` characters
    pub fn chunk_count(&self, char_len: usize) -> usize {
        if char_len == 0 {
            return 0;
        }
        if char_len <= self.max_len {
            return 1;
        }
        (char_len - self.overlap).div_ceil(self.stride())
    }
}

/// Iterator over the chunks of a segment sequence
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    segments: &'a [Segment],
    max_len: usize,
    stride: usize,
    segment_idx: usize,
    /// Byte position of the next chunk start in the current segment
    byte_pos: usize,
    /// Char position of the next chunk start in the current segment
    char_pos: usize,
    next_index: u32,
}

impl Chunks<'_> {
    fn advance_segment(&mut self) {
        self.segment_idx += 1;
        self.byte_pos = 0;
        self.char_pos = 0;
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        loop {
            let segment = self.segments.get(self.segment_idx)?;
            let rest = &segment.text[self.byte_pos..];
            if rest.is_empty() {
                self.advance_segment();
                continue;
            }

            let end = byte_offset_of_char(rest, self.max_len);
            let chunk = Chunk {
                index: self.next_index,
                segment: segment.number,
                char_offset: self.char_pos,
                text: rest[..end].to_string(),
            };
            self.next_index += 1;

            if end == rest.len() {
                self.advance_segment();
            } else {
                self.byte_pos += byte_offset_of_char(rest, self.stride);
                self.char_pos += self.stride;
            }

            return Some(chunk);
        }
    }
}

impl FusedIterator for Chunks<'_> {}

/// Byte offset of the `n`th char of `text`, or its length if shorter
fn byte_offset_of_char(text: &str, n: usize) -> usize {
    text.char_indices()
        .nth(n)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}
