//! Splitting documents into overlapping, bounded chunks
//!
//! Sizes are measured in characters, never bytes, so a cut can not land
//! inside a multi-byte character. Each chunk holds at most `chunk_size`
//! characters and every chunk after the first starts with exactly
//! `overlap` characters taken from the end of its predecessor.

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use storyforge_domain::Chunk;

/// Splits text on a preferred separator, falling back to hard cuts
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
    separator: String,
    max_text_length: usize,
}

impl TextChunker {
    /// Create a new text chunker
    ///
    /// Fails when `chunk_size` is zero or `overlap` is not smaller than it.
    pub fn new(
        chunk_size: usize,
        overlap: usize,
        separator: impl Into<String>,
    ) -> Result<Self, ExtractorError> {
        if chunk_size == 0 {
            return Err(ExtractorError::Chunking(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(ExtractorError::Chunking(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            overlap,
            separator: separator.into(),
            max_text_length: usize::MAX,
        })
    }

    /// Build a chunker from extractor settings
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        let mut chunker = Self::new(
            config.chunk_size,
            config.chunk_overlap,
            config.separator.clone(),
        )?;
        chunker.max_text_length = config.max_text_length;
        Ok(chunker)
    }

    /// Reject documents longer than `max` characters
    pub fn with_max_text_length(mut self, max: usize) -> Self {
        self.max_text_length = max;
        self
    }

    /// Lazily chunk the given text
    ///
    /// Empty or whitespace-only documents are rejected here, before any
    /// chunk is produced.
    pub fn chunk<'a>(&'a self, text: &'a str) -> Result<Chunks<'a>, ExtractorError> {
        if text.trim().is_empty() {
            return Err(ExtractorError::Chunking("document is empty".to_string()));
        }

        let length = text.chars().count();
        if length > self.max_text_length {
            return Err(ExtractorError::Chunking(format!(
                "document has {} characters, maximum is {}",
                length, self.max_text_length
            )));
        }

        Ok(Chunks {
            chunker: self,
            text,
            position: 0,
            index: 0,
            finished: false,
        })
    }

    /// Chunk the given text into a vector
    pub fn split(&self, text: &str) -> Result<Vec<Chunk>, ExtractorError> {
        Ok(self.chunk(text)?.collect())
    }
}

/// Iterator over the chunks of one document
///
/// Produced by [`TextChunker::chunk`]. The sequence is deterministic for a
/// given text and chunker.
#[derive(Debug)]
pub struct Chunks<'a> {
    chunker: &'a TextChunker,
    text: &'a str,
    position: usize,
    index: usize,
    finished: bool,
}

impl Chunks<'_> {
    /// Byte length of the next chunk, measured from `position`
    fn next_cut(&self, rest: &str) -> Option<usize> {
        // Byte offset of the first character past the size limit
        let (limit, _) = rest.char_indices().nth(self.chunker.chunk_size)?;
        let window = &rest[..limit];

        let separator = self.chunker.separator.as_str();
        if !separator.is_empty() {
            if let Some(found) = window.rfind(separator) {
                let cut = found + separator.len();
                // A cut inside the overlap would not advance
                if window[..cut].chars().count() > self.chunker.overlap {
                    return Some(cut);
                }
            }
        }

        Some(limit)
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.finished {
            return None;
        }

        let rest = &self.text[self.position..];
        let overlap = if self.index == 0 { 0 } else { self.chunker.overlap };

        let chunk = match self.next_cut(rest) {
            None => {
                self.finished = true;
                Chunk {
                    index: self.index,
                    start: self.position,
                    overlap,
                    text: rest.to_string(),
                }
            }
            Some(cut) => {
                let body = &rest[..cut];
                let keep = body.chars().count() - self.chunker.overlap;
                let advance = body
                    .char_indices()
                    .nth(keep)
                    .map_or(cut, |(byte, _)| byte);

                let chunk = Chunk {
                    index: self.index,
                    start: self.position,
                    overlap,
                    text: body.to_string(),
                };
                self.position += advance;
                chunk
            }
        };

        self.index += 1;
        Some(chunk)
    }
}

impl std::iter::FusedIterator for Chunks<'_> {}
