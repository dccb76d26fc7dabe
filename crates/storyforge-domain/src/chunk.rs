//! Chunk - a bounded segment of a source document

/// An ordered, immutable slice of a document handed to one worker
///
/// `overlap` counts the leading characters this chunk shares with the
/// previous one. Dropping those characters from every chunk after the
/// first and concatenating yields the original document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based ordinal position within the run
    pub index: usize,

    /// Byte offset of `text` in the source document
    pub start: usize,

    /// Leading characters shared with the previous chunk
    pub overlap: usize,

    /// Chunk content
    pub text: String,
}

impl Chunk {
    /// Text that is new in this chunk, with the overlap prefix removed
    pub fn fresh_text(&self) -> &str {
        match self.text.char_indices().nth(self.overlap) {
            Some((byte, _)) => &self.text[byte..],
            None => "",
        }
    }

    /// Length of the chunk in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Rebuild the source text from an ordered chunk sequence
pub fn reassemble<'a, I>(chunks: I) -> String
where
    I: IntoIterator<Item = &'a Chunk>,
{
    let mut out = String::new();
    for chunk in chunks {
        out.push_str(chunk.fresh_text());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_text_skips_overlap() {
        let chunk = Chunk {
            index: 1,
            start: 3,
            overlap: 2,
            text: "déjà".to_string(),
        };
        assert_eq!(chunk.fresh_text(), "jà");
        assert_eq!(chunk.char_len(), 4);
    }

    #[test]
    fn test_reassemble() {
        let chunks = vec![
            Chunk { index: 0, start: 0, overlap: 0, text: "abcd".into() },
            Chunk { index: 1, start: 2, overlap: 2, text: "cdef".into() },
        ];
        assert_eq!(reassemble(&chunks), "abcdef");
    }
}
