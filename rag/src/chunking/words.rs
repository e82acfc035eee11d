//! Fixed word-window chunking.

use crate::error::Result;
use crate::types::{Document, Passage};

use super::Chunker;

/// Chunks text into consecutive windows of `chunk_size` words with no overlap.
///
/// Words are maximal runs of non-whitespace and are rejoined with a single space,
/// so any run of whitespace (including newlines) collapses. Only the last passage
/// may be shorter than `chunk_size`.
///
/// # Example
///
/// ```rust
/// use lookout_rag::chunking::{Chunker, WordChunker};
/// use lookout_rag::Document;
///
/// let chunker = WordChunker::new(2);
/// let doc = Document::new("kb", "one two three", "kb", "kb.txt");
/// let passages = chunker.chunk(&doc).unwrap();
/// assert_eq!(passages[0].text, "one two");
/// assert_eq!(passages[1].text, "three");
/// ```
#[derive(Debug, Clone)]
pub struct WordChunker {
    chunk_size: usize,
}

impl WordChunker {
    /// Creates a new word chunker.
    ///
    /// # Panics
    /// Panics if `chunk_size` is zero.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be greater than zero");
        Self { chunk_size }
    }

    /// Returns the configured window size in words.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Default for WordChunker {
    fn default() -> Self {
        Self::new(75)
    }
}

impl Chunker for WordChunker {
    fn chunk(&self, doc: &Document) -> Result<Vec<Passage>> {
        let words: Vec<&str> = doc.text.split_whitespace().collect();

        let passages = words
            .chunks(self.chunk_size)
            .enumerate()
            .map(|(ordinal, window)| {
                Passage::new(
                    format!("{}#chunk_{ordinal}", doc.id),
                    &doc.id,
                    window.join(" "),
                    ordinal,
                )
            })
            .collect();

        Ok(passages)
    }

    fn name(&self) -> &'static str {
        "words"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new("kb", text, "kb", "kb.txt")
    }

    #[test]
    fn splits_into_fixed_windows() {
        let text = (1..=7).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let passages = WordChunker::new(3).chunk(&doc(&text)).unwrap();

        let texts: Vec<_> = passages.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["w1 w2 w3", "w4 w5 w6", "w7"]);
        assert_eq!(passages[2].ordinal, 2);
        assert_eq!(passages[1].id, "kb#chunk_1");
        assert!(passages.iter().all(|p| p.document_id == "kb"));
    }

    #[test]
    fn window_count_is_ceiling() {
        for words in [1usize, 74, 75, 76, 150, 151] {
            let text = vec!["x"; words].join(" ");
            let passages = WordChunker::new(75).chunk(&doc(&text)).unwrap();
            assert_eq!(passages.len(), words.div_ceil(75), "words = {words}");
        }
    }

    #[test]
    fn concatenation_restores_word_sequence() {
        let text = "alpha  beta\n\ngamma\tdelta epsilon\nzeta";
        let passages = WordChunker::new(4).chunk(&doc(text)).unwrap();

        let rejoined = passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let original: Vec<_> = text.split_whitespace().collect();
        assert_eq!(rejoined, original.join(" "));
    }

    #[test]
    fn empty_and_whitespace_only_yield_nothing() {
        let chunker = WordChunker::default();
        assert!(chunker.chunk(&doc("")).unwrap().is_empty());
        assert!(chunker.chunk(&doc(" \n\t  ")).unwrap().is_empty());
    }

    #[test]
    #[should_panic(expected = "chunk_size")]
    fn zero_chunk_size_panics() {
        let _ = WordChunker::new(0);
    }
}
