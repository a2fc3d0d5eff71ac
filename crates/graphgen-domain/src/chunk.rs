//! Chunk module - the atomic unit of extraction

use serde::{Deserialize, Serialize};

/// A unit of input text with a stable identifier
///
/// Chunks are owned by the caller and never mutated by the pipeline. The
/// identifier becomes the provenance (`source_id`) of every record extracted
/// from the chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Caller-assigned identifier, stable across runs
    pub id: String,

    /// Raw text content
    pub content: String,
}

impl Chunk {
    /// Create a new chunk
    ///
    /// # Examples
    ///
    /// ```
    /// use graphgen_domain::Chunk;
    ///
    /// let chunk = Chunk::new("c1", "Entity1 founded by Person1.");
    /// assert_eq!(chunk.id, "c1");
    /// ```
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }

    /// Length of the content in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
