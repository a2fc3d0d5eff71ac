//! Single-writer reduction of per-chunk results

use crate::error::ExtractorError;
use crate::types::{BatchExtraction, ChunkExtraction, ChunkFailure};

/// Folds chunk outcomes into one batch result
///
/// Chunks run concurrently but their outcomes are fed here one at a time,
/// in chunk input order, so the order of records inside each group does
/// not depend on scheduling.
#[derive(Debug, Default)]
pub struct Aggregator {
    batch: BatchExtraction,
}

impl Aggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one chunk's outcome
    pub fn push(&mut self, chunk_id: &str, outcome: Result<ChunkExtraction, ExtractorError>) {
        match outcome {
            Ok(extraction) => self.push_success(extraction),
            Err(error) => self.push_failure(ChunkFailure::from_error(chunk_id, &error)),
        }
    }

    /// Fold a successful chunk
    pub fn push_success(&mut self, extraction: ChunkExtraction) {
        self.batch.result.absorb(extraction.result);
        self.batch.chunks.push(extraction.metadata);
    }

    /// Record a failed chunk
    pub fn push_failure(&mut self, failure: ChunkFailure) {
        self.batch.failures.push(failure);
    }

    /// Chunks folded so far, failures included
    pub fn chunks_seen(&self) -> usize {
        self.batch.chunks.len() + self.batch.failures.len()
    }

    /// Finish the reduction
    pub fn finish(self) -> BatchExtraction {
        self.batch
    }
}
