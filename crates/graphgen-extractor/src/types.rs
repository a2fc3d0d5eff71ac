//! Result and report types for extraction and merging

use crate::error::{ExtractorError, Stage};
use crate::language::Language;
use crate::merge::{EdgeMerge, NodeMerge, SummaryOutcome};
use graphgen_domain::ExtractionResult;
use serde::{Deserialize, Serialize};

/// Metadata about one chunk's extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Chunk identifier
    pub chunk_id: String,

    /// Template family used for the chunk
    pub language: Language,

    /// Name of the LLM model used
    pub model_name: String,

    /// LLM calls issued, decision queries included
    pub llm_calls: usize,

    /// Glean rounds that produced an extraction
    pub glean_rounds: usize,

    /// Tuples that could not be classified
    pub discarded_records: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Records extracted from one chunk
#[derive(Debug, Clone)]
pub struct ChunkExtraction {
    /// Grouped records
    pub result: ExtractionResult,

    /// Metadata about the extraction
    pub metadata: ChunkMetadata,
}

/// A chunk that produced no result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkFailure {
    /// Chunk identifier
    pub chunk_id: String,

    /// Stage that failed, when an LLM call was at fault
    pub stage: Option<Stage>,

    /// Reason for failure
    pub reason: String,
}

impl ChunkFailure {
    /// Build a failure record from an extraction error
    pub fn from_error(chunk_id: impl Into<String>, error: &ExtractorError) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            stage: error.stage(),
            reason: error.to_string(),
        }
    }
}

/// Output of extracting a batch of chunks
#[derive(Debug, Clone, Default)]
pub struct BatchExtraction {
    /// Records of every successful chunk, folded in chunk input order
    pub result: ExtractionResult,

    /// Metadata of every successful chunk, in input order
    pub chunks: Vec<ChunkMetadata>,

    /// Chunks that failed, in input order
    pub failures: Vec<ChunkFailure>,
}

impl BatchExtraction {
    /// Total LLM calls issued by successful chunks
    pub fn llm_calls(&self) -> usize {
        self.chunks.iter().map(|c| c.llm_calls).sum()
    }

    /// Total tuples discarded by successful chunks
    pub fn discarded_records(&self) -> usize {
        self.chunks.iter().map(|c| c.discarded_records).sum()
    }
}

/// Counters for one merge pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Nodes written that did not exist before
    pub nodes_created: usize,

    /// Nodes written that already existed
    pub nodes_updated: usize,

    /// Edges written that did not exist before
    pub edges_created: usize,

    /// Edges written that already existed
    pub edges_updated: usize,

    /// `UNKNOWN` nodes inserted for missing edge endpoints
    pub placeholder_nodes: usize,

    /// Descriptions the LLM summarised
    pub summaries: usize,

    /// Summarisations that failed and kept the raw join
    pub summary_fallbacks: usize,
}

impl MergeSummary {
    /// Count one node merge
    pub fn record_node(&mut self, merge: &NodeMerge) {
        if merge.existed {
            self.nodes_updated += 1;
        } else {
            self.nodes_created += 1;
        }
        self.record_summary(merge.summary);
    }

    /// Count one edge merge
    pub fn record_edge(&mut self, merge: &EdgeMerge) {
        if merge.existed {
            self.edges_updated += 1;
        } else {
            self.edges_created += 1;
        }
        self.placeholder_nodes += merge.placeholders;
        self.record_summary(merge.summary);
    }

    fn record_summary(&mut self, outcome: SummaryOutcome) {
        match outcome {
            SummaryOutcome::NotNeeded => {}
            SummaryOutcome::Summarized => self.summaries += 1,
            SummaryOutcome::FellBack => self.summary_fallbacks += 1,
        }
    }

    /// Summarisation calls issued, successful or not
    pub fn summary_calls(&self) -> usize {
        self.summaries + self.summary_fallbacks
    }
}

/// Report of a full extract-and-merge run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Chunks submitted
    pub chunks_total: usize,

    /// Chunks that produced a result
    pub chunks_succeeded: usize,

    /// Chunks that failed
    pub failures: Vec<ChunkFailure>,

    /// Entity mentions across successful chunks
    pub entity_mentions: usize,

    /// Relationship mentions across successful chunks
    pub relationship_mentions: usize,

    /// Tuples that could not be classified
    pub discarded_records: usize,

    /// Merge counters
    pub merge: MergeSummary,

    /// LLM calls issued, summarisation included
    pub llm_calls: usize,

    /// Wall-clock time in milliseconds
    pub elapsed_ms: u64,
}

impl BuildReport {
    /// True when every chunk succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
