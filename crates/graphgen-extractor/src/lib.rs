//! GraphGen Extractor
//!
//! Turns chunks of text into a knowledge graph of entities and relationships
//! using an LLM.
//!
//! # Overview
//!
//! Each chunk is sent to the LLM with a language-specific extraction prompt.
//! The model is then asked whether anything was missed and, while it says
//! yes, to continue extracting, up to `max_loop` rounds. The concatenated
//! output is split into delimited tuples which are classified as entity or
//! relationship records and grouped by name or by ordered pair.
//!
//! Groups from many chunks are folded together and merged into a graph
//! store: majority-vote types, deduplicated descriptions (summarised by the
//! LLM once they grow long), summed edge weights and sorted provenance.
//!
//! # Architecture
//!
//! ```text
//! Chunk → Prompt Composer → Glean Loop (LLM) → Tokenizer → Classifier
//!       → Aggregator → Merge Resolver → GraphStore
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use graphgen_domain::Chunk;
//! use graphgen_extractor::{Extractor, ExtractorConfig};
//! use graphgen_llm::MockProvider;
//! use graphgen_store::MemoryGraphStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(
//!     r#"("entity"<|>"Entity1"<|>"organization"<|>"A company")<|COMPLETE|>"#,
//! );
//! let extractor = Extractor::new(llm, ExtractorConfig::default())?;
//! let store = MemoryGraphStore::new();
//!
//! let chunks = vec![Chunk::new("c1", "Entity1 is a company.")];
//! let report = extractor.build_graph(&chunks, &store).await?;
//!
//! println!("Nodes created: {}", report.merge.nodes_created);
//! println!("Failures: {}", report.failures.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod aggregate;
mod classifier;
mod config;
mod error;
mod extractor;
mod glean;
mod language;
mod locks;
mod merge;
mod prompt;
mod tokenizer;
mod types;

#[cfg(test)]
mod tests;

pub use aggregate::Aggregator;
pub use classifier::{
    clean_str, classify, parse_response, DiscardReason, ParsedRecord, ParsedResponse,
};
pub use config::{ExtractorConfig, FormatConfig};
pub use error::{ExtractorError, Stage};
pub use extractor::Extractor;
pub use glean::{is_affirmative, GleanLoop, GleanOutput};
pub use language::{detect_language, Language};
pub use locks::KeyedLocks;
pub use merge::{
    consolidate_descriptions, merge_keywords, resolve_entity_type, EdgeMerge, MergeLocks,
    MergeResolver, NodeMerge, SummaryOutcome, UNKNOWN_ENTITY_TYPE,
};
pub use prompt::{ExtractionPrompts, FormatParams, PromptComposer};
pub use tokenizer::{extract_tuple, split_by_markers, split_records};
pub use types::{
    BatchExtraction, BuildReport, ChunkExtraction, ChunkFailure, ChunkMetadata, MergeSummary,
};
