//! GraphGen Domain Layer
//!
//! This crate contains the core data model for GraphGen's knowledge-graph
//! extraction pipeline and the trait interfaces that every other layer
//! depends upon.
//!
//! ## Key Concepts
//!
//! - **Chunk**: A unit of input text with a stable, caller-assigned identifier
//! - **Records**: One entity or relationship mention extracted from one chunk
//! - **Extraction Result**: A chunk's records grouped by entity name and by
//!   ordered (source, target) pair
//! - **Canonical Node / Edge**: The merged, persisted form of a group of records
//! - **Provenance**: The set of chunk identifiers behind a canonical record
//!
//! ## Architecture
//!
//! - Pure data types and grouping logic only
//! - Infrastructure (LLM providers, graph stores) lives in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod extraction;
pub mod graph;
pub mod history;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use chunk::Chunk;
pub use extraction::ExtractionResult;
pub use graph::{join_source_ids, split_source_ids, CanonicalEdge, CanonicalNode, GRAPH_FIELD_SEP};
pub use history::{ConversationHistory, Turn};
pub use record::{EdgeKey, EntityRecord, RelationshipRecord, DEFAULT_RELATIONSHIP_WEIGHT};
