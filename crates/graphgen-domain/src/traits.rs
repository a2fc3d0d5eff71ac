//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction pipeline and
//! infrastructure. Implementations live in other crates.

use crate::{CanonicalEdge, CanonicalNode, ConversationHistory, EdgeKey};
use async_trait::async_trait;
use std::fmt::Display;

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (graphgen-llm). A call either
/// returns the generated text or fails with a transport/provider error;
/// retries are the implementation's concern, never the caller's.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Error type for LLM operations
    type Error: Display + Send + Sync + 'static;

    /// Generate a completion for `prompt`, continuing `history`
    async fn generate(
        &self,
        prompt: &str,
        history: &ConversationHistory,
    ) -> Result<String, Self::Error>;
}

/// Trait for the graph store consumed by the merge stage
///
/// Implemented by the infrastructure layer (graphgen-store). Upserts replace
/// the stored value entirely; they are never field-by-field patches.
/// Implementations must be safe to share between tasks; callers serialise
/// read-modify-write cycles on the same key.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Error type for store operations
    type Error: Display + Send + Sync + 'static;

    /// Get the canonical node for an entity name
    async fn get_node(&self, name: &str) -> Result<Option<CanonicalNode>, Self::Error>;

    /// Whether a node exists for an entity name
    async fn has_node(&self, name: &str) -> Result<bool, Self::Error> {
        Ok(self.get_node(name).await?.is_some())
    }

    /// Insert or replace the canonical node for an entity name
    async fn upsert_node(&self, name: &str, node: CanonicalNode) -> Result<(), Self::Error>;

    /// Get the canonical edge for an ordered pair
    async fn get_edge(&self, src_id: &str, tgt_id: &str)
        -> Result<Option<CanonicalEdge>, Self::Error>;

    /// Insert or replace the canonical edge for an ordered pair
    async fn upsert_edge(
        &self,
        src_id: &str,
        tgt_id: &str,
        edge: CanonicalEdge,
    ) -> Result<(), Self::Error>;

    /// Number of stored nodes
    async fn node_count(&self) -> Result<usize, Self::Error>;

    /// Number of stored edges
    async fn edge_count(&self) -> Result<usize, Self::Error>;

    /// All nodes, sorted by name
    async fn all_nodes(&self) -> Result<Vec<(String, CanonicalNode)>, Self::Error>;

    /// All edges, sorted by pair
    async fn all_edges(&self) -> Result<Vec<(EdgeKey, CanonicalEdge)>, Self::Error>;
}
