//! In-memory graph store

use crate::StoreError;
use async_trait::async_trait;
use graphgen_domain::traits::GraphStore;
use graphgen_domain::{CanonicalEdge, CanonicalNode, EdgeKey};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Graph store backed by hash maps
///
/// Cheap to create; contents are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    nodes: RwLock<HashMap<String, CanonicalNode>>,
    edges: RwLock<HashMap<EdgeKey, CanonicalEdge>>,
}

impl MemoryGraphStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    type Error = StoreError;

    async fn get_node(&self, name: &str) -> Result<Option<CanonicalNode>, Self::Error> {
        Ok(self.nodes.read().await.get(name).cloned())
    }

    async fn upsert_node(&self, name: &str, node: CanonicalNode) -> Result<(), Self::Error> {
        self.nodes.write().await.insert(name.to_string(), node);
        Ok(())
    }

    async fn get_edge(
        &self,
        src_id: &str,
        tgt_id: &str,
    ) -> Result<Option<CanonicalEdge>, Self::Error> {
        let key = (src_id.to_string(), tgt_id.to_string());
        Ok(self.edges.read().await.get(&key).cloned())
    }

    async fn upsert_edge(
        &self,
        src_id: &str,
        tgt_id: &str,
        edge: CanonicalEdge,
    ) -> Result<(), Self::Error> {
        self.edges
            .write()
            .await
            .insert((src_id.to_string(), tgt_id.to_string()), edge);
        Ok(())
    }

    async fn node_count(&self) -> Result<usize, Self::Error> {
        Ok(self.nodes.read().await.len())
    }

    async fn edge_count(&self) -> Result<usize, Self::Error> {
        Ok(self.edges.read().await.len())
    }

    async fn all_nodes(&self) -> Result<Vec<(String, CanonicalNode)>, Self::Error> {
        let mut nodes: Vec<_> = self
            .nodes
            .read()
            .await
            .iter()
            .map(|(name, node)| (name.clone(), node.clone()))
            .collect();
        nodes.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(nodes)
    }

    async fn all_edges(&self) -> Result<Vec<(EdgeKey, CanonicalEdge)>, Self::Error> {
        let mut edges: Vec<_> = self
            .edges
            .read()
            .await
            .iter()
            .map(|(key, edge)| (key.clone(), edge.clone()))
            .collect();
        edges.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(entity_type: &str) -> CanonicalNode {
        CanonicalNode {
            entity_type: entity_type.to_string(),
            description: "desc".to_string(),
            source_id: "c1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_node() {
        let store = MemoryGraphStore::new();
        store.upsert_node("Acme", node("ORG")).await.unwrap();
        store.upsert_node("Acme", node("COMPANY")).await.unwrap();

        let stored = store.get_node("Acme").await.unwrap().unwrap();
        assert_eq!(stored.entity_type, "COMPANY");
        assert_eq!(store.node_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_has_node_default_method() {
        let store = MemoryGraphStore::new();
        assert!(!store.has_node("Acme").await.unwrap());
        store.upsert_node("Acme", node("ORG")).await.unwrap();
        assert!(store.has_node("Acme").await.unwrap());
    }

    #[tokio::test]
    async fn test_edges_are_directional() {
        let store = MemoryGraphStore::new();
        let edge = CanonicalEdge {
            description: "founded".to_string(),
            keywords: "founding".to_string(),
            weight: 0.9,
            source_id: "c1".to_string(),
        };
        store.upsert_edge("Person1", "Entity1", edge).await.unwrap();

        assert!(store.get_edge("Person1", "Entity1").await.unwrap().is_some());
        assert!(store.get_edge("Entity1", "Person1").await.unwrap().is_none());
        assert_eq!(store.edge_count().await.unwrap(), 1);
    }
}
