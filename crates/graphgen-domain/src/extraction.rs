//! Grouped extraction output

use crate::record::{EdgeKey, EntityRecord, RelationshipRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Records grouped by entity name and by ordered relationship pair
///
/// Grouping uses exact string equality: `"Acme"` and `"acme"` land in
/// different groups. Within a group, records keep first-seen-first order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Entity name -> mentions of that entity
    pub nodes: HashMap<String, Vec<EntityRecord>>,

    /// `(src_id, tgt_id)` -> mentions of that relationship
    #[serde(with = "edge_map")]
    pub edges: HashMap<EdgeKey, Vec<RelationshipRecord>>,
}

impl ExtractionResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity mention to its group
    pub fn push_entity(&mut self, record: EntityRecord) {
        self.nodes
            .entry(record.entity_name.clone())
            .or_default()
            .push(record);
    }

    /// Append a relationship mention to its group
    pub fn push_relationship(&mut self, record: RelationshipRecord) {
        self.edges.entry(record.key()).or_default().push(record);
    }

    /// Fold another result into this one
    ///
    /// The other result's records are appended after the existing records of
    /// each group, so absorbing results in chunk order keeps group order
    /// deterministic.
    pub fn absorb(&mut self, other: ExtractionResult) {
        for (name, records) in other.nodes {
            self.nodes.entry(name).or_default().extend(records);
        }
        for (key, records) in other.edges {
            self.edges.entry(key).or_default().extend(records);
        }
    }

    /// True when no records were extracted
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Total number of entity mentions across all groups
    pub fn entity_mentions(&self) -> usize {
        self.nodes.values().map(Vec::len).sum()
    }

    /// Total number of relationship mentions across all groups
    pub fn relationship_mentions(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Entity names in sorted order
    pub fn sorted_entity_names(&self) -> Vec<&String> {
        let mut names: Vec<_> = self.nodes.keys().collect();
        names.sort();
        names
    }

    /// Edge keys in sorted order
    pub fn sorted_edge_keys(&self) -> Vec<&EdgeKey> {
        let mut keys: Vec<_> = self.edges.keys().collect();
        keys.sort();
        keys
    }
}

/// Tuple keys are not valid JSON object keys, so edges serialize as a list of
/// `{src_id, tgt_id, records}` entries.
mod edge_map {
    use super::{EdgeKey, RelationshipRecord};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    #[derive(Serialize, Deserialize)]
    struct EdgeGroup {
        src_id: String,
        tgt_id: String,
        records: Vec<RelationshipRecord>,
    }

    pub fn serialize<S>(
        edges: &HashMap<EdgeKey, Vec<RelationshipRecord>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut groups: Vec<EdgeGroup> = edges
            .iter()
            .map(|((src_id, tgt_id), records)| EdgeGroup {
                src_id: src_id.clone(),
                tgt_id: tgt_id.clone(),
                records: records.clone(),
            })
            .collect();
        groups.sort_by(|a, b| (&a.src_id, &a.tgt_id).cmp(&(&b.src_id, &b.tgt_id)));
        groups.serialize(serializer)
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<HashMap<EdgeKey, Vec<RelationshipRecord>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let groups = Vec::<EdgeGroup>::deserialize(deserializer)?;
        Ok(groups
            .into_iter()
            .map(|g| ((g.src_id, g.tgt_id), g.records))
            .collect())
    }
}
