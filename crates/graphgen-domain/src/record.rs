//! Extracted records (one per mention)

use serde::{Deserialize, Serialize};

/// Weight assigned to a relationship when the model omits it or emits
/// something non-numeric
pub const DEFAULT_RELATIONSHIP_WEIGHT: f64 = 1.0;

/// Grouping key for relationships: the ordered `(src_id, tgt_id)` pair
///
/// Direction is not canonicalised, so `(A, B)` and `(B, A)` are distinct.
pub type EdgeKey = (String, String);

/// A single entity mention extracted from one chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Cleaned entity name (not case-folded)
    pub entity_name: String,

    /// Entity type as emitted by the model
    pub entity_type: String,

    /// Free-text description of the entity
    pub description: String,

    /// Identifier of the chunk this mention came from
    pub source_id: String,
}

/// A single relationship mention extracted from one chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// Source entity name
    pub src_id: String,

    /// Target entity name
    pub tgt_id: String,

    /// Free-text description of the relationship
    pub description: String,

    /// Comma-separated keywords summarising the relationship
    pub keywords: String,

    /// Relationship strength
    pub weight: f64,

    /// Identifier of the chunk this mention came from
    pub source_id: String,
}

impl RelationshipRecord {
    /// The grouping key of this record
    pub fn key(&self) -> EdgeKey {
        (self.src_id.clone(), self.tgt_id.clone())
    }
}
