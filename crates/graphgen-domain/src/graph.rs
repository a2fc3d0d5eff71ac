//! Canonical graph records (per entity name / per edge pair)

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Separator used when several values are packed into one string field
pub const GRAPH_FIELD_SEP: &str = "<SEP>";

/// The merged, persisted form of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalNode {
    /// Majority-vote entity type
    pub entity_type: String,

    /// Consolidated (possibly summarised) description
    pub description: String,

    /// Contributing chunk ids, sorted and joined with [`GRAPH_FIELD_SEP`]
    pub source_id: String,
}

impl CanonicalNode {
    /// Contributing chunk ids as a list
    pub fn source_ids(&self) -> Vec<String> {
        split_source_ids(&self.source_id)
    }
}

/// The merged, persisted form of a relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEdge {
    /// Consolidated (possibly summarised) description
    pub description: String,

    /// Sorted, deduplicated keyword union, comma-separated
    pub keywords: String,

    /// Aggregated weight (sum of all contributing weights)
    pub weight: f64,

    /// Contributing chunk ids, sorted and joined with [`GRAPH_FIELD_SEP`]
    pub source_id: String,
}

impl CanonicalEdge {
    /// Contributing chunk ids as a list
    pub fn source_ids(&self) -> Vec<String> {
        split_source_ids(&self.source_id)
    }
}

/// Split a packed field into its non-empty parts
///
/// # Examples
///
/// ```
/// use graphgen_domain::split_source_ids;
///
/// assert_eq!(split_source_ids("c1<SEP>c2"), vec!["c1", "c2"]);
/// assert!(split_source_ids("").is_empty());
/// ```
pub fn split_source_ids(packed: &str) -> Vec<String> {
    packed
        .split(GRAPH_FIELD_SEP)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Deduplicate, sort and pack a set of values
///
/// The result is independent of input order.
pub fn join_source_ids<I, S>(ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let set: BTreeSet<String> = ids
        .into_iter()
        .map(Into::into)
        .filter(|s| !s.trim().is_empty())
        .collect();
    set.into_iter().collect::<Vec<_>>().join(GRAPH_FIELD_SEP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_dedupes_and_sorts() {
        let packed = join_source_ids(["c2", "c1", "c2"]);
        assert_eq!(packed, "c1<SEP>c2");
    }

    #[test]
    fn test_split_ignores_empty_segments() {
        assert_eq!(split_source_ids("c1<SEP><SEP>c2"), vec!["c1", "c2"]);
    }

    #[test]
    fn test_node_source_ids() {
        let node = CanonicalNode {
            entity_type: "ORG".to_string(),
            description: "d".to_string(),
            source_id: "c1<SEP>c2".to_string(),
        };
        assert_eq!(node.source_ids(), vec!["c1", "c2"]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: packing is independent of input order
        #[test]
        fn test_join_order_independent(mut ids in prop::collection::vec("[a-z0-9]{1,6}", 0..12)) {
            let forward = join_source_ids(ids.clone());
            ids.reverse();
            let backward = join_source_ids(ids);
            prop_assert_eq!(forward, backward);
        }

        /// Property: split(join(xs)) is the sorted set of xs
        #[test]
        fn test_split_join_is_sorted_set(ids in prop::collection::vec("[a-z0-9]{1,6}", 0..12)) {
            let mut expected: Vec<String> = ids.clone();
            expected.sort();
            expected.dedup();
            prop_assert_eq!(split_source_ids(&join_source_ids(ids)), expected);
        }
    }
}
