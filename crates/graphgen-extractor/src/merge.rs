//! Merging grouped records into canonical graph nodes and edges

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::glean::{bounded_call, CallFailure};
use crate::language::detect_language;
use crate::locks::KeyedLocks;
use crate::prompt::PromptComposer;
use graphgen_domain::traits::{GraphStore, LlmClient};
use graphgen_domain::{
    join_source_ids, CanonicalEdge, CanonicalNode, ConversationHistory,
    EdgeKey, EntityRecord, RelationshipRecord, GRAPH_FIELD_SEP,
};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Entity type given to nodes nobody described
pub const UNKNOWN_ENTITY_TYPE: &str = "UNKNOWN";

/// What happened to a consolidated description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// Short enough, or summarisation disabled
    NotNeeded,
    /// Replaced by the LLM's summary
    Summarized,
    /// Summarisation failed; the raw join was kept
    FellBack,
}

/// Result of merging one node group
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMerge {
    /// The node as written
    pub node: CanonicalNode,
    /// Whether a node already existed under this name
    pub existed: bool,
    /// Description handling
    pub summary: SummaryOutcome,
}

/// Result of merging one edge group
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMerge {
    /// The edge as written
    pub edge: CanonicalEdge,
    /// Whether an edge already existed for this pair
    pub existed: bool,
    /// Placeholder endpoint nodes inserted
    pub placeholders: usize,
    /// Description handling
    pub summary: SummaryOutcome,
}

/// Majority-vote entity type
///
/// Ties go to the type seen first. Empty types do not vote; with no votes
/// at all the result is `UNKNOWN`.
///
/// # Examples
///
/// ```
/// use graphgen_extractor::resolve_entity_type;
///
/// assert_eq!(resolve_entity_type(["ORG", "ORG", "PERSON"]), "ORG");
/// assert_eq!(resolve_entity_type(["PERSON", "ORG"]), "PERSON");
/// ```
pub fn resolve_entity_type<'a, I>(types: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, entity_type) in types.into_iter().filter(|t| !t.is_empty()).enumerate() {
        counts.entry(entity_type).or_insert((0, position)).0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(entity_type, _)| entity_type.to_string())
        .unwrap_or_else(|| UNKNOWN_ENTITY_TYPE.to_string())
}

/// Sorted, deduplicated `<SEP>` join of descriptions
pub fn consolidate_descriptions<'a, I>(descriptions: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let set: BTreeSet<&str> = descriptions
        .into_iter()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect();
    set.into_iter().collect::<Vec<_>>().join(GRAPH_FIELD_SEP)
}

/// Sorted, deduplicated union of comma-separated keyword lists
pub fn merge_keywords<'a, I>(keyword_lists: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let set: BTreeSet<&str> = keyword_lists
        .into_iter()
        .flat_map(|list| list.split(','))
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect();
    set.into_iter().collect::<Vec<_>>().join(", ")
}

/// Locks serialising read-modify-write cycles per node name and per pair
#[derive(Debug, Default)]
pub struct MergeLocks {
    nodes: KeyedLocks<String>,
    edges: KeyedLocks<EdgeKey>,
}

impl MergeLocks {
    /// Create empty lock tables
    pub fn new() -> Self {
        Self::default()
    }
}

/// Merges record groups into a graph store
///
/// Every merge is a read, a pure combination with the existing value, and a
/// full-replacement upsert, done while holding that key's lock.
pub struct MergeResolver<'a, L> {
    llm: &'a L,
    composer: &'a PromptComposer,
    config: &'a ExtractorConfig,
    locks: &'a MergeLocks,
}

impl<'a, L: LlmClient> MergeResolver<'a, L> {
    /// Create a resolver
    pub fn new(
        llm: &'a L,
        composer: &'a PromptComposer,
        config: &'a ExtractorConfig,
        locks: &'a MergeLocks,
    ) -> Self {
        Self {
            llm,
            composer,
            config,
            locks,
        }
    }

    /// Merge one entity group into the store
    pub async fn merge_node<S: GraphStore>(
        &self,
        store: &S,
        name: &str,
        records: &[EntityRecord],
    ) -> Result<NodeMerge, ExtractorError> {
        let _guard = self.locks.nodes.lock(&name.to_string()).await;
        let existing = store.get_node(name).await.map_err(store_error)?;

        let entity_type = resolve_entity_type(
            records
                .iter()
                .map(|r| r.entity_type.as_str())
                .chain(existing.iter().map(|n| n.entity_type.as_str())),
        );
        let joined = consolidate_descriptions(
            records
                .iter()
                .map(|r| r.description.as_str())
                .chain(existing.iter().map(|n| n.description.as_str())),
        );
        let source_id = join_source_ids(
            records
                .iter()
                .map(|r| r.source_id.clone())
                .chain(existing.iter().flat_map(|n| n.source_ids())),
        );

        let (description, summary) = self.summarize(name, joined).await;
        let node = CanonicalNode {
            entity_type,
            description,
            source_id,
        };

        store
            .upsert_node(name, node.clone())
            .await
            .map_err(store_error)?;
        debug!("Merged node '{}' from {} records", name, records.len());

        Ok(NodeMerge {
            node,
            existed: existing.is_some(),
            summary,
        })
    }

    /// Merge one relationship group into the store
    ///
    /// Missing endpoint nodes are created as `UNKNOWN` placeholders first.
    pub async fn merge_edge<S: GraphStore>(
        &self,
        store: &S,
        key: &EdgeKey,
        records: &[RelationshipRecord],
    ) -> Result<EdgeMerge, ExtractorError> {
        let (src_id, tgt_id) = key;
        let _guard = self.locks.edges.lock(key).await;
        let existing = store.get_edge(src_id, tgt_id).await.map_err(store_error)?;

        let weight = records.iter().map(|r| r.weight).sum::<f64>()
            + existing.as_ref().map_or(0.0, |e| e.weight);
        let joined = consolidate_descriptions(
            records
                .iter()
                .map(|r| r.description.as_str())
                .chain(existing.iter().map(|e| e.description.as_str())),
        );
        let keywords = merge_keywords(
            records
                .iter()
                .map(|r| r.keywords.as_str())
                .chain(existing.iter().map(|e| e.keywords.as_str())),
        );
        let source_id = join_source_ids(
            records
                .iter()
                .map(|r| r.source_id.clone())
                .chain(existing.iter().flat_map(|e| e.source_ids())),
        );

        let mut placeholders = 0;
        for endpoint in [src_id, tgt_id] {
            if self
                .ensure_endpoint(store, endpoint, &joined, &source_id)
                .await?
            {
                placeholders += 1;
            }
        }

        let label = format!("({}, {})", src_id, tgt_id);
        let (description, summary) = self.summarize(&label, joined).await;
        let edge = CanonicalEdge {
            description,
            keywords,
            weight,
            source_id,
        };

        store
            .upsert_edge(src_id, tgt_id, edge.clone())
            .await
            .map_err(store_error)?;
        debug!("Merged edge {} from {} records", label, records.len());

        Ok(EdgeMerge {
            edge,
            existed: existing.is_some(),
            placeholders,
            summary,
        })
    }

    /// Insert a placeholder node for `name` unless one exists
    async fn ensure_endpoint<S: GraphStore>(
        &self,
        store: &S,
        name: &str,
        description: &str,
        source_id: &str,
    ) -> Result<bool, ExtractorError> {
        let _guard = self.locks.nodes.lock(&name.to_string()).await;
        if store.has_node(name).await.map_err(store_error)? {
            return Ok(false);
        }

        let placeholder = CanonicalNode {
            entity_type: UNKNOWN_ENTITY_TYPE.to_string(),
            description: description.to_string(),
            source_id: source_id.to_string(),
        };
        store
            .upsert_node(name, placeholder)
            .await
            .map_err(store_error)?;
        debug!("Inserted placeholder node '{}'", name);
        Ok(true)
    }

    /// Summarise `joined` when it is longer than the threshold
    ///
    /// Any failure keeps the raw join.
    async fn summarize(&self, label: &str, joined: String) -> (String, SummaryOutcome) {
        if !self.config.enable_summary
            || joined.chars().count() <= self.config.summary_threshold_chars
        {
            return (joined, SummaryOutcome::NotNeeded);
        }

        let language = detect_language(&joined);
        let prompt = self.composer.summary_prompt(language, label, &joined);
        let history = ConversationHistory::new();

        let limit = self.config.llm_timeout();
        let answer = bounded_call(self.llm, &prompt, &history, limit)
            .await
            .map_err(|failure| ExtractorError::Summary {
                key: label.to_string(),
                message: match failure {
                    CallFailure::Failed(message) => message,
                    CallFailure::TimedOut => format!("timed out after {:?}", limit),
                },
            });

        match answer {
            Ok(summary) if !summary.trim().is_empty() => {
                (summary.trim().to_string(), SummaryOutcome::Summarized)
            }
            Ok(_) => {
                warn!("Empty summary for {}, keeping joined descriptions", label);
                (joined, SummaryOutcome::FellBack)
            }
            Err(e) => {
                warn!("{}; keeping joined descriptions", e);
                (joined, SummaryOutcome::FellBack)
            }
        }
    }
}

fn store_error<E: std::fmt::Display>(error: E) -> ExtractorError {
    ExtractorError::Store(error.to_string())
}
