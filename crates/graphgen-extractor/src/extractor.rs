//! Core Extractor implementation

use crate::aggregate::Aggregator;
use crate::classifier::parse_response;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::glean::GleanLoop;
use crate::merge::{MergeLocks, MergeResolver};
use crate::prompt::PromptComposer;
use crate::types::{
    BatchExtraction, BuildReport, ChunkExtraction, ChunkFailure, ChunkMetadata, MergeSummary,
};
use futures::stream::{self, StreamExt};
use graphgen_domain::traits::{GraphStore, LlmClient};
use graphgen_domain::{Chunk, ExtractionResult};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// The Extractor turns chunks of text into a knowledge graph
pub struct Extractor<L>
where
    L: LlmClient,
{
    llm: Arc<L>,
    config: Arc<ExtractorConfig>,
    composer: Arc<PromptComposer>,
    locks: MergeLocks,
    model_name: Arc<str>,
}

impl<L> Extractor<L>
where
    L: LlmClient + 'static,
{
    /// Create a new Extractor
    ///
    /// Fails if the configuration does not validate.
    pub fn new(llm: L, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let composer = PromptComposer::new(config.format.clone());

        Ok(Self {
            llm: Arc::new(llm),
            config: Arc::new(config),
            composer: Arc::new(composer),
            locks: MergeLocks::new(),
            model_name: Arc::from("llm"),
        })
    }

    /// Create a new Extractor with a specific model name
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Arc::from(model_name.into());
        self
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract entity and relationship records from one chunk
    ///
    /// Any failed or timed-out LLM call fails the whole chunk; no partial
    /// result is returned.
    pub async fn extract_chunk(&self, chunk: &Chunk) -> Result<ChunkExtraction, ExtractorError> {
        run_chunk(
            self.llm.as_ref(),
            &self.composer,
            &self.config,
            &self.model_name,
            chunk,
        )
        .await
    }

    /// Extract a batch of chunks concurrently
    ///
    /// At most `max_concurrency` chunks are in flight. Outcomes are folded in
    /// input order; every chunk ends up either in the result or in
    /// `failures`.
    pub async fn extract_chunks(&self, chunks: &[Chunk]) -> BatchExtraction {
        info!(
            "Extracting {} chunks with up to {} in flight",
            chunks.len(),
            self.config.max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut tasks = JoinSet::new();
        let mut outcomes: Vec<Option<Result<ChunkExtraction, ExtractorError>>> =
            (0..chunks.len()).map(|_| None).collect();

        for (index, chunk) in chunks.iter().enumerate() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!("Chunk scheduler closed: {}", e);
                    break;
                }
            };
            let llm = Arc::clone(&self.llm);
            let composer = Arc::clone(&self.composer);
            let config = Arc::clone(&self.config);
            let model_name = Arc::clone(&self.model_name);
            let chunk = chunk.clone();

            tasks.spawn(async move {
                let outcome =
                    run_chunk(llm.as_ref(), &composer, &config, &model_name, &chunk).await;
                drop(permit);
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => warn!("Chunk task did not complete: {}", e),
            }
        }

        let mut aggregator = Aggregator::new();
        for (chunk, outcome) in chunks.iter().zip(outcomes) {
            match outcome {
                Some(outcome) => {
                    if let Err(e) = &outcome {
                        warn!("Chunk '{}' failed: {}", chunk.id, e);
                    }
                    aggregator.push(&chunk.id, outcome);
                }
                None => aggregator.push_failure(ChunkFailure {
                    chunk_id: chunk.id.clone(),
                    stage: None,
                    reason: "extraction task did not complete".to_string(),
                }),
            }
        }

        let batch = aggregator.finish();
        info!(
            "Extracted {} chunks ({} failed): {} entities, {} relationships",
            batch.chunks.len(),
            batch.failures.len(),
            batch.result.nodes.len(),
            batch.result.edges.len()
        );
        batch
    }

    /// Merge grouped records into `store`
    ///
    /// All nodes are merged before any edge, so placeholders are only created
    /// for endpoints nobody extracted. Different keys merge concurrently.
    pub async fn merge_into<S: GraphStore>(
        &self,
        result: &ExtractionResult,
        store: &S,
    ) -> Result<MergeSummary, ExtractorError> {
        let resolver = MergeResolver::new(
            self.llm.as_ref(),
            &self.composer,
            &self.config,
            &self.locks,
        );
        let limit = self.config.max_concurrency;
        let mut summary = MergeSummary::default();

        let node_merges: Vec<_> = stream::iter(result.sorted_entity_names())
            .map(|name| resolver.merge_node(store, name, &result.nodes[name]))
            .buffer_unordered(limit)
            .collect()
            .await;
        for merge in node_merges {
            summary.record_node(&merge?);
        }

        let edge_merges: Vec<_> = stream::iter(result.sorted_edge_keys())
            .map(|key| resolver.merge_edge(store, key, &result.edges[key]))
            .buffer_unordered(limit)
            .collect()
            .await;
        for merge in edge_merges {
            summary.record_edge(&merge?);
        }

        info!(
            "Merged {} nodes and {} edges ({} placeholders, {} summaries)",
            summary.nodes_created + summary.nodes_updated,
            summary.edges_created + summary.edges_updated,
            summary.placeholder_nodes,
            summary.summaries
        );
        Ok(summary)
    }

    /// Extract every chunk and merge the results into `store`
    pub async fn build_graph<S: GraphStore>(
        &self,
        chunks: &[Chunk],
        store: &S,
    ) -> Result<BuildReport, ExtractorError> {
        let start = Instant::now();
        let batch = self.extract_chunks(chunks).await;
        let merge = self.merge_into(&batch.result, store).await?;

        Ok(BuildReport {
            chunks_total: chunks.len(),
            chunks_succeeded: batch.chunks.len(),
            entity_mentions: batch.result.entity_mentions(),
            relationship_mentions: batch.result.relationship_mentions(),
            discarded_records: batch.discarded_records(),
            llm_calls: batch.llm_calls() + merge.summary_calls(),
            failures: batch.failures,
            merge,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}

async fn run_chunk<L: LlmClient>(
    llm: &L,
    composer: &PromptComposer,
    config: &ExtractorConfig,
    model_name: &str,
    chunk: &Chunk,
) -> Result<ChunkExtraction, ExtractorError> {
    let start = Instant::now();
    let prompts = composer.compose(&chunk.content);
    info!(
        "Extracting chunk '{}' ({} chars, {})",
        chunk.id,
        chunk.char_len(),
        prompts.language
    );
    debug!("Hint prompt length: {} chars", prompts.hint.len());

    let output = GleanLoop::new(
        llm,
        &chunk.id,
        &prompts,
        config.max_loop,
        config.llm_timeout(),
    )
    .run()
    .await?;

    let parsed = parse_response(&output.raw, &chunk.id, &config.format);
    info!(
        "Chunk '{}' done: {} entities, {} relationships, {} discarded, {} calls",
        chunk.id,
        parsed.result.nodes.len(),
        parsed.result.edges.len(),
        parsed.discarded,
        output.calls
    );

    Ok(ChunkExtraction {
        result: parsed.result,
        metadata: ChunkMetadata {
            chunk_id: chunk.id.clone(),
            language: prompts.language,
            model_name: model_name.to_string(),
            llm_calls: output.calls,
            glean_rounds: output.rounds,
            discarded_records: parsed.discarded,
            processing_time_ms: start.elapsed().as_millis() as u64,
        },
    })
}
