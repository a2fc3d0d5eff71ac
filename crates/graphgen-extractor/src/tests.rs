//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{
        Extractor, ExtractorConfig, ExtractorError, PromptComposer, Stage, UNKNOWN_ENTITY_TYPE,
    };
    use async_trait::async_trait;
    use graphgen_domain::traits::{GraphStore, LlmClient};
    use graphgen_domain::{Chunk, ConversationHistory};
    use graphgen_llm::MockProvider;
    use graphgen_store::{MemoryGraphStore, SqliteGraphStore};
    use std::time::Duration;

    const FOUNDING: &str = r#"("entity"<|>"Entity1"<|>"ORG"<|>"A river shipping company")##
("entity"<|>"Person1"<|>"PERSON"<|>"Founder of Entity1")##
("relationship"<|>"Person1"<|>"Entity1"<|>"founded"<|>"founding"<|>0.9)<|COMPLETE|>"#;

    fn hint(content: &str) -> String {
        PromptComposer::default().compose(content).hint
    }

    fn key(src: &str, tgt: &str) -> (String, String) {
        (src.to_string(), tgt.to_string())
    }

    #[tokio::test]
    async fn test_single_chunk_round_trip() {
        let llm = MockProvider::scripted([FOUNDING, "no"]);
        let extractor = Extractor::new(llm.clone(), ExtractorConfig::default()).unwrap();

        let extraction = extractor
            .extract_chunk(&Chunk::new("c1", "Person1 founded Entity1."))
            .await
            .unwrap();

        let result = extraction.result;
        assert_eq!(result.nodes.len(), 2);
        assert_eq!(result.nodes["Entity1"][0].entity_type, "ORG");
        assert_eq!(result.nodes["Entity1"][0].source_id, "c1");

        let edge = &result.edges[&key("Person1", "Entity1")];
        assert_eq!(edge.len(), 1);
        assert_eq!(edge[0].description, "founded");
        assert_eq!(edge[0].keywords, "founding");
        assert!((edge[0].weight - 0.9).abs() < f64::EPSILON);

        // Initial extraction plus one declined decision
        assert_eq!(extraction.metadata.llm_calls, 2);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_output_gives_empty_result() {
        let llm = MockProvider::scripted(["Sorry, I cannot help with that.", "no"]);
        let extractor = Extractor::new(llm, ExtractorConfig::default()).unwrap();

        let extraction = extractor
            .extract_chunk(&Chunk::new("c1", "Nothing here."))
            .await
            .unwrap();

        assert!(extraction.result.nodes.is_empty());
        assert!(extraction.result.edges.is_empty());
    }

    #[tokio::test]
    async fn test_glean_rounds_add_records() {
        let llm = MockProvider::scripted([
            r#"("entity"<|>"Entity1"<|>"ORG"<|>"A company")"#,
            "YES",
            r#"##("entity"<|>"Person1"<|>"PERSON"<|>"A founder")"#,
            "no",
        ]);
        let extractor = Extractor::new(llm.clone(), ExtractorConfig::default()).unwrap();

        let extraction = extractor
            .extract_chunk(&Chunk::new("c1", "Person1 founded Entity1."))
            .await
            .unwrap();

        assert_eq!(extraction.result.nodes.len(), 2);
        assert_eq!(extraction.metadata.glean_rounds, 1);
        assert_eq!(llm.call_count(), 4);
    }

    #[tokio::test]
    async fn test_zero_max_loop_issues_one_call() {
        let llm = MockProvider::new(FOUNDING);
        let config = ExtractorConfig {
            max_loop: 0,
            ..ExtractorConfig::default()
        };
        let extractor = Extractor::new(llm.clone(), config).unwrap();

        extractor
            .extract_chunk(&Chunk::new("c1", "Person1 founded Entity1."))
            .await
            .unwrap();

        assert_eq!(llm.call_count(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ExtractorConfig {
            max_concurrency: 0,
            ..ExtractorConfig::default()
        };
        let err = Extractor::new(MockProvider::default(), config).err().unwrap();
        assert!(matches!(err, ExtractorError::Config(_)));
    }

    #[tokio::test]
    async fn test_merge_across_chunks() {
        let first = "Entity1 ships goods on the river.";
        let second = "Entity1 was founded long ago.";
        let mut llm = MockProvider::new("no");
        llm.add_response(hint(first), r#"("entity"<|>"Entity1"<|>"ORG"<|>"A shipping firm")"#);
        llm.add_response(hint(second), r#"("entity"<|>"Entity1"<|>"ORG"<|>"An old company")"#);

        let extractor = Extractor::new(llm, ExtractorConfig::default()).unwrap();
        let store = MemoryGraphStore::new();
        let chunks = vec![Chunk::new("c1", first), Chunk::new("c2", second)];

        let report = extractor.build_graph(&chunks, &store).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.chunks_succeeded, 2);
        assert_eq!(report.merge.nodes_created, 1);
        assert_eq!(report.llm_calls, 4);

        let node = store.get_node("Entity1").await.unwrap().unwrap();
        assert_eq!(node.entity_type, "ORG");
        assert_eq!(node.description, "A shipping firm<SEP>An old company");
        assert_eq!(node.source_ids(), vec!["c1", "c2"]);
    }

    #[tokio::test]
    async fn test_failed_chunk_is_reported_not_dropped() {
        let good = "Person1 founded Entity1.";
        let bad = "This chunk breaks the provider.";
        let mut llm = MockProvider::new("no");
        llm.add_response(hint(good), FOUNDING);
        llm.add_error(hint(bad));

        let extractor = Extractor::new(llm, ExtractorConfig::default()).unwrap();
        let store = MemoryGraphStore::new();
        let chunks = vec![Chunk::new("bad", bad), Chunk::new("good", good)];

        let report = extractor.build_graph(&chunks, &store).await.unwrap();

        assert_eq!(report.chunks_total, 2);
        assert_eq!(report.chunks_succeeded, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].chunk_id, "bad");
        assert_eq!(report.failures[0].stage, Some(Stage::Initial));
        assert_eq!(store.node_count().await.unwrap(), 2);
        assert_eq!(store.edge_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_relationship_without_entities_creates_placeholders() {
        let llm = MockProvider::scripted([
            r#"("relationship"<|>"Person1"<|>"Entity1"<|>"founded"<|>"founding"<|>2)"#,
            "no",
        ]);
        let extractor = Extractor::new(llm, ExtractorConfig::default()).unwrap();
        let store = MemoryGraphStore::new();

        let report = extractor
            .build_graph(&[Chunk::new("c1", "Person1 founded Entity1.")], &store)
            .await
            .unwrap();

        assert_eq!(report.merge.placeholder_nodes, 2);
        for name in ["Person1", "Entity1"] {
            let node = store.get_node(name).await.unwrap().unwrap();
            assert_eq!(node.entity_type, UNKNOWN_ENTITY_TYPE);
            assert_eq!(node.description, "founded");
        }
        let edge = store.get_edge("Person1", "Entity1").await.unwrap().unwrap();
        assert!((edge.weight - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_repeated_builds_accumulate_in_sqlite() {
        let mut llm = MockProvider::new("no");
        llm.add_response(hint("Person1 founded Entity1."), FOUNDING);

        let extractor = Extractor::new(llm, ExtractorConfig::default()).unwrap();
        let store = SqliteGraphStore::new(":memory:").unwrap();

        let first = vec![Chunk::new("c1", "Person1 founded Entity1.")];
        let second = vec![Chunk::new("c2", "Person1 founded Entity1.")];
        extractor.build_graph(&first, &store).await.unwrap();
        let report = extractor.build_graph(&second, &store).await.unwrap();

        assert_eq!(report.merge.nodes_updated, 2);
        assert_eq!(report.merge.edges_updated, 1);

        let edge = store.get_edge("Person1", "Entity1").await.unwrap().unwrap();
        assert!((edge.weight - 1.8).abs() < 1e-9);
        assert_eq!(edge.source_ids(), vec!["c1", "c2"]);
        assert_eq!(edge.description, "founded");
    }

    #[tokio::test]
    async fn test_many_chunks_share_one_entity() {
        let mut llm = MockProvider::new("no");
        let chunks: Vec<Chunk> = (0..24)
            .map(|i| Chunk::new(format!("c{:02}", i), format!("Entity1 appears in part {}.", i)))
            .collect();
        for chunk in &chunks {
            llm.add_response(
                hint(&chunk.content),
                format!(r#"("entity"<|>"Entity1"<|>"ORG"<|>"Seen in {}")"#, chunk.id),
            );
        }

        let config = ExtractorConfig {
            max_concurrency: 4,
            ..ExtractorConfig::default()
        };
        let extractor = Extractor::new(llm, config).unwrap();
        let store = MemoryGraphStore::new();

        let report = extractor.build_graph(&chunks, &store).await.unwrap();

        assert_eq!(report.chunks_succeeded, 24);
        assert_eq!(report.entity_mentions, 24);
        let node = store.get_node("Entity1").await.unwrap().unwrap();
        assert_eq!(node.source_ids().len(), 24);
    }

    /// Answers from the chunk text embedded in the prompt, slowly for "alpha"
    struct PromptKeyed;

    #[async_trait]
    impl LlmClient for PromptKeyed {
        type Error = String;

        async fn generate(
            &self,
            prompt: &str,
            _history: &ConversationHistory,
        ) -> Result<String, Self::Error> {
            if prompt.contains("alpha") {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(r#"("entity"<|>"Entity1"<|>"ORG"<|>"alpha")"#.to_string())
            } else if prompt.contains("beta") {
                Ok(r#"("entity"<|>"Entity1"<|>"ORG"<|>"beta")"#.to_string())
            } else {
                Ok("no".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_group_order_follows_chunk_order() {
        let extractor = Extractor::new(PromptKeyed, ExtractorConfig::default()).unwrap();
        let chunks = vec![Chunk::new("c1", "alpha"), Chunk::new("c2", "beta")];

        let batch = extractor.extract_chunks(&chunks).await;

        let descriptions: Vec<_> = batch.result.nodes["Entity1"]
            .iter()
            .map(|r| r.description.as_str())
            .collect();
        assert_eq!(descriptions, vec!["alpha", "beta"]);
        let ids: Vec<_> = batch.chunks.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
    }
}
