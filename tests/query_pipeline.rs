// file: tests/query_pipeline.rs
// description: end-to-end ingest and query runs over a temporary index
// reference: offline hash embeddings and a scripted chat model

use async_trait::async_trait;
use gdpr_rag::config::EmbeddingBackend;
use gdpr_rag::evaluation::{Evaluator, RecordStore};
use gdpr_rag::llm::{ChatMessage, ChatModel};
use gdpr_rag::retrieval::ScoreOrderReranker;
use gdpr_rag::{
    AutoMergingIndex, AutoMergingRetriever, Config, EmbeddingProvider, HashEmbeddingProvider,
    IngestOrchestrator, QueryRunner, RagError, ResponseSynthesizer, RetrieverQueryEngine,
    SummaryMatcher, load_article_summaries,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

const METADATA: &str = "\
**Article 6 - Lawfulness of processing**: Processing is lawful only with consent, a contract or a legal obligation.
**Article 7 - Conditions for consent**: The controller must demonstrate consent and the data subject may withdraw consent at any time.
**Article 17 - Right to erasure**: The data subject can obtain erasure of personal data without undue delay.
";

const ARTICLES: [(&str, &str); 3] = [
    (
        "Article 6.txt",
        "Processing shall be lawful only if the data subject has given consent. \
         Processing is also lawful when it is necessary for the performance of a contract. \
         Compliance with a legal obligation of the controller is another basis. \
         Vital interests of the data subject may justify processing.",
    ),
    (
        "Article 7.txt",
        "Where processing is based on consent, the controller shall be able to demonstrate consent. \
         The request for consent shall be presented in clear and plain language. \
         The data subject shall have the right to withdraw consent at any time. \
         Withdrawing consent shall be as easy as giving it.",
    ),
    (
        "Article 17.txt",
        "The data subject shall have the right to obtain the erasure of personal data without undue delay. \
         Erasure applies where the data are no longer necessary for their purposes. \
         Erasure applies where the data subject withdraws consent. \
         Erasure applies where the personal data have been unlawfully processed.",
    ),
];

struct ScriptedModel;

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, _messages: &[ChatMessage]) -> gdpr_rag::Result<String> {
        Ok("Score: 8. Personal data must be erased on request.".to_string())
    }
}

struct UnreachableModel;

#[async_trait]
impl ChatModel for UnreachableModel {
    fn model_name(&self) -> &str {
        "unreachable"
    }

    async fn chat(&self, _messages: &[ChatMessage]) -> gdpr_rag::Result<String> {
        Err(RagError::Llm("connection refused".to_string()))
    }
}

/// Embeds the first batch, then fails every later one.
struct DropsAfterFirstBatch {
    inner: HashEmbeddingProvider,
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for DropsAfterFirstBatch {
    fn model_name(&self) -> &str {
        "hash"
    }

    async fn embed(&self, texts: &[String]) -> gdpr_rag::Result<Vec<Vec<f32>>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(RagError::Embedding("embedding service went away".to_string()));
        }
        self.inner.embed(texts).await
    }
}

fn write_corpus(root: &Path) -> Config {
    let articles_dir = root.join("articles");
    fs::create_dir_all(&articles_dir).unwrap();
    for (name, text) in ARTICLES {
        fs::write(articles_dir.join(name), text).unwrap();
    }
    fs::write(root.join("metadata.txt"), METADATA).unwrap();

    let mut config = Config::default_config();
    config.paths.articles_dir = articles_dir;
    config.paths.metadata_path = root.join("metadata.txt");
    config.paths.index_dir = root.join("merging_index");
    config.embedding.provider = EmbeddingBackend::Hash;
    config.matcher.provider = EmbeddingBackend::Hash;
    config.retrieval.chunk_sizes = vec![64, 32, 16];
    config.retrieval.rerank_model = "none".to_string();
    config
}

fn embedder() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashEmbeddingProvider::new(64, 256))
}

#[tokio::test]
async fn test_ingest_builds_then_loads() {
    let temp = TempDir::new().unwrap();
    let config = write_corpus(temp.path());

    let orchestrator = IngestOrchestrator::with_embedder(config.clone(), embedder())
        .with_progress(false)
        .with_color(false);

    let built = orchestrator.run(false).await.unwrap();
    let stats = built.stats.expect("first run builds the index");
    assert_eq!(stats.documents_loaded, 3);
    assert_eq!(stats.documents_enriched, 3);
    assert_eq!(stats.nodes_created, built.index.docstore().len());
    assert_eq!(
        built.index.vector_count().await.unwrap() as usize,
        built.index.docstore().leaf_count()
    );

    let loaded = orchestrator.run(false).await.unwrap();
    assert!(loaded.stats.is_none());
    assert_eq!(loaded.index.docstore().len(), built.index.docstore().len());

    let rebuilt = orchestrator.run(true).await.unwrap();
    assert!(rebuilt.stats.is_some());
}

#[tokio::test]
async fn test_interrupted_build_recovers_on_next_run() {
    let temp = TempDir::new().unwrap();
    let mut config = write_corpus(temp.path());
    config.embedding.batch_size = 2;

    let failing: Arc<dyn EmbeddingProvider> = Arc::new(DropsAfterFirstBatch {
        inner: HashEmbeddingProvider::new(64, 256),
        calls: AtomicUsize::new(0),
    });
    let result = IngestOrchestrator::with_embedder(config.clone(), failing)
        .with_progress(false)
        .run(false)
        .await;

    assert!(matches!(result, Err(RagError::Embedding(_))));
    assert!(!config.paths.index_dir.exists());
    assert!(!AutoMergingIndex::staging_dir(&config.paths.index_dir).exists());

    let orchestrator =
        IngestOrchestrator::with_embedder(config.clone(), embedder()).with_progress(false);
    let report = orchestrator.run(false).await.unwrap();
    assert!(report.stats.is_some());
    assert!(orchestrator.run(false).await.unwrap().stats.is_none());
}

#[tokio::test]
async fn test_open_requires_existing_index() {
    let temp = TempDir::new().unwrap();
    let config = write_corpus(temp.path());
    let orchestrator =
        IngestOrchestrator::with_embedder(config.clone(), embedder()).with_progress(false);

    match orchestrator.open().await {
        Err(RagError::Index(message)) => assert!(message.contains("gdpr_rag ingest")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("open built an index"),
    }
    assert!(!config.paths.index_dir.exists());

    orchestrator.run(false).await.unwrap();
    let index = orchestrator.open().await.unwrap();
    assert!(index.docstore().leaf_count() > 0);
}

#[tokio::test]
async fn test_matches_printed_before_answer_fails() {
    let temp = TempDir::new().unwrap();
    let config = write_corpus(temp.path());
    let embedder = embedder();

    let report = IngestOrchestrator::with_embedder(config.clone(), Arc::clone(&embedder))
        .with_progress(false)
        .run(false)
        .await
        .unwrap();

    let summaries = load_article_summaries(&config.paths.metadata_path).unwrap();
    let matcher = SummaryMatcher::new(2, Arc::clone(&embedder), &summaries)
        .await
        .unwrap();
    let engine = RetrieverQueryEngine::new(
        AutoMergingRetriever::new(Arc::new(report.index), embedder, 6, 0.5),
        Arc::new(ScoreOrderReranker),
        ResponseSynthesizer::new(Arc::new(UnreachableModel), 4_000),
        3,
    );
    let runner = QueryRunner::new(matcher, engine, None);

    let input: &[u8] = b"right to erasure\n";
    let mut output = Vec::new();
    let result = runner.run(input, &mut output).await;
    let output = String::from_utf8(output).unwrap();

    assert!(matches!(result, Err(RagError::Llm(_))));
    assert!(output.contains("Top similar articles:\n"));
    assert!(!output.contains("Response:"));
}

#[tokio::test]
async fn test_retrieval_respects_article_filter() {
    let temp = TempDir::new().unwrap();
    let config = write_corpus(temp.path());
    let embedder = embedder();

    let report = IngestOrchestrator::with_embedder(config.clone(), Arc::clone(&embedder))
        .with_progress(false)
        .run(false)
        .await
        .unwrap();

    let retriever = AutoMergingRetriever::new(Arc::new(report.index), embedder, 6, 0.5);
    let key = "Article 17 - Right to erasure".to_string();

    let nodes = retriever
        .retrieve("can i withdraw consent", std::slice::from_ref(&key))
        .await
        .unwrap();

    assert!(!nodes.is_empty());
    assert!(
        nodes
            .iter()
            .all(|scored| scored.node.article_number() == Some(key.as_str()))
    );
    assert!(nodes.windows(2).all(|pair| pair[0].score >= pair[1].score));
}

#[tokio::test]
async fn test_console_session_answers_until_exit() {
    let temp = TempDir::new().unwrap();
    let config = write_corpus(temp.path());
    let embedder = embedder();

    let report = IngestOrchestrator::with_embedder(config.clone(), Arc::clone(&embedder))
        .with_progress(false)
        .run(false)
        .await
        .unwrap();

    let summaries = load_article_summaries(&config.paths.metadata_path).unwrap();
    let matcher = SummaryMatcher::new(2, Arc::clone(&embedder), &summaries)
        .await
        .unwrap();

    let llm: Arc<dyn ChatModel> = Arc::new(ScriptedModel);
    let engine = RetrieverQueryEngine::new(
        AutoMergingRetriever::new(Arc::new(report.index), embedder, 6, 0.5),
        Arc::new(ScoreOrderReranker),
        ResponseSynthesizer::new(Arc::clone(&llm), 4_000),
        3,
    );

    let records_path = temp.path().join("evaluation/records.jsonl");
    fs::create_dir_all(records_path.parent().unwrap()).unwrap();
    fs::write(&records_path, "stale record from an earlier session\n").unwrap();
    let evaluator =
        Evaluator::new(llm, "Automerging Query Engine").with_store(RecordStore::new(&records_path));

    let runner = QueryRunner::new(matcher, engine, Some(evaluator));

    let input: &[u8] = b"Can I have my data ERASED?\n\nexit\nnever answered\n";
    let mut output = Vec::new();
    let answered = runner.run(input, &mut output).await.unwrap();
    let output = String::from_utf8(output).unwrap();

    assert_eq!(answered, 1);
    assert_eq!(
        output
            .matches("Enter your query (or type 'exit' to quit): ")
            .count(),
        3
    );
    assert!(output.contains("Top similar articles:"));
    assert!(output.contains("Source Article:::"));
    assert!(output.contains("Response: Score: 8. Personal data must be erased on request."));
    assert!(output.contains("Evaluation:::"));
    assert!(output.contains("Answer Relevance 0.8"));
    assert!(!output.contains("never answered"));

    let records = RecordStore::new(&records_path).load().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].input, "can i have my data erased?");
    assert_eq!(records[0].app_id, "Automerging Query Engine");
    assert_eq!(records[0].feedback.len(), 3);

    let turn = runner.answer("  Who Must Prove CONSENT?  ").await.unwrap();
    assert_eq!(turn.query, "who must prove consent?");
    assert_eq!(turn.article_keys.len(), 2);
    assert!(turn.evaluation.is_some());
}
