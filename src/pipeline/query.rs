// file: src/pipeline/query.rs
// description: interactive question answering over the persisted index
// reference: match, retrieve, rerank, synthesize and evaluate per console query

use crate::config::Config;
use crate::console::{self, EXIT_COMMAND, PROMPT};
use crate::embeddings::{EmbeddingProvider, create_provider};
use crate::error::Result;
use crate::evaluation::{EvaluationRecord, Evaluator, RecordStore};
use crate::index::AutoMergingIndex;
use crate::llm::{ChatModel, OpenAiChatClient};
use crate::matcher::SummaryMatcher;
use crate::models::QueryResponse;
use crate::parser::load_article_summaries;
use crate::retrieval::{
    AutoMergingRetriever, ResponseSynthesizer, RetrieverQueryEngine, create_reranker,
};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

/// Everything produced for one console query.
#[derive(Debug, Clone)]
pub struct QueryTurn {
    pub query: String,
    pub article_keys: Vec<String>,
    pub response: QueryResponse,
    pub evaluation: Option<EvaluationRecord>,
}

pub struct QueryRunner {
    matcher: SummaryMatcher,
    engine: RetrieverQueryEngine,
    evaluator: Option<Evaluator>,
}

impl QueryRunner {
    pub fn new(
        matcher: SummaryMatcher,
        engine: RetrieverQueryEngine,
        evaluator: Option<Evaluator>,
    ) -> Self {
        Self {
            matcher,
            engine,
            evaluator,
        }
    }

    /// Wires the matcher, query engine and evaluator from `config`. The
    /// config must already carry the API key.
    pub async fn from_config(
        config: &Config,
        index: AutoMergingIndex,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let summaries = load_article_summaries(&config.paths.metadata_path)?;
        let matcher_embedder = create_provider(
            config.matcher.provider,
            &config.matcher.model,
            config.matcher.max_length,
            config.embedding.batch_size,
            &config.llm,
        )?;
        let matcher = SummaryMatcher::new(config.matcher.top_k, matcher_embedder, &summaries).await?;

        index.check_embedder(embedder.as_ref());
        let retriever = AutoMergingRetriever::new(
            Arc::new(index),
            embedder,
            config.retrieval.similarity_top_k,
            config.retrieval.merge_ratio,
        );

        let llm: Arc<dyn ChatModel> =
            Arc::new(OpenAiChatClient::from_config(&config.llm, &config.llm.model)?);
        let engine = RetrieverQueryEngine::new(
            retriever,
            create_reranker(&config.retrieval.rerank_model)?,
            ResponseSynthesizer::new(llm, config.retrieval.max_context_chars),
            config.retrieval.rerank_top_n,
        );

        let evaluator = if config.evaluation.enabled {
            let judge: Arc<dyn ChatModel> = Arc::new(OpenAiChatClient::from_config(
                &config.llm,
                &config.evaluation.model,
            )?);
            let mut evaluator = Evaluator::new(judge, config.evaluation.app_id.clone());
            if let Some(path) = &config.evaluation.records_path {
                evaluator = evaluator.with_store(RecordStore::new(path));
            }
            Some(evaluator)
        } else {
            None
        };

        Ok(Self::new(matcher, engine, evaluator))
    }

    /// Lowercases the query, restricts retrieval to the best-matching
    /// articles, answers and (when enabled) evaluates the answer.
    pub async fn answer(&self, raw_query: &str) -> Result<QueryTurn> {
        let query = raw_query.trim().to_lowercase();
        let article_keys = self.match_articles(&query).await?;
        self.respond(query, article_keys).await
    }

    /// Article keys whose summaries best match an already lowercased query.
    pub async fn match_articles(&self, query: &str) -> Result<Vec<String>> {
        let article_keys = self.matcher.compute_similarity(query).await?;
        debug!("Candidate articles: {:?}", article_keys);
        Ok(article_keys)
    }

    async fn respond(&self, query: String, article_keys: Vec<String>) -> Result<QueryTurn> {
        let response = self.engine.query(&query, &article_keys).await?;

        let evaluation = match &self.evaluator {
            Some(evaluator) => Some(evaluator.evaluate(&query, &response).await?),
            None => None,
        };

        Ok(QueryTurn {
            query,
            article_keys,
            response,
            evaluation,
        })
    }

    /// Prompts on `output` and answers each line of `input` until `exit` or
    /// end of input. Returns the number of answered queries.
    pub async fn run<R, W>(&self, input: R, output: &mut W) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        if let Some(evaluator) = &self.evaluator {
            evaluator.reset_records()?;
        }

        let mut lines = input.lines();
        let mut answered = 0;

        loop {
            write!(output, "\n\n{}", PROMPT)?;
            output.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let query = line.trim().to_lowercase();
            if query == EXIT_COMMAND {
                break;
            }
            if query.is_empty() {
                continue;
            }

            // matches go out before any retrieval or LLM call can fail
            let article_keys = self.match_articles(&query).await?;
            write!(output, "{}", console::render_matches(&article_keys))?;
            output.flush()?;

            let turn = self.respond(query, article_keys).await?;
            write!(output, "{}", console::render_response(&turn.response))?;
            if let Some(record) = &turn.evaluation {
                write!(output, "{}", console::render_evaluation(record))?;
            }
            output.flush()?;
            answered += 1;
        }

        info!("Query session finished after {} queries", answered);
        Ok(answered)
    }
}
