// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use gdpr_rag::config::EmbeddingBackend;
use gdpr_rag::embeddings::create_provider;
use gdpr_rag::utils::logging::{format_info, format_success, format_warning, init_logger};
use gdpr_rag::{
    ArticleSplitter, AutoMergingIndex, Config, IngestOrchestrator, QueryRunner, SummaryMatcher,
    load_article_summaries,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "gdpr_rag")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Retrieval-augmented question answering over the GDPR articles", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split the GDPR PDF into one text file per article
    Split {
        #[arg(long, value_name = "FILE")]
        pdf: Option<PathBuf>,

        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Load the hierarchical index, building it when it does not exist
    Ingest {
        /// Delete any existing index and build it again
        #[arg(long)]
        rebuild: bool,
    },

    /// Print the articles whose summaries best match a query
    Match {
        query: String,

        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Answer queries interactively until "exit"
    Query,

    /// Print node counts of the persisted index
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    info!("GDPR RAG Pipeline");
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        let config = Config::default_config();
        config.validate().context("Invalid default configuration")?;
        config
    };

    match cli.command {
        Commands::Split { pdf, output } => {
            cmd_split(&config, pdf, output)?;
        }
        Commands::Ingest { rebuild } => {
            cmd_ingest(config, rebuild, cli.color).await?;
        }
        Commands::Match { query, k } => {
            cmd_match(&config, &query, k).await?;
        }
        Commands::Query => {
            cmd_query(config, cli.color).await?;
        }
        Commands::Stats => {
            cmd_stats(&config).await?;
        }
    }

    Ok(())
}

fn uses_remote_embeddings(config: &Config) -> bool {
    config.embedding.provider == EmbeddingBackend::OpenAi
        || config.matcher.provider == EmbeddingBackend::OpenAi
}

fn cmd_split(config: &Config, pdf: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let pdf_path = pdf.unwrap_or_else(|| config.paths.pdf_path.clone());
    let output_dir = output.unwrap_or_else(|| config.paths.articles_dir.clone());

    info!("Splitting {} into {}", pdf_path.display(), output_dir.display());
    let start_time = Instant::now();

    let written = ArticleSplitter::new(&output_dir)
        .split_pdf(&pdf_path)
        .with_context(|| format!("Failed to split {}", pdf_path.display()))?;

    for path in &written {
        println!("{}", path.display());
    }
    println!(
        "{}",
        format_success(&format!(
            "Saved {} article files in {:.2}s",
            written.len(),
            start_time.elapsed().as_secs_f64()
        ))
    );

    Ok(())
}

async fn cmd_ingest(mut config: Config, rebuild: bool, colored: bool) -> Result<()> {
    if uses_remote_embeddings(&config) {
        config.resolve_api_key(true)?;
    }

    let orchestrator = IngestOrchestrator::new(config)
        .context("Failed to create embedding provider")?
        .with_color(colored);

    let report = orchestrator
        .run(rebuild)
        .await
        .context("Ingestion failed")?;

    let message = match &report.stats {
        Some(stats) => format!(
            "Built index: {} nodes, {} leaf vectors",
            stats.nodes_created, stats.leaf_nodes_embedded
        ),
        None => {
            println!(
                "{}",
                format_warning(&format!(
                    "Index already present at {} ({} nodes); use --rebuild to rebuild it",
                    report.index.persist_dir().display(),
                    report.index.docstore().len()
                ))
            );
            return Ok(());
        }
    };
    println!("{}", format_success(&message));

    Ok(())
}

async fn cmd_match(config: &Config, query: &str, k: Option<usize>) -> Result<()> {
    let mut config = config.clone();
    if config.matcher.provider == EmbeddingBackend::OpenAi {
        config.resolve_api_key(true)?;
    }

    let summaries = load_article_summaries(&config.paths.metadata_path)
        .context("Failed to load article summaries")?;
    let embedder = create_provider(
        config.matcher.provider,
        &config.matcher.model,
        config.matcher.max_length,
        config.embedding.batch_size,
        &config.llm,
    )?;
    let matcher = SummaryMatcher::new(k.unwrap_or(config.matcher.top_k), embedder, &summaries)
        .await
        .context("Failed to build summary matcher")?;

    let scores = matcher.compute_scores(&query.to_lowercase()).await?;

    println!("\nTop similar articles for: \"{}\"\n", query);
    println!("{}", "=".repeat(80));
    for (idx, (name, score)) in scores.iter().take(matcher.k()).enumerate() {
        println!("\n{}. {} (Score: {:.4})", idx + 1, name, score);
        if let Some(summary) = matcher.summary(name) {
            println!("   {}", summary);
        }
    }
    println!("\n{}", "=".repeat(80));

    Ok(())
}

async fn cmd_query(mut config: Config, colored: bool) -> Result<()> {
    config.resolve_api_key(true)?;

    let orchestrator = IngestOrchestrator::new(config.clone())
        .context("Failed to create embedding provider")?
        .with_color(colored);
    let embedder = orchestrator.embedder();
    let index = orchestrator.open().await.context("Failed to open index")?;

    let runner = QueryRunner::from_config(&config, index, embedder)
        .await
        .context("Failed to initialise query engine")?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let answered = runner.run(stdin, &mut stdout).await?;

    println!("\n{}", format_info(&format!("Answered {} queries", answered)));
    Ok(())
}

async fn cmd_stats(config: &Config) -> Result<()> {
    info!("Gathering statistics");

    let index_dir = &config.paths.index_dir;
    if !AutoMergingIndex::exists(index_dir) {
        println!(
            "{}",
            format_info(&format!(
                "No index at {}; run `gdpr_rag ingest` first",
                index_dir.display()
            ))
        );
        return Ok(());
    }

    let index = AutoMergingIndex::load(index_dir)
        .await
        .context("Failed to load index")?;

    if !index.client().ping().await? {
        return Err(anyhow::anyhow!("Vector store connection failed"));
    }

    let docstore = index.docstore();
    let vectors = index.vector_count().await?;

    println!("\nIndex statistics for {}\n", index_dir.display());
    println!("{}", "=".repeat(80));
    println!("Nodes in docstore:   {}", docstore.len());
    println!("Leaf nodes:          {}", docstore.leaf_count());
    println!("Vectors in LanceDB:  {}", vectors);
    if let Some(embedding) = docstore.embedding() {
        println!(
            "Embedding model:     {} ({} dimensions)",
            embedding.model, embedding.dimension
        );
    }
    println!("{}", "=".repeat(80));

    Ok(())
}
