//! Command-line surface of the `sopcheck` binary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::adjudication::{Adjudicator, LlmJudge};
use crate::config::Config;
use crate::embedding::{CachedEmbedder, Embedder, HashEmbedder, HttpEmbedder};
use crate::index::RequirementIndex;
use crate::ingestion::{Ingestor, LlmNormalizer, Normalizer, PlainTextNormalizer};
use crate::llm::GenaiChat;
use crate::matching::SemanticMatcher;
use crate::orchestrator::{CancelHandle, Orchestrator, ReverseCheck, ingest_into_index};
use crate::report::RunOutcome;
use crate::storage::{IndexStore, StorageTarget};

/// Gaps listed on the console after a verify run.
const CONSOLE_GAP_LIMIT: usize = 5;

/// Exit status when a verify run completed but some findings were degraded.
const EXIT_DEGRADED: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "sopcheck",
    about = "Reverse-check an SOP against indexed reference requirements",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract requirements from reference documents and append them to the index.
    Ingest(IngestArgs),

    /// Check an SOP against every indexed requirement and write a gap report.
    Verify(VerifyArgs),

    /// Print index size, dimension, fingerprint, and per-document counts.
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Reference documents (plain text or Markdown).
    #[arg(long, num_args = 1.., required = true)]
    pub files: Vec<PathBuf>,

    /// Index location: a path, `local`, or `gs://bucket/object`.
    #[arg(long)]
    pub index: Option<String>,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// The SOP document to verify.
    #[arg(long)]
    pub sop: PathBuf,

    #[arg(long)]
    pub index: Option<String>,

    /// Report path; a `.md` extension selects Markdown, anything else JSON.
    #[arg(long, default_value = "gap_report.json")]
    pub output: PathBuf,

    #[arg(long)]
    pub top_k: Option<usize>,

    #[arg(long)]
    pub threshold: Option<f32>,

    /// Similarity at or above which a match is SATISFIED without asking the judge.
    #[arg(long)]
    pub auto_satisfy: Option<f32>,

    #[arg(long)]
    pub parallelism: Option<usize>,

    #[arg(long)]
    pub judge_model: Option<String>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    #[arg(long)]
    pub index: Option<String>,
}

pub async fn run_from_env() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::from_env().context("invalid SOPCHECK_* environment")?;
    run(cli, config).await
}

pub async fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    match cli.command {
        Commands::Ingest(args) => run_ingest(args, config).await,
        Commands::Verify(args) => run_verify(args, config).await,
        Commands::Inspect(args) => run_inspect(args, config).await,
    }
}

/// Applies command-line overrides on top of the environment configuration.
pub fn apply_overrides(mut config: Config, args: &VerifyArgs) -> Result<Config> {
    if let Some(index) = &args.index {
        config.index = index.clone();
    }
    if let Some(top_k) = args.top_k {
        config.top_k = top_k;
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if args.auto_satisfy.is_some() {
        config.auto_satisfy_threshold = args.auto_satisfy;
    }
    if let Some(parallelism) = args.parallelism {
        config.parallelism = parallelism;
    }
    if let Some(model) = &args.judge_model {
        config.judge_model = model.clone();
    }
    config.validate()?;
    Ok(config)
}

fn open_store(location: &str) -> Result<Arc<dyn IndexStore>> {
    let target = StorageTarget::parse(location)
        .with_context(|| format!("invalid index location '{location}'"))?;
    Ok(target.open())
}

/// HTTP embeddings when an endpoint is configured, otherwise the offline hash embedder.
pub fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let inner: Arc<dyn Embedder> = match &config.embedding_url {
        Some(url) => {
            info!(%url, model = %config.embedding_model, "Using HTTP embedder");
            Arc::new(
                HttpEmbedder::new(url, &config.embedding_model, config.embedding_dim)?
                    .with_api_key(config.embedding_api_key.clone()),
            )
        }
        None => {
            warn!(
                dimension = config.embedding_dim,
                "No SOPCHECK_EMBEDDING_URL configured, using offline hash embedder"
            );
            Arc::new(HashEmbedder::new(config.embedding_dim)?)
        }
    };
    Ok(Arc::new(CachedEmbedder::new(inner)))
}

pub fn build_normalizer(config: &Config) -> Arc<dyn Normalizer> {
    match &config.normalizer_model {
        Some(model) => Arc::new(LlmNormalizer::new(
            Arc::new(GenaiChat::new(model)),
            config.retry_policy(),
        )),
        None => Arc::new(PlainTextNormalizer::new()),
    }
}

pub fn build_ingestor(config: &Config) -> Result<Ingestor> {
    Ok(Ingestor::new(
        build_normalizer(config),
        build_embedder(config)?,
        config.retry_policy(),
    )
    .with_embed_concurrency(config.parallelism))
}

pub fn build_engine(config: &Config) -> Result<ReverseCheck> {
    let judge = Arc::new(LlmJudge::new(Arc::new(GenaiChat::new(&config.judge_model))));
    let adjudicator = Adjudicator::new(judge, config.adjudication_policy())
        .with_auto_satisfy(config.auto_satisfy_threshold);
    Ok(ReverseCheck::new(
        SemanticMatcher::new(config.matcher_config())?,
        Arc::new(adjudicator),
        config.parallelism,
    ))
}

async fn run_ingest(args: IngestArgs, mut config: Config) -> Result<ExitCode> {
    if let Some(index) = args.index {
        config.index = index;
    }
    config.validate()?;

    let store = open_store(&config.index)?;
    let ingestor = build_ingestor(&config)?;
    let summary = ingest_into_index(store.as_ref(), &ingestor, &args.files)
        .await
        .context("ingest failed")?;

    println!(
        "Appended {} requirements to {} ({} total)",
        summary.appended,
        store.location(),
        summary.total
    );
    for failed in &summary.failed {
        println!("  skipped {}: {}", failed.path.display(), failed.error);
    }

    if summary.failed.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn run_verify(args: VerifyArgs, config: Config) -> Result<ExitCode> {
    let config = apply_overrides(config, &args)?;
    let store = open_store(&config.index)?;

    let cancel = CancelHandle::new();
    let orchestrator = Orchestrator::new(store, build_ingestor(&config)?, build_engine(&config)?)
        .with_cancel(cancel.clone());
    let interrupt = spawn_interrupt_watcher(cancel);

    let result = orchestrator.run(&args.sop).await;
    interrupt.abort();
    let report = result.context("verification failed")?;

    report
        .write_to(&args.output)
        .await
        .with_context(|| format!("failed to write report to {}", args.output.display()))?;

    print!("{}", report.console_summary(CONSOLE_GAP_LIMIT));
    println!("Report written to {}", args.output.display());

    Ok(exit_code_for(report.outcome()))
}

async fn run_inspect(args: InspectArgs, mut config: Config) -> Result<ExitCode> {
    if let Some(index) = args.index {
        config.index = index;
    }
    let store = open_store(&config.index)?;
    let index = RequirementIndex::load(store.as_ref())
        .await
        .with_context(|| format!("failed to load index from {}", store.location()))?;

    print!("{}", describe_index(&store.location(), &index));
    Ok(ExitCode::SUCCESS)
}

/// Human-readable index description printed by `inspect`.
pub fn describe_index(location: &str, index: &RequirementIndex) -> String {
    let mut out = format!(
        "Index:        {location}\nRequirements: {}\nDimension:    {}\nFingerprint:  {}\n",
        index.len(),
        index
            .dimension()
            .map_or_else(|| "-".to_string(), |d| d.to_string()),
        index.fingerprint()
    );
    for document in index.documents() {
        out.push_str(&format!(
            "  {document}: {}\n",
            index.by_source(document).len()
        ));
    }
    out
}

pub fn exit_code_for(outcome: RunOutcome) -> ExitCode {
    match outcome {
        RunOutcome::Success => ExitCode::SUCCESS,
        RunOutcome::PartialDegradation => ExitCode::from(EXIT_DEGRADED),
        RunOutcome::Cancelled => ExitCode::FAILURE,
    }
}

fn spawn_interrupt_watcher(cancel: CancelHandle) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            cancel.cancel();
        }
    })
}
