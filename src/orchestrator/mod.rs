//! Run orchestration: the verify state machine and the ingest pipeline.
//!
//! A verify run walks `INIT -> LOADING_INDEX -> INGESTING_TARGET -> MATCHING -> ADJUDICATING ->
//! AGGREGATING -> DONE`. Index, configuration, and target ingestion failures abort the run
//! before any report exists. Once adjudication starts the run always produces a total report.

mod cancel;
mod engine;
mod error;
mod state;


pub use cancel::CancelHandle;
pub use engine::ReverseCheck;
pub use error::{RunError, RunResult};
pub use state::{RunState, RunTracker};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::index::RequirementIndex;
use crate::ingestion::{FailedFile, Ingestor, source_name};
use crate::report::{GapReport, RunMetadata};
use crate::storage::IndexStore;

/// Outcome of one verify run, successful or not, with the states it went through.
#[derive(Debug)]
pub struct RunRecord {
    pub states: Vec<RunState>,
    pub result: RunResult<GapReport>,
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    store: Arc<dyn IndexStore>,
    ingestor: Ingestor,
    engine: ReverseCheck,
    cancel: CancelHandle,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn IndexStore>, ingestor: Ingestor, engine: ReverseCheck) -> Self {
        Self {
            store,
            ingestor,
            engine,
            cancel: CancelHandle::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Verifies `target` and returns the report.
    pub async fn run(&self, target: &Path) -> RunResult<GapReport> {
        self.execute(target).await.result
    }

    /// Verifies `target`, returning the state history alongside the result.
    #[instrument(skip(self), fields(target = %target.display(), index = %self.store.location()))]
    pub async fn execute(&self, target: &Path) -> RunRecord {
        let mut metadata = RunMetadata::new(
            source_name(target),
            *self.engine.matcher().config(),
            self.engine.adjudicator().judge_name(),
        );
        let mut tracker = RunTracker::new(metadata.run_id);

        let result = self.drive(target, &mut tracker, &mut metadata).await;
        if let Err(e) = &result {
            tracker.fail(e);
            error!(run_id = %metadata.run_id, error = %e, "Verification run aborted");
        }

        RunRecord {
            states: tracker.history().to_vec(),
            result,
        }
    }

    async fn drive(
        &self,
        target: &Path,
        tracker: &mut RunTracker,
        metadata: &mut RunMetadata,
    ) -> RunResult<GapReport> {
        self.validate_target(target).await?;
        self.checkpoint(tracker)?;

        tracker.advance(RunState::LoadingIndex)?;
        let index = RequirementIndex::load(self.store.as_ref()).await?;
        metadata.index_version = index.fingerprint();
        metadata.index_size = index.len();
        metadata.dimension = index.dimension();
        self.checkpoint(tracker)?;

        tracker.advance(RunState::IngestingTarget)?;
        let pool = self.ingestor.ingest_target(target).await?;
        metadata.dropped_statements = pool.dropped();
        if pool.dropped() > 0 {
            warn!(dropped = pool.dropped(), "Some SOP statements could not be embedded");
        }
        if let (Some(index_dim), Some(pool_dim)) = (index.dimension(), pool.dimension())
            && index_dim != pool_dim
        {
            return Err(RunError::DimensionMismatch {
                index: index_dim,
                pool: pool_dim,
            });
        }
        self.checkpoint(tracker)?;

        tracker.advance(RunState::Matching)?;
        let matched = self.engine.match_all(&index, &pool);
        let unmatched = matched.iter().filter(|(_, m)| m.is_empty()).count();
        info!(
            requirements = matched.len(),
            statements = pool.len(),
            unmatched,
            "Matching complete"
        );

        tracker.advance(RunState::Adjudicating)?;
        let findings = self.engine.adjudicate_all(&matched, &self.cancel).await;

        tracker.advance(RunState::Aggregating)?;
        let report = GapReport::assemble(metadata.clone(), findings);

        tracker.advance(RunState::Done)?;
        info!(
            run_id = %report.metadata.run_id,
            total = report.summary.total,
            satisfied = report.summary.counts.satisfied,
            partial = report.summary.counts.partial,
            weak = report.summary.counts.weak,
            missing = report.summary.counts.missing,
            cancelled = report.summary.counts.cancelled,
            degraded = report.summary.degraded,
            outcome = %report.outcome(),
            "Verification run complete"
        );
        Ok(report)
    }

    async fn validate_target(&self, target: &Path) -> RunResult<()> {
        let meta = tokio::fs::metadata(target).await.map_err(|e| {
            RunError::Configuration(format!("target {} is not readable: {e}", target.display()))
        })?;
        if !meta.is_file() {
            return Err(RunError::Configuration(format!(
                "target {} is not a file",
                target.display()
            )));
        }
        if self.store.location().trim().is_empty() {
            return Err(RunError::Configuration(
                "index location is empty".to_string(),
            ));
        }
        Ok(())
    }

    fn checkpoint(&self, tracker: &RunTracker) -> RunResult<()> {
        if self.cancel.is_cancelled() {
            return Err(RunError::Cancelled {
                state: tracker.current(),
            });
        }
        Ok(())
    }
}

/// Result of an ingest command.
#[derive(Debug)]
pub struct IngestSummary {
    pub appended: usize,
    pub total: usize,
    pub failed: Vec<FailedFile>,
}

/// Ingests reference files and appends them to the index in `store`.
///
/// Each file is processed independently and failing files are skipped. The successful ones
/// are appended as one all-or-nothing batch and persisted. A missing index starts empty;
/// a corrupt one is fatal.
#[instrument(skip(store, ingestor, paths), fields(index = %store.location(), files = paths.len()))]
pub async fn ingest_into_index(
    store: &dyn IndexStore,
    ingestor: &Ingestor,
    paths: &[PathBuf],
) -> RunResult<IngestSummary> {
    if paths.is_empty() {
        return Err(RunError::Configuration(
            "no reference files given".to_string(),
        ));
    }

    let index = RequirementIndex::load_or_empty(store).await?;
    let batch = ingestor.ingest_references(paths).await;

    if batch.records.is_empty() {
        warn!(failed = batch.failed.len(), "No requirements extracted, index unchanged");
        return Ok(IngestSummary {
            appended: 0,
            total: index.len(),
            failed: batch.failed,
        });
    }

    let appended = batch.records.len();
    let index = index.append(batch.records)?;
    index.persist(store).await?;

    info!(
        appended,
        total = index.len(),
        files_ok = batch.files_ok,
        files_failed = batch.failed.len(),
        "Reference ingestion complete"
    );
    Ok(IngestSummary {
        appended,
        total: index.len(),
        failed: batch.failed,
    })
}
