use std::fmt;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::RunError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Init,
    LoadingIndex,
    IngestingTarget,
    Matching,
    Adjudicating,
    Aggregating,
    Done,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// The state a successful run moves to next.
    pub fn successor(&self) -> Option<RunState> {
        match self {
            Self::Init => Some(Self::LoadingIndex),
            Self::LoadingIndex => Some(Self::IngestingTarget),
            Self::IngestingTarget => Some(Self::Matching),
            Self::Matching => Some(Self::Adjudicating),
            Self::Adjudicating => Some(Self::Aggregating),
            Self::Aggregating => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn can_transition_to(&self, next: RunState) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == Self::Failed || self.successor() == Some(next)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "INIT",
            Self::LoadingIndex => "LOADING_INDEX",
            Self::IngestingTarget => "INGESTING_TARGET",
            Self::Matching => "MATCHING",
            Self::Adjudicating => "ADJUDICATING",
            Self::Aggregating => "AGGREGATING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Validated state machine for one run, keeping the full history.
#[derive(Debug, Clone)]
pub struct RunTracker {
    run_id: Uuid,
    history: Vec<RunState>,
}

impl RunTracker {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            history: vec![RunState::Init],
        }
    }

    pub fn current(&self) -> RunState {
        self.history
            .last()
            .copied()
            .unwrap_or(RunState::Init)
    }

    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    pub fn advance(&mut self, next: RunState) -> Result<(), RunError> {
        let from = self.current();
        if !from.can_transition_to(next) {
            return Err(RunError::InvalidTransition { from, to: next });
        }
        info!(run_id = %self.run_id, %from, to = %next, "Run state transition");
        self.history.push(next);
        Ok(())
    }

    /// Moves to FAILED unless already terminal.
    pub fn fail(&mut self, error: &RunError) {
        let from = self.current();
        if from.is_terminal() {
            return;
        }
        warn!(run_id = %self.run_id, %from, %error, "Run failed");
        self.history.push(RunState::Failed);
    }
}
