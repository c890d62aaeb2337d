//! Final run report.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::request::{RelocationRequest, Strategy};

/// How the run ended. Failures travel as errors, not reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    Aborted { reason: String },
}

/// What a finished (completed or cleanly aborted) run tells the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocationReport {
    pub instance: String,
    pub strategy: Strategy,
    pub source: PathBuf,
    pub target: PathBuf,
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Where the original data was renamed aside (copy-relink only).
    ///
    /// The backup is never deleted by the orchestrator; retention is the
    /// operator's call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
}

impl RelocationReport {
    pub fn completed(request: &RelocationRequest, backup_path: Option<PathBuf>) -> Self {
        Self {
            instance: request.instance.clone(),
            strategy: request.strategy,
            source: request.source.clone(),
            target: request.target.clone(),
            outcome: Outcome::Completed,
            backup_path,
        }
    }

    pub fn aborted(request: &RelocationRequest, reason: impl Into<String>) -> Self {
        Self {
            instance: request.instance.clone(),
            strategy: request.strategy,
            source: request.source.clone(),
            target: request.target.clone(),
            outcome: Outcome::Aborted {
                reason: reason.into(),
            },
            backup_path: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, Outcome::Completed)
    }
}
