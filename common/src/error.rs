//! Error taxonomy for the pipeline
//!
//! Two levels of failure exist:
//! - `PipelineError`: fatal to the whole run (discovery or persistence)
//! - `StageError`: recorded against a single opportunity; only a research
//!   failure stops further stages for that opportunity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Run-level failures. These propagate to the runner, which emits a
/// single `error` phase event and stops.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("discovery agent failed: {0}")]
    Discovery(String),

    #[error("persistence failed: {0}")]
    Persistence(String),
}

/// Pipeline stage names used in per-opportunity error records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Research,
    StrategyAnalysis,
    Critique,
    Debate,
    Verdict,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Research => write!(f, "research"),
            Self::StrategyAnalysis => write!(f, "strategy_analysis"),
            Self::Critique => write!(f, "critique"),
            Self::Debate => write!(f, "debate"),
            Self::Verdict => write!(f, "verdict"),
        }
    }
}

/// A stage-level failure recorded against one opportunity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageError {
    pub stage: Stage,
    /// Agent that failed, when the failure is attributable to one
    pub agent: Option<String>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl StageError {
    pub fn new(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            agent: None,
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }
}

/// Outcome of one stage for one opportunity.
///
/// Keeps "missing because it failed" and "missing because not applicable"
/// distinguishable: a skipped stage records nothing, a failed stage
/// records a `StageError`.
#[derive(Debug, Clone)]
pub enum StageResult<T> {
    Completed(T),
    Failed(String),
    Skipped,
}

impl<T> StageResult<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }
}
