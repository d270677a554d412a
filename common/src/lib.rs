//! Shared data model for the thesis research pipeline
//!
//! This crate defines the types that flow between the pipeline stages:
//! - Thesis and strategy inputs
//! - Discovered and analyzed opportunities
//! - Verdicts, critiques, debate rounds
//! - Phase events streamed to callers
//! - The error taxonomy (run-level vs. stage-level failures)

mod error;
mod types;

pub use error::{PipelineError, Stage, StageError, StageResult};
pub use types::{
    AnalyzedOpportunity, Critique, CritiqueRole, DebateEntry, DebateRound, Decision, Opportunity,
    Phase, PhaseEvent, PipelineRun, ResearchReport, RiskLevel, RunSummary, Strategy, Thesis,
    Verdict,
};
