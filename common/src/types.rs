//! Core types shared across the pipeline crates

use crate::error::StageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

/// Investing philosophy tag selecting which analyst/critic collaborators apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Value,
    SpecialSituations,
    Distressed,
    General,
}

impl Strategy {
    /// Human-readable label used in prompts and logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::SpecialSituations => "special-situations",
            Self::Distressed => "distressed",
            Self::General => "general",
        }
    }
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "value" => Ok(Self::Value),
            "special-situations" | "special_situations" => Ok(Self::SpecialSituations),
            "distressed" => Ok(Self::Distressed),
            "general" => Ok(Self::General),
            other => Err(anyhow::anyhow!("unknown strategy: {}", other)),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The user's input hypothesis. Immutable for the lifetime of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thesis {
    /// Free-text investment hypothesis
    pub hypothesis: String,
    /// Strategy tag selecting analyst/critic collaborators
    pub strategy: Strategy,
    /// Optional short title for display
    pub title: Option<String>,
}

impl Thesis {
    pub fn new(hypothesis: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            hypothesis: hypothesis.into(),
            strategy,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Risk level assigned to an opportunity at discovery time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl FromStr for RiskLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(anyhow::anyhow!("unknown risk level: {}", other)),
        }
    }
}

/// A discovered candidate investment target
///
/// The ticker is the opportunity's identity and never changes after
/// discovery. Only the enrichment stage writes into `metrics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    /// Exchange ticker, unique within a run
    pub ticker: String,
    /// Company name
    pub company: String,
    /// Strategy-specific thesis fragment from the discovery agent
    pub thesis: String,
    /// Alignment with the user's hypothesis, 0-100
    pub alignment_score: u8,
    pub risk: RiskLevel,
    /// Named financial metrics; missing keys are tolerated everywhere
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
}

/// Long-form deep-research output. Write-once: later stages only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchReport {
    pub content: String,
    /// Name of the agent that produced the report (primary or fallback)
    pub provider: String,
    pub generated_at: DateTime<Utc>,
}

/// Adversarial reviewer roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritiqueRole {
    Skeptic,
    RiskOfficer,
}

impl std::fmt::Display for CritiqueRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skeptic => write!(f, "skeptic"),
            Self::RiskOfficer => write!(f, "risk_officer"),
        }
    }
}

/// One adversarial review of a research report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Critique {
    pub role: CritiqueRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// One entry in a debate round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateEntry {
    pub agent: String,
    pub content: String,
}

/// One exchange cycle where critics respond to prior output.
/// Rounds are appended in order and never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRound {
    pub round: u32,
    pub entries: Vec<DebateEntry>,
}

/// Final call on an opportunity (or the aggregated run)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Invest,
    Pass,
    Watch,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invest => write!(f, "invest"),
            Self::Pass => write!(f, "pass"),
            Self::Watch => write!(f, "watch"),
        }
    }
}

/// Decision/confidence/rationale triple derived from agent free text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub decision: Decision,
    /// 0-100
    pub confidence: u8,
    pub rationale: String,
}

impl Verdict {
    /// Default verdict used when nothing could be scored
    pub fn watch_default() -> Self {
        Self {
            decision: Decision::Watch,
            confidence: 50,
            rationale: "No scored opportunities".to_string(),
        }
    }
}

/// An opportunity plus everything the per-opportunity pipeline produced.
///
/// Mutated incrementally by each stage, never rolled back: a later
/// failure only appends to `errors`, it does not erase earlier fields.
/// Invariant: `score` is defined iff `verdict` is defined, and a verdict
/// exists only when `research` exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedOpportunity {
    pub opportunity: Opportunity,
    pub research: Option<ResearchReport>,
    pub strategy_analysis: Option<String>,
    pub critiques: Vec<Critique>,
    pub debate: Vec<DebateRound>,
    pub verdict: Option<Verdict>,
    /// Signed score: +confidence for invest, -confidence for pass, 0 for watch
    pub score: Option<i32>,
    pub errors: Vec<StageError>,
}

impl AnalyzedOpportunity {
    pub fn new(opportunity: Opportunity) -> Self {
        Self {
            opportunity,
            research: None,
            strategy_analysis: None,
            critiques: Vec::new(),
            debate: Vec::new(),
            verdict: None,
            score: None,
            errors: Vec::new(),
        }
    }

    /// Decision used for summary tallies; undefined verdicts count as watch
    pub fn summary_decision(&self) -> Decision {
        self.verdict.as_ref().map_or(Decision::Watch, |v| v.decision)
    }
}

/// Aggregate outcome of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub invest_count: usize,
    pub pass_count: usize,
    pub watch_count: usize,
    /// Ticker of the highest-scoring opportunity, if any scored
    pub top_pick: Option<String>,
    /// Aggregate verdict: copied from the top pick, or watch/50 default
    pub verdict: Verdict,
    pub duration_ms: u64,
}

/// One complete pipeline run, finalized when the aggregate verdict is
/// computed and immutable thereafter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub session_id: Uuid,
    pub thesis: Thesis,
    /// Opportunities as discovered (ranked, capped)
    pub opportunities: Vec<Opportunity>,
    /// Analyzed opportunities in final ranked order
    pub analyzed: Vec<AnalyzedOpportunity>,
    pub summary: RunSummary,
    /// Phase-event log, in emission order
    pub events: Vec<PhaseEvent>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Stage of the streamed progress protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Starting,
    Researching,
    StrategyAnalysis,
    Critique,
    Verdict,
    Complete,
    Error,
}

/// One unit of the streamed progress protocol
///
/// `complete` carries the serialized run summary as its content;
/// `error` terminates the stream for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseEvent {
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl PhaseEvent {
    pub fn now(phase: Phase) -> Self {
        Self {
            phase,
            agent: None,
            content: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}
