//! Opportunity analyzer - the per-opportunity four-stage state machine
//!
//! Stages run strictly in order: research -> strategy analysis ->
//! critique -> verdict. Each later stage gates on a defined research
//! report, not on the success of every prior stage: a failed strategy
//! analysis still allows critique and verdict to run with the field
//! absent. Only a research failure is fatal to the opportunity; every
//! other failure is recorded and the pipeline degrades around it.

use crate::config::PipelineConfig;
use crate::progress::ProgressSender;
use crate::verdict::VerdictParser;
use chrono::Utc;
use common::{
    AnalyzedOpportunity, Critique, CritiqueRole, Opportunity, Phase, PhaseEvent, ResearchReport,
    Stage, StageError, StageResult, Thesis,
};
use research_agents::{AgentRoster, TextGenerator};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Literal placeholder rendered for absent prior text in downstream
/// prompts; sections are never silently omitted
pub const NOT_AVAILABLE: &str = "Not available";

/// Runs the research -> strategy -> critique -> verdict sequence for one
/// opportunity with stage-level failure isolation
pub struct OpportunityAnalyzer {
    roster: Arc<AgentRoster>,
    parser: VerdictParser,
    config: PipelineConfig,
}

impl OpportunityAnalyzer {
    pub fn new(roster: Arc<AgentRoster>, config: PipelineConfig) -> Self {
        Self {
            roster,
            parser: VerdictParser::new(),
            config,
        }
    }

    /// Analyze one opportunity. Never fails: every stage failure is
    /// converted into the opportunity's error list.
    pub async fn analyze(
        &self,
        opportunity: Opportunity,
        thesis: &Thesis,
        progress: &ProgressSender,
    ) -> AnalyzedOpportunity {
        let mut analyzed = AnalyzedOpportunity::new(opportunity);
        let ticker = analyzed.opportunity.ticker.clone();

        // Stage 1: deep research. Fatal to this opportunity on failure.
        progress
            .emit(
                PhaseEvent::now(Phase::Researching)
                    .with_agent(self.roster.research_primary().name())
                    .with_content(ticker.clone()),
            )
            .await;
        match self.research(&analyzed.opportunity, thesis).await {
            StageResult::Completed(report) => analyzed.research = Some(report),
            StageResult::Failed(reason) => {
                warn!(ticker, %reason, "research failed, no further stages for this opportunity");
                analyzed
                    .errors
                    .push(StageError::new(Stage::Research, reason));
                return analyzed;
            }
            StageResult::Skipped => unreachable!("research is never skipped"),
        }
        let research_text = analyzed
            .research
            .as_ref()
            .map(|r| r.content.clone())
            .unwrap_or_default();

        // Stage 2: strategy analysis, only when an analyst exists for the
        // thesis strategy. Absence is a skip, not an error.
        match self.strategy_analysis(&ticker, thesis, &research_text, progress).await {
            StageResult::Completed(text) => analyzed.strategy_analysis = Some(text),
            StageResult::Failed(reason) => {
                let agent = self
                    .roster
                    .analyst_for(thesis.strategy)
                    .map(|a| a.name().to_string())
                    .unwrap_or_default();
                analyzed.errors.push(
                    StageError::new(Stage::StrategyAnalysis, reason).with_agent(agent),
                );
            }
            StageResult::Skipped => {
                debug!(ticker, strategy = %thesis.strategy, "no analyst for strategy, skipping");
            }
        }

        // Stage 3: both critics concurrently, independently wrapped.
        progress
            .emit(PhaseEvent::now(Phase::Critique).with_content(ticker.clone()))
            .await;
        let critique_prompt = format!(
            "Research report for {} ({}):\n{}\n\nProvide your adversarial review.",
            ticker, analyzed.opportunity.company, research_text
        );
        let (skeptic_result, risk_result) = tokio::join!(
            self.roster.skeptic().generate(&critique_prompt),
            self.roster.risk_officer().generate(&critique_prompt),
        );
        self.record_critique(&mut analyzed, CritiqueRole::Skeptic, skeptic_result);
        self.record_critique(&mut analyzed, CritiqueRole::RiskOfficer, risk_result);

        // Stage 4: verdict over all available prior text; absent fields
        // render as an explicit placeholder.
        let verdict_agent = self.roster.verdict();
        progress
            .emit(
                PhaseEvent::now(Phase::Verdict)
                    .with_agent(verdict_agent.name())
                    .with_content(ticker.clone()),
            )
            .await;
        let verdict_prompt = self.build_verdict_prompt(&analyzed, thesis);
        match verdict_agent.generate(&verdict_prompt).await {
            Ok(response) => {
                let verdict = self.parser.parse(&response);
                analyzed.score = Some(VerdictParser::score(&verdict));
                analyzed.verdict = Some(verdict);
                info!(ticker, score = ?analyzed.score, "opportunity verdicted");
            }
            Err(e) => {
                warn!(ticker, error = %e, "verdict agent failed");
                analyzed.errors.push(
                    StageError::new(Stage::Verdict, e.to_string())
                        .with_agent(verdict_agent.name()),
                );
            }
        }

        analyzed
    }

    /// Deep research with a poll-bounded wait on the primary provider
    /// and a single fallback attempt
    async fn research(
        &self,
        opportunity: &Opportunity,
        thesis: &Thesis,
    ) -> StageResult<ResearchReport> {
        let prompt = format!(
            "Hypothesis: {}\nStrategy: {}\n\nProduce a deep research report on {} ({}). \
             Discovery thesis: {}",
            thesis.hypothesis,
            thesis.strategy,
            opportunity.ticker,
            opportunity.company,
            opportunity.thesis
        );

        let primary = self.roster.research_primary();
        let primary_error = match self.bounded_wait(primary.as_ref(), &prompt).await {
            Ok(content) => {
                return StageResult::Completed(ResearchReport {
                    content,
                    provider: primary.name().to_string(),
                    generated_at: Utc::now(),
                });
            }
            Err(e) => {
                warn!(
                    ticker = %opportunity.ticker,
                    agent = primary.name(),
                    error = %e,
                    "primary research provider failed, trying fallback"
                );
                e
            }
        };

        match self.roster.research_fallback() {
            Some(fallback) => match fallback.generate(&prompt).await {
                Ok(content) => StageResult::Completed(ResearchReport {
                    content,
                    provider: fallback.name().to_string(),
                    generated_at: Utc::now(),
                }),
                Err(e) => StageResult::Failed(format!(
                    "primary: {}; fallback {}: {}",
                    primary_error,
                    fallback.name(),
                    e
                )),
            },
            None => StageResult::Failed(format!("primary: {}; no fallback", primary_error)),
        }
    }

    /// Wait on an in-flight call with periodic progress ticks and a total
    /// deadline. The call is dropped (cancelled) on timeout.
    async fn bounded_wait(
        &self,
        agent: &dyn TextGenerator,
        prompt: &str,
    ) -> anyhow::Result<String> {
        let timeout = Duration::from_secs(self.config.research_timeout_secs);
        let deadline = Instant::now() + timeout;
        let call = agent.generate(prompt);
        tokio::pin!(call);

        let mut poll = tokio::time::interval(Duration::from_secs(
            self.config.research_poll_secs.max(1),
        ));
        poll.tick().await; // first tick completes immediately

        loop {
            tokio::select! {
                result = &mut call => return result,
                _ = poll.tick() => {
                    if Instant::now() >= deadline {
                        anyhow::bail!(
                            "timed out after {}s",
                            self.config.research_timeout_secs
                        );
                    }
                    debug!(agent = agent.name(), "still waiting on deep research");
                }
            }
        }
    }

    async fn strategy_analysis(
        &self,
        ticker: &str,
        thesis: &Thesis,
        research_text: &str,
        progress: &ProgressSender,
    ) -> StageResult<String> {
        let Some(analyst) = self.roster.analyst_for(thesis.strategy) else {
            return StageResult::Skipped;
        };

        progress
            .emit(
                PhaseEvent::now(Phase::StrategyAnalysis)
                    .with_agent(analyst.name())
                    .with_content(ticker.to_string()),
            )
            .await;

        let prompt = format!(
            "Strategy: {}\n\nResearch report for {}:\n{}\n\n\
             Analyze this opportunity through your strategy lens.",
            thesis.strategy, ticker, research_text
        );
        match analyst.generate(&prompt).await {
            Ok(text) => StageResult::Completed(text),
            Err(e) => {
                warn!(ticker, agent = analyst.name(), error = %e, "strategy analysis failed");
                StageResult::Failed(e.to_string())
            }
        }
    }

    fn record_critique(
        &self,
        analyzed: &mut AnalyzedOpportunity,
        role: CritiqueRole,
        result: anyhow::Result<String>,
    ) {
        let agent_name = match role {
            CritiqueRole::Skeptic => self.roster.skeptic().name(),
            CritiqueRole::RiskOfficer => self.roster.risk_officer().name(),
        };
        match result {
            Ok(content) => analyzed.critiques.push(Critique {
                role,
                content,
                timestamp: Utc::now(),
            }),
            Err(e) => {
                warn!(
                    ticker = %analyzed.opportunity.ticker,
                    agent = agent_name,
                    error = %e,
                    "critic failed"
                );
                analyzed
                    .errors
                    .push(StageError::new(Stage::Critique, e.to_string()).with_agent(agent_name));
            }
        }
    }

    /// Assemble the verdict prompt from all prior text, substituting the
    /// literal placeholder for anything absent
    fn build_verdict_prompt(&self, analyzed: &AnalyzedOpportunity, thesis: &Thesis) -> String {
        let research = analyzed
            .research
            .as_ref()
            .map(|r| r.content.as_str())
            .unwrap_or(NOT_AVAILABLE);
        let strategy = analyzed
            .strategy_analysis
            .as_deref()
            .unwrap_or(NOT_AVAILABLE);
        let critique_for = |role: CritiqueRole| {
            analyzed
                .critiques
                .iter()
                .find(|c| c.role == role)
                .map(|c| c.content.as_str())
                .unwrap_or(NOT_AVAILABLE)
        };

        format!(
            "Hypothesis: {}\nOpportunity: {} ({})\n\n\
             Research report:\n{}\n\n\
             Strategy analysis:\n{}\n\n\
             Skeptic critique:\n{}\n\n\
             Risk officer critique:\n{}\n\n\
             Respond with exactly:\n\
             DECISION: INVEST|PASS|WATCH\n\
             CONFIDENCE: 0-100\n\
             RATIONALE: your reasoning",
            thesis.hypothesis,
            analyzed.opportunity.ticker,
            analyzed.opportunity.company,
            research,
            strategy,
            critique_for(CritiqueRole::Skeptic),
            critique_for(CritiqueRole::RiskOfficer),
        )
    }
}
