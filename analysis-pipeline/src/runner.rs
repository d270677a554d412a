//! Pipeline runner - top-level coordination of a run
//!
//! Sequence: mark session researching -> discovery -> per-opportunity
//! analysis in bounded-concurrency batches -> debate rounds -> ranking
//! and aggregation -> persistence -> completion event. Run-level failures
//! (discovery, persistence) emit a single `error` phase event and stop;
//! everything else degrades per opportunity.
//!
//! Sub-components return values rather than mutating shared state; the
//! runner is the single writer of the analyzed list and the event log,
//! so no locking is needed across opportunities.

use crate::analyzer::OpportunityAnalyzer;
use crate::config::PipelineConfig;
use crate::debate::{DebateFacilitator, DebateInputs};
use crate::discovery::DiscoveryStage;
use crate::enrich::Enricher;
use crate::market::MarketData;
use crate::progress::ProgressSender;
use crate::store::SessionStore;
use crate::verdict;
use chrono::Utc;
use common::{
    AnalyzedOpportunity, CritiqueRole, Phase, PhaseEvent, PipelineError, PipelineRun, Thesis,
};
use futures::future::join_all;
use research_agents::AgentRoster;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

/// Handle to one in-flight run: the ordered phase-event stream plus the
/// final result
pub struct PipelineStream {
    pub events: mpsc::Receiver<PhaseEvent>,
    pub handle: JoinHandle<Result<PipelineRun, PipelineError>>,
}

/// Top-level coordinator. Collaborators are constructed once and passed
/// in by reference; no global state.
pub struct PipelineRunner {
    roster: Arc<AgentRoster>,
    market: Arc<dyn MarketData>,
    store: Arc<dyn SessionStore>,
    config: PipelineConfig,
}

impl PipelineRunner {
    pub fn new(
        roster: Arc<AgentRoster>,
        market: Arc<dyn MarketData>,
        store: Arc<dyn SessionStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            roster,
            market,
            store,
            config,
        }
    }

    /// Start a run on a spawned task and return its event stream
    pub fn start(self: &Arc<Self>, thesis: Thesis, session_id: Uuid) -> PipelineStream {
        let (progress, events) = ProgressSender::channel();
        let runner = Arc::clone(self);
        let handle =
            tokio::spawn(async move { runner.execute(thesis, session_id, progress).await });
        PipelineStream { events, handle }
    }

    /// Execute one run end to end
    async fn execute(
        &self,
        thesis: Thesis,
        session_id: Uuid,
        progress: ProgressSender,
    ) -> Result<PipelineRun, PipelineError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        info!(%session_id, strategy = %thesis.strategy, "pipeline run starting");

        if let Err(e) = self.store.mark_researching(session_id).await {
            return self
                .fail(&progress, PipelineError::Persistence(e.to_string()))
                .await;
        }

        progress
            .emit(PhaseEvent::now(Phase::Starting).with_content(thesis.hypothesis.clone()))
            .await;

        // Discovery: the only stage whose agent failure aborts the run
        let discovery = DiscoveryStage::new(
            Arc::clone(&self.roster),
            Enricher::new(Arc::clone(&self.market)),
            &self.config,
        );
        let opportunities = match discovery.run(&thesis).await {
            Ok(opportunities) => opportunities,
            Err(e) => return self.fail(&progress, e).await,
        };

        // Analysis: batches run sequentially, batch members concurrently
        let analyzer = OpportunityAnalyzer::new(Arc::clone(&self.roster), self.config.clone());
        let mut analyzed: Vec<AnalyzedOpportunity> = Vec::with_capacity(opportunities.len());
        for batch in opportunities.chunks(self.config.batch_size.max(1)) {
            let results = join_all(
                batch
                    .iter()
                    .map(|opp| analyzer.analyze(opp.clone(), &thesis, &progress)),
            )
            .await;
            analyzed.extend(results);
        }

        if self.config.enable_debate {
            self.run_debates(&mut analyzed).await;
        }

        verdict::rank(&mut analyzed);
        let summary = verdict::summarize(&analyzed, clock.elapsed().as_millis() as u64);
        info!(
            %session_id,
            invest = summary.invest_count,
            pass = summary.pass_count,
            watch = summary.watch_count,
            top_pick = ?summary.top_pick,
            "pipeline run aggregated"
        );

        let run = PipelineRun {
            session_id,
            thesis,
            opportunities,
            analyzed,
            summary,
            events: progress.take_log(),
            started_at,
            completed_at: Utc::now(),
        };

        // Persist before announcing completion so an error event is still
        // possible on store failure
        if let Err(e) = self.store.save_completed(session_id, &run).await {
            return self
                .fail(&progress, PipelineError::Persistence(e.to_string()))
                .await;
        }

        let summary_json = serde_json::to_string(&run.summary)
            .unwrap_or_else(|_| "{}".to_string());
        progress
            .emit(PhaseEvent::now(Phase::Complete).with_content(summary_json))
            .await;

        Ok(run)
    }

    /// Debate rounds are strictly sequential per opportunity; the
    /// strategy analysis plays the bull case when present
    async fn run_debates(&self, analyzed: &mut [AnalyzedOpportunity]) {
        let facilitator = DebateFacilitator::new(Arc::clone(&self.roster), &self.config);
        for item in analyzed.iter_mut() {
            let critique_for = |role: CritiqueRole| {
                item.critiques
                    .iter()
                    .find(|c| c.role == role)
                    .map(|c| c.content.as_str())
            };
            let inputs = DebateInputs {
                bull: item.strategy_analysis.as_deref(),
                skeptic: critique_for(CritiqueRole::Skeptic),
                risk_officer: critique_for(CritiqueRole::RiskOfficer),
            };
            let (rounds, errors) = facilitator.run(&item.opportunity.ticker, inputs).await;
            item.debate.extend(rounds);
            item.errors.extend(errors);
        }
    }

    /// Emit the single terminal error event and return the failure
    async fn fail(
        &self,
        progress: &ProgressSender,
        err: PipelineError,
    ) -> Result<PipelineRun, PipelineError> {
        error!(error = %err, "pipeline run failed");
        progress
            .emit(PhaseEvent::now(Phase::Error).with_content(err.to_string()))
            .await;
        Err(err)
    }
}
