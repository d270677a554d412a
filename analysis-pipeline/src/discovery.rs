//! Discovery stage - one agent call, extracted, enriched, ranked, capped
//!
//! Only the discovery-agent call itself is fatal to the run; extraction
//! producing zero drafts simply yields an empty list and the run proceeds
//! to aggregation with a default watch verdict.

use crate::config::PipelineConfig;
use crate::enrich::Enricher;
use crate::extract::Extractor;
use common::{Opportunity, PipelineError, Thesis};
use research_agents::AgentRoster;
use std::sync::Arc;
use tracing::{info, warn};

/// Runs discovery for one thesis
pub struct DiscoveryStage {
    roster: Arc<AgentRoster>,
    extractor: Extractor,
    enricher: Enricher,
    max_opportunities: usize,
}

impl DiscoveryStage {
    pub fn new(roster: Arc<AgentRoster>, enricher: Enricher, config: &PipelineConfig) -> Self {
        Self {
            roster,
            extractor: Extractor::new(config.max_extracted),
            enricher,
            max_opportunities: config.max_opportunities,
        }
    }

    /// Discover, enrich, and rank opportunities for the thesis.
    ///
    /// Output is capped at `max_opportunities` with unique tickers.
    pub async fn run(&self, thesis: &Thesis) -> Result<Vec<Opportunity>, PipelineError> {
        let agent = self.roster.discovery();
        let prompt = self.build_prompt(thesis);

        let response = agent
            .generate(&prompt)
            .await
            .map_err(|e| PipelineError::Discovery(e.to_string()))?;

        let drafts = self.extractor.extract(&response, thesis.strategy);
        if drafts.is_empty() {
            warn!("discovery response matched no template, proceeding with zero opportunities");
            return Ok(Vec::new());
        }

        let mut enriched = self.enricher.enrich(drafts).await;

        // Extraction already sorts, but enrichment fan-out must not be
        // trusted to preserve ranking if that changes; re-sort and cap.
        enriched.sort_by(|a, b| b.alignment_score.cmp(&a.alignment_score));
        enriched.truncate(self.max_opportunities);

        info!(
            count = enriched.len(),
            strategy = %thesis.strategy,
            "discovery complete"
        );
        Ok(enriched)
    }

    fn build_prompt(&self, thesis: &Thesis) -> String {
        format!(
            "Investment hypothesis: {}\nStrategy: {}\n\n\
             Identify public companies that fit this hypothesis. For each, \
             respond with exactly this block format:\n\
             [TICKER] Company Name | Score: 0-100\n\
             Thesis: one sentence\n\
             Metrics: key=value, key=value\n\
             Risk: low|medium|high",
            thesis.hypothesis, thesis.strategy
        )
    }
}
