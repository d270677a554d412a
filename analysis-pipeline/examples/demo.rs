//! Example run of the thesis research pipeline
//!
//! This example demonstrates:
//! 1. Building the agent roster (scripted agents stand in for providers)
//! 2. Wiring market-data and session-store collaborators
//! 3. Starting a run and consuming the streamed phase events
//! 4. Reading the final ranked result

use analysis_pipeline::{
    InMemorySessionStore, KeyMetrics, MarketData, PipelineConfig, PipelineRunner, PriceSnapshot,
};
use anyhow::Result;
use async_trait::async_trait;
use common::{Strategy, Thesis};
use research_agents::{AgentRoster, TextGenerator};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber;
use uuid::Uuid;

struct Scripted {
    name: &'static str,
    response: &'static str,
}

impl Scripted {
    fn new(name: &'static str, response: &'static str) -> Arc<Self> {
        Arc::new(Self { name, response })
    }
}

#[async_trait]
impl TextGenerator for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.to_string())
    }
}

struct DemoMarket;

#[async_trait]
impl MarketData for DemoMarket {
    async fn price_snapshot(&self, _ticker: &str) -> Result<PriceSnapshot> {
        Ok(PriceSnapshot {
            price: 21.7,
            change_pct: 0.6,
        })
    }

    async fn key_metrics(&self, _ticker: &str) -> Result<KeyMetrics> {
        Ok(KeyMetrics {
            pe: Some(5.4),
            fcf_yield: Some(0.17),
            ..Default::default()
        })
    }
}

const DISCOVERY_TEXT: &str = "\
[SBLK] Star Bulk Carriers | Score: 87
Thesis: dry bulk fleet trading below net asset value
Metrics: pe=5.2
Risk: medium

[GSL] Global Ship Lease | Score: 74
Thesis: contracted charter backlog covers the equity
Risk: low
";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("🔍 Thesis Research Pipeline - Example");

    // Step 1: the agent roster
    let roster = Arc::new(
        AgentRoster::builder()
            .discovery(Scripted::new("discovery", DISCOVERY_TEXT))
            .research_primary(Scripted::new(
                "deep-research",
                "Fleet replacement value exceeds enterprise value; charter rates firming.",
            ))
            .analyst(
                Strategy::Value,
                Scripted::new("value-analyst", "Classic net-net with a cyclical tailwind."),
            )
            .skeptic(Scripted::new(
                "skeptic",
                "Dry bulk rates mean-revert; the discount may be deserved.",
            ))
            .risk_officer(Scripted::new(
                "risk-officer",
                "Leverage is moderate but covenants tighten below book value.",
            ))
            .verdict(Scripted::new(
                "verdict",
                "DECISION: INVEST\nCONFIDENCE: 71\nRATIONALE: Discount to NAV with improving rates.",
            ))
            .debate_synthesizer(Scripted::new(
                "synthesizer",
                "The bull case survives the critique; position sizing should respect the cycle.",
            ))
            .build()?,
    );

    // Step 2: collaborators and the runner
    let store = Arc::new(InMemorySessionStore::new());
    let runner = Arc::new(PipelineRunner::new(
        roster,
        Arc::new(DemoMarket),
        store,
        PipelineConfig::default(),
    ));

    // Step 3: start the run and consume the event stream
    let thesis = Thesis::new("deep value shipping companies below NAV", Strategy::Value)
        .with_title("Deep value shipping");
    let mut stream = runner.start(thesis, Uuid::new_v4());

    while let Some(event) = stream.events.recv().await {
        info!(
            phase = ?event.phase,
            agent = event.agent.as_deref().unwrap_or("-"),
            "phase event"
        );
    }

    // Step 4: the final ranked result
    let run = stream.handle.await??;
    info!("✅ Run complete in {}ms", run.summary.duration_ms);
    for analyzed in &run.analyzed {
        info!(
            ticker = %analyzed.opportunity.ticker,
            score = ?analyzed.score,
            decision = ?analyzed.verdict.as_ref().map(|v| v.decision),
            "ranked opportunity"
        );
    }
    info!(
        top_pick = ?run.summary.top_pick,
        "aggregate verdict: {} ({}%)",
        run.summary.verdict.decision,
        run.summary.verdict.confidence
    );

    Ok(())
}
