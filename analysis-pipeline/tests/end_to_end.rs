//! End-to-end pipeline runs over scripted collaborators

use analysis_pipeline::{
    InMemorySessionStore, KeyMetrics, MarketData, PipelineConfig, PipelineRunner, PriceSnapshot,
};
use async_trait::async_trait;
use common::{Decision, Phase, PhaseEvent, Stage, Strategy, Thesis};
use research_agents::{AgentRoster, TextGenerator};
use std::sync::Arc;
use uuid::Uuid;

/// Agent that answers from a fixed script, failing when the prompt
/// mentions a poisoned ticker
struct Scripted {
    name: &'static str,
    response: &'static str,
    fail_on: Option<&'static str>,
    fail_always: bool,
}

impl Scripted {
    fn ok(name: &'static str, response: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            response,
            fail_on: None,
            fail_always: false,
        })
    }

    fn fail_on(name: &'static str, response: &'static str, ticker: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            response,
            fail_on: Some(ticker),
            fail_always: false,
        })
    }

    fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            response: "",
            fail_on: None,
            fail_always: true,
        })
    }
}

#[async_trait]
impl TextGenerator for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        if self.fail_always {
            anyhow::bail!("{} is down", self.name);
        }
        if let Some(ticker) = self.fail_on {
            if prompt.contains(ticker) {
                anyhow::bail!("{} failed for {}", self.name, ticker);
            }
        }
        Ok(self.response.to_string())
    }
}

/// Market data that fails for one ticker
struct PartialMarket {
    failing: &'static str,
}

#[async_trait]
impl MarketData for PartialMarket {
    async fn price_snapshot(&self, ticker: &str) -> anyhow::Result<PriceSnapshot> {
        if ticker == self.failing {
            anyhow::bail!("no quote for {}", ticker);
        }
        Ok(PriceSnapshot {
            price: 18.2,
            change_pct: 1.4,
        })
    }

    async fn key_metrics(&self, ticker: &str) -> anyhow::Result<KeyMetrics> {
        if ticker == self.failing {
            anyhow::bail!("no metrics for {}", ticker);
        }
        Ok(KeyMetrics {
            pe: Some(4.8),
            fcf_yield: Some(0.19),
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

async fn drain(mut events: tokio::sync::mpsc::Receiver<PhaseEvent>) -> Vec<PhaseEvent> {
    let mut collected = Vec::new();
    while let Some(event) = events.recv().await {
        collected.push(event);
    }
    collected
}

fn value_roster(
    discovery: Arc<Scripted>,
    research: Arc<Scripted>,
) -> Arc<AgentRoster> {
    Arc::new(
        AgentRoster::builder()
            .discovery(discovery)
            .research_primary(research)
            .analyst(Strategy::Value, Scripted::ok("value-analyst", "undervalued on every metric"))
            .skeptic(Scripted::ok("skeptic", "rates are cyclical"))
            .risk_officer(Scripted::ok("risk-officer", "watch the leverage"))
            .verdict(Scripted::ok(
                "verdict",
                "DECISION: INVEST\nCONFIDENCE: 72\nRATIONALE: discount plus catalysts",
            ))
            .debate_synthesizer(Scripted::ok("synthesizer", "the bull case survives"))
            .build()
            .unwrap(),
    )
}

#[tokio::test]
async fn test_value_scenario_with_partial_failures() {
    // Enrichment fails for GSL; research fails for GSL; SBLK completes
    // every stage and becomes the top pick.
    let roster = value_roster(
        Scripted::ok("discovery", DISCOVERY_TEXT),
        Scripted::fail_on("deep-research", "exhaustive report", "GSL"),
    );
    let store = Arc::new(InMemorySessionStore::new());
    let runner = Arc::new(PipelineRunner::new(
        roster,
        Arc::new(PartialMarket { failing: "GSL" }),
        store.clone(),
        PipelineConfig::default(),
    ));

    let session_id = Uuid::new_v4();
    let thesis = Thesis::new("deep value shipping co.", Strategy::Value);
    let stream = runner.start(thesis, session_id);

    let events = drain(stream.events).await;
    let run = stream.handle.await.unwrap().unwrap();

    // Both discovered opportunities are present
    assert_eq!(run.opportunities.len(), 2);
    assert_eq!(run.analyzed.len(), 2);

    // SBLK was enriched, GSL kept its prior fields
    let sblk_opp = run.opportunities.iter().find(|o| o.ticker == "SBLK").unwrap();
    assert_eq!(sblk_opp.metrics.get("price"), Some(&18.2));
    let gsl_opp = run.opportunities.iter().find(|o| o.ticker == "GSL").unwrap();
    assert!(gsl_opp.metrics.get("price").is_none());

    // GSL's research failed: no verdict, no score, error recorded, still listed
    let gsl = run
        .analyzed
        .iter()
        .find(|a| a.opportunity.ticker == "GSL")
        .unwrap();
    assert!(gsl.verdict.is_none());
    assert!(gsl.score.is_none());
    assert!(gsl.errors.iter().any(|e| e.stage == Stage::Research));

    // SBLK completed all stages and is the top pick
    let sblk = run
        .analyzed
        .iter()
        .find(|a| a.opportunity.ticker == "SBLK")
        .unwrap();
    assert_eq!(sblk.verdict.as_ref().unwrap().decision, Decision::Invest);
    assert_eq!(sblk.verdict.as_ref().unwrap().confidence, 72);
    assert_eq!(sblk.score, Some(72));
    assert!(!sblk.debate.is_empty());

    assert_eq!(run.summary.invest_count, 1);
    assert_eq!(run.summary.pass_count, 0);
    assert_eq!(run.summary.watch_count, 1);
    assert_eq!(run.summary.top_pick.as_deref(), Some("SBLK"));
    assert_eq!(run.summary.verdict.decision, Decision::Invest);

    // Ranked order: scored entry first
    assert_eq!(run.analyzed[0].opportunity.ticker, "SBLK");

    // Stream shape: starts with `starting`, ends with `complete`, no `error`
    assert_eq!(events.first().unwrap().phase, Phase::Starting);
    assert_eq!(events.last().unwrap().phase, Phase::Complete);
    assert!(events.iter().all(|e| e.phase != Phase::Error));
    let complete = events.last().unwrap();
    let summary_json: serde_json::Value =
        serde_json::from_str(complete.content.as_deref().unwrap()).unwrap();
    assert_eq!(summary_json["invest_count"], 1);

    // Store saw both touches
    assert_eq!(store.status(session_id).await.as_deref(), Some("completed"));
    assert!(store.completed_run(session_id).await.is_some());
}

#[tokio::test]
async fn test_discovery_outage_emits_single_error_and_no_complete() {
    let roster = value_roster(
        Scripted::failing("discovery"),
        Scripted::ok("deep-research", "report"),
    );
    let store = Arc::new(InMemorySessionStore::new());
    let runner = Arc::new(PipelineRunner::new(
        roster,
        Arc::new(PartialMarket { failing: "" }),
        store.clone(),
        PipelineConfig::default(),
    ));

    let session_id = Uuid::new_v4();
    let thesis = Thesis::new("anything", Strategy::Value);
    let stream = runner.start(thesis, session_id);

    let events = drain(stream.events).await;
    let result = stream.handle.await.unwrap();

    assert!(result.is_err());
    let error_events = events.iter().filter(|e| e.phase == Phase::Error).count();
    assert_eq!(error_events, 1);
    assert!(events.iter().all(|e| e.phase != Phase::Complete));

    // Session never reached completed
    assert_eq!(
        store.status(session_id).await.as_deref(),
        Some("researching")
    );
}

#[tokio::test]
async fn test_empty_discovery_completes_with_watch_default() {
    let roster = value_roster(
        Scripted::ok("discovery", "nothing matched any template"),
        Scripted::ok("deep-research", "report"),
    );
    let store = Arc::new(InMemorySessionStore::new());
    let runner = Arc::new(PipelineRunner::new(
        roster,
        Arc::new(PartialMarket { failing: "" }),
        store.clone(),
        PipelineConfig::default(),
    ));

    let session_id = Uuid::new_v4();
    let stream = runner.start(Thesis::new("no matches", Strategy::General), session_id);

    let events = drain(stream.events).await;
    let run = stream.handle.await.unwrap().unwrap();

    assert!(run.opportunities.is_empty());
    assert!(run.analyzed.is_empty());
    assert_eq!(run.summary.verdict.decision, Decision::Watch);
    assert_eq!(run.summary.verdict.confidence, 50);
    assert_eq!(run.summary.top_pick, None);
    assert_eq!(events.last().unwrap().phase, Phase::Complete);
}

#[tokio::test]
async fn test_phase_events_are_ordered_within_an_opportunity() {
    let roster = value_roster(
        Scripted::ok(
            "discovery",
            "[SBLK] Star Bulk | Score: 80\nThesis: cheap\nRisk: low\n",
        ),
        Scripted::ok("deep-research", "report"),
    );
    let runner = Arc::new(PipelineRunner::new(
        roster,
        Arc::new(PartialMarket { failing: "" }),
        Arc::new(InMemorySessionStore::new()),
        PipelineConfig::default(),
    ));

    let stream = runner.start(
        Thesis::new("one pick", Strategy::Value),
        Uuid::new_v4(),
    );
    let events = drain(stream.events).await;
    stream.handle.await.unwrap().unwrap();

    let phases: Vec<Phase> = events.iter().map(|e| e.phase).collect();
    assert_eq!(
        phases,
        vec![
            Phase::Starting,
            Phase::Researching,
            Phase::StrategyAnalysis,
            Phase::Critique,
            Phase::Verdict,
            Phase::Complete,
        ]
    );
}
