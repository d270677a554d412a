//! Verdict parser and run-level aggregation
//!
//! The verdict agent is asked to respond with:
//!
//! ```text
//! DECISION: INVEST
//! CONFIDENCE: 72
//! RATIONALE: free text...
//! ```
//!
//! Parsing is anchored line matching; a miss is a low-confidence default
//! (watch / 50), never an error. Parsing is deterministic and idempotent.

use common::{AnalyzedOpportunity, Decision, RunSummary, Verdict};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref DECISION_RE: Regex =
        Regex::new(r"(?mi)^\s*DECISION:\s*(INVEST|PASS|WATCH)\b").unwrap();
    static ref CONFIDENCE_RE: Regex = Regex::new(r"(?mi)^\s*CONFIDENCE:\s*(\d{1,3})\s*%?").unwrap();
    static ref RATIONALE_RE: Regex = Regex::new(r"(?msi)^\s*RATIONALE:\s*(.+)\z").unwrap();
}

/// Parses verdict-agent free text into a structured verdict
#[derive(Debug, Clone, Default)]
pub struct VerdictParser;

impl VerdictParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a verdict from agent text, defaulting to watch / 50 on any
    /// template miss
    pub fn parse(&self, text: &str) -> Verdict {
        let decision = DECISION_RE
            .captures(text)
            .map(|caps| match caps[1].to_uppercase().as_str() {
                "INVEST" => Decision::Invest,
                "PASS" => Decision::Pass,
                _ => Decision::Watch,
            })
            .unwrap_or_else(|| {
                debug!("no decision token found, defaulting to watch");
                Decision::Watch
            });

        let confidence = CONFIDENCE_RE
            .captures(text)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .map(|v| v.min(100) as u8)
            .unwrap_or(50);

        let rationale = RATIONALE_RE
            .captures(text)
            .map(|caps| caps[1].trim().to_string())
            .unwrap_or_else(|| text.trim().to_string());

        Verdict {
            decision,
            confidence,
            rationale,
        }
    }

    /// Signed score: +confidence for invest, -confidence for pass, 0 for
    /// watch
    pub fn score(verdict: &Verdict) -> i32 {
        match verdict.decision {
            Decision::Invest => i32::from(verdict.confidence),
            Decision::Pass => -i32::from(verdict.confidence),
            Decision::Watch => 0,
        }
    }
}

/// Stable sort by score descending. Ties keep discovery order; entries
/// without a score (research failed) sort last.
pub fn rank(analyzed: &mut [AnalyzedOpportunity]) {
    analyzed.sort_by(|a, b| b.score.cmp(&a.score));
}

/// Tally decisions and derive the aggregate verdict from the top pick.
///
/// Opportunities without a verdict count as watch for the tallies only;
/// they are never scored. With nothing scored the aggregate defaults to
/// watch / 50.
pub fn summarize(analyzed: &[AnalyzedOpportunity], duration_ms: u64) -> RunSummary {
    let mut invest_count = 0;
    let mut pass_count = 0;
    let mut watch_count = 0;
    for item in analyzed {
        match item.summary_decision() {
            Decision::Invest => invest_count += 1,
            Decision::Pass => pass_count += 1,
            Decision::Watch => watch_count += 1,
        }
    }

    let top = analyzed.iter().find(|a| a.score.is_some());
    let top_pick = top.map(|a| a.opportunity.ticker.clone());
    let verdict = top
        .and_then(|a| a.verdict.clone())
        .unwrap_or_else(Verdict::watch_default);

    RunSummary {
        invest_count,
        pass_count,
        watch_count,
        top_pick,
        verdict,
        duration_ms,
    }
}
