//! Extractor - turns discovery-agent free text into opportunity drafts
//!
//! The discovery agent is asked to emit one block per opportunity:
//!
//! ```text
//! [TICKER] Company Name | Score: 87
//! Thesis: one-sentence strategy-specific thesis
//! Metrics: pe=6.2, fcf_yield=0.18
//! Risk: low
//! ```
//!
//! The `Metrics:` line is optional. If the strict template yields zero
//! matches, a looser single-line fallback applies (`TICKER - trailing
//! text`, optional brackets), assigning score 50 and medium risk. The
//! two-tier behavior is deliberately preserved as-is; parsing misses are
//! low-confidence defaults, never errors.

use common::{Opportunity, RiskLevel, Strategy};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

lazy_static! {
    static ref STRICT_RE: Regex = Regex::new(
        r"(?m)^\[(?P<ticker>[A-Z][A-Z0-9.\-]{0,9})\]\s*(?P<name>[^|\r\n]+?)\s*\|\s*Score:\s*(?P<score>\d+)\s*\r?\n\s*Thesis:\s*(?P<thesis>[^\r\n]+?)\s*\r?\n(?:\s*Metrics:\s*(?P<metrics>[^\r\n]+?)\s*\r?\n)?\s*Risk:\s*(?P<risk>(?i:low|medium|high))\b"
    )
    .unwrap();
    static ref LOOSE_RE: Regex = Regex::new(
        r"(?m)^\s*(?:\d+[.)]\s*)?\[?(?P<ticker>[A-Z][A-Z0-9.\-]{1,9})\]?\s*[:\-]\s+(?P<rest>\S.*?)\s*$"
    )
    .unwrap();
}

/// Pure text-to-structure extraction for discovery output
#[derive(Debug, Clone)]
pub struct Extractor {
    /// Maximum drafts returned, applied after sorting by score
    max_drafts: usize,
}

impl Extractor {
    pub fn new(max_drafts: usize) -> Self {
        Self { max_drafts }
    }

    /// Extract opportunity drafts from one block of agent text.
    ///
    /// Returns drafts sorted by score descending (stable), unique by
    /// ticker, truncated to the configured maximum. Never fails: text
    /// that matches neither template yields an empty list.
    pub fn extract(&self, text: &str, _strategy: Strategy) -> Vec<Opportunity> {
        let mut drafts = self.extract_strict(text);

        if drafts.is_empty() {
            debug!("strict template yielded nothing, trying loose fallback");
            drafts = self.extract_loose(text);
        }

        // Stable sort keeps first-seen order among equal scores, so the
        // dedup below keeps the highest-scoring entry per ticker.
        drafts.sort_by(|a, b| b.alignment_score.cmp(&a.alignment_score));

        let mut seen = HashSet::new();
        drafts.retain(|d| seen.insert(d.ticker.clone()));
        drafts.truncate(self.max_drafts);
        drafts
    }

    fn extract_strict(&self, text: &str) -> Vec<Opportunity> {
        STRICT_RE
            .captures_iter(text)
            .map(|caps| {
                let score = caps["score"].parse::<u32>().map(|v| v.min(100)).unwrap_or(50) as u8;
                let risk = caps["risk"].parse().unwrap_or(RiskLevel::Medium);
                let metrics = caps
                    .name("metrics")
                    .map(|m| parse_metrics(m.as_str()))
                    .unwrap_or_default();

                Opportunity {
                    ticker: caps["ticker"].to_string(),
                    company: caps["name"].trim().to_string(),
                    thesis: caps["thesis"].trim().to_string(),
                    alignment_score: score,
                    risk,
                    metrics,
                }
            })
            .collect()
    }

    fn extract_loose(&self, text: &str) -> Vec<Opportunity> {
        LOOSE_RE
            .captures_iter(text)
            .map(|caps| Opportunity {
                ticker: caps["ticker"].to_string(),
                company: caps["ticker"].to_string(),
                thesis: caps["rest"].trim().to_string(),
                alignment_score: 50,
                risk: RiskLevel::Medium,
                metrics: HashMap::new(),
            })
            .collect()
    }
}

/// Parse a `key=value, key=value` metrics line; malformed pairs are
/// skipped rather than raising an error
fn parse_metrics(line: &str) -> HashMap<String, f64> {
    let mut metrics = HashMap::new();
    for pair in line.split(',') {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().map(str::trim).unwrap_or_default();
        let value = parts.next().map(str::trim);
        if key.is_empty() {
            continue;
        }
        if let Some(Ok(value)) = value.map(str::parse::<f64>) {
            metrics.insert(key.to_lowercase(), value);
        } else {
            debug!(pair = %pair.trim(), "skipping malformed metric pair");
        }
    }
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRICT_TEXT: &str = "\
Here are my picks:

[SBLK] Star Bulk Carriers | Score: 87
Thesis: trades well below net asset value with improving dry bulk rates
Metrics: pe=5.2, fcf_yield=0.21
Risk: medium

[GSL] Global Ship Lease | Score: 74
Thesis: long charters lock in cash flow through the cycle
Risk: low
";

    #[test]
    fn test_strict_extraction() {
        let extractor = Extractor::new(5);
        let drafts = extractor.extract(STRICT_TEXT, Strategy::Value);

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].ticker, "SBLK");
        assert_eq!(drafts[0].company, "Star Bulk Carriers");
        assert_eq!(drafts[0].alignment_score, 87);
        assert_eq!(drafts[0].risk, RiskLevel::Medium);
        assert_eq!(drafts[0].metrics.get("pe"), Some(&5.2));
        assert_eq!(drafts[0].metrics.get("fcf_yield"), Some(&0.21));

        // Metrics line absent: tolerated, map empty
        assert_eq!(drafts[1].ticker, "GSL");
        assert!(drafts[1].metrics.is_empty());
        assert_eq!(drafts[1].risk, RiskLevel::Low);
    }

    #[test]
    fn test_sorted_by_score_descending() {
        let text = "\
[AAA] Low Co | Score: 40
Thesis: a
Risk: low
[BBB] High Co | Score: 90
Thesis: b
Risk: high
";
        let extractor = Extractor::new(5);
        let drafts = extractor.extract(text, Strategy::Value);
        assert_eq!(drafts[0].ticker, "BBB");
        assert_eq!(drafts[1].ticker, "AAA");
    }

    #[test]
    fn test_truncates_to_max() {
        let mut text = String::new();
        for i in 0..8 {
            text.push_str(&format!(
                "[TK{}] Company {} | Score: {}\nThesis: t\nRisk: low\n",
                i,
                i,
                50 + i
            ));
        }
        let extractor = Extractor::new(5);
        let drafts = extractor.extract(&text, Strategy::Value);
        assert_eq!(drafts.len(), 5);
        assert_eq!(drafts[0].alignment_score, 57);
    }

    #[test]
    fn test_duplicate_tickers_keep_highest() {
        let text = "\
[DUP] First Co | Score: 60
Thesis: a
Risk: low
[DUP] Second Co | Score: 80
Thesis: b
Risk: high
";
        let extractor = Extractor::new(5);
        let drafts = extractor.extract(text, Strategy::Value);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].alignment_score, 80);
    }

    #[test]
    fn test_loose_fallback() {
        let text = "\
Top candidates:
1. [FRO] - crude tanker rates are inflecting upward
2. STNG: product tanker fleet trading below NAV
";
        let extractor = Extractor::new(5);
        let drafts = extractor.extract(text, Strategy::Value);

        assert_eq!(drafts.len(), 2);
        for draft in &drafts {
            assert_eq!(draft.alignment_score, 50);
            assert_eq!(draft.risk, RiskLevel::Medium);
            assert!(draft.metrics.is_empty());
        }
        let tickers: Vec<&str> = drafts.iter().map(|d| d.ticker.as_str()).collect();
        assert!(tickers.contains(&"FRO"));
        assert!(tickers.contains(&"STNG"));
    }

    #[test]
    fn test_no_match_yields_empty() {
        let extractor = Extractor::new(5);
        let drafts = extractor.extract("nothing structured here at all", Strategy::General);
        assert!(drafts.is_empty());
    }

    #[test]
    fn test_malformed_metric_pairs_skipped() {
        let metrics = parse_metrics("pe=6.1, garbage, ev_ebitda=abc, fcf_yield=0.12");
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics.get("pe"), Some(&6.1));
        assert_eq!(metrics.get("fcf_yield"), Some(&0.12));
    }

    #[test]
    fn test_score_clamped_to_100() {
        let text = "[BIG] Big Co | Score: 250\nThesis: t\nRisk: low\n";
        let extractor = Extractor::new(5);
        let drafts = extractor.extract(text, Strategy::Value);
        assert_eq!(drafts[0].alignment_score, 100);
    }
}
