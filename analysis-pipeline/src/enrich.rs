//! Enricher - merges externally-fetched metrics into opportunity drafts
//!
//! One price + key-metrics call-pair per opportunity, fetched
//! concurrently and unordered with respect to each other. A failed fetch
//! leaves that opportunity's prior fields intact; it never removes the
//! opportunity or aborts sibling fetches.

use crate::market::MarketData;
use common::Opportunity;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// Concurrent metric enrichment over a market-data collaborator
pub struct Enricher {
    market: Arc<dyn MarketData>,
}

impl Enricher {
    pub fn new(market: Arc<dyn MarketData>) -> Self {
        Self { market }
    }

    /// Enrich all drafts concurrently. Never fails; list order and length
    /// are preserved regardless of per-ticker fetch outcomes.
    pub async fn enrich(&self, opportunities: Vec<Opportunity>) -> Vec<Opportunity> {
        join_all(
            opportunities
                .into_iter()
                .map(|opp| self.enrich_one(opp)),
        )
        .await
    }

    async fn enrich_one(&self, mut opp: Opportunity) -> Opportunity {
        let (price, metrics) = tokio::join!(
            self.market.price_snapshot(&opp.ticker),
            self.market.key_metrics(&opp.ticker),
        );

        match price {
            Ok(snapshot) => {
                opp.metrics.insert("price".to_string(), snapshot.price);
                opp.metrics.insert("change_pct".to_string(), snapshot.change_pct);
            }
            Err(e) => warn!(ticker = %opp.ticker, error = %e, "price fetch failed"),
        }

        match metrics {
            Ok(km) => {
                let pairs = [
                    ("pe", km.pe),
                    ("ev_ebitda", km.ev_ebitda),
                    ("debt_equity", km.debt_equity),
                    ("fcf_yield", km.fcf_yield),
                    ("market_cap", km.market_cap),
                ];
                for (key, value) in pairs {
                    if let Some(value) = value {
                        opp.metrics.insert(key.to_string(), value);
                    }
                }
                debug!(ticker = %opp.ticker, "metrics merged");
            }
            Err(e) => warn!(ticker = %opp.ticker, error = %e, "metrics fetch failed"),
        }

        opp
    }
}
