//! Market-data collaborator boundary
//!
//! Lookups may fail independently per ticker; the enricher converts
//! failures into absent fields, never into errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Latest price for a ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub price: f64,
    /// Percent change over the prior session
    pub change_pct: f64,
}

/// Key valuation metrics for a ticker; providers rarely have all of them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub pe: Option<f64>,
    pub ev_ebitda: Option<f64>,
    pub debt_equity: Option<f64>,
    pub fcf_yield: Option<f64>,
    pub market_cap: Option<f64>,
}

/// Trait for market-data providers
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn price_snapshot(&self, ticker: &str) -> anyhow::Result<PriceSnapshot>;

    async fn key_metrics(&self, ticker: &str) -> anyhow::Result<KeyMetrics>;
}
