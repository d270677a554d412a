//! Pipeline configuration

use serde::{Deserialize, Serialize};

/// Configuration for one pipeline instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum opportunity drafts kept by the extractor
    pub max_extracted: usize,

    /// Maximum opportunities the discovery stage hands to analysis
    pub max_opportunities: usize,

    /// Opportunities analyzed concurrently; batches run sequentially to
    /// respect provider rate limits
    pub batch_size: usize,

    /// Total bounded wait on the primary deep-research provider before
    /// the fallback is tried
    pub research_timeout_secs: u64,

    /// Interval between progress checks while waiting on deep research
    pub research_poll_secs: u64,

    /// Maximum characters of any referenced prior text included in a
    /// debate prompt
    pub debate_excerpt_chars: usize,

    /// Run the debate rounds after critique
    pub enable_debate: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_extracted: 5,
            max_opportunities: 3,
            batch_size: 3,
            research_timeout_secs: 120,
            research_poll_secs: 5,
            debate_excerpt_chars: 1200,
            enable_debate: true,
        }
    }
}
