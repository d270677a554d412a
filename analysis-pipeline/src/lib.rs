//! Analysis Pipeline - the orchestration core of the thesis research system
//!
//! Turns a free-text investment hypothesis into a ranked set of researched,
//! critiqued, and adjudicated opportunities. This crate owns:
//! - Extraction of structured opportunities from free agent text
//! - Concurrent metric enrichment from a market-data collaborator
//! - The discovery stage (one agent call, ranked and capped output)
//! - The per-opportunity analyzer (research -> strategy -> critique -> verdict)
//! - The debate facilitator (up to three conditional rounds)
//! - Verdict parsing and run-level aggregation
//! - The streamed phase-event protocol and the top-level runner

pub mod analyzer;
pub mod config;
pub mod debate;
pub mod discovery;
pub mod enrich;
pub mod extract;
pub mod market;
pub mod progress;
pub mod runner;
pub mod store;
pub mod verdict;

// Re-export commonly used types
pub use analyzer::OpportunityAnalyzer;
pub use config::PipelineConfig;
pub use debate::{DebateFacilitator, DebateInputs};
pub use discovery::DiscoveryStage;
pub use enrich::Enricher;
pub use extract::Extractor;
pub use market::{KeyMetrics, MarketData, PriceSnapshot};
pub use progress::ProgressSender;
pub use runner::{PipelineRunner, PipelineStream};
pub use store::{InMemorySessionStore, SessionStore};
pub use verdict::VerdictParser;
