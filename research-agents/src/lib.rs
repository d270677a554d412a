//! Research Agents - text-generation collaborators for the thesis pipeline
//!
//! This crate provides the boundary to the underlying text-generation
//! providers. It includes:
//! - The `TextGenerator` trait: one narrow interface, prompt in, text out
//! - An Anthropic-backed provider with bounded retries
//! - The `AgentRoster` collecting the named agents the pipeline needs
//!   (discovery, deep research, strategy analysts, critics, verdict,
//!   debate synthesizer)

pub mod anthropic;
pub mod generator;
pub mod roster;

// Re-export commonly used types
pub use anthropic::{AnthropicConfig, AnthropicGenerator};
pub use generator::TextGenerator;
pub use roster::{AgentRoster, RosterBuilder};
