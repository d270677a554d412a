//! The TextGenerator trait - the single seam to text-generation providers
//!
//! No structured output is assumed anywhere: providers return free text,
//! and all structure is recovered downstream by the extractor and the
//! verdict parser.

use async_trait::async_trait;

/// Narrow interface to a text-generation provider.
///
/// The pipeline depends only on this trait; one implementation exists per
/// provider. Implementations may fail for arbitrary transport reasons,
/// which the pipeline converts into stage-level error records.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Name of this agent, used in phase events and error records
    fn name(&self) -> &str;

    /// Generate a free-text response to the prompt
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
