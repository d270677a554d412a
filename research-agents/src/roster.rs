//! AgentRoster - the named collaborators one pipeline run depends on
//!
//! Built once and passed by reference into the runner and its stages, so
//! tests can substitute fakes without any global state.

use crate::generator::TextGenerator;
use anyhow::{anyhow, Result};
use common::Strategy;
use std::collections::HashMap;
use std::sync::Arc;

/// The full set of text-generation collaborators for a run.
///
/// Discovery, deep-research primary, both critics, and the verdict agent
/// are required; the research fallback, per-strategy analysts, and the
/// debate synthesizer are optional and their absence degrades gracefully.
pub struct AgentRoster {
    discovery: Arc<dyn TextGenerator>,
    research_primary: Arc<dyn TextGenerator>,
    research_fallback: Option<Arc<dyn TextGenerator>>,
    analysts: HashMap<Strategy, Arc<dyn TextGenerator>>,
    skeptic: Arc<dyn TextGenerator>,
    risk_officer: Arc<dyn TextGenerator>,
    verdict: Arc<dyn TextGenerator>,
    debate_synthesizer: Option<Arc<dyn TextGenerator>>,
}

impl AgentRoster {
    pub fn builder() -> RosterBuilder {
        RosterBuilder::default()
    }

    pub fn discovery(&self) -> &Arc<dyn TextGenerator> {
        &self.discovery
    }

    pub fn research_primary(&self) -> &Arc<dyn TextGenerator> {
        &self.research_primary
    }

    pub fn research_fallback(&self) -> Option<&Arc<dyn TextGenerator>> {
        self.research_fallback.as_ref()
    }

    /// Strategy-specific analyst, if one is registered for the tag.
    /// No analyst for a strategy (typically `general`) is not an error.
    pub fn analyst_for(&self, strategy: Strategy) -> Option<&Arc<dyn TextGenerator>> {
        self.analysts.get(&strategy)
    }

    pub fn skeptic(&self) -> &Arc<dyn TextGenerator> {
        &self.skeptic
    }

    pub fn risk_officer(&self) -> &Arc<dyn TextGenerator> {
        &self.risk_officer
    }

    pub fn verdict(&self) -> &Arc<dyn TextGenerator> {
        &self.verdict
    }

    pub fn debate_synthesizer(&self) -> Option<&Arc<dyn TextGenerator>> {
        self.debate_synthesizer.as_ref()
    }
}

/// Builder for `AgentRoster`
#[derive(Default)]
pub struct RosterBuilder {
    discovery: Option<Arc<dyn TextGenerator>>,
    research_primary: Option<Arc<dyn TextGenerator>>,
    research_fallback: Option<Arc<dyn TextGenerator>>,
    analysts: HashMap<Strategy, Arc<dyn TextGenerator>>,
    skeptic: Option<Arc<dyn TextGenerator>>,
    risk_officer: Option<Arc<dyn TextGenerator>>,
    verdict: Option<Arc<dyn TextGenerator>>,
    debate_synthesizer: Option<Arc<dyn TextGenerator>>,
}

impl RosterBuilder {
    pub fn discovery(mut self, agent: Arc<dyn TextGenerator>) -> Self {
        self.discovery = Some(agent);
        self
    }

    pub fn research_primary(mut self, agent: Arc<dyn TextGenerator>) -> Self {
        self.research_primary = Some(agent);
        self
    }

    pub fn research_fallback(mut self, agent: Arc<dyn TextGenerator>) -> Self {
        self.research_fallback = Some(agent);
        self
    }

    pub fn analyst(mut self, strategy: Strategy, agent: Arc<dyn TextGenerator>) -> Self {
        self.analysts.insert(strategy, agent);
        self
    }

    pub fn skeptic(mut self, agent: Arc<dyn TextGenerator>) -> Self {
        self.skeptic = Some(agent);
        self
    }

    pub fn risk_officer(mut self, agent: Arc<dyn TextGenerator>) -> Self {
        self.risk_officer = Some(agent);
        self
    }

    pub fn verdict(mut self, agent: Arc<dyn TextGenerator>) -> Self {
        self.verdict = Some(agent);
        self
    }

    pub fn debate_synthesizer(mut self, agent: Arc<dyn TextGenerator>) -> Self {
        self.debate_synthesizer = Some(agent);
        self
    }

    pub fn build(self) -> Result<AgentRoster> {
        Ok(AgentRoster {
            discovery: self.discovery.ok_or_else(|| anyhow!("discovery agent is required"))?,
            research_primary: self
                .research_primary
                .ok_or_else(|| anyhow!("research primary agent is required"))?,
            research_fallback: self.research_fallback,
            analysts: self.analysts,
            skeptic: self.skeptic.ok_or_else(|| anyhow!("skeptic agent is required"))?,
            risk_officer: self
                .risk_officer
                .ok_or_else(|| anyhow!("risk officer agent is required"))?,
            verdict: self.verdict.ok_or_else(|| anyhow!("verdict agent is required"))?,
            debate_synthesizer: self.debate_synthesizer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Canned(&'static str);

    #[async_trait]
    impl TextGenerator for Canned {
        fn name(&self) -> &str {
            self.0
        }

        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    fn agent(name: &'static str) -> Arc<dyn TextGenerator> {
        Arc::new(Canned(name))
    }

    #[test]
    fn test_builder_requires_core_agents() {
        let err = AgentRoster::builder().build();
        assert!(err.is_err());
    }

    #[test]
    fn test_analyst_lookup_is_optional() {
        let roster = AgentRoster::builder()
            .discovery(agent("discovery"))
            .research_primary(agent("deep-research"))
            .skeptic(agent("skeptic"))
            .risk_officer(agent("risk-officer"))
            .verdict(agent("verdict"))
            .analyst(Strategy::Value, agent("value-analyst"))
            .build()
            .unwrap();

        assert!(roster.analyst_for(Strategy::Value).is_some());
        assert!(roster.analyst_for(Strategy::General).is_none());
        assert!(roster.research_fallback().is_none());
    }
}
