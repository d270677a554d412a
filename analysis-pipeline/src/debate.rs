//! Debate facilitator - up to three conditional rounds between critics
//!
//! Round 1: the skeptic responds to the bull case. Round 2: the risk
//! officer synthesizes round 1 plus both original analyses. Round 3: the
//! debate synthesizer produces a cross-round summary. Rounds run strictly
//! in sequence because each prompt depends on the prior round's output.
//!
//! A round whose required inputs or collaborator are unavailable is
//! skipped entirely (no retry, no error record). Every referenced prior
//! text enters a prompt only as a bounded excerpt, so prompt size stays
//! bounded regardless of upstream verbosity.

use crate::config::PipelineConfig;
use common::{DebateEntry, DebateRound, Stage, StageError};
use research_agents::AgentRoster;
use std::sync::Arc;
use tracing::{debug, warn};

/// Inputs available for one opportunity's debate
#[derive(Debug, Clone, Copy, Default)]
pub struct DebateInputs<'a> {
    /// Bull case; in this pipeline the strategy analysis when present
    pub bull: Option<&'a str>,
    pub skeptic: Option<&'a str>,
    pub risk_officer: Option<&'a str>,
}

/// Runs the conditional debate rounds for one opportunity
pub struct DebateFacilitator {
    roster: Arc<AgentRoster>,
    excerpt_chars: usize,
}

impl DebateFacilitator {
    pub fn new(roster: Arc<AgentRoster>, config: &PipelineConfig) -> Self {
        Self {
            roster,
            excerpt_chars: config.debate_excerpt_chars,
        }
    }

    /// Run up to three rounds. A round failure records a debate-stage
    /// error and stops further rounds; skipped rounds record nothing.
    pub async fn run(
        &self,
        ticker: &str,
        inputs: DebateInputs<'_>,
    ) -> (Vec<DebateRound>, Vec<StageError>) {
        let mut rounds = Vec::new();
        let mut errors = Vec::new();

        // Round 1: skeptic responds to the bull case
        match (inputs.bull, inputs.skeptic) {
            (Some(bull), Some(skeptic_text)) => {
                let agent = self.roster.skeptic();
                let prompt = format!(
                    "Bull case for {}:\n{}\n\nYour prior critique:\n{}\n\n\
                     Respond directly to the bull case: which of its claims survive \
                     your critique and which do not?",
                    ticker,
                    self.excerpt(bull),
                    self.excerpt(skeptic_text),
                );
                match agent.generate(&prompt).await {
                    Ok(content) => rounds.push(DebateRound {
                        round: 1,
                        entries: vec![DebateEntry {
                            agent: agent.name().to_string(),
                            content,
                        }],
                    }),
                    Err(e) => {
                        warn!(ticker, error = %e, "debate round 1 failed");
                        errors.push(
                            StageError::new(Stage::Debate, format!("round 1: {}", e))
                                .with_agent(agent.name()),
                        );
                        return (rounds, errors);
                    }
                }
            }
            _ => debug!(ticker, "debate round 1 skipped, bull or skeptic input missing"),
        }

        // Round 2: risk officer synthesizes round 1 plus the originals
        if let Some(round_one) = rounds.first() {
            let agent = self.roster.risk_officer();
            let mut prompt = format!(
                "Debate round 1 for {}:\n{}\n",
                ticker,
                self.excerpt(&round_one.entries[0].content),
            );
            if let Some(bull) = inputs.bull {
                prompt.push_str(&format!("\nOriginal bull case:\n{}\n", self.excerpt(bull)));
            }
            if let Some(risk_text) = inputs.risk_officer {
                prompt.push_str(&format!(
                    "\nYour original risk assessment:\n{}\n",
                    self.excerpt(risk_text)
                ));
            }
            prompt.push_str(
                "\nSynthesize the exchange so far: what risks remain live and what has been \
                 adequately rebutted?",
            );
            match agent.generate(&prompt).await {
                Ok(content) => rounds.push(DebateRound {
                    round: 2,
                    entries: vec![DebateEntry {
                        agent: agent.name().to_string(),
                        content,
                    }],
                }),
                Err(e) => {
                    warn!(ticker, error = %e, "debate round 2 failed");
                    errors.push(
                        StageError::new(Stage::Debate, format!("round 2: {}", e))
                            .with_agent(agent.name()),
                    );
                    return (rounds, errors);
                }
            }
        } else {
            debug!(ticker, "debate round 2 skipped, no round 1 output");
        }

        // Round 3: cross-round summary, only when a synthesizer exists
        match (self.roster.debate_synthesizer(), rounds.is_empty()) {
            (Some(agent), false) => {
                let mut prompt = format!("Debate transcript for {}:\n", ticker);
                for round in &rounds {
                    for entry in &round.entries {
                        prompt.push_str(&format!(
                            "\n[round {} - {}]\n{}\n",
                            round.round,
                            entry.agent,
                            self.excerpt(&entry.content)
                        ));
                    }
                }
                prompt.push_str("\nProduce a final cross-round summary of the debate.");
                match agent.generate(&prompt).await {
                    Ok(content) => rounds.push(DebateRound {
                        round: 3,
                        entries: vec![DebateEntry {
                            agent: agent.name().to_string(),
                            content,
                        }],
                    }),
                    Err(e) => {
                        warn!(ticker, error = %e, "debate round 3 failed");
                        errors.push(
                            StageError::new(Stage::Debate, format!("round 3: {}", e))
                                .with_agent(agent.name()),
                        );
                    }
                }
            }
            _ => debug!(ticker, "debate round 3 skipped"),
        }

        (rounds, errors)
    }

    /// Char-boundary-safe bounded excerpt of prior content
    fn excerpt<'t>(&self, text: &'t str) -> &'t str {
        match text.char_indices().nth(self.excerpt_chars) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }
}
