//! Anthropic-backed TextGenerator
//!
//! Thin messages-API client: one prompt in, the first text block of the
//! response out. Retries rate limits and timeouts with a linear backoff.

use crate::generator::TextGenerator;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Configuration for one Anthropic-backed agent
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// Agent name surfaced in phase events and error records
    pub name: String,
    pub api_key: String,
    pub model: String,
    /// System prompt establishing the agent's role
    pub system_prompt: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub max_retries: u32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            name: "anthropic".to_string(),
            api_key: String::new(),
            model: "claude-sonnet-4-20250514".to_string(),
            system_prompt: String::new(),
            max_tokens: 2048,
            timeout_ms: 60_000,
            max_retries: 2,
        }
    }
}

/// TextGenerator backed by the Anthropic messages API
pub struct AnthropicGenerator {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicGenerator {
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("failed to build http client")?;

        Ok(Self { config, client })
    }

    fn extract_text_content(body: &serde_json::Value) -> Result<String> {
        body.get("content")
            .and_then(|c| c.as_array())
            .and_then(|blocks| blocks.iter().find(|b| b["type"] == "text"))
            .and_then(|b| b["text"].as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("response contained no text block"))
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": self.config.system_prompt,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        });

        let mut attempt = 0u32;
        loop {
            let send_result = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", "2023-06-01")
                .header("content-type", "application/json")
                .json(&payload)
                .send()
                .await;

            match send_result {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        if status.as_u16() == 429 && attempt < self.config.max_retries {
                            attempt += 1;
                            warn!(agent = %self.config.name, attempt, "rate limited, retrying");
                            sleep(Duration::from_millis(250 * u64::from(attempt))).await;
                            continue;
                        }
                        return Err(anyhow!("api returned {}: {}", status, body));
                    }

                    let body: serde_json::Value = response
                        .json()
                        .await
                        .context("failed to decode response body")?;
                    return Self::extract_text_content(&body);
                }
                Err(e) => {
                    if attempt < self.config.max_retries {
                        attempt += 1;
                        warn!(agent = %self.config.name, attempt, error = %e, "request failed, retrying");
                        sleep(Duration::from_millis(250 * u64::from(attempt))).await;
                        continue;
                    }
                    return Err(anyhow!("request failed after {} retries: {}", attempt, e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_content() {
        let body = json!({
            "content": [
                { "type": "tool_use", "id": "x" },
                { "type": "text", "text": "DECISION: WATCH" }
            ]
        });
        let text = AnthropicGenerator::extract_text_content(&body).unwrap();
        assert_eq!(text, "DECISION: WATCH");
    }

    #[test]
    fn test_extract_text_content_missing() {
        let body = json!({ "content": [] });
        assert!(AnthropicGenerator::extract_text_content(&body).is_err());
    }
}
