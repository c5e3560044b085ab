use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use super::AnalysisBackend;
use crate::config::LlmConfig;
use crate::error::{ArbordocError, Result};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const INITIAL_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 16_000;

/// Anthropic Messages API backend with bounded internal retry
pub struct AnthropicBackend {
    config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                ArbordocError::Config(
                    "Anthropic API key not set (config llm.api_key or ANTHROPIC_API_KEY)"
                        .to_string(),
                )
            })?;

        Ok(Self {
            config: config.clone(),
            api_key,
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{}/v1/messages", base)
    }

    async fn call_api(&self, system_instruction: &str, payload: &str) -> CallResult {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": system_instruction,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        {
                            "type": "text",
                            "text": payload,
                        }
                    ]
                }
            ]
        });

        let response = match self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return CallResult::Transient(format!("request failed: {}", e)),
        };

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            let text = response.text().await.unwrap_or_default();
            return CallResult::Transient(format!("API error {}: {}", status, text));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return CallResult::Fatal(format!("API error {}: {}", status, text));
        }

        let data: serde_json::Value = match response.json().await {
            Ok(data) => data,
            Err(e) => return CallResult::Transient(format!("failed to parse response: {}", e)),
        };

        match data["content"][0]["text"].as_str() {
            Some(text) => CallResult::Ok(text.to_string()),
            None => CallResult::Fatal(format!("unexpected response shape: {}", data)),
        }
    }
}

enum CallResult {
    Ok(String),
    Transient(String),
    Fatal(String),
}

#[async_trait]
impl AnalysisBackend for AnthropicBackend {
    async fn generate(&self, system_instruction: &str, payload: &str) -> Result<String> {
        let mut backoff_ms = INITIAL_BACKOFF_MS;
        let attempts = self.config.max_retries + 1;

        for attempt in 1..=attempts {
            match self.call_api(system_instruction, payload).await {
                CallResult::Ok(text) => {
                    debug!("Anthropic call succeeded on attempt {}", attempt);
                    return Ok(text);
                }
                CallResult::Fatal(reason) => {
                    return Err(ArbordocError::Backend(reason));
                }
                CallResult::Transient(reason) => {
                    if attempt == attempts {
                        return Err(ArbordocError::Backend(format!(
                            "retry budget exhausted after {} attempts: {}",
                            attempts, reason
                        )));
                    }
                    warn!(
                        "Transient backend failure (attempt {}/{}): {}",
                        attempt, attempts, reason
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
                }
            }
        }

        unreachable!("retry loop returns on final attempt")
    }

    fn backend_name(&self) -> &str {
        "Anthropic"
    }
}
