use std::future::Future;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_LIGHT_MODEL: &str = "claude-3-5-haiku-20241022";
const DEFAULT_HEAVY_MODEL: &str = "claude-sonnet-4-20250514";

/// Errors raised while invoking the completion service
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("failed to reach completion service: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion service error: {status} - {body}")]
    Api { status: u16, body: String },
    #[error("no text content in completion response")]
    EmptyCompletion,
}

/// Which model tier a stage asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Cheap model for light restructuring
    Lightweight,
    /// Strong model for code and test generation
    HighCapability,
}

/// Sampling parameters for a single completion
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub tier: ModelTier,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: Option<f64>,
}

impl GenerationParams {
    /// Story restructuring: light model, near-deterministic
    pub fn normalizer() -> Self {
        Self {
            tier: ModelTier::Lightweight,
            max_tokens: 2000,
            temperature: 0.1,
            top_p: None,
        }
    }

    pub fn code_generation() -> Self {
        Self {
            tier: ModelTier::HighCapability,
            max_tokens: 8000,
            temperature: 0.1,
            top_p: Some(0.9),
        }
    }

    /// Slightly warmer than code generation for scenario variety
    pub fn bdd_generation() -> Self {
        Self {
            tier: ModelTier::HighCapability,
            max_tokens: 6000,
            temperature: 0.2,
            top_p: Some(0.9),
        }
    }
}

/// A text-completion service: prompt in, trimmed completion text out
pub trait CompletionClient {
    fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// Configuration for the Anthropic Messages API client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    pub base_url: String,
    /// Model used for [`ModelTier::Lightweight`]
    pub light_model: String,
    /// Model used for [`ModelTier::HighCapability`]
    pub heavy_model: String,
}

impl LlmConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;

        Ok(Self {
            api_key,
            base_url: env_or("STORYFORGE_LLM_BASE_URL", DEFAULT_BASE_URL),
            light_model: env_or("STORYFORGE_LIGHT_MODEL", DEFAULT_LIGHT_MODEL),
            heavy_model: env_or("STORYFORGE_HEAVY_MODEL", DEFAULT_HEAVY_MODEL),
        })
    }

    /// Create with the default endpoint and models
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            light_model: DEFAULT_LIGHT_MODEL.to_string(),
            heavy_model: DEFAULT_HEAVY_MODEL.to_string(),
        }
    }

    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Lightweight => &self.light_model,
            ModelTier::HighCapability => &self.heavy_model,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    config: LlmConfig,
}

impl AnthropicClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }
}

impl CompletionClient for AnthropicClient {
    /// Send the prompt as a single user message and return the first text block, trimmed
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        let request = MessagesRequest {
            model: self.config.model_for(params.tier).to_string(),
            max_tokens: params.max_tokens,
            temperature: Some(params.temperature),
            top_p: params.top_p,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        debug!(
            "Calling {} ({} prompt chars, max_tokens={})",
            request.model,
            prompt.chars().count(),
            request.max_tokens
        );

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let response: MessagesResponse = response.json().await?;
        extract_text(&response)
    }
}

/// First text content block of a response, trimmed
fn extract_text(response: &MessagesResponse) -> Result<String, LlmError> {
    response
        .content
        .first()
        .filter(|c| c.content_type == "text")
        .map(|c| c.text.trim().to_string())
        .ok_or(LlmError::EmptyCompletion)
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_params() {
        let normalizer = GenerationParams::normalizer();
        assert_eq!(normalizer.tier, ModelTier::Lightweight);
        assert_eq!(normalizer.max_tokens, 2000);
        assert_eq!(normalizer.top_p, None);

        let code = GenerationParams::code_generation();
        assert_eq!(code.tier, ModelTier::HighCapability);
        assert_eq!(code.max_tokens, 8000);
        assert_eq!(code.temperature, 0.1);

        let bdd = GenerationParams::bdd_generation();
        assert_eq!(bdd.max_tokens, 6000);
        assert_eq!(bdd.temperature, 0.2);
    }

    #[test]
    fn test_extract_first_text_block() {
        let json = r#"{"content": [{"type": "text", "text": "  Feature: Login\n "}, {"type": "text", "text": "ignored"}]}"#;
        let response: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_text(&response).unwrap(), "Feature: Login");
    }

    #[test]
    fn test_extract_rejects_missing_text() {
        let response: MessagesResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(matches!(extract_text(&response), Err(LlmError::EmptyCompletion)));

        let json = r#"{"content": [{"type": "tool_use", "name": "x"}]}"#;
        let response: MessagesResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(extract_text(&response), Err(LlmError::EmptyCompletion)));
    }

    #[test]
    fn test_request_omits_unset_top_p() {
        let request = MessagesRequest {
            model: "m".to_string(),
            max_tokens: 10,
            temperature: Some(0.1),
            top_p: None,
            messages: vec![],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("top_p").is_none());
        assert_eq!(value["max_tokens"], 10);
    }

    #[test]
    fn test_model_for_tier() {
        let config = LlmConfig::new("key".to_string());
        assert_eq!(config.model_for(ModelTier::Lightweight), DEFAULT_LIGHT_MODEL);
        assert_eq!(config.model_for(ModelTier::HighCapability), DEFAULT_HEAVY_MODEL);
    }
}
