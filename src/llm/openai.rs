// ABOUTME: OpenAI chat-completions adapter implementing the LanguageModel trait
// ABOUTME: Structured outputs via json_schema response format, with cost estimation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # OpenAI Adapter
//!
//! Implements [`LanguageModel`] against the OpenAI chat-completions API.
//! `parse` uses the `json_schema` response format so the model either
//! returns a schema-conformant document or the call fails; `format` is a
//! plain completion on the cheaper model. Costs are estimated from the
//! pricing table below and attached to every usage record.

use super::{ChatMessage, CostEstimate, LanguageModel, LlmCompletion, LlmUsage, OutputSchema, TokenUsage};
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Default chat-completions endpoint
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default model for structured extraction
const DEFAULT_PARSE_MODEL: &str = "gpt-4o-2024-08-06";
/// Default model for narration (cheap and fast)
const DEFAULT_FORMAT_MODEL: &str = "gpt-4o-mini";
/// Sampling temperature for narration
const FORMAT_TEMPERATURE: f32 = 0.2;

/// Per-million-token pricing, USD
mod pricing {
    /// (input, output) USD per million tokens by model
    pub const TABLE: &[(&str, f64, f64)] = &[
        ("gpt-4o-2024-08-06", 2.50, 10.00),
        ("gpt-4o", 2.50, 10.00),
        ("gpt-4o-mini", 0.15, 0.60),
    ];
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// ============================================================================
// Configuration & Provider
// ============================================================================

/// Configuration for the OpenAI adapter, injected at construction time
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API base URL
    pub base_url: String,
    /// API key
    pub api_key: String,
    /// Model used for structured extraction
    pub parse_model: String,
    /// Model used for narration
    pub format_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: String::new(),
            parse_model: DEFAULT_PARSE_MODEL.to_owned(),
            format_model: DEFAULT_FORMAT_MODEL.to_owned(),
        }
    }
}

/// OpenAI chat-completions provider
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a provider from explicit configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty.
    pub fn new(config: OpenAiConfig) -> AppResult<Self> {
        if config.api_key.is_empty() {
            return Err(AppError::config("OpenAI API key is not set"));
        }
        debug!(
            "initializing openai provider: base_url={}, parse_model={}, format_model={}",
            config.base_url, config.parse_model, config.format_model
        );
        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }

    fn api_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        temperature: Option<f32>,
        response_format: Option<ResponseFormat<'_>>,
    ) -> AppResult<(String, LlmUsage)> {
        let request = OpenAiRequest {
            model,
            messages: messages
                .into_iter()
                .map(|m| OpenAiMessage {
                    role: m.role.as_str(),
                    content: m.content,
                })
                .collect(),
            temperature,
            response_format,
        };

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("failed to send request to openai: {e}");
                AppError::external_service("openai", format!("failed to connect: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service("openai", format!("failed to read response: {e}"))
        })?;
        if !status.is_success() {
            error!("openai returned {status}: {body}");
            return Err(AppError::external_service(
                "openai",
                format!("API returned {status}"),
            ));
        }

        let parsed: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::external_service("openai", format!("failed to parse response: {e}"))
        })?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::external_service("openai", "response had no content"))?;

        let usage = parsed.usage.unwrap_or_default();
        Ok((content, estimate_usage(model, &usage)?))
    }
}

/// Attach cost estimates from the pricing table to raw token counts
fn estimate_usage(model: &str, usage: &OpenAiUsage) -> AppResult<LlmUsage> {
    let (_, input_rate, output_rate) = pricing::TABLE
        .iter()
        .find(|(name, _, _)| *name == model)
        .ok_or_else(|| AppError::config(format!("model {model} has no pricing entry")))?;

    let input = f64::from(usage.prompt_tokens) * (input_rate / 1_000_000.0);
    let output = f64::from(usage.completion_tokens) * (output_rate / 1_000_000.0);
    Ok(LlmUsage {
        tokens: TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        },
        cost: CostEstimate {
            currency: "USD".to_owned(),
            input,
            output,
            total: input + output,
        },
    })
}

#[async_trait]
impl LanguageModel for OpenAiProvider {
    async fn parse(
        &self,
        system_prompt: &str,
        user_text: &str,
        schema: &OutputSchema,
    ) -> AppResult<LlmCompletion<serde_json::Value>> {
        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_text),
        ];
        let response_format = ResponseFormat {
            format_type: "json_schema",
            json_schema: JsonSchemaFormat {
                name: &schema.name,
                strict: true,
                schema: &schema.schema,
            },
        };

        let (content, usage) = self
            .complete(&self.config.parse_model, messages, None, Some(response_format))
            .await?;
        let data = serde_json::from_str(&content).map_err(|e| {
            AppError::external_service("openai", format!("non-JSON structured output: {e}"))
        })?;
        Ok(LlmCompletion { data, usage })
    }

    async fn format(
        &self,
        system_prompt: &str,
        text: &str,
    ) -> AppResult<LlmCompletion<String>> {
        let messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(text)];
        let (content, usage) = self
            .complete(
                &self.config.format_model,
                messages,
                Some(FORMAT_TEMPERATURE),
                None,
            )
            .await?;
        Ok(LlmCompletion {
            data: content,
            usage,
        })
    }
}
