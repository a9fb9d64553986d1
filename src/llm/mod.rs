// ABOUTME: LLM service abstraction for structured extraction and narration
// ABOUTME: Defines the LanguageModel trait, chat message types, and usage records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # LLM Service Provider Interface
//!
//! The pipeline treats the hosted language model as a black box with two
//! operations: schema-constrained extraction ([`LanguageModel::parse`]) and
//! free-text narration ([`LanguageModel::format`]). Every call returns a
//! usage record with token counts and a monetary cost estimate computed by
//! the adapter from its pricing table; the core never computes pricing
//! itself, it only aggregates the records it receives. At most one attempt
//! is made per call per turn; failures abort the turn.

mod openai;
pub mod prompts;

pub use openai::{OpenAiConfig, OpenAiProvider};

use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
}

impl MessageRole {
    /// String representation for API calls
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

// ============================================================================
// Usage / Cost Records
// ============================================================================

/// Token usage statistics for one API call
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

/// Monetary cost estimate for one API call, keyed by currency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEstimate {
    /// ISO currency code, e.g. "USD"
    pub currency: String,
    /// Cost attributed to prompt tokens
    pub input: f64,
    /// Cost attributed to completion tokens
    pub output: f64,
    /// Input plus output
    pub total: f64,
}

/// Usage returned by the adapter for one call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmUsage {
    /// Token counts
    pub tokens: TokenUsage,
    /// Cost estimate from the adapter's pricing table
    pub cost: CostEstimate,
}

/// A titled usage record, one per external LLM call made during a turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageMetric {
    /// Which call this was, e.g. "Stage 1 Usage"
    pub title: String,
    /// Provider that produced the usage, e.g. "openai"
    pub provider: String,
    /// Token counts
    pub tokens: TokenUsage,
    /// Cost estimate
    pub cost: CostEstimate,
}

impl UsageMetric {
    /// Tag adapter usage with the call title
    #[must_use]
    pub fn from_usage(title: impl Into<String>, provider: impl Into<String>, usage: LlmUsage) -> Self {
        Self {
            title: title.into(),
            provider: provider.into(),
            tokens: usage.tokens,
            cost: usage.cost,
        }
    }
}

// ============================================================================
// Completion Types
// ============================================================================

/// Named JSON schema constraining a structured extraction call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSchema {
    /// Schema name sent to the API
    pub name: String,
    /// JSON Schema document
    pub schema: serde_json::Value,
}

/// Result of one LLM call: the payload plus its usage record
#[derive(Debug, Clone)]
pub struct LlmCompletion<T> {
    /// Schema-conformant payload (`parse`) or free text (`format`)
    pub data: T,
    /// Usage for this call
    pub usage: LlmUsage,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Contract for the hosted language model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Structured extraction: returns a payload conforming to `schema`
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the response does not
    /// conform to the schema.
    async fn parse(
        &self,
        system_prompt: &str,
        user_text: &str,
        schema: &OutputSchema,
    ) -> AppResult<LlmCompletion<serde_json::Value>>;

    /// Free-text narration
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    async fn format(&self, system_prompt: &str, text: &str)
        -> AppResult<LlmCompletion<String>>;
}

/// Run a structured extraction and deserialize the payload into `T`
///
/// # Errors
///
/// Returns an error if the call fails or the payload does not deserialize
/// into `T`.
pub async fn parse_into<T: DeserializeOwned>(
    llm: &dyn LanguageModel,
    system_prompt: &str,
    user_text: &str,
    schema: &OutputSchema,
) -> AppResult<LlmCompletion<T>> {
    let completion = llm.parse(system_prompt, user_text, schema).await?;
    let data = serde_json::from_value(completion.data).map_err(|e| {
        AppError::external_service("llm", format!("schema-nonconformant payload: {e}"))
    })?;
    Ok(LlmCompletion {
        data,
        usage: completion.usage,
    })
}
