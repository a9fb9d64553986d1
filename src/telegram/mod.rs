// ABOUTME: Telegram chat transport - webhook payload types and outbound client
// ABOUTME: Delivers reply text blocks to a conversation via the Bot API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Telegram Transport
//!
//! The chat platform is an opaque collaborator: inbound delivery provides a
//! sender id, a chat id, and raw text via webhook; outbound delivery sends
//! one or more text blocks to a chat id. Messages are sent with HTML parse
//! mode to match the formatting fragments.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Telegram Bot API base URL
const API_BASE_URL: &str = "https://api.telegram.org";

// ============================================================================
// Webhook payload types
// ============================================================================

/// Message sender as delivered by the webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSender {
    /// Numeric user id
    pub id: i64,
    /// First name if present
    pub first_name: Option<String>,
    /// Last name if present
    pub last_name: Option<String>,
    /// Username if present
    pub username: Option<String>,
}

/// Conversation the message arrived in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    /// Numeric chat id
    pub id: i64,
}

/// One inbound message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    /// Message id within the chat
    pub message_id: i64,
    /// Sender; absent for channel posts
    pub from: Option<TelegramSender>,
    /// Conversation
    pub chat: TelegramChat,
    /// Raw text; absent for stickers, photos, etc.
    pub text: Option<String>,
}

/// Webhook update envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUpdate {
    /// Monotonic update id
    pub update_id: i64,
    /// The message, when this update carries one
    pub message: Option<TelegramMessage>,
}

// ============================================================================
// Outbound client
// ============================================================================

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Serialize)]
struct SetWebhookPayload<'a> {
    url: &'a str,
}

/// Outbound Telegram Bot API client
///
/// The bot token is injected at construction time; nothing reads the
/// environment at call sites.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramClient {
    /// Create a client with the given bot token
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty.
    pub fn new(bot_token: impl Into<String>) -> AppResult<Self> {
        let bot_token = bot_token.into();
        if bot_token.is_empty() {
            return Err(AppError::config("Telegram bot token is not set"));
        }
        Ok(Self {
            bot_token,
            client: reqwest::Client::new(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{API_BASE_URL}/bot{}/{method}", self.bot_token)
    }

    /// Deliver one text block to a chat (HTML parse mode)
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or returns a non-success
    /// status.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> AppResult<()> {
        debug!(chat_id, chars = text.len(), "sending telegram message");
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessagePayload {
                chat_id,
                text,
                parse_mode: "HTML",
            })
            .send()
            .await
            .map_err(|e| AppError::external_service("telegram", format!("send failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("telegram sendMessage returned {status}: {body}");
            return Err(AppError::external_service(
                "telegram",
                format!("sendMessage returned {status}"),
            ));
        }
        Ok(())
    }

    /// Register the webhook URL with the Bot API
    ///
    /// # Errors
    ///
    /// Returns an error if registration fails.
    pub async fn register_webhook(&self, url: &str) -> AppResult<()> {
        let response = self
            .client
            .post(self.method_url("setWebhook"))
            .json(&SetWebhookPayload { url })
            .send()
            .await
            .map_err(|e| {
                AppError::external_service("telegram", format!("setWebhook failed: {e}"))
            })?;
        if !response.status().is_success() {
            return Err(AppError::external_service(
                "telegram",
                format!("setWebhook returned {}", response.status()),
            ));
        }
        Ok(())
    }
}
