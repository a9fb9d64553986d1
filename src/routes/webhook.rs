// ABOUTME: Telegram webhook handler - resolves the user and runs the pipeline
// ABOUTME: Creates users on first contact and delivers reply plus side messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Telegram Webhook
//!
//! `POST /webhook?token=<secret>`: authenticates the shared secret, resolves
//! (or creates) the user from the sender identity, runs the message pipeline,
//! and delivers the reply and any additional messages. The handler always
//! answers 200 for authenticated requests so Telegram does not re-deliver
//! updates whose processing failed; failures are logged and the user has
//! already received the apology reply from the pipeline.

use crate::models::{TelegramIdentity, User};
use crate::pipeline::{process_message, ProcessMessageParams};
use crate::resources::ServerResources;
use crate::storage::StorageProvider;
use crate::telegram::{TelegramMessage, TelegramUpdate};
use crate::timeutil::parse_timezone;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use chrono_tz::Tz;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Query parameters on the webhook URL
#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    /// Shared secret configured at webhook registration
    pub token: Option<String>,
}

/// Handle one Telegram update
pub async fn telegram_webhook(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<WebhookQuery>,
    Json(update): Json<TelegramUpdate>,
) -> StatusCode {
    if query.token.as_deref() != Some(resources.config.telegram.webhook_secret.as_str()) {
        warn!("webhook called with a bad or missing token");
        return StatusCode::UNAUTHORIZED;
    }

    let Some(message) = update.message else {
        return StatusCode::OK;
    };
    if let Err(status) = handle_message(&resources, message).await {
        return status;
    }
    StatusCode::OK
}

async fn handle_message(
    resources: &ServerResources,
    message: TelegramMessage,
) -> Result<(), StatusCode> {
    // Ignore updates without a sender or text (stickers, channel posts, ...)
    let (Some(sender), Some(text)) = (message.from, message.text) else {
        return Ok(());
    };

    let user = resolve_user(resources, &sender).await.map_err(|e| {
        warn!("failed to resolve user for telegram id {}: {e}", sender.id);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let params = ProcessMessageParams {
        user_id: user.id,
        input_text: text,
        user_tz: resolve_timezone(user.timezone.as_deref()),
        now: Utc::now(),
    };
    let result = process_message(&resources.database, resources.llm.as_ref(), &params).await;
    info!(
        user_id = %user.id,
        is_error = result.is_error,
        actions = result.actions_taken.len(),
        "processed message"
    );

    let chat_id = message.chat.id;
    if let Err(e) = resources.telegram.send_message(chat_id, &result.message).await {
        warn!("failed to deliver reply to chat {chat_id}: {e}");
    }
    for additional in &result.additional_messages {
        if let Err(e) = resources.telegram.send_message(chat_id, additional).await {
            warn!("failed to deliver additional message to chat {chat_id}: {e}");
        }
    }
    Ok(())
}

/// Find the sender's user record, creating one on first contact
async fn resolve_user(
    resources: &ServerResources,
    sender: &crate::telegram::TelegramSender,
) -> anyhow::Result<User> {
    if let Some(user) = resources
        .database
        .get_user_by_telegram_id(sender.id)
        .await?
    {
        return Ok(user);
    }

    let user = User::new(TelegramIdentity {
        user_id: sender.id,
        first_name: sender.first_name.clone(),
        last_name: sender.last_name.clone(),
        username: sender.username.clone(),
    });
    resources.database.create_user(&user).await?;
    info!(user_id = %user.id, telegram_id = sender.id, "created user on first contact");
    Ok(user)
}

/// Parse the stored timezone, falling back to UTC before onboarding
fn resolve_timezone(timezone: Option<&str>) -> Tz {
    timezone
        .and_then(parse_timezone)
        .unwrap_or(chrono_tz::UTC)
}
