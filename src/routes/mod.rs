// ABOUTME: Route module organization for the Healthbot HTTP endpoints
// ABOUTME: Composes the webhook and health routes over shared server resources
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # HTTP Routes
//!
//! The HTTP surface is deliberately small: the Telegram webhook and a health
//! probe. Everything else happens inside the pipeline.

/// Telegram webhook endpoint
pub mod webhook;

use crate::resources::ServerResources;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

/// Build the application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(webhook::telegram_webhook))
        .with_state(resources)
}

/// Liveness probe
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "healthbot",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
