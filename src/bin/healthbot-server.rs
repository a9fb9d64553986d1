// ABOUTME: Healthbot server binary - wires config, storage, LLM, and routes
// ABOUTME: Starts the axum webhook server that drives the message pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! Healthbot server entry point

use anyhow::Result;
use healthbot::config::ServerConfig;
use healthbot::llm::OpenAiProvider;
use healthbot::resources::ServerResources;
use healthbot::routes;
use healthbot::storage::{Database, StorageProvider};
use healthbot::telegram::TelegramClient;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    healthbot::logging::init_from_env();

    let config = ServerConfig::from_env()?;
    info!("starting healthbot: {}", config.summary());

    let database = Database::new(&config.database.url).await?;
    database.migrate().await?;
    info!("storage ready: {}", database.backend_info());

    let llm = OpenAiProvider::new(config.llm.clone())?;
    let telegram = TelegramClient::new(config.telegram.bot_token.clone())?;
    let resources = Arc::new(ServerResources::new(
        database,
        Arc::new(llm),
        telegram,
        config.clone(),
    ));

    if let Some(base) = &config.telegram.webhook_public_url {
        let url = format!("{base}?token={}", config.telegram.webhook_secret);
        resources.telegram.register_webhook(&url).await?;
        info!("registered telegram webhook");
    }

    let app = routes::router(resources);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
