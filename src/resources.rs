// ABOUTME: Dependency bundle wiring storage, LLM, and transport into the routes
// ABOUTME: Constructed once in the binary and shared behind an Arc
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Server Resources
//!
//! One-stop dependency container: every external collaborator is constructed
//! once at startup from explicit configuration and handed to the HTTP layer
//! behind an `Arc`. No handler constructs its own collaborators.

use crate::config::ServerConfig;
use crate::llm::LanguageModel;
use crate::storage::Database;
use crate::telegram::TelegramClient;
use std::sync::Arc;

/// Shared dependencies for the webhook server
pub struct ServerResources {
    /// Storage backend
    pub database: Database,
    /// Hosted language model adapter
    pub llm: Arc<dyn LanguageModel>,
    /// Outbound chat transport
    pub telegram: TelegramClient,
    /// Startup configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Bundle the collaborators
    #[must_use]
    pub fn new(
        database: Database,
        llm: Arc<dyn LanguageModel>,
        telegram: TelegramClient,
        config: ServerConfig,
    ) -> Self {
        Self {
            database,
            llm,
            telegram,
            config,
        }
    }
}
