// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Reads every setting once at startup into typed config structs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Environment Configuration
//!
//! All deployment settings come from environment variables, read once by
//! [`ServerConfig::from_env`]. Required variables fail fast at startup;
//! optional ones have documented defaults.

use crate::llm::OpenAiConfig;
use anyhow::{Context, Result};
use std::env;

/// Default HTTP port for the webhook server
const DEFAULT_HTTP_PORT: u16 = 8081;
/// Default database location
const DEFAULT_DATABASE_URL: &str = "sqlite:data/healthbot.db";

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `sqlite:data/healthbot.db`
    pub url: String,
}

/// Telegram transport configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API token
    pub bot_token: String,
    /// Shared secret expected on webhook requests
    pub webhook_secret: String,
    /// Public webhook URL to register with the Bot API at startup, if any
    pub webhook_public_url: Option<String>,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port the webhook server binds to
    pub http_port: u16,
    /// Database settings
    pub database: DatabaseConfig,
    /// LLM adapter settings
    pub llm: OpenAiConfig,
    /// Telegram transport settings
    pub telegram: TelegramConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Required: `OPENAI_API_KEY`, `TELEGRAM_BOT_TOKEN`,
    /// `TELEGRAM_WEBHOOK_SECRET`.
    ///
    /// Optional: `HTTP_PORT` (default 8081), `DATABASE_URL`
    /// (default `sqlite:data/healthbot.db`), `OPENAI_BASE_URL`,
    /// `OPENAI_PARSE_MODEL`, `OPENAI_FORMAT_MODEL`, `TELEGRAM_WEBHOOK_URL`
    /// (when set, the webhook is registered at startup).
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self> {
        let http_port = match env::var("HTTP_PORT") {
            Ok(port) => port
                .parse()
                .with_context(|| format!("invalid HTTP_PORT: {port}"))?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        let mut llm = OpenAiConfig {
            api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            ..OpenAiConfig::default()
        };
        if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
            llm.base_url = base_url;
        }
        if let Ok(model) = env::var("OPENAI_PARSE_MODEL") {
            llm.parse_model = model;
        }
        if let Ok(model) = env::var("OPENAI_FORMAT_MODEL") {
            llm.format_model = model;
        }

        Ok(Self {
            http_port,
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned()),
            },
            llm,
            telegram: TelegramConfig {
                bot_token: env::var("TELEGRAM_BOT_TOKEN")
                    .context("TELEGRAM_BOT_TOKEN must be set")?,
                webhook_secret: env::var("TELEGRAM_WEBHOOK_SECRET")
                    .context("TELEGRAM_WEBHOOK_SECRET must be set")?,
                webhook_public_url: env::var("TELEGRAM_WEBHOOK_URL").ok(),
            },
        })
    }

    /// One-line startup summary safe for logs (no secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} database={} parse_model={} format_model={}",
            self.http_port, self.database.url, self.llm.parse_model, self.llm.format_model
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set_required_vars() {
        env::set_var("OPENAI_API_KEY", "sk-test");
        env::set_var("TELEGRAM_BOT_TOKEN", "123:abc");
        env::set_var("TELEGRAM_WEBHOOK_SECRET", "hook-secret");
    }

    fn clear_vars() {
        for var in [
            "OPENAI_API_KEY",
            "TELEGRAM_BOT_TOKEN",
            "TELEGRAM_WEBHOOK_SECRET",
            "HTTP_PORT",
            "DATABASE_URL",
            "OPENAI_PARSE_MODEL",
            "TELEGRAM_WEBHOOK_URL",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_applied() {
        clear_vars();
        set_required_vars();
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
        clear_vars();
    }

    #[test]
    #[serial]
    fn test_missing_required_var_fails() {
        clear_vars();
        env::set_var("TELEGRAM_BOT_TOKEN", "123:abc");
        env::set_var("TELEGRAM_WEBHOOK_SECRET", "hook-secret");
        assert!(ServerConfig::from_env().is_err());
        clear_vars();
    }

    #[test]
    #[serial]
    fn test_overrides_respected() {
        clear_vars();
        set_required_vars();
        env::set_var("HTTP_PORT", "9090");
        env::set_var("DATABASE_URL", "sqlite::memory:");
        env::set_var("OPENAI_PARSE_MODEL", "gpt-4o");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.llm.parse_model, "gpt-4o");
        clear_vars();
    }

    #[test]
    #[serial]
    fn test_summary_contains_no_secrets() {
        clear_vars();
        set_required_vars();
        let config = ServerConfig::from_env().unwrap();
        let summary = config.summary();
        assert!(!summary.contains("sk-test"));
        assert!(!summary.contains("hook-secret"));
        clear_vars();
    }
}
