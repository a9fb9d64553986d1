// ABOUTME: Main library entry point for the Healthbot assistant
// ABOUTME: Exposes the message pipeline, rollup engine, and external adapters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

#![deny(unsafe_code)]

//! # Healthbot
//!
//! A conversational health-tracking assistant: users send free-text messages
//! (meals, weights, activities, questions) over Telegram; the system
//! extracts structured facts with a two-stage LLM pipeline, persists them,
//! and replies with a natural-language summary.
//!
//! ## Architecture
//!
//! - **Pipeline**: stage-1 extraction to typed actions, concurrent dispatch,
//!   stage-2 narration
//! - **Intelligence**: BMR baseline estimation and the daily rollup engine
//! - **Units**: unit-safe quantities that refuse mismatched arithmetic
//! - **Storage**: pluggable persistence behind a provider trait
//! - **LLM / Telegram**: external collaborators behind explicit adapters
//!
//! ## Example
//!
//! ```rust,no_run
//! use healthbot::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("healthbot configured: {}", config.summary());
//!     Ok(())
//! }
//! ```

/// Configuration management
pub mod config;

/// Application constants: calendar math, BMR coefficients, canned texts
pub mod constants;

/// Unified error handling
pub mod errors;

/// Deterministic chat-text formatting fragments
pub mod formatters;

/// BMR estimation and the daily rollup engine
pub mod intelligence;

/// LLM service adapters and prompts
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Core domain models
pub mod models;

/// The message-processing pipeline
pub mod pipeline;

/// Shared dependency bundle for the HTTP layer
pub mod resources;

/// HTTP routes (webhook + health)
pub mod routes;

/// Storage abstraction and backends
pub mod storage;

/// Telegram transport
pub mod telegram;

/// Timezone-aware time helpers
pub mod timeutil;

/// Unit-safe numeric primitives
pub mod units;
