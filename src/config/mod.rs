// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Environment-only configuration, injected explicitly at construction time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! Configuration module
//!
//! Environment-only configuration: [`environment::ServerConfig::from_env`]
//! reads every setting once at startup, and the resulting structs are passed
//! explicitly into the adapters (storage, LLM, Telegram) at construction
//! time. Nothing reads the environment at call sites.

/// Environment and server configuration
pub mod environment;

pub use environment::ServerConfig;
