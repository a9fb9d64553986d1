// ABOUTME: Storage abstraction layer for Healthbot
// ABOUTME: Plugin architecture with a SQLite backend behind a provider trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Storage Abstraction
//!
//! All persistence goes through [`StorageProvider`]: point reads by id,
//! indexed `(user_id, timestamp)` range queries per record table, inserts,
//! and single-field profile patches. Range queries are half-open
//! `[from, to)`. No transactions are assumed across calls; the pipeline
//! never issues two writes to the same record in one turn.

use crate::models::{ActivityRecord, Gender, MealRecord, User, WeightRecord};
use crate::units::Quantity;
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub mod factory;
pub mod sqlite;

pub use factory::Database;

/// Core storage abstraction trait
///
/// All backends implement this trait to provide a consistent interface to
/// the pipeline and rollup engine.
#[async_trait]
pub trait StorageProvider: Send + Sync + Clone {
    /// Run migrations to set up the schema
    async fn migrate(&self) -> Result<()>;

    // ================================
    // Users
    // ================================

    /// Insert a new user
    async fn create_user(&self, user: &User) -> Result<()>;

    /// Get a user by id
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Get a user by id, failing if absent
    async fn get_user_required(&self, user_id: Uuid) -> Result<User>;

    /// Look up a user by their Telegram identity
    async fn get_user_by_telegram_id(&self, telegram_user_id: i64) -> Result<Option<User>>;

    /// Patch the user's timezone
    async fn set_user_timezone(&self, user_id: Uuid, timezone: &str) -> Result<()>;

    /// Patch the user's gender
    async fn set_user_gender(&self, user_id: Uuid, gender: Gender) -> Result<()>;

    /// Patch the user's year of birth
    async fn set_user_year_of_birth(&self, user_id: Uuid, year_of_birth: i32) -> Result<()>;

    /// Patch the user's height (centimeters)
    async fn set_user_height(&self, user_id: Uuid, height: Quantity) -> Result<()>;

    /// Patch the user's current weight (kilograms)
    async fn set_user_weight(&self, user_id: Uuid, weight: Quantity) -> Result<()>;

    // ================================
    // Records (append-only)
    // ================================

    /// Insert a weight measurement
    async fn record_weight(&self, record: &WeightRecord) -> Result<()>;

    /// Insert a meal
    async fn record_meal(&self, record: &MealRecord) -> Result<()>;

    /// Insert an activity
    async fn record_activity(&self, record: &ActivityRecord) -> Result<()>;

    /// Weight measurements with `from_ts <= timestamp < to_ts`, oldest first
    async fn weights_in_range(
        &self,
        user_id: Uuid,
        from_ts: i64,
        to_ts: i64,
    ) -> Result<Vec<WeightRecord>>;

    /// Meals with `from_ts <= timestamp < to_ts`, oldest first
    async fn meals_in_range(
        &self,
        user_id: Uuid,
        from_ts: i64,
        to_ts: i64,
    ) -> Result<Vec<MealRecord>>;

    /// Activities with `from_ts <= timestamp < to_ts`, oldest first
    async fn activities_in_range(
        &self,
        user_id: Uuid,
        from_ts: i64,
        to_ts: i64,
    ) -> Result<Vec<ActivityRecord>>;
}
