// ABOUTME: Storage factory with backend detection from the database URL
// ABOUTME: Wraps concrete backends in a single enum the rest of the app depends on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! Storage factory
//!
//! Detects the backend from the connection string and wraps it in the
//! [`Database`] enum that delegates to the concrete implementation.

use super::sqlite::SqliteDatabase;
use super::StorageProvider;
use crate::models::{ActivityRecord, Gender, MealRecord, User, WeightRecord};
use crate::units::Quantity;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    /// Embedded SQLite, including `sqlite::memory:` for tests
    SQLite,
}

/// Storage instance wrapper that delegates to the configured backend
#[derive(Clone)]
pub enum Database {
    /// SQLite backend
    SQLite(SqliteDatabase),
}

impl Database {
    /// Create a storage instance from a connection string
    ///
    /// # Errors
    ///
    /// Returns an error if the URL scheme is unsupported or the connection
    /// fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        debug!("detecting storage backend from url: {database_url}");
        let db_type = detect_database_type(database_url)?;
        info!("initializing {db_type:?} storage backend");
        match db_type {
            DatabaseType::SQLite => Ok(Self::SQLite(SqliteDatabase::new(database_url).await?)),
        }
    }

    /// Descriptive string for logging
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::SQLite(_) => "SQLite (embedded)",
        }
    }
}

/// Detect the backend type from a connection string
fn detect_database_type(database_url: &str) -> Result<DatabaseType> {
    if database_url.starts_with("sqlite:") {
        Ok(DatabaseType::SQLite)
    } else {
        Err(anyhow!(
            "unsupported database url (expected sqlite:...): {database_url}"
        ))
    }
}

#[async_trait]
impl StorageProvider for Database {
    async fn migrate(&self) -> Result<()> {
        match self {
            Self::SQLite(db) => db.migrate().await,
        }
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        match self {
            Self::SQLite(db) => db.create_user(user).await,
        }
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        match self {
            Self::SQLite(db) => db.get_user(user_id).await,
        }
    }

    async fn get_user_required(&self, user_id: Uuid) -> Result<User> {
        match self {
            Self::SQLite(db) => db.get_user_required(user_id).await,
        }
    }

    async fn get_user_by_telegram_id(&self, telegram_user_id: i64) -> Result<Option<User>> {
        match self {
            Self::SQLite(db) => db.get_user_by_telegram_id(telegram_user_id).await,
        }
    }

    async fn set_user_timezone(&self, user_id: Uuid, timezone: &str) -> Result<()> {
        match self {
            Self::SQLite(db) => db.set_user_timezone(user_id, timezone).await,
        }
    }

    async fn set_user_gender(&self, user_id: Uuid, gender: Gender) -> Result<()> {
        match self {
            Self::SQLite(db) => db.set_user_gender(user_id, gender).await,
        }
    }

    async fn set_user_year_of_birth(&self, user_id: Uuid, year_of_birth: i32) -> Result<()> {
        match self {
            Self::SQLite(db) => db.set_user_year_of_birth(user_id, year_of_birth).await,
        }
    }

    async fn set_user_height(&self, user_id: Uuid, height: Quantity) -> Result<()> {
        match self {
            Self::SQLite(db) => db.set_user_height(user_id, height).await,
        }
    }

    async fn set_user_weight(&self, user_id: Uuid, weight: Quantity) -> Result<()> {
        match self {
            Self::SQLite(db) => db.set_user_weight(user_id, weight).await,
        }
    }

    async fn record_weight(&self, record: &WeightRecord) -> Result<()> {
        match self {
            Self::SQLite(db) => db.record_weight(record).await,
        }
    }

    async fn record_meal(&self, record: &MealRecord) -> Result<()> {
        match self {
            Self::SQLite(db) => db.record_meal(record).await,
        }
    }

    async fn record_activity(&self, record: &ActivityRecord) -> Result<()> {
        match self {
            Self::SQLite(db) => db.record_activity(record).await,
        }
    }

    async fn weights_in_range(
        &self,
        user_id: Uuid,
        from_ts: i64,
        to_ts: i64,
    ) -> Result<Vec<WeightRecord>> {
        match self {
            Self::SQLite(db) => db.weights_in_range(user_id, from_ts, to_ts).await,
        }
    }

    async fn meals_in_range(
        &self,
        user_id: Uuid,
        from_ts: i64,
        to_ts: i64,
    ) -> Result<Vec<MealRecord>> {
        match self {
            Self::SQLite(db) => db.meals_in_range(user_id, from_ts, to_ts).await,
        }
    }

    async fn activities_in_range(
        &self,
        user_id: Uuid,
        from_ts: i64,
        to_ts: i64,
    ) -> Result<Vec<ActivityRecord>> {
        match self {
            Self::SQLite(db) => db.activities_in_range(user_id, from_ts, to_ts).await,
        }
    }
}
