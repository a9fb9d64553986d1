// ABOUTME: SQLite storage backend for Healthbot using sqlx
// ABOUTME: Implements the StorageProvider trait with indexed range queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # SQLite Storage Backend
//!
//! Embedded, zero-configuration backend. Profile quantities are stored as
//! plain numeric columns in their canonical units (kg/cm/kcal) and
//! reconstructed into [`Quantity`] values on read; meal line items are
//! stored as a JSON column.

use super::StorageProvider;
use crate::models::{
    ActivityRecord, BurnEstimate, Gender, MealItem, MealRecord, TelegramIdentity, User,
    WeightRecord,
};
use crate::units::{Quantity, Unit};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

/// SQLite-backed storage
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (creating if missing) the database at `database_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the connection fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url: {database_url}"))?
            .create_if_missing(true);

        // An in-memory database exists per connection; more than one
        // connection would see different databases.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("failed to connect to sqlite database")?;

        Ok(Self { pool })
    }

    /// Access the underlying connection pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id: String = row.try_get("id")?;
        let gender: Option<String> = row.try_get("gender")?;
        let gender = match gender.as_deref() {
            Some("male") => Some(Gender::Male),
            Some("female") => Some(Gender::Female),
            Some(other) => return Err(anyhow!("unknown gender in users table: {other}")),
            None => None,
        };
        let height_cm: Option<f64> = row.try_get("height_cm")?;
        let weight_kg: Option<f64> = row.try_get("weight_kg")?;

        Ok(User {
            id: Uuid::parse_str(&id).context("invalid user id in users table")?,
            telegram: TelegramIdentity {
                user_id: row.try_get("telegram_user_id")?,
                first_name: row.try_get("telegram_first_name")?,
                last_name: row.try_get("telegram_last_name")?,
                username: row.try_get("telegram_username")?,
            },
            timezone: row.try_get("timezone")?,
            gender,
            year_of_birth: row.try_get("year_of_birth")?,
            height: height_cm.map(Quantity::centimeters),
            weight: weight_kg.map(Quantity::kilograms),
        })
    }
}

#[async_trait]
impl StorageProvider for SqliteDatabase {
    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                telegram_user_id INTEGER NOT NULL UNIQUE,
                telegram_first_name TEXT,
                telegram_last_name TEXT,
                telegram_username TEXT,
                timezone TEXT,
                gender TEXT,
                year_of_birth INTEGER,
                height_cm REAL,
                weight_kg REAL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS weight_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id),
                weight_kg REAL NOT NULL,
                timestamp INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_weight_user_ts ON weight_records(user_id, timestamp)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS meal_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id),
                items TEXT NOT NULL,
                total_kcal REAL NOT NULL,
                timestamp INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_meal_user_ts ON meal_records(user_id, timestamp)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS activity_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id),
                activity TEXT NOT NULL,
                burn_kcal REAL NOT NULL,
                burn_min_kcal REAL NOT NULL,
                burn_max_kcal REAL NOT NULL,
                timestamp INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_activity_user_ts ON activity_records(user_id, timestamp)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO users (
                id, telegram_user_id, telegram_first_name, telegram_last_name,
                telegram_username, timezone, gender, year_of_birth, height_cm, weight_kg
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(user.id.to_string())
        .bind(user.telegram.user_id)
        .bind(&user.telegram.first_name)
        .bind(&user.telegram.last_name)
        .bind(&user.telegram.username)
        .bind(&user.timezone)
        .bind(user.gender.map(|g| g.as_str()))
        .bind(user.year_of_birth)
        .bind(user.height.map(|h| h.value))
        .bind(user.weight.map(|w| w.value))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn get_user_required(&self, user_id: Uuid) -> Result<User> {
        self.get_user(user_id)
            .await?
            .ok_or_else(|| anyhow!("user {user_id} not found"))
    }

    async fn get_user_by_telegram_id(&self, telegram_user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE telegram_user_id = ?")
            .bind(telegram_user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn set_user_timezone(&self, user_id: Uuid, timezone: &str) -> Result<()> {
        sqlx::query("UPDATE users SET timezone = ? WHERE id = ?")
            .bind(timezone)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_user_gender(&self, user_id: Uuid, gender: Gender) -> Result<()> {
        sqlx::query("UPDATE users SET gender = ? WHERE id = ?")
            .bind(gender.as_str())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_user_year_of_birth(&self, user_id: Uuid, year_of_birth: i32) -> Result<()> {
        sqlx::query("UPDATE users SET year_of_birth = ? WHERE id = ?")
            .bind(year_of_birth)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_user_height(&self, user_id: Uuid, height: Quantity) -> Result<()> {
        if height.unit != Unit::Centimeters {
            return Err(anyhow!("height must be stored in cm, got {}", height.unit));
        }
        sqlx::query("UPDATE users SET height_cm = ? WHERE id = ?")
            .bind(height.value)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_user_weight(&self, user_id: Uuid, weight: Quantity) -> Result<()> {
        if weight.unit != Unit::Kilograms {
            return Err(anyhow!("weight must be stored in kg, got {}", weight.unit));
        }
        sqlx::query("UPDATE users SET weight_kg = ? WHERE id = ?")
            .bind(weight.value)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_weight(&self, record: &WeightRecord) -> Result<()> {
        if record.weight.unit != Unit::Kilograms {
            return Err(anyhow!(
                "weight records must be in kg, got {}",
                record.weight.unit
            ));
        }
        sqlx::query(
            "INSERT INTO weight_records (user_id, weight_kg, timestamp) VALUES (?, ?, ?)",
        )
        .bind(record.user_id.to_string())
        .bind(record.weight.value)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_meal(&self, record: &MealRecord) -> Result<()> {
        let items = serde_json::to_string(&record.items)?;
        sqlx::query(
            "INSERT INTO meal_records (user_id, items, total_kcal, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(record.user_id.to_string())
        .bind(items)
        .bind(record.total_calories.value)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_activity(&self, record: &ActivityRecord) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO activity_records (
                user_id, activity, burn_kcal, burn_min_kcal, burn_max_kcal, timestamp
            ) VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(record.user_id.to_string())
        .bind(&record.activity)
        .bind(record.calories_burned.value)
        .bind(record.calories_burned.min)
        .bind(record.calories_burned.max)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn weights_in_range(
        &self,
        user_id: Uuid,
        from_ts: i64,
        to_ts: i64,
    ) -> Result<Vec<WeightRecord>> {
        let rows = sqlx::query(
            r"
            SELECT weight_kg, timestamp FROM weight_records
            WHERE user_id = ? AND timestamp >= ? AND timestamp < ?
            ORDER BY timestamp ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(from_ts)
        .bind(to_ts)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(WeightRecord {
                    user_id,
                    weight: Quantity::kilograms(row.try_get("weight_kg")?),
                    timestamp: row.try_get("timestamp")?,
                })
            })
            .collect()
    }

    async fn meals_in_range(
        &self,
        user_id: Uuid,
        from_ts: i64,
        to_ts: i64,
    ) -> Result<Vec<MealRecord>> {
        let rows = sqlx::query(
            r"
            SELECT items, total_kcal, timestamp FROM meal_records
            WHERE user_id = ? AND timestamp >= ? AND timestamp < ?
            ORDER BY timestamp ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(from_ts)
        .bind(to_ts)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let items: String = row.try_get("items")?;
                let items: Vec<MealItem> =
                    serde_json::from_str(&items).context("corrupt meal items column")?;
                Ok(MealRecord {
                    user_id,
                    items,
                    total_calories: Quantity::kilocalories(row.try_get("total_kcal")?),
                    timestamp: row.try_get("timestamp")?,
                })
            })
            .collect()
    }

    async fn activities_in_range(
        &self,
        user_id: Uuid,
        from_ts: i64,
        to_ts: i64,
    ) -> Result<Vec<ActivityRecord>> {
        let rows = sqlx::query(
            r"
            SELECT activity, burn_kcal, burn_min_kcal, burn_max_kcal, timestamp
            FROM activity_records
            WHERE user_id = ? AND timestamp >= ? AND timestamp < ?
            ORDER BY timestamp ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(from_ts)
        .bind(to_ts)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ActivityRecord {
                    user_id,
                    activity: row.try_get("activity")?,
                    calories_burned: BurnEstimate {
                        value: row.try_get("burn_kcal")?,
                        min: row.try_get("burn_min_kcal")?,
                        max: row.try_get("burn_max_kcal")?,
                        unit: Unit::Kilocalories,
                    },
                    timestamp: row.try_get("timestamp")?,
                })
            })
            .collect()
    }
}
