// ABOUTME: Core data models for the Healthbot health-tracking assistant
// ABOUTME: Defines User, Gender, weight/meal/activity records, and rollup value objects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Core Data Models
//!
//! Domain structures shared across the pipeline, rollup engine, and storage.
//! A `User` owns its weight/meal/activity records (referenced by `user_id`);
//! records are immutable append-only facts tagged with an epoch-millisecond
//! timestamp describing when the event occurred (inferred from the message,
//! not necessarily receipt time). Corrections are not supported.

use crate::units::{Quantity, Unit};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// User
// ============================================================================

/// User gender, used only for BMR estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male (higher BMR constants)
    Male,
    /// Female (lower BMR constants)
    Female,
}

impl Gender {
    /// Display representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// Identity assigned by the chat platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramIdentity {
    /// Telegram numeric user id
    pub user_id: i64,
    /// First name if the platform provided one
    pub first_name: Option<String>,
    /// Last name if the platform provided one
    pub last_name: Option<String>,
    /// Username if the platform provided one
    pub username: Option<String>,
}

/// A Healthbot user: chat identity plus an optional biometric profile
///
/// Created on the first inbound message from a new chat identity and patched
/// field-by-field as information is extracted from later messages. Never
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// Chat platform identity
    pub telegram: TelegramIdentity,
    /// IANA timezone name, e.g. "Asia/Singapore"
    pub timezone: Option<String>,
    /// Gender for BMR estimation
    pub gender: Option<Gender>,
    /// Year of birth (stored instead of age so it never goes stale)
    pub year_of_birth: Option<i32>,
    /// Height in centimeters
    pub height: Option<Quantity>,
    /// Current weight in kilograms, patched on every weight recording
    pub weight: Option<Quantity>,
}

impl User {
    /// Create a new user from a chat identity with an empty profile
    #[must_use]
    pub fn new(telegram: TelegramIdentity) -> Self {
        Self {
            id: Uuid::new_v4(),
            telegram,
            timezone: None,
            gender: None,
            year_of_birth: None,
            height: None,
            weight: None,
        }
    }

    /// Whether the profile can support BMR-based features
    ///
    /// Ready means all five optional profile fields are populated; removing
    /// any one of them makes the user not-ready again.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.timezone.is_some()
            && self.gender.is_some()
            && self.year_of_birth.is_some()
            && self.height.is_some()
            && self.weight.is_some()
    }
}

// ============================================================================
// Records (immutable, append-only)
// ============================================================================

/// A min/max estimate range in kilocalories
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalorieRange {
    /// Lower bound of the estimate
    pub min: f64,
    /// Upper bound of the estimate
    pub max: f64,
    /// Always kilocalories
    #[serde(rename = "units")]
    pub unit: Unit,
}

impl CalorieRange {
    /// Midpoint of the range, the single value used for aggregation
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// A single weight measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightRecord {
    /// Owning user
    pub user_id: Uuid,
    /// Measured weight (kilograms)
    pub weight: Quantity,
    /// When the measurement was taken (epoch ms)
    pub timestamp: i64,
}

/// One line item of a recorded meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealItem {
    /// What was eaten
    pub name: String,
    /// Estimated calories for a single portion
    #[serde(rename = "estimatedCaloriesPerPortion")]
    pub estimated_calories_per_portion: CalorieRange,
    /// How many portions were eaten
    #[serde(rename = "numPortions")]
    pub num_portions: f64,
}

impl MealItem {
    /// Point-estimate calories for this item: range midpoint times portions
    #[must_use]
    pub fn point_estimate_kcal(&self) -> f64 {
        self.estimated_calories_per_portion.midpoint() * self.num_portions
    }
}

/// A recorded meal with its line items and precomputed total
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealRecord {
    /// Owning user
    pub user_id: Uuid,
    /// Line items with per-portion estimate ranges
    pub items: Vec<MealItem>,
    /// Rounded sum of item point estimates (kcal), stored for fast rollups
    pub total_calories: Quantity,
    /// When the meal was eaten (epoch ms)
    pub timestamp: i64,
}

impl MealRecord {
    /// Build a record from extracted items, computing the rounded total
    #[must_use]
    pub fn from_items(user_id: Uuid, items: Vec<MealItem>, timestamp: i64) -> Self {
        let total: f64 = items.iter().map(MealItem::point_estimate_kcal).sum();
        Self {
            user_id,
            items,
            total_calories: Quantity::kilocalories(total.round()),
            timestamp,
        }
    }
}

/// Estimated calorie burn for an activity: stored range plus point estimate
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BurnEstimate {
    /// Rounded midpoint of the range, used for aggregation
    pub value: f64,
    /// Lower bound of the estimate
    pub min: f64,
    /// Upper bound of the estimate
    pub max: f64,
    /// Always kilocalories
    #[serde(rename = "units")]
    pub unit: Unit,
}

impl BurnEstimate {
    /// Build from a min/max range, rounding the midpoint
    #[must_use]
    pub fn from_range(min: f64, max: f64) -> Self {
        Self {
            value: ((min + max) / 2.0).round(),
            min,
            max,
            unit: Unit::Kilocalories,
        }
    }
}

/// A recorded activity with its estimated calorie burn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Owning user
    pub user_id: Uuid,
    /// Name or description of the activity
    pub activity: String,
    /// Estimated burn
    pub calories_burned: BurnEstimate,
    /// When the activity happened (epoch ms)
    pub timestamp: i64,
}

// ============================================================================
// Rollup value objects (derived, never persisted)
// ============================================================================

/// Aggregated statistics for one calendar day in one timezone
///
/// Derived fresh on every query; never cached across requests because the
/// underlying records change between requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    /// Local calendar date of the bucket start instant, `yyyy-MM-dd`
    pub date: String,
    /// Three-letter weekday of `date`
    pub day_of_week: String,
    /// Bucket start (epoch ms)
    pub date_ts: i64,
    /// Sum of meal totals; absent when the day has no meals
    pub calories_in: Option<Quantity>,
    /// BMR baseline plus activity burn; present whenever the baseline is
    /// computable (it always is)
    pub calories_out: Option<Quantity>,
    /// `calories_out - calories_in`; absent when either operand is absent.
    /// Negative means a surplus.
    pub deficit: Option<Quantity>,
    /// Mean of the day's weight samples; absent without samples
    pub weight: Option<Quantity>,
    /// Chronologically first sample taken before the morning cutoff hour
    pub first_morning_weight: Option<Quantity>,
    /// Chronologically last sample taken after the evening start hour
    pub last_evening_weight: Option<Quantity>,
    /// Whether any meal/activity/weight fell inside this bucket
    pub has_data: bool,
}

/// Cross-day aggregate over a window of daily summaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overview {
    /// Mean deficit over the days that have one; days without a deficit do
    /// not count as zero. Absent when no day has a deficit.
    pub average_calorie_deficit: Option<Quantity>,
    /// First raw weight sample in the window (not a day-boundary aggregate)
    pub earliest_weight: Option<Quantity>,
    /// Last raw weight sample in the window
    pub latest_weight: Option<Quantity>,
}

/// Result of the last-N-days rollup query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastNDaysSummary {
    /// False when zero days in the window have any data; the overview is
    /// absent in that case
    pub has_data: bool,
    /// One entry per day, oldest to newest
    pub daily_summaries: Vec<DailySummary>,
    /// Cross-day aggregate, present iff `has_data`
    pub overview: Option<Overview>,
}
