// ABOUTME: Daily rollup engine - buckets raw records into per-day statistics
// ABOUTME: Computes calories in/out, deficit, weight trend, and cross-day overview
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Daily Rollup Engine
//!
//! Aggregates a user's stored meals, weights, and activities over a half-open
//! window `[from, to)` into one [`DailySummary`] per calendar day plus a
//! cross-day [`Overview`].
//!
//! Bucketing policy: fixed 24-hour slices measured from the window start
//! (`from + i*86_400_000`), not calendar-midnight-aligned. Day labels are the
//! local calendar date of each slice's start instant in the caller's
//! timezone. Weight samples classify as morning when the local hour is below
//! 8 and as evening at hour 16 or later.
//!
//! Summaries are derived fresh on every query and never cached; the
//! underlying records change between requests.

use crate::constants::time::{EVENING_START_HOUR, MORNING_END_HOUR, ONE_DAY_MS};
use crate::errors::{AppError, AppResult};
use crate::intelligence::bmr::estimate_bmr;
use crate::models::{
    ActivityRecord, DailySummary, LastNDaysSummary, MealRecord, Overview, User, WeightRecord,
};
use crate::storage::StorageProvider;
use crate::timeutil::{format_local_date, format_local_day_of_week, local_hour};
use crate::units::{mean_quantity, sum_quantities, Quantity, Unit};
use chrono_tz::Tz;
use tracing::debug;

/// Compute one summary per 24-hour bucket of `[from_ts, to_ts)`
///
/// Returns exactly `ceil((to_ts - from_ts) / 86_400_000)` entries, contiguous
/// and non-overlapping, oldest to newest.
///
/// # Errors
///
/// Returns an error when the window is empty or inverted, or when any stored
/// quantity carries an unexpected unit (internal invariant; records are only
/// written in kcal/kg).
pub fn compute_daily_summaries(
    meals: &[MealRecord],
    activities: &[ActivityRecord],
    weights: &[WeightRecord],
    base_burn: &Quantity,
    from_ts: i64,
    to_ts: i64,
    tz: Tz,
) -> AppResult<Vec<DailySummary>> {
    if to_ts <= from_ts {
        return Err(AppError::invalid_input(format!(
            "rollup window is empty: from={from_ts} to={to_ts}"
        )));
    }
    base_burn.expect_unit(Unit::Kilocalories)?;

    let num_days = (to_ts - from_ts + ONE_DAY_MS - 1) / ONE_DAY_MS;
    let mut summaries = Vec::with_capacity(usize::try_from(num_days).unwrap_or_default());

    for i in 0..num_days {
        let day_start = from_ts + i * ONE_DAY_MS;
        let day_end = day_start + ONE_DAY_MS;
        summaries.push(summarize_bucket(
            meals, activities, weights, base_burn, day_start, day_end, tz,
        )?);
    }

    Ok(summaries)
}

/// Summarize one `[day_start, day_end)` bucket
fn summarize_bucket(
    meals: &[MealRecord],
    activities: &[ActivityRecord],
    weights: &[WeightRecord],
    base_burn: &Quantity,
    day_start: i64,
    day_end: i64,
    tz: Tz,
) -> AppResult<DailySummary> {
    let in_bucket = |ts: i64| ts >= day_start && ts < day_end;

    // Calories in: present only when the day has at least one meal.
    let day_meals: Vec<&MealRecord> = meals.iter().filter(|m| in_bucket(m.timestamp)).collect();
    let calories_in = if day_meals.is_empty() {
        None
    } else {
        Some(sum_quantities(
            day_meals.iter().map(|m| &m.total_calories),
            Unit::Kilocalories,
        )?)
    };

    // Calories out: baseline burn plus activity burn. The baseline is always
    // computable, so this is always present.
    let day_activities: Vec<&ActivityRecord> = activities
        .iter()
        .filter(|a| in_bucket(a.timestamp))
        .collect();
    let mut activity_burn = 0.0;
    for activity in &day_activities {
        if activity.calories_burned.unit != Unit::Kilocalories {
            return Err(AppError::unit_mismatch(format!(
                "activity burn recorded in {}",
                activity.calories_burned.unit
            )));
        }
        activity_burn += activity.calories_burned.value;
    }
    let calories_out = Some(Quantity::kilocalories(base_burn.value + activity_burn));

    let deficit = match (&calories_out, &calories_in) {
        (Some(out), Some(cal_in)) => Some(out.checked_sub(cal_in)?),
        _ => None,
    };

    // Weight: day mean plus the chronologically first morning / last evening
    // samples by the user's local hour.
    let mut day_weights: Vec<&WeightRecord> =
        weights.iter().filter(|w| in_bucket(w.timestamp)).collect();
    day_weights.sort_by_key(|w| w.timestamp);

    let weight = mean_quantity(day_weights.iter().map(|w| &w.weight), Unit::Kilograms)?;
    let first_morning_weight = day_weights
        .iter()
        .find(|w| local_hour(w.timestamp, tz) < MORNING_END_HOUR)
        .map(|w| w.weight);
    let last_evening_weight = day_weights
        .iter()
        .rev()
        .find(|w| local_hour(w.timestamp, tz) >= EVENING_START_HOUR)
        .map(|w| w.weight);

    Ok(DailySummary {
        date: format_local_date(day_start, tz),
        day_of_week: format_local_day_of_week(day_start, tz),
        date_ts: day_start,
        calories_in,
        calories_out,
        deficit,
        weight,
        first_morning_weight,
        last_evening_weight,
        has_data: !day_meals.is_empty() || !day_activities.is_empty() || !day_weights.is_empty(),
    })
}

/// Compute the cross-day overview for a window
///
/// Average deficit is the mean over days that have a deficit value; days
/// without one do not count as zero. The weight change endpoints are the
/// earliest and latest raw samples in the window, not day-boundary weights.
///
/// Returns `None` when no day in the window has any data.
///
/// # Errors
///
/// Returns an error if deficits or the two weight endpoints disagree on
/// units, or if the summaries are not in chronological order.
pub fn compute_overview(
    daily_summaries: &[DailySummary],
    weights: &[WeightRecord],
) -> AppResult<Option<Overview>> {
    let with_data: Vec<&DailySummary> =
        daily_summaries.iter().filter(|d| d.has_data).collect();
    let Some((first_day, last_day)) = with_data.first().zip(with_data.last()) else {
        return Ok(None);
    };
    if last_day.date_ts < first_day.date_ts {
        return Err(AppError::internal(format!(
            "daily summaries out of order: {} before {}",
            last_day.date_ts, first_day.date_ts
        )));
    }

    let mut deficit_total = 0.0;
    let mut days_with_deficit = 0usize;
    for day in &with_data {
        if let Some(deficit) = &day.deficit {
            deficit.expect_unit(Unit::Kilocalories)?;
            deficit_total += deficit.value;
            days_with_deficit += 1;
        }
    }
    #[allow(clippy::cast_precision_loss)]
    let average_calorie_deficit = (days_with_deficit > 0)
        .then(|| Quantity::kilocalories(deficit_total / days_with_deficit as f64));

    let mut sorted: Vec<&WeightRecord> = weights.iter().collect();
    sorted.sort_by_key(|w| w.timestamp);
    let earliest_weight = sorted.first().map(|w| w.weight);
    let latest_weight = sorted.last().map(|w| w.weight);
    if let (Some(earliest), Some(latest)) = (&earliest_weight, &latest_weight) {
        if earliest.unit != latest.unit {
            return Err(AppError::unit_mismatch(format!(
                "window weight samples disagree on units: {} vs {}",
                earliest.unit, latest.unit
            )));
        }
    }

    Ok(Some(Overview {
        average_calorie_deficit,
        earliest_weight,
        latest_weight,
    }))
}

/// Fetch and roll up the last `num_days` days ending at `end_of_last_day_ts`
///
/// The window is `[end - num_days*24h + 1, end)`; each bucket is a fixed
/// 24-hour slice from the window start.
///
/// # Errors
///
/// Returns an error on storage failure, invalid window, or unit-invariant
/// violations in stored records.
pub async fn last_n_days_summary<S: StorageProvider>(
    storage: &S,
    user: &User,
    num_days: i64,
    end_of_last_day_ts: i64,
    tz: Tz,
    current_year: i32,
) -> AppResult<LastNDaysSummary> {
    if num_days <= 0 {
        return Err(AppError::invalid_input(format!(
            "num_days must be positive, got {num_days}"
        )));
    }
    let from_ts = end_of_last_day_ts - num_days * ONE_DAY_MS + 1;
    let to_ts = end_of_last_day_ts;

    let meals = storage.meals_in_range(user.id, from_ts, to_ts).await?;
    let weights = storage.weights_in_range(user.id, from_ts, to_ts).await?;
    let activities = storage.activities_in_range(user.id, from_ts, to_ts).await?;
    debug!(
        user_id = %user.id,
        meals = meals.len(),
        weights = weights.len(),
        activities = activities.len(),
        "rolling up {num_days} days ending {end_of_last_day_ts}"
    );

    let estimate = estimate_bmr(user, current_year)?;
    let daily_summaries = compute_daily_summaries(
        &meals,
        &activities,
        &weights,
        &estimate.bmr,
        from_ts,
        to_ts,
        tz,
    )?;
    let overview = compute_overview(&daily_summaries, &weights)?;

    Ok(LastNDaysSummary {
        has_data: overview.is_some(),
        daily_summaries,
        overview,
    })
}
