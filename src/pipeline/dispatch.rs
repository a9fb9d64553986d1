// ABOUTME: Action dispatcher - routes each extracted action to its handler
// ABOUTME: Handlers run as a concurrent fan-out and fold into the accumulator in order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Action Dispatcher
//!
//! Dispatches every stage-1 action concurrently. Actions within one message
//! are assumed to touch disjoint storage keys, so no locking is provided
//! across the fan-out. Each handler produces a [`HandlerOutput`] that is
//! folded into the accumulator in action order once the batch completes.
//!
//! Any handler error aborts the whole turn; outputs of handlers that already
//! finished are still folded first so their usage records are preserved.
//!
//! After the batch, readiness is re-checked: several concurrently dispatched
//! actions can jointly complete the profile (one message may set gender,
//! height, and age at once), so the onboarding-complete message depends on
//! the before/after transition rather than any single action.

use super::actions::{
    infer_date_schema, Action, EstimateItem, InferredDatePart, InferredDateParts,
};
use super::result::ProcessMessageResultBuilder;
use super::ProcessMessageParams;
use crate::constants::{messages, usage_titles};
use crate::errors::{AppError, AppResult};
use crate::formatters::{format_summary, format_weight_summary, progress_update};
use crate::intelligence::rollup::last_n_days_summary;
use crate::llm::prompts::infer_date_prompt;
use crate::llm::{parse_into, LanguageModel, UsageMetric};
use crate::models::{ActivityRecord, BurnEstimate, MealItem, MealRecord, WeightRecord};
use crate::storage::StorageProvider;
use crate::timeutil::{end_of_local_day, local_naive_to_timestamp};
use crate::units::{Quantity, Unit};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures_util::future::join_all;
use tracing::{debug, warn};

/// Everything one handler contributed to the turn
#[derive(Debug, Default)]
pub struct HandlerOutput {
    /// Human-readable action log entries
    pub actions_taken: Vec<String>,
    /// Side messages delivered alongside the main reply
    pub additional_messages: Vec<String>,
    /// Usage records for LLM calls the handler made
    pub usage_metrics: Vec<UsageMetric>,
}

impl HandlerOutput {
    fn fold_into(self, builder: &mut ProcessMessageResultBuilder) {
        for metric in self.usage_metrics {
            builder.add_usage_metric(metric);
        }
        for action in self.actions_taken {
            builder.add_action_taken(action);
        }
        for message in self.additional_messages {
            builder.add_additional_message(message);
        }
    }
}

/// Dispatch all extracted actions and fold their effects into the builder
///
/// # Errors
///
/// Returns the first handler error; completed handlers' outputs (including
/// usage records) are folded before the error propagates.
pub async fn dispatch_actions<S: StorageProvider>(
    storage: &S,
    llm: &dyn LanguageModel,
    params: &ProcessMessageParams,
    actions: &[Action],
    builder: &mut ProcessMessageResultBuilder,
) -> AppResult<()> {
    let was_ready = storage.get_user_required(params.user_id).await?.is_ready();

    debug!(user_id = %params.user_id, count = actions.len(), "dispatching actions");
    let results = join_all(
        actions
            .iter()
            .map(|action| handle_action(storage, llm, params, action)),
    )
    .await;

    let mut first_error = None;
    for result in results {
        match result {
            Ok(output) => output.fold_into(builder),
            Err(error) => {
                warn!("action handler failed: {error}");
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
    }
    if let Some(error) = first_error {
        return Err(error);
    }

    // Onboarding: emit the all-set message only on a false -> true transition.
    let is_ready = storage.get_user_required(params.user_id).await?.is_ready();
    if !was_ready && is_ready {
        builder.add_action_taken("Account is ready to use the app!");
        builder.add_action_taken(format!(
            "Prepared message for the user: {}",
            messages::ALL_SET
        ));
    }
    Ok(())
}

/// Route one action to its handler (exhaustive over the intent catalog)
async fn handle_action<S: StorageProvider>(
    storage: &S,
    llm: &dyn LanguageModel,
    params: &ProcessMessageParams,
    action: &Action,
) -> AppResult<HandlerOutput> {
    match action {
        Action::RecordWeight { weight } => {
            handle_record_weight(storage, llm, params, weight).await
        }
        Action::RecordMealsAndCalories { items } => {
            handle_record_meal(storage, llm, params, items).await
        }
        Action::RecordActivitiesAndBurn {
            activity,
            calories_burned,
        } => handle_record_activity(storage, llm, params, activity, calories_burned).await,
        Action::GetGeneralAdvice { advice } => {
            let mut output = HandlerOutput::default();
            output.actions_taken.push(format!("Received advice: {advice}"));
            Ok(output)
        }
        Action::EstimateCalories { items } => Ok(handle_estimate_calories(items)),
        Action::SetTimezone { timezone } => {
            let mut output = HandlerOutput::default();
            storage.set_user_timezone(params.user_id, timezone).await?;
            output.actions_taken.push(format!("Set timezone: {timezone}"));
            Ok(output)
        }
        Action::GetWeeklySummary => {
            handle_summary_request(storage, params, 7, "Retrieved weekly summary").await
        }
        Action::GetDailySummary => {
            handle_summary_request(
                storage,
                params,
                2,
                "Retrieved daily summary. Comparing with yesterday.",
            )
            .await
        }
        Action::EditPreviousAction => {
            let mut output = HandlerOutput::default();
            output.actions_taken.push(messages::EDIT_NOT_SUPPORTED.to_owned());
            Ok(output)
        }
        Action::SetUserGender { gender } => {
            let mut output = HandlerOutput::default();
            storage.set_user_gender(params.user_id, *gender).await?;
            output
                .actions_taken
                .push(format!("Set user gender: {}", gender.as_str()));
            Ok(output)
        }
        Action::SetUserAge { age } => handle_set_age(storage, params, *age).await,
        Action::SetUserHeight { height } => {
            let mut output = HandlerOutput::default();
            height.expect_unit(Unit::Centimeters)?;
            storage.set_user_height(params.user_id, *height).await?;
            output
                .actions_taken
                .push(format!("Set user height: {} {}", height.value, height.unit));
            Ok(output)
        }
    }
}

// ============================================================================
// Record handlers
// ============================================================================

async fn handle_record_weight<S: StorageProvider>(
    storage: &S,
    llm: &dyn LanguageModel,
    params: &ProcessMessageParams,
    weight: &Quantity,
) -> AppResult<HandlerOutput> {
    let mut output = HandlerOutput::default();
    weight.expect_unit(Unit::Kilograms)?;

    let timestamp = infer_timestamp(llm, params, &mut output).await?;
    storage
        .record_weight(&WeightRecord {
            user_id: params.user_id,
            weight: *weight,
            timestamp,
        })
        .await?;
    // Keep the profile's current weight in sync for BMR estimation.
    storage.set_user_weight(params.user_id, *weight).await?;
    output
        .actions_taken
        .push(format!("Recorded weight: {} {}", weight.value, weight.unit));

    let user = storage.get_user_required(params.user_id).await?;
    let summary = last_n_days_summary(
        storage,
        &user,
        3,
        end_of_local_day(timestamp, params.user_tz),
        params.user_tz,
        params.current_year(),
    )
    .await?;
    if let Some(text) = format_weight_summary(&summary) {
        output.additional_messages.push(text);
    }
    Ok(output)
}

async fn handle_record_meal<S: StorageProvider>(
    storage: &S,
    llm: &dyn LanguageModel,
    params: &ProcessMessageParams,
    items: &[MealItem],
) -> AppResult<HandlerOutput> {
    let mut output = HandlerOutput::default();
    let timestamp = infer_timestamp(llm, params, &mut output).await?;

    let record = MealRecord::from_items(params.user_id, items.to_vec(), timestamp);
    storage.record_meal(&record).await?;

    output.actions_taken.push(format!(
        "Estimated calories by items:\n```\n{}\n```",
        serde_json::to_string_pretty(items)?
    ));
    output.actions_taken.push(format!(
        "Recorded meal with calories: ({} kcal)",
        record.total_calories.value
    ));

    if let Some(update) =
        progress_update_for(storage, params, end_of_local_day(timestamp, params.user_tz)).await?
    {
        output.additional_messages.push(update);
    }
    Ok(output)
}

async fn handle_record_activity<S: StorageProvider>(
    storage: &S,
    llm: &dyn LanguageModel,
    params: &ProcessMessageParams,
    activity: &str,
    calories_burned: &crate::models::CalorieRange,
) -> AppResult<HandlerOutput> {
    let mut output = HandlerOutput::default();
    let timestamp = infer_timestamp(llm, params, &mut output).await?;

    let burn = BurnEstimate::from_range(calories_burned.min, calories_burned.max);
    storage
        .record_activity(&ActivityRecord {
            user_id: params.user_id,
            activity: activity.to_owned(),
            calories_burned: burn,
            timestamp,
        })
        .await?;
    output.actions_taken.push(format!(
        "Recorded activity: {activity} ({} {} burned)",
        burn.value, burn.unit
    ));

    if let Some(update) =
        progress_update_for(storage, params, end_of_local_day(timestamp, params.user_tz)).await?
    {
        output.additional_messages.push(update);
    }
    Ok(output)
}

// ============================================================================
// Read-only handlers
// ============================================================================

fn handle_estimate_calories(items: &[EstimateItem]) -> HandlerOutput {
    let mut output = HandlerOutput::default();
    let total: f64 = items
        .iter()
        .map(|item| item.estimated_calories.midpoint() * item.quantity)
        .sum();

    let mut lines = vec![format!("Estimated calories: {} kcal", total.round())];
    lines.extend(items.iter().map(|item| {
        format!(
            "  - {}: {}-{} {}",
            item.name,
            item.estimated_calories.min,
            item.estimated_calories.max,
            item.estimated_calories.unit
        )
    }));
    output.actions_taken.push(lines.join("\n"));
    output
}

async fn handle_summary_request<S: StorageProvider>(
    storage: &S,
    params: &ProcessMessageParams,
    num_days: i64,
    log_entry: &str,
) -> AppResult<HandlerOutput> {
    let mut output = HandlerOutput::default();
    let user = storage.get_user_required(params.user_id).await?;
    let summary = last_n_days_summary(
        storage,
        &user,
        num_days,
        end_of_local_day(params.now_ms(), params.user_tz),
        params.user_tz,
        params.current_year(),
    )
    .await?;

    // The full block goes into the action log too, so stage-2 narration can
    // compress it into the one-line reply while the block itself is delivered
    // verbatim alongside.
    let block = format_summary(&summary)?;
    output.actions_taken.push(log_entry.to_owned());
    output.actions_taken.push(block.clone());
    output.additional_messages.push(block);
    Ok(output)
}

async fn handle_set_age<S: StorageProvider>(
    storage: &S,
    params: &ProcessMessageParams,
    age: i32,
) -> AppResult<HandlerOutput> {
    let mut output = HandlerOutput::default();
    if age <= 0 {
        return Err(AppError::invalid_input(format!("age must be positive: {age}")));
    }
    // Store year of birth so the value never goes stale.
    storage
        .set_user_year_of_birth(params.user_id, params.current_year() - age)
        .await?;
    output.actions_taken.push(format!("Set user age: {age}"));
    Ok(output)
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Short-window progress block for the day containing a fresh record
async fn progress_update_for<S: StorageProvider>(
    storage: &S,
    params: &ProcessMessageParams,
    end_of_day_ts: i64,
) -> AppResult<Option<String>> {
    let user = storage.get_user_required(params.user_id).await?;
    let summary = last_n_days_summary(
        storage,
        &user,
        1,
        end_of_day_ts,
        params.user_tz,
        params.current_year(),
    )
    .await?;
    summary
        .daily_summaries
        .first()
        .map(progress_update)
        .transpose()
}

/// Resolve the record timestamp from the message, falling back to receipt time
///
/// Asks the model for explicit date/time components mentioned in the text and
/// overlays them on the user-local current date-time. The call's usage is
/// recorded on the handler output.
async fn infer_timestamp(
    llm: &dyn LanguageModel,
    params: &ProcessMessageParams,
    output: &mut HandlerOutput,
) -> AppResult<i64> {
    let prompt = infer_date_prompt(&params.current_date_str(), &params.input_text);
    let completion = parse_into::<InferredDateParts>(
        llm,
        &prompt,
        &params.input_text,
        &infer_date_schema(),
    )
    .await?;
    output.usage_metrics.push(UsageMetric::from_usage(
        usage_titles::INFER_DATE,
        "openai",
        completion.usage,
    ));

    let mut local = params.now.with_timezone(&params.user_tz).naive_local();
    if let Some(date_str) = completion.data.parts.iter().find_map(|p| match p {
        InferredDatePart::Date { date } => Some(date.as_str()),
        InferredDatePart::Time { .. } => None,
    }) {
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| AppError::invalid_input(format!("inferred date {date_str:?}: {e}")))?;
        local = NaiveDateTime::new(date, local.time());
    }
    if let Some(time_str) = completion.data.parts.iter().find_map(|p| match p {
        InferredDatePart::Time { time } => Some(time.as_str()),
        InferredDatePart::Date { .. } => None,
    }) {
        let time = NaiveTime::parse_from_str(time_str, "%H:%M:%S")
            .map_err(|e| AppError::invalid_input(format!("inferred time {time_str:?}: {e}")))?;
        local = NaiveDateTime::new(local.date(), time);
    }

    local_naive_to_timestamp(local, params.user_tz)
}
