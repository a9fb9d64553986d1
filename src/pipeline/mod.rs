// ABOUTME: Pipeline orchestrator - sequences extraction, dispatch, and narration
// ABOUTME: Handles the /start onboarding special case and top-level failure recovery
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Message-Processing Pipeline
//!
//! One inbound message runs through: stage-1 extraction (free text to typed
//! actions), concurrent action dispatch, then stage-2 narration (action log
//! to final reply). The literal `/start` command short-circuits to a
//! readiness-based onboarding reply with no LLM calls.
//!
//! Any failure at any point collapses the turn to a fixed apology reply with
//! `is_error` set; usage metrics recorded before the failure are preserved in
//! the result, because partial LLM spend is billed regardless of downstream
//! failure.

pub mod actions;
pub mod dispatch;
pub mod result;

pub use actions::{Action, Stage1Output, Stage2Output};
pub use result::{ProcessMessageResult, ProcessMessageResultBuilder};

use crate::constants::{messages, usage_titles};
use crate::errors::AppResult;
use crate::llm::prompts::{system_prompt, Stage};
use crate::llm::{parse_into, LanguageModel, UsageMetric};
use crate::storage::StorageProvider;
use crate::timeutil::format_local_datetime;
use actions::stage1_output_schema;
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

/// Per-turn input to the pipeline
#[derive(Debug, Clone)]
pub struct ProcessMessageParams {
    /// The user this message belongs to
    pub user_id: Uuid,
    /// Raw inbound text
    pub input_text: String,
    /// The user's timezone (falls back to UTC before onboarding)
    pub user_tz: Tz,
    /// Receipt time of the message
    pub now: DateTime<Utc>,
}

impl ProcessMessageParams {
    /// User-local current date-time string embedded in prompts
    #[must_use]
    pub fn current_date_str(&self) -> String {
        format_local_datetime(self.now, self.user_tz)
    }

    /// User-local current calendar year
    #[must_use]
    pub fn current_year(&self) -> i32 {
        self.now.with_timezone(&self.user_tz).year()
    }

    /// Receipt time as epoch milliseconds
    #[must_use]
    pub fn now_ms(&self) -> i64 {
        self.now.timestamp_millis()
    }
}

/// Process one inbound message end to end
///
/// Never fails: internal errors produce a result with `is_error` set, the
/// fixed apology as the reply, and whatever usage metrics were recorded
/// before the failure.
pub async fn process_message<S: StorageProvider>(
    storage: &S,
    llm: &dyn LanguageModel,
    params: &ProcessMessageParams,
) -> ProcessMessageResult {
    let mut builder = ProcessMessageResultBuilder::new();
    match run_stages(storage, llm, params, &mut builder).await {
        Ok(()) => builder.build(),
        Err(err) => {
            error!(user_id = %params.user_id, "failed to process message: {err}");
            builder.set_is_error(true);
            builder.set_message(messages::APOLOGY);
            builder.build()
        }
    }
}

async fn run_stages<S: StorageProvider>(
    storage: &S,
    llm: &dyn LanguageModel,
    params: &ProcessMessageParams,
    builder: &mut ProcessMessageResultBuilder,
) -> AppResult<()> {
    if params.input_text.trim().eq_ignore_ascii_case("/start") {
        return handle_start_command(storage, params, builder).await;
    }

    // Stage 1: free text -> typed actions
    let stage1 = parse_into::<Stage1Output>(
        llm,
        &system_prompt(&params.current_date_str(), Stage::Stage1),
        &params.input_text,
        &stage1_output_schema(),
    )
    .await?;
    builder.set_stage1_output(stage1.data.clone());
    builder.add_usage_metric(UsageMetric::from_usage(
        usage_titles::STAGE_1,
        "openai",
        stage1.usage,
    ));
    info!(
        user_id = %params.user_id,
        actions = stage1.data.actions.len(),
        "stage 1 extracted actions"
    );

    dispatch::dispatch_actions(storage, llm, params, &stage1.data.actions, builder).await?;

    // Stage 2: action log -> final reply
    let narration_context = json!({
        "userInput": params.input_text,
        "actionsTaken": builder.actions_taken(),
    });
    let stage2 = llm
        .format(
            &system_prompt(&params.current_date_str(), Stage::Stage2),
            &narration_context.to_string(),
        )
        .await?;
    builder.add_usage_metric(UsageMetric::from_usage(
        usage_titles::STAGE_2,
        "openai",
        stage2.usage,
    ));
    let stage2_output = Stage2Output {
        response: stage2.data,
    };
    builder.set_stage2_output(stage2_output.clone());
    builder.set_message(stage2_output.response);

    Ok(())
}

/// Terminal `/start` reply built from current readiness; no LLM calls
async fn handle_start_command<S: StorageProvider>(
    storage: &S,
    params: &ProcessMessageParams,
    builder: &mut ProcessMessageResultBuilder,
) -> AppResult<()> {
    let user = storage.get_user_required(params.user_id).await?;
    let response = if user.is_ready() {
        messages::ALL_SET
    } else {
        messages::WELCOME
    };

    builder.set_message(response);
    builder.set_stage1_output(Stage1Output::default());
    builder.set_stage2_output(Stage2Output {
        response: response.to_owned(),
    });
    builder.add_action_taken("Handled /start command");
    Ok(())
}
