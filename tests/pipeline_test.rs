// ABOUTME: End-to-end pipeline tests with a scripted language model and real storage
// ABOUTME: Covers /start, recording flows, onboarding transition, and failure paths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use healthbot::constants::messages;
use healthbot::errors::{AppError, AppResult};
use healthbot::llm::{
    CostEstimate, LanguageModel, LlmCompletion, LlmUsage, OutputSchema, TokenUsage,
};
use healthbot::models::{Gender, TelegramIdentity, User};
use healthbot::pipeline::{process_message, ProcessMessageParams};
use healthbot::storage::{Database, StorageProvider};
use healthbot::timeutil::parse_timezone;
use healthbot::units::Quantity;
use serde_json::json;

/// A scripted stand-in for the hosted model: fixed stage-1 actions, fixed
/// inferred date parts, optional failure injection per call kind.
struct ScriptedLlm {
    stage1: serde_json::Value,
    inferred_parts: serde_json::Value,
    fail_stage1: bool,
    fail_format: bool,
}

impl ScriptedLlm {
    fn returning_actions(stage1: serde_json::Value) -> Self {
        Self {
            stage1,
            inferred_parts: json!({ "parts": [] }),
            fail_stage1: false,
            fail_format: false,
        }
    }

    fn usage() -> LlmUsage {
        LlmUsage {
            tokens: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 20,
                total_tokens: 120,
            },
            cost: CostEstimate {
                currency: "USD".to_owned(),
                input: 0.001,
                output: 0.0005,
                total: 0.0015,
            },
        }
    }
}

#[async_trait]
impl LanguageModel for ScriptedLlm {
    async fn parse(
        &self,
        _system_prompt: &str,
        _user_text: &str,
        schema: &OutputSchema,
    ) -> AppResult<LlmCompletion<serde_json::Value>> {
        if schema.name == "infer_date" {
            return Ok(LlmCompletion {
                data: self.inferred_parts.clone(),
                usage: Self::usage(),
            });
        }
        if self.fail_stage1 {
            return Err(AppError::external_service("openai", "scripted failure"));
        }
        Ok(LlmCompletion {
            data: self.stage1.clone(),
            usage: Self::usage(),
        })
    }

    async fn format(
        &self,
        _system_prompt: &str,
        _text: &str,
    ) -> AppResult<LlmCompletion<String>> {
        if self.fail_format {
            return Err(AppError::external_service("openai", "scripted failure"));
        }
        Ok(LlmCompletion {
            data: "Narrated reply.".to_owned(),
            usage: Self::usage(),
        })
    }
}

async fn test_database() -> Database {
    let db = Database::new("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    db
}

async fn create_user(db: &Database, ready: bool) -> User {
    let mut user = User::new(TelegramIdentity {
        user_id: 7,
        first_name: Some("Sam".into()),
        last_name: None,
        username: Some("sam".into()),
    });
    user.timezone = Some("Asia/Singapore".into());
    user.weight = Some(Quantity::kilograms(80.0));
    if ready {
        user.gender = Some(Gender::Male);
        user.year_of_birth = Some(1990);
        user.height = Some(Quantity::centimeters(175.0));
    }
    db.create_user(&user).await.unwrap();
    user
}

fn params_for(user: &User, text: &str) -> ProcessMessageParams {
    ProcessMessageParams {
        user_id: user.id,
        input_text: text.to_owned(),
        user_tz: parse_timezone("Asia/Singapore").unwrap(),
        // 2024-03-10 12:00 in Singapore
        now: Utc.with_ymd_and_hms(2024, 3, 10, 4, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn test_start_command_before_onboarding() {
    let db = test_database().await;
    let user = create_user(&db, false).await;
    let llm = ScriptedLlm::returning_actions(json!({ "actions": [] }));

    let result = process_message(&db, &llm, &params_for(&user, "/start")).await;

    assert!(!result.is_error);
    assert_eq!(result.message, messages::WELCOME);
    // No LLM calls for /start
    assert!(result.usage_metrics.is_empty());
    assert_eq!(result.actions_taken, vec!["Handled /start command"]);
    let stage1 = result.intermediates.stage1_output.unwrap();
    assert!(stage1.actions.is_empty());
}

#[tokio::test]
async fn test_start_command_when_ready() {
    let db = test_database().await;
    let user = create_user(&db, true).await;
    let llm = ScriptedLlm::returning_actions(json!({ "actions": [] }));

    let result = process_message(&db, &llm, &params_for(&user, "  /START  ")).await;
    assert_eq!(result.message, messages::ALL_SET);
}

#[tokio::test]
async fn test_meal_recording_end_to_end() {
    let db = test_database().await;
    let user = create_user(&db, true).await;
    let llm = ScriptedLlm::returning_actions(json!({
        "actions": [{
            "intent": "RECORD_MEALS_AND_CALORIES",
            "items": [{
                "name": "eggs",
                "estimatedCaloriesPerPortion": { "min": 140, "max": 160, "units": "kcal" },
                "numPortions": 2
            }]
        }]
    }));

    let params = params_for(&user, "ate 2 eggs, about 140-160 kcal each");
    let result = process_message(&db, &llm, &params).await;

    assert!(!result.is_error);
    assert_eq!(result.message, "Narrated reply.");

    // Persisted point estimate: round(((140+160)/2) * 2) = 300
    let meals = db
        .meals_in_range(user.id, 0, i64::MAX)
        .await
        .unwrap();
    assert_eq!(meals.len(), 1);
    assert!((meals[0].total_calories.value - 300.0).abs() < f64::EPSILON);

    // One usage record per external call, in accumulation order
    let titles: Vec<&str> = result.usage_metrics.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Stage 1 Usage", "Infer Date", "Stage 2 Usage"]);
    let totals = result.total_cost_by_currency();
    assert_eq!(totals.len(), 1);
    assert!((totals[0].value - 0.0045).abs() < 1e-12);

    // Progress update side message for the meal's day
    assert_eq!(result.additional_messages.len(), 1);
    assert!(result.additional_messages[0].contains("Your progress for 2024-03-10"));
    assert!(result.additional_messages[0].contains("300 kcal"));

    // Action log mentions the recorded total
    assert!(result
        .actions_taken
        .iter()
        .any(|a| a.contains("Recorded meal with calories: (300 kcal)")));
}

#[tokio::test]
async fn test_weight_recording_patches_profile() {
    let db = test_database().await;
    let user = create_user(&db, true).await;
    let llm = ScriptedLlm::returning_actions(json!({
        "actions": [{
            "intent": "RECORD_WEIGHT",
            "weight": { "value": 79.5, "units": "kg" }
        }]
    }));

    let result = process_message(&db, &llm, &params_for(&user, "weighed 79.5 kg")).await;
    assert!(!result.is_error);
    assert!(result
        .actions_taken
        .iter()
        .any(|a| a.contains("Recorded weight: 79.5 kg")));

    // Weight summary side message covers the last 3 days
    assert!(result.additional_messages[0].starts_with("Weight summary for the last 3 days:"));

    // The profile's current weight is kept in sync
    let updated = db.get_user_required(user.id).await.unwrap();
    assert!((updated.weight.unwrap().value - 79.5).abs() < f64::EPSILON);

    let weights = db.weights_in_range(user.id, 0, i64::MAX).await.unwrap();
    assert_eq!(weights.len(), 1);
}

#[tokio::test]
async fn test_onboarding_transition_fires_once() {
    let db = test_database().await;
    // timezone + weight present; gender, age, height arrive in one message
    let user = create_user(&db, false).await;
    let llm = ScriptedLlm::returning_actions(json!({
        "actions": [
            { "intent": "SET_USER_GENDER", "gender": "female" },
            { "intent": "SET_USER_AGE", "age": 34 },
            { "intent": "SET_USER_HEIGHT", "height": { "value": 170, "units": "cm" } }
        ]
    }));

    let params = params_for(&user, "I'm a 34-year-old female, 170 cm tall");
    let result = process_message(&db, &llm, &params).await;

    assert!(!result.is_error);
    assert!(result
        .actions_taken
        .iter()
        .any(|a| a == "Account is ready to use the app!"));

    let updated = db.get_user_required(user.id).await.unwrap();
    assert!(updated.is_ready());
    assert_eq!(updated.year_of_birth, Some(1990));

    // Dispatching again when already ready does not re-emit the message
    let again = process_message(&db, &llm, &params).await;
    assert!(!again
        .actions_taken
        .iter()
        .any(|a| a == "Account is ready to use the app!"));
}

#[tokio::test]
async fn test_daily_summary_request() {
    let db = test_database().await;
    let user = create_user(&db, true).await;
    let llm = ScriptedLlm::returning_actions(json!({
        "actions": [{ "intent": "GET_DAILY_SUMMARY" }]
    }));

    let result = process_message(&db, &llm, &params_for(&user, "how am I doing today?")).await;
    assert!(!result.is_error);
    assert!(result
        .actions_taken
        .iter()
        .any(|a| a == "Retrieved daily summary. Comparing with yesterday."));
    let summary_text = &result.additional_messages[0];
    assert!(summary_text.contains("Summary Across All Days"));
    // Two day headers: yesterday and today
    assert!(summary_text.contains("2024-03-09"));
    assert!(summary_text.contains("2024-03-10"));
}

#[tokio::test]
async fn test_edit_previous_action_is_recognized_noop() {
    let db = test_database().await;
    let user = create_user(&db, true).await;
    let llm = ScriptedLlm::returning_actions(json!({
        "actions": [{ "intent": "EDIT_PREVIOUS_ACTION" }]
    }));

    let result = process_message(&db, &llm, &params_for(&user, "change yesterday's meal")).await;
    assert!(!result.is_error);
    assert!(result
        .actions_taken
        .iter()
        .any(|a| a.contains("not currently supported")));
}

#[tokio::test]
async fn test_extraction_failure_yields_apology() {
    let db = test_database().await;
    let user = create_user(&db, true).await;
    let llm = ScriptedLlm {
        stage1: json!({ "actions": [] }),
        inferred_parts: json!({ "parts": [] }),
        fail_stage1: true,
        fail_format: false,
    };

    let result = process_message(&db, &llm, &params_for(&user, "hello")).await;
    assert!(result.is_error);
    assert_eq!(result.message, messages::APOLOGY);
    assert!(result.usage_metrics.is_empty());
}

#[tokio::test]
async fn test_narration_failure_preserves_stage1_usage() {
    let db = test_database().await;
    let user = create_user(&db, true).await;
    let llm = ScriptedLlm {
        stage1: json!({
            "actions": [{ "intent": "GET_GENERAL_ADVICE", "advice": "sleep more" }]
        }),
        inferred_parts: json!({ "parts": [] }),
        fail_stage1: false,
        fail_format: true,
    };

    let result = process_message(&db, &llm, &params_for(&user, "any advice?")).await;
    assert!(result.is_error);
    assert_eq!(result.message, messages::APOLOGY);
    // Partial spend must never be silently dropped
    let titles: Vec<&str> = result.usage_metrics.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Stage 1 Usage"]);
}

#[tokio::test]
async fn test_explicit_date_in_message_backdates_the_record() {
    let db = test_database().await;
    let user = create_user(&db, true).await;
    let llm = ScriptedLlm {
        stage1: json!({
            "actions": [{
                "intent": "RECORD_WEIGHT",
                "weight": { "value": 81.0, "units": "kg" }
            }]
        }),
        inferred_parts: json!({
            "parts": [
                { "type": "date", "date": "2024-03-08" },
                { "type": "time", "time": "07:30:00" }
            ]
        }),
        fail_stage1: false,
        fail_format: false,
    };

    let result = process_message(&db, &llm, &params_for(&user, "I was 81 kg on March 8th")).await;
    assert!(!result.is_error);

    let weights = db.weights_in_range(user.id, 0, i64::MAX).await.unwrap();
    assert_eq!(weights.len(), 1);
    // 2024-03-08 07:30 SGT is 2024-03-07 23:30 UTC
    let expected = Utc
        .with_ymd_and_hms(2024, 3, 7, 23, 30, 0)
        .unwrap()
        .timestamp_millis();
    assert_eq!(weights[0].timestamp, expected);
}
