// ABOUTME: Closed intent catalog and the typed payload each action carries
// ABOUTME: Includes the JSON schemas constraining the extraction calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Action Schema & Intent Catalog
//!
//! The closed set of intents the extraction stage may return, modeled as a
//! tagged union over `intent` so dispatch is an exhaustive match rather than
//! a runtime handler map. The JSON schemas sent with the extraction calls
//! are built here, next to the types they constrain.

use crate::llm::OutputSchema;
use crate::models::{CalorieRange, Gender, MealItem};
use crate::units::Quantity;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Intent tag strings as they appear on the wire and in prompts
pub mod intents {
    /// Respond with general health advice
    pub const GET_GENERAL_ADVICE: &str = "GET_GENERAL_ADVICE";
    /// Estimate calories without persisting anything
    pub const ESTIMATE_CALORIES: &str = "ESTIMATE_CALORIES";
    /// Record a weight measurement
    pub const RECORD_WEIGHT: &str = "RECORD_WEIGHT";
    /// Record a meal with calorie estimates
    pub const RECORD_MEALS_AND_CALORIES: &str = "RECORD_MEALS_AND_CALORIES";
    /// Record an activity with burn estimates
    pub const RECORD_ACTIVITIES_AND_BURN: &str = "RECORD_ACTIVITIES_AND_BURN";
    /// Set the user's timezone
    pub const SET_TIMEZONE: &str = "SET_TIMEZONE";
    /// Produce a 7-day summary
    pub const GET_WEEKLY_SUMMARY: &str = "GET_WEEKLY_SUMMARY";
    /// Produce a 2-day summary (today vs yesterday)
    pub const GET_DAILY_SUMMARY: &str = "GET_DAILY_SUMMARY";
    /// Edit a previous action (recognized, not supported)
    pub const EDIT_PREVIOUS_ACTION: &str = "EDIT_PREVIOUS_ACTION";
    /// Set the user's gender
    pub const SET_USER_GENDER: &str = "SET_USER_GENDER";
    /// Set the user's age
    pub const SET_USER_AGE: &str = "SET_USER_AGE";
    /// Set the user's height
    pub const SET_USER_HEIGHT: &str = "SET_USER_HEIGHT";

    /// Every intent, in catalog order
    pub const ALL: &[&str] = &[
        GET_GENERAL_ADVICE,
        ESTIMATE_CALORIES,
        RECORD_WEIGHT,
        RECORD_MEALS_AND_CALORIES,
        RECORD_ACTIVITIES_AND_BURN,
        SET_TIMEZONE,
        GET_WEEKLY_SUMMARY,
        GET_DAILY_SUMMARY,
        EDIT_PREVIOUS_ACTION,
        SET_USER_GENDER,
        SET_USER_AGE,
        SET_USER_HEIGHT,
    ];
}

/// One line item of a calorie estimation request (nothing is persisted)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateItem {
    /// What is being estimated
    pub name: String,
    /// Estimated calories for one unit
    #[serde(rename = "estimatedCalories")]
    pub estimated_calories: CalorieRange,
    /// How many units
    pub quantity: f64,
}

/// A single extracted action, tagged by intent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "intent")]
pub enum Action {
    /// Record a weight measurement
    #[serde(rename = "RECORD_WEIGHT")]
    RecordWeight {
        /// Measured weight (kilograms)
        weight: Quantity,
    },
    /// Record a meal with per-item calorie ranges
    #[serde(rename = "RECORD_MEALS_AND_CALORIES")]
    RecordMealsAndCalories {
        /// Line items with per-portion estimate ranges
        items: Vec<MealItem>,
    },
    /// Record an activity with a burn range
    #[serde(rename = "RECORD_ACTIVITIES_AND_BURN")]
    RecordActivitiesAndBurn {
        /// Name or description of the activity
        activity: String,
        /// Estimated burn range
        #[serde(rename = "caloriesBurned")]
        calories_burned: CalorieRange,
    },
    /// Relay general health advice (no persistence)
    #[serde(rename = "GET_GENERAL_ADVICE")]
    GetGeneralAdvice {
        /// The advice text produced by extraction
        advice: String,
    },
    /// Estimate calories without recording (no persistence)
    #[serde(rename = "ESTIMATE_CALORIES")]
    EstimateCalories {
        /// Items being estimated
        items: Vec<EstimateItem>,
    },
    /// Set the user's timezone
    #[serde(rename = "SET_TIMEZONE")]
    SetTimezone {
        /// IANA timezone name
        timezone: String,
    },
    /// Produce a 7-day summary
    #[serde(rename = "GET_WEEKLY_SUMMARY")]
    GetWeeklySummary,
    /// Produce a 2-day summary
    #[serde(rename = "GET_DAILY_SUMMARY")]
    GetDailySummary,
    /// Recognized but intentionally unsupported
    #[serde(rename = "EDIT_PREVIOUS_ACTION")]
    EditPreviousAction,
    /// Set the user's gender
    #[serde(rename = "SET_USER_GENDER")]
    SetUserGender {
        /// Extracted gender
        gender: Gender,
    },
    /// Set the user's age in years
    #[serde(rename = "SET_USER_AGE")]
    SetUserAge {
        /// Age in years (converted to year-of-birth at write time)
        age: i32,
    },
    /// Set the user's height
    #[serde(rename = "SET_USER_HEIGHT")]
    SetUserHeight {
        /// Height (centimeters)
        height: Quantity,
    },
}

impl Action {
    /// The wire tag for this action
    #[must_use]
    pub const fn intent(&self) -> &'static str {
        match self {
            Self::RecordWeight { .. } => intents::RECORD_WEIGHT,
            Self::RecordMealsAndCalories { .. } => intents::RECORD_MEALS_AND_CALORIES,
            Self::RecordActivitiesAndBurn { .. } => intents::RECORD_ACTIVITIES_AND_BURN,
            Self::GetGeneralAdvice { .. } => intents::GET_GENERAL_ADVICE,
            Self::EstimateCalories { .. } => intents::ESTIMATE_CALORIES,
            Self::SetTimezone { .. } => intents::SET_TIMEZONE,
            Self::GetWeeklySummary => intents::GET_WEEKLY_SUMMARY,
            Self::GetDailySummary => intents::GET_DAILY_SUMMARY,
            Self::EditPreviousAction => intents::EDIT_PREVIOUS_ACTION,
            Self::SetUserGender { .. } => intents::SET_USER_GENDER,
            Self::SetUserAge { .. } => intents::SET_USER_AGE,
            Self::SetUserHeight { .. } => intents::SET_USER_HEIGHT,
        }
    }
}

/// Output of the stage-1 extraction call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stage1Output {
    /// Actions to dispatch, possibly empty
    pub actions: Vec<Action>,
}

/// Output of the stage-2 narration call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage2Output {
    /// Final free-text reply to the user
    pub response: String,
}

/// A date or time component inferred from the user's message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InferredDatePart {
    /// An explicit date, `yyyy-MM-dd`
    Date {
        /// The date in `yyyy-MM-dd` format
        date: String,
    },
    /// An explicit time, `HH:mm:ss`
    Time {
        /// The time in `HH:mm:ss` format
        time: String,
    },
}

/// Output of the date-inference call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferredDateParts {
    /// Zero or more explicit components found in the message
    pub parts: Vec<InferredDatePart>,
}

// ============================================================================
// JSON schemas for the extraction calls
// ============================================================================

fn quantity_schema(unit: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "value": { "type": "number" },
            "units": { "type": "string", "enum": [unit] }
        },
        "required": ["value", "units"],
        "additionalProperties": false
    })
}

fn calorie_range_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "min": { "type": "number" },
            "max": { "type": "number" },
            "units": { "type": "string", "enum": ["kcal"] }
        },
        "required": ["min", "max", "units"],
        "additionalProperties": false
    })
}

fn intent_tag(intent: &str) -> serde_json::Value {
    json!({ "type": "string", "enum": [intent] })
}

/// Schema constraining the stage-1 extraction call
#[must_use]
pub fn stage1_output_schema() -> OutputSchema {
    let weight_action = json!({
        "type": "object",
        "properties": {
            "intent": intent_tag(intents::RECORD_WEIGHT),
            "weight": quantity_schema("kg")
        },
        "required": ["intent", "weight"],
        "additionalProperties": false
    });
    let meal_action = json!({
        "type": "object",
        "properties": {
            "intent": intent_tag(intents::RECORD_MEALS_AND_CALORIES),
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "estimatedCaloriesPerPortion": calorie_range_schema(),
                        "numPortions": { "type": "number" }
                    },
                    "required": ["name", "estimatedCaloriesPerPortion", "numPortions"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["intent", "items"],
        "additionalProperties": false
    });
    let activity_action = json!({
        "type": "object",
        "properties": {
            "intent": intent_tag(intents::RECORD_ACTIVITIES_AND_BURN),
            "activity": { "type": "string" },
            "caloriesBurned": calorie_range_schema()
        },
        "required": ["intent", "activity", "caloriesBurned"],
        "additionalProperties": false
    });
    let advice_action = json!({
        "type": "object",
        "properties": {
            "intent": intent_tag(intents::GET_GENERAL_ADVICE),
            "advice": { "type": "string" }
        },
        "required": ["intent", "advice"],
        "additionalProperties": false
    });
    let estimate_action = json!({
        "type": "object",
        "properties": {
            "intent": intent_tag(intents::ESTIMATE_CALORIES),
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "estimatedCalories": calorie_range_schema(),
                        "quantity": { "type": "number" }
                    },
                    "required": ["name", "estimatedCalories", "quantity"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["intent", "items"],
        "additionalProperties": false
    });
    let timezone_action = json!({
        "type": "object",
        "properties": {
            "intent": intent_tag(intents::SET_TIMEZONE),
            "timezone": { "type": "string" }
        },
        "required": ["intent", "timezone"],
        "additionalProperties": false
    });
    let weekly_action = json!({
        "type": "object",
        "properties": { "intent": intent_tag(intents::GET_WEEKLY_SUMMARY) },
        "required": ["intent"],
        "additionalProperties": false
    });
    let daily_action = json!({
        "type": "object",
        "properties": { "intent": intent_tag(intents::GET_DAILY_SUMMARY) },
        "required": ["intent"],
        "additionalProperties": false
    });
    let edit_action = json!({
        "type": "object",
        "properties": { "intent": intent_tag(intents::EDIT_PREVIOUS_ACTION) },
        "required": ["intent"],
        "additionalProperties": false
    });
    let gender_action = json!({
        "type": "object",
        "properties": {
            "intent": intent_tag(intents::SET_USER_GENDER),
            "gender": { "type": "string", "enum": ["male", "female"] }
        },
        "required": ["intent", "gender"],
        "additionalProperties": false
    });
    let age_action = json!({
        "type": "object",
        "properties": {
            "intent": intent_tag(intents::SET_USER_AGE),
            "age": { "type": "integer" }
        },
        "required": ["intent", "age"],
        "additionalProperties": false
    });
    let height_action = json!({
        "type": "object",
        "properties": {
            "intent": intent_tag(intents::SET_USER_HEIGHT),
            "height": quantity_schema("cm")
        },
        "required": ["intent", "height"],
        "additionalProperties": false
    });

    OutputSchema {
        name: "user_health_information_stage_1".to_owned(),
        schema: json!({
            "type": "object",
            "properties": {
                "actions": {
                    "type": "array",
                    "items": {
                        "anyOf": [
                            weight_action,
                            meal_action,
                            activity_action,
                            advice_action,
                            estimate_action,
                            timezone_action,
                            weekly_action,
                            daily_action,
                            edit_action,
                            gender_action,
                            age_action,
                            height_action
                        ]
                    }
                }
            },
            "required": ["actions"],
            "additionalProperties": false
        }),
    }
}

/// Schema constraining the date-inference call
#[must_use]
pub fn infer_date_schema() -> OutputSchema {
    OutputSchema {
        name: "infer_date".to_owned(),
        schema: json!({
            "type": "object",
            "properties": {
                "parts": {
                    "type": "array",
                    "items": {
                        "anyOf": [
                            {
                                "type": "object",
                                "properties": {
                                    "type": { "type": "string", "enum": ["date"] },
                                    "date": { "type": "string", "description": "The date in yyyy-MM-dd format" }
                                },
                                "required": ["type", "date"],
                                "additionalProperties": false
                            },
                            {
                                "type": "object",
                                "properties": {
                                    "type": { "type": "string", "enum": ["time"] },
                                    "time": { "type": "string", "description": "The time in HH:mm:ss format" }
                                },
                                "required": ["type", "time"],
                                "additionalProperties": false
                            }
                        ]
                    }
                }
            },
            "required": ["parts"],
            "additionalProperties": false
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Unit;

    #[test]
    fn test_intent_tags_match_serde_representation() {
        // Completeness check: the tag reported by `intent()` must equal the
        // serde tag for every variant.
        let actions = vec![
            Action::RecordWeight {
                weight: Quantity::kilograms(80.0),
            },
            Action::RecordMealsAndCalories { items: vec![] },
            Action::RecordActivitiesAndBurn {
                activity: "run".into(),
                calories_burned: CalorieRange {
                    min: 100.0,
                    max: 200.0,
                    unit: Unit::Kilocalories,
                },
            },
            Action::GetGeneralAdvice {
                advice: "drink water".into(),
            },
            Action::EstimateCalories { items: vec![] },
            Action::SetTimezone {
                timezone: "Europe/London".into(),
            },
            Action::GetWeeklySummary,
            Action::GetDailySummary,
            Action::EditPreviousAction,
            Action::SetUserGender {
                gender: Gender::Female,
            },
            Action::SetUserAge { age: 30 },
            Action::SetUserHeight {
                height: Quantity::centimeters(175.0),
            },
        ];
        assert_eq!(actions.len(), intents::ALL.len());
        for action in actions {
            let value = serde_json::to_value(&action).unwrap();
            assert_eq!(value["intent"], action.intent());
            assert!(intents::ALL.contains(&action.intent()));
        }
    }

    #[test]
    fn test_stage1_output_round_trip() {
        let payload = serde_json::json!({
            "actions": [
                {
                    "intent": "RECORD_MEALS_AND_CALORIES",
                    "items": [
                        {
                            "name": "eggs",
                            "estimatedCaloriesPerPortion": { "min": 140, "max": 160, "units": "kcal" },
                            "numPortions": 2
                        }
                    ]
                },
                { "intent": "GET_WEEKLY_SUMMARY" }
            ]
        });
        let output: Stage1Output = serde_json::from_value(payload).unwrap();
        assert_eq!(output.actions.len(), 2);
        match &output.actions[0] {
            Action::RecordMealsAndCalories { items } => {
                assert_eq!(items.len(), 1);
                assert!((items[0].point_estimate_kcal() - 300.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_intent_is_rejected() {
        let payload = serde_json::json!({ "actions": [{ "intent": "DELETE_EVERYTHING" }] });
        assert!(serde_json::from_value::<Stage1Output>(payload).is_err());
    }

    #[test]
    fn test_schema_names_every_intent() {
        let schema = stage1_output_schema();
        let rendered = schema.schema.to_string();
        for intent in intents::ALL {
            assert!(rendered.contains(intent), "schema missing intent {intent}");
        }
    }

    #[test]
    fn test_inferred_date_parts_deserialize() {
        let payload = serde_json::json!({
            "parts": [
                { "type": "date", "date": "2024-03-09" },
                { "type": "time", "time": "08:30:00" }
            ]
        });
        let parts: InferredDateParts = serde_json::from_value(payload).unwrap();
        assert_eq!(parts.parts.len(), 2);
    }
}
