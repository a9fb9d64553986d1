// ABOUTME: Prompt builders for the two pipeline stages and date inference
// ABOUTME: Embeds the current user-local date-time and the intent catalog
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Prompts
//!
//! The stage-1 and stage-2 calls share one system prompt parameterized by
//! stage; it embeds the user-local current date-time and the full intent
//! catalog. Date inference uses its own small prompt.

use crate::pipeline::actions::intents;
use std::fmt;

/// Which pipeline stage a system prompt is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Extraction: free text to typed actions
    Stage1,
    /// Narration: action log to final reply
    Stage2,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stage1 => write!(f, "STAGE_1"),
            Self::Stage2 => write!(f, "STAGE_2"),
        }
    }
}

/// Build the shared system prompt for a stage
///
/// `current_date_str` is the user-local date-time, `yyyy-MM-dd HH:mm:ss`.
#[must_use]
pub fn system_prompt(current_date_str: &str, stage: Stage) -> String {
    format!(
        r#"# Healthbot Agent Overview
The Healthbot system processes a user's message and determines the steps to take. There are 2 stages
1. STAGE_1: Process the user's message and return the list of actions to take.
2. STAGE_2: Review the actions taken and return a concise response to the user.

CURRENT STAGE: {stage}

## Dates
Current date: {current_date_str}
All dates MUST follow format yyyy-MM-dd HH:mm:ss - e.g. 2024-01-01 00:00:00

## Allowed User intentions
Each user message can have multiple intentions. The following are the allowed intentions:

### ENUM: {general_advice}
Respond with clear precise advice, favoring numbers and verified data backed by research.

### ENUM: {estimate_calories}
Estimate the calories for the user's input. Provide a range (min and max) for each item.

### ENUM: {record_weight}
Extract user's weight information if provided.

### ENUM: {record_meals}
 - Evaluate the items a user has eaten. For each item, determine the calories per portion, and number of portions.
 - If multiple portions are provided, estimate the calories per portion. The system will multiply the calories per portion by the number of portions to estimate the user's total calories.
 - Provide a range (min and max) for each estimate. Aim to be as precise as possible.

### ENUM: {record_activities}
Extract user's activity information and estimate calorie burn information if provided. Provide a range (min and max) for the calorie burn.

### ENUM: {set_timezone}
Set the user's timezone. The timezone should be in a standard format (e.g., 'America/New_York', 'Europe/London').

### ENUM: {weekly_summary}
Send "Here is your weekly summary." to the user. (the actual summary will be appended to the message).
Keep your response to one line.

### ENUM: {daily_summary}
Send "Here is your daily summary." to the user. (the actual summary will be appended to the message)
Keep your response to one line.

### ENUM: {edit_previous}
Detect if the user wants to edit a previous action (activity, meal, or weight). Inform the user that this feature is not currently supported.

### ENUM: {set_gender}
Set the user's gender (male or female). This is used for BMR calculation.

### ENUM: {set_age}
Set the user's age in years. This is used for BMR calculation.

### ENUM: {set_height}
Set the user's height in centimeters. This is used for BMR calculation.

## Output Format for STAGE_2
Plain text only. Do not use markdown or any formatting tokens. Prefer whitespace formatting, and use - for bullet points. For emphasis, use caps.
Do not bold, italicize, or underline.
"#,
        stage = stage,
        current_date_str = current_date_str,
        general_advice = intents::GET_GENERAL_ADVICE,
        estimate_calories = intents::ESTIMATE_CALORIES,
        record_weight = intents::RECORD_WEIGHT,
        record_meals = intents::RECORD_MEALS_AND_CALORIES,
        record_activities = intents::RECORD_ACTIVITIES_AND_BURN,
        set_timezone = intents::SET_TIMEZONE,
        weekly_summary = intents::GET_WEEKLY_SUMMARY,
        daily_summary = intents::GET_DAILY_SUMMARY,
        edit_previous = intents::EDIT_PREVIOUS_ACTION,
        set_gender = intents::SET_USER_GENDER,
        set_age = intents::SET_USER_AGE,
        set_height = intents::SET_USER_HEIGHT,
    )
}

/// Build the date-inference prompt
#[must_use]
pub fn infer_date_prompt(current_date_str: &str, message: &str) -> String {
    format!(
        r"## Goal
Infer the date from the user's message.

## Context
Current date: {current_date_str}

## Format
Date Format: yyyy-MM-dd
Time Format: HH:mm:ss

### User's Message
{message}

## Output:
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_names_every_intent() {
        let prompt = system_prompt("2024-01-01 00:00:00", Stage::Stage1);
        for intent in intents::ALL {
            assert!(prompt.contains(intent), "prompt missing intent {intent}");
        }
        assert!(prompt.contains("CURRENT STAGE: STAGE_1"));
        assert!(prompt.contains("Current date: 2024-01-01 00:00:00"));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Stage2.to_string(), "STAGE_2");
    }
}
