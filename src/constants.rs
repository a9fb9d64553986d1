// ABOUTME: System-wide constants for the Healthbot pipeline and rollup engine
// ABOUTME: Contains time math, BMR formula coefficients, and canned bot texts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Constants Module
//!
//! Hardcoded domain constants: calendar math for the rollup engine,
//! Harris-Benedict coefficients and fallback assumptions for the BMR
//! estimator, and the canned texts the bot sends outside of LLM narration.

/// Time and bucketing constants for the daily rollup engine
pub mod time {
    /// One calendar day, in milliseconds. Rollup buckets are fixed slices of
    /// this width measured from the query window start.
    pub const ONE_DAY_MS: i64 = 24 * 60 * 60 * 1000;

    /// A weight sample taken before this local hour counts as a morning sample
    pub const MORNING_END_HOUR: u32 = 8;

    /// A weight sample taken at or after this local hour counts as an evening sample
    pub const EVENING_START_HOUR: u32 = 16;

    /// Local date-time format embedded in prompts and parsed back from the
    /// date-inference call
    pub const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
}

/// Harris-Benedict BMR formula coefficients and fallback assumptions
///
/// Reference: Harris, J.A., & Benedict, F.G. (1918). A biometric study of
/// human basal metabolism. Revised coefficients (Roza & Shizgal, 1984).
pub mod bmr {
    /// Male base constant (kcal/day)
    pub const MALE_BASE: f64 = 88.362;
    /// Male weight coefficient (kcal/day per kg)
    pub const MALE_WEIGHT_COEF: f64 = 13.397;
    /// Male height coefficient (kcal/day per cm)
    pub const MALE_HEIGHT_COEF: f64 = 4.799;
    /// Male age coefficient (kcal/day per year, subtracted)
    pub const MALE_AGE_COEF: f64 = 5.677;

    /// Female base constant (kcal/day)
    pub const FEMALE_BASE: f64 = 447.593;
    /// Female weight coefficient (kcal/day per kg)
    pub const FEMALE_WEIGHT_COEF: f64 = 9.247;
    /// Female height coefficient (kcal/day per cm)
    pub const FEMALE_HEIGHT_COEF: f64 = 3.098;
    /// Female age coefficient (kcal/day per year, subtracted)
    pub const FEMALE_AGE_COEF: f64 = 4.330;

    /// Fallback year of birth when the profile has none
    pub const DEFAULT_YEAR_OF_BIRTH: i32 = 2000;
    /// Fallback height in centimeters
    pub const DEFAULT_HEIGHT_CM: f64 = 165.0;
    /// Fallback weight in kilograms
    pub const DEFAULT_WEIGHT_KG: f64 = 70.0;
}

/// Canned texts sent to the user without LLM involvement
pub mod messages {
    /// Reply for every internally-failed turn. Deliberately generic so that
    /// internal state never leaks to the end user.
    pub const APOLOGY: &str =
        "I couldn't process your request. Please try rephrasing your message.";

    /// Onboarding reply to `/start` when the profile is incomplete
    pub const WELCOME: &str = "Welcome! To get started, please set your timezone. You can say something like \"set my timezone to Singapore\".\n\nI also need some information to calculate your Basal Metabolic Rate (BMR). Please provide the following details:\n\n1. Your gender (male or female)\n2. Your age in years\n3. Your height in centimeters\n4. Your weight in kilograms\n\nYou can respond with something like: \"I'm a 30-year-old male, 175 cm tall.\"";

    /// Reply once the profile has everything BMR-based features need
    pub const ALL_SET: &str = "You're all set! 👍🏼\n\nIn this chat, I can help you with a variety of tasks to help you keep track of your health!\n\nHere are some things I can help with:\n  1. Keep track of your weight ⚖️\n  2. Keep track of your meals and calories 🥗🌯\n  3. Keep track of your activities and calorie burn 🏃🏻‍♂️🏃🏽‍♀️🔥\n  4. Set your timezone 🕥\n  5. Get a weekly summary of your activities 📊\n  6. Get a daily summary comparing today and yesterday 📅\n\nI can also provide you with general advice and estimate calories for your meals.";

    /// Confirmation text for the recognized-but-unsupported edit intent
    pub const EDIT_NOT_SUPPORTED: &str =
        "Editing previous actions is not currently supported. I apologize for the inconvenience.";
}

/// Titles attached to usage metrics, one per external LLM call
pub mod usage_titles {
    /// Stage-1 extraction call
    pub const STAGE_1: &str = "Stage 1 Usage";
    /// Stage-2 narration call
    pub const STAGE_2: &str = "Stage 2 Usage";
    /// Date-inference call made by record-* handlers
    pub const INFER_DATE: &str = "Infer Date";
}
