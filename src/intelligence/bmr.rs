// ABOUTME: Basal Metabolic Rate estimation using the Harris-Benedict equations
// ABOUTME: Falls back to fixed profile assumptions so the baseline is always computable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # BMR Estimator
//!
//! Maps a user's biometric profile to a baseline daily energy burn in
//! kcal/day. Missing profile fields fall back to fixed defaults so the
//! estimator works even before onboarding completes; the estimate reports
//! which assumptions it used so narration can mention them.
//!
//! Formula (revised Harris-Benedict):
//! - male:   `88.362 + 13.397*kg + 4.799*cm - 5.677*age`
//! - female: `447.593 + 9.247*kg + 3.098*cm - 4.330*age`

use crate::constants::bmr as coef;
use crate::errors::AppResult;
use crate::models::{Gender, User};
use crate::units::{Quantity, Unit};
use serde::{Deserialize, Serialize};

/// The profile values the estimate was actually computed from
///
/// Equal to the user's profile where populated, fallback defaults elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BmrAssumptions {
    /// Gender used in the gender-branched formula
    pub gender: Gender,
    /// Age in years at `current_year`
    pub age: i32,
    /// Year of birth the age was derived from
    pub year_of_birth: i32,
    /// Height in centimeters
    pub height: Quantity,
    /// Weight in kilograms
    pub weight: Quantity,
}

/// A baseline daily burn estimate with its input assumptions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BmrEstimate {
    /// Baseline burn in kcal/day
    pub bmr: Quantity,
    /// Profile values the formula was evaluated with
    pub assumptions: BmrAssumptions,
}

/// Estimate the user's Basal Metabolic Rate for the given calendar year
///
/// # Errors
///
/// Returns a unit-mismatch error if the stored height is not in centimeters
/// or the stored weight is not in kilograms. That is an internal invariant
/// violation (records are only ever written in those units), not user-facing
/// validation.
pub fn estimate_bmr(user: &User, current_year: i32) -> AppResult<BmrEstimate> {
    let gender = user.gender.unwrap_or(Gender::Male);
    let year_of_birth = user.year_of_birth.unwrap_or(coef::DEFAULT_YEAR_OF_BIRTH);
    let age = current_year - year_of_birth;
    let height = user
        .height
        .unwrap_or(Quantity::centimeters(coef::DEFAULT_HEIGHT_CM));
    let weight = user
        .weight
        .unwrap_or(Quantity::kilograms(coef::DEFAULT_WEIGHT_KG));

    weight.expect_unit(Unit::Kilograms)?;
    height.expect_unit(Unit::Centimeters)?;

    let age_f = f64::from(age);
    let value = match gender {
        Gender::Male => {
            coef::MALE_BASE + coef::MALE_WEIGHT_COEF * weight.value
                + coef::MALE_HEIGHT_COEF * height.value
                - coef::MALE_AGE_COEF * age_f
        }
        Gender::Female => {
            coef::FEMALE_BASE + coef::FEMALE_WEIGHT_COEF * weight.value
                + coef::FEMALE_HEIGHT_COEF * height.value
                - coef::FEMALE_AGE_COEF * age_f
        }
    };

    Ok(BmrEstimate {
        bmr: Quantity::kilocalories(value),
        assumptions: BmrAssumptions {
            gender,
            age,
            year_of_birth,
            height,
            weight,
        },
    })
}
