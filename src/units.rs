// ABOUTME: Unit-safe numeric primitives for mass, energy, and length quantities
// ABOUTME: Provides checked arithmetic that refuses to combine mismatched units
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Unit-Safe Quantities
//!
//! Every stored numeric fact carries its unit. Arithmetic across quantities
//! is only defined when units are identical; a mismatch is a programmer error
//! surfaced as [`ErrorCode::UnitMismatch`](crate::errors::ErrorCode), never a
//! silent coercion. The unit set is deliberately closed: the system records
//! kilograms, kilocalories, and centimeters and nothing else.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of measurement units used across the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    /// Mass in kilograms
    #[serde(rename = "kg")]
    Kilograms,
    /// Energy in kilocalories
    #[serde(rename = "kcal")]
    Kilocalories,
    /// Length in centimeters
    #[serde(rename = "cm")]
    Centimeters,
}

impl Unit {
    /// Wire/display representation, matching the stored document shape
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Kilograms => "kg",
            Self::Kilocalories => "kcal",
            Self::Centimeters => "cm",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A numeric value tagged with its unit
///
/// Serializes as `{ "value": 70.0, "units": "kg" }` to match the stored
/// record shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    /// Magnitude in `units`
    pub value: f64,
    /// Unit of measurement
    #[serde(rename = "units")]
    pub unit: Unit,
}

impl Quantity {
    /// Create a quantity
    #[must_use]
    pub const fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Kilograms shorthand
    #[must_use]
    pub const fn kilograms(value: f64) -> Self {
        Self::new(value, Unit::Kilograms)
    }

    /// Kilocalories shorthand
    #[must_use]
    pub const fn kilocalories(value: f64) -> Self {
        Self::new(value, Unit::Kilocalories)
    }

    /// Centimeters shorthand
    #[must_use]
    pub const fn centimeters(value: f64) -> Self {
        Self::new(value, Unit::Centimeters)
    }

    /// Ensure this quantity carries the expected unit
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::UnitMismatch`](crate::errors::ErrorCode) when the
    /// unit differs. This is an internal invariant check, not user-facing
    /// validation.
    pub fn expect_unit(&self, unit: Unit) -> AppResult<()> {
        if self.unit == unit {
            Ok(())
        } else {
            Err(AppError::unit_mismatch(format!(
                "expected {unit}, got {}",
                self.unit
            )))
        }
    }

    /// Add another quantity of the same unit
    ///
    /// # Errors
    ///
    /// Returns an error on unit mismatch.
    pub fn checked_add(&self, other: &Self) -> AppResult<Self> {
        self.require_same_unit(other, "add")?;
        Ok(Self::new(self.value + other.value, self.unit))
    }

    /// Subtract another quantity of the same unit
    ///
    /// # Errors
    ///
    /// Returns an error on unit mismatch.
    pub fn checked_sub(&self, other: &Self) -> AppResult<Self> {
        self.require_same_unit(other, "subtract")?;
        Ok(Self::new(self.value - other.value, self.unit))
    }

    /// Absolute magnitude with the same unit
    #[must_use]
    pub fn abs(&self) -> Self {
        Self::new(self.value.abs(), self.unit)
    }

    fn require_same_unit(&self, other: &Self, op: &str) -> AppResult<()> {
        if self.unit == other.unit {
            Ok(())
        } else {
            Err(AppError::unit_mismatch(format!(
                "cannot {op} {} and {}",
                self.unit, other.unit
            )))
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Sum quantities, requiring every element to carry `unit`
///
/// An empty iterator sums to zero in `unit`.
///
/// # Errors
///
/// Returns an error if any element carries a different unit.
pub fn sum_quantities<'a, I>(quantities: I, unit: Unit) -> AppResult<Quantity>
where
    I: IntoIterator<Item = &'a Quantity>,
{
    let mut total = Quantity::new(0.0, unit);
    for q in quantities {
        total = total.checked_add(q)?;
    }
    Ok(total)
}

/// Arithmetic mean of quantities, requiring every element to carry `unit`
///
/// Returns `None` for an empty iterator; a mean over zero samples is a
/// no-data condition, not a zero value.
///
/// # Errors
///
/// Returns an error if any element carries a different unit.
pub fn mean_quantity<'a, I>(quantities: I, unit: Unit) -> AppResult<Option<Quantity>>
where
    I: IntoIterator<Item = &'a Quantity>,
{
    let mut total = 0.0;
    let mut count = 0usize;
    for q in quantities {
        q.expect_unit(unit)?;
        total += q.value;
        count += 1;
    }
    if count == 0 {
        return Ok(None);
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = total / count as f64;
    Ok(Some(Quantity::new(mean, unit)))
}
