// ABOUTME: Intelligence module for health analytics - BMR estimation and daily rollups
// ABOUTME: Pure aggregation logic over stored meals, weights, and activities
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Intelligence Module
//!
//! The numeric heart of the assistant: the BMR baseline estimator and the
//! daily rollup engine that buckets raw records into timezone-correct daily
//! and multi-day statistics.

/// Basal Metabolic Rate estimation with fallback assumptions
pub mod bmr;
/// Daily rollup engine: per-day and cross-day statistics
pub mod rollup;

pub use bmr::{estimate_bmr, BmrAssumptions, BmrEstimate};
pub use rollup::{compute_daily_summaries, compute_overview, last_n_days_summary};
