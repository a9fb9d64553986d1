// ABOUTME: Deterministic chat-text fragments for calories, deficits, and weights
// ABOUTME: Shared by rollup narration and individual action confirmations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

//! # Message Formatting Fragments
//!
//! Pure, unit-aware renderers producing Telegram-HTML chat text. Missing
//! values render as explicit "No data" sentinels, never as errors; a unit
//! mismatch between two operands is a hard error the caller must rule out
//! upstream.
//!
//! Sign conventions: a deficit (`calories_out - calories_in`) is favorable
//! and renders with 👍🏼; a surplus (negative deficit) renders with ⚠️. A
//! weight difference (`earlier - later`) of zero or more renders as "lost",
//! anything negative as "gained".

use crate::errors::AppResult;
use crate::models::{DailySummary, LastNDaysSummary};
use crate::units::Quantity;

/// Placeholder used wherever an optional value is absent
const NO_DATA: &str = "No data";

// ============================================================================
// Number helpers
// ============================================================================

/// Two decimal places with a redundant ".00" stripped: 600.5 -> "600.50",
/// 600.0 -> "600"
fn pretty_fixed2(value: f64) -> String {
    let fixed = format!("{value:.2}");
    fixed.strip_suffix(".00").map_or(fixed.clone(), String::from)
}

/// Up to two decimal places with trailing zeros trimmed: 80.10 -> "80.1",
/// 80.00 -> "80"
fn pretty_number(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_owned()
}

// ============================================================================
// Deficit / surplus fragment
// ============================================================================

/// Compute a deficit from a calories pair: `out - in` when both are present
///
/// # Errors
///
/// Returns an error if the two quantities carry different units.
pub fn deficit_from_calories(
    calories_in: Option<&Quantity>,
    calories_out: Option<&Quantity>,
) -> AppResult<Option<Quantity>> {
    match (calories_out, calories_in) {
        (Some(out), Some(cal_in)) => Ok(Some(out.checked_sub(cal_in)?)),
        _ => Ok(None),
    }
}

/// Render a deficit or surplus line
///
/// Examples: `Deficit: 👍🏼 1000 kcal`, `Surplus: ⚠️ 500 kcal`,
/// `Deficit: No data recorded`.
#[must_use]
pub fn format_deficit_surplus(deficit: Option<&Quantity>) -> String {
    let label = match deficit {
        Some(d) if d.value < 0.0 => "Surplus",
        _ => "Deficit",
    };
    let detail = deficit.map_or_else(
        || "No data recorded".to_owned(),
        |d| {
            let symbol = if d.value > 0.0 { "👍🏼" } else { "⚠️" };
            format!("{symbol} {} {}", pretty_fixed2(d.value.abs()), d.unit)
        },
    );
    format!("{label}: {detail}")
}

// ============================================================================
// Weight fragments
// ============================================================================

/// Render a single weight value: `<code>80.5 kg</code>` or `No data`
#[must_use]
pub fn format_weight(weight: Option<&Quantity>) -> String {
    weight.map_or_else(
        || NO_DATA.to_owned(),
        |w| format!("<code>{} {}</code>", pretty_number(w.value), w.unit),
    )
}

/// Render the difference between two optional weight samples
///
/// Both present: `earlier - later`, zero or more renders "lost" with 👍🏼,
/// negative renders "gained" with ⚠️, plus an `earlier -> later` detail.
/// Exactly one present: a single labeled point. Neither: `No data`.
///
/// # Errors
///
/// Returns an error if both samples are present with different units;
/// callers must guarantee unit consistency upstream.
pub fn format_weight_difference(
    earlier: Option<&Quantity>,
    later: Option<&Quantity>,
    earlier_label: &str,
    later_label: &str,
) -> AppResult<String> {
    match (earlier, later) {
        (Some(e), Some(l)) => {
            let lost = e.checked_sub(l)?;
            let (symbol, suffix) = if lost.value >= 0.0 {
                ("👍🏼", "lost")
            } else {
                ("⚠️", "gained")
            };
            Ok(format!(
                "{symbol} {} {suffix} | {} -> {}",
                format_weight(Some(&lost.abs())),
                format_weight(Some(e)),
                format_weight(Some(l)),
            ))
        }
        (Some(e), None) => Ok(format!("{earlier_label} @ {}", format_weight(Some(e)))),
        (None, Some(l)) => Ok(format!("{later_label} @ {}", format_weight(Some(l)))),
        (None, None) => Ok(NO_DATA.to_owned()),
    }
}

/// One-line morning/evening weight summary for a day:
/// `[Mon] ☀️ <code>80 kg</code> | 🌙 <code>79.5 kg</code>`
#[must_use]
pub fn weight_summary_line(
    day_of_week: Option<&str>,
    first_morning_weight: Option<&Quantity>,
    last_evening_weight: Option<&Quantity>,
) -> String {
    let prefix = day_of_week.map_or_else(String::new, |d| format!("[{d}] "));
    format!(
        "{prefix}☀️ {} | 🌙 {}",
        format_weight(first_morning_weight),
        format_weight(last_evening_weight)
    )
}

// ============================================================================
// Calorie fragments
// ============================================================================

/// Render a calorie value rounded to whole kcal: `<code>300 kcal</code>`
#[must_use]
pub fn format_calories(calories: Option<&Quantity>) -> String {
    calories.map_or_else(
        || NO_DATA.to_owned(),
        |c| format!("<code>{} {}</code>", c.value.round(), c.unit),
    )
}

/// One-line in/out/deficit summary:
/// `🍔 In: <code>1200 kcal</code>, 🔥 Out: <code>1800 kcal</code>, Deficit: 👍🏼 600 kcal`
///
/// # Errors
///
/// Returns an error if the in/out units mismatch.
pub fn calorie_summary_line(
    calories_in: Option<&Quantity>,
    calories_out: Option<&Quantity>,
) -> AppResult<String> {
    let deficit = deficit_from_calories(calories_in, calories_out)?;
    Ok(format!(
        "🍔 In: {}, 🔥 Out: {}, {}",
        format_calories(calories_in),
        format_calories(calories_out),
        format_deficit_surplus(deficit.as_ref())
    ))
}

/// Spontaneous progress block appended after a meal or activity recording
///
/// # Errors
///
/// Returns an error if the in/out units mismatch.
pub fn progress_update(day: &DailySummary) -> AppResult<String> {
    Ok(format!(
        "<b>Your progress for {}</b>\n - {}",
        day.date,
        calorie_summary_line(day.calories_in.as_ref(), day.calories_out.as_ref())?
    ))
}

// ============================================================================
// Multi-day summary block
// ============================================================================

/// Render an ordered multi-day summary plus its cross-window overview
///
/// Per day: a header, a calorie line, and a weight line whose comparison
/// mode depends on what the previous day has (morning-to-morning, else
/// evening-to-evening, else a first-day single point, else morning-to-evening
/// within the day). Days without data render a fixed placeholder. A trailing
/// block reports the window average deficit and earliest-vs-latest weight
/// change.
///
/// # Errors
///
/// Returns an error on unit mismatches between compared samples.
pub fn format_summary(summary: &LastNDaysSummary) -> AppResult<String> {
    let mut lines: Vec<String> = Vec::new();

    for (i, day) in summary.daily_summaries.iter().enumerate() {
        let previous = i.checked_sub(1).and_then(|p| summary.daily_summaries.get(p));
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("<b>📆 [{}] {}</b>", day.day_of_week, day.date));
        if !day.has_data {
            lines.push("  No data".to_owned());
            continue;
        }

        let deficit =
            deficit_from_calories(day.calories_in.as_ref(), day.calories_out.as_ref())?;
        lines.push(format!(
            "  [Calories] {}",
            format_deficit_surplus(deficit.as_ref())
        ));

        lines.push(weight_comparison_line(day, previous, i == 0)?);
    }

    let overview = summary.overview.as_ref();
    let average_deficit = overview.and_then(|o| o.average_calorie_deficit.as_ref());
    let earliest = overview.and_then(|o| o.earliest_weight.as_ref());
    let latest = overview.and_then(|o| o.latest_weight.as_ref());

    Ok(format!(
        "{}\n\n🗒️ Summary Across All Days:\n  [Calories (Avg)] {}\n  [Weight] {}",
        lines.join("\n"),
        format_deficit_surplus(average_deficit),
        format_weight_difference(earliest, latest, "earliest", "latest")?,
    ))
}

/// Pick the weight comparison mode for one day of the summary block
fn weight_comparison_line(
    day: &DailySummary,
    previous: Option<&DailySummary>,
    is_first: bool,
) -> AppResult<String> {
    let prev_morning = previous.and_then(|p| p.first_morning_weight.as_ref());
    let prev_evening = previous.and_then(|p| p.last_evening_weight.as_ref());

    // The first listed day has nothing to compare against.
    if is_first {
        let first_weight = day
            .first_morning_weight
            .as_ref()
            .or(day.last_evening_weight.as_ref());
        return Ok(first_weight.map_or_else(
            || "  [Weight] No data".to_owned(),
            |w| format!("  [Weight] Initial @ {}", format_weight(Some(w))),
        ));
    }

    // Best: morning to morning
    if let (Some(prev), Some(cur)) = (prev_morning, day.first_morning_weight.as_ref()) {
        return Ok(format!(
            "  [Weight M2M] {}",
            format_weight_difference(Some(prev), Some(cur), "prev morning", "morning")?
        ));
    }
    // Next best: evening to evening
    if let (Some(prev), Some(cur)) = (prev_evening, day.last_evening_weight.as_ref()) {
        return Ok(format!(
            "  [Weight E2E] {}",
            format_weight_difference(Some(prev), Some(cur), "prev evening", "evening")?
        ));
    }
    // Last resort: morning to evening within the same day
    Ok(format!(
        "  [Weight M2E] {}",
        format_weight_difference(
            day.first_morning_weight.as_ref(),
            day.last_evening_weight.as_ref(),
            "morning",
            "evening",
        )?
    ))
}

/// Weight summary for the last N days, appended after a weight recording
///
/// Returns `None` when the window has no days.
#[must_use]
pub fn format_weight_summary(summary: &LastNDaysSummary) -> Option<String> {
    if summary.daily_summaries.is_empty() {
        return None;
    }
    let logs: Vec<String> = summary
        .daily_summaries
        .iter()
        .map(|d| {
            format!(
                "   - {}",
                weight_summary_line(
                    Some(&d.day_of_week),
                    d.first_morning_weight.as_ref(),
                    d.last_evening_weight.as_ref()
                )
            )
        })
        .collect();
    Some(format!(
        "Weight summary for the last {} days:\n{}",
        summary.daily_summaries.len(),
        logs.join("\n")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Overview;

    fn day(date: &str, dow: &str, has_data: bool) -> DailySummary {
        DailySummary {
            date: date.to_owned(),
            day_of_week: dow.to_owned(),
            date_ts: 0,
            calories_in: None,
            calories_out: None,
            deficit: None,
            weight: None,
            first_morning_weight: None,
            last_evening_weight: None,
            has_data,
        }
    }

    #[test]
    fn test_deficit_positive_renders_thumbs_up() {
        let rendered = format_deficit_surplus(Some(&Quantity::kilocalories(1000.0)));
        assert_eq!(rendered, "Deficit: 👍🏼 1000 kcal");
    }

    #[test]
    fn test_surplus_negative_renders_warning_with_magnitude() {
        let rendered = format_deficit_surplus(Some(&Quantity::kilocalories(-500.0)));
        assert_eq!(rendered, "Surplus: ⚠️ 500 kcal");
    }

    #[test]
    fn test_deficit_none_renders_sentinel() {
        assert_eq!(format_deficit_surplus(None), "Deficit: No data recorded");
    }

    #[test]
    fn test_deficit_keeps_meaningful_decimals() {
        let rendered = format_deficit_surplus(Some(&Quantity::kilocalories(600.5)));
        assert_eq!(rendered, "Deficit: 👍🏼 600.50 kcal");
    }

    #[test]
    fn test_deficit_from_calories_is_out_minus_in() {
        let deficit = deficit_from_calories(
            Some(&Quantity::kilocalories(1200.0)),
            Some(&Quantity::kilocalories(1800.0)),
        )
        .unwrap()
        .unwrap();
        assert!((deficit.value - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deficit_from_calories_mismatched_units_errors() {
        assert!(deficit_from_calories(
            Some(&Quantity::kilograms(1.0)),
            Some(&Quantity::kilocalories(1800.0)),
        )
        .is_err());
    }

    #[test]
    fn test_weight_difference_lost() {
        let rendered = format_weight_difference(
            Some(&Quantity::kilograms(80.0)),
            Some(&Quantity::kilograms(78.0)),
            "earliest",
            "latest",
        )
        .unwrap();
        assert!(rendered.contains("lost"));
        assert!(rendered.contains("👍🏼"));
        assert!(rendered.contains("<code>2 kg</code>"));
    }

    #[test]
    fn test_weight_difference_gained() {
        let rendered = format_weight_difference(
            Some(&Quantity::kilograms(78.0)),
            Some(&Quantity::kilograms(80.0)),
            "earliest",
            "latest",
        )
        .unwrap();
        assert!(rendered.contains("gained"));
        assert!(rendered.contains("⚠️"));
        assert!(rendered.contains("<code>2 kg</code>"));
    }

    #[test]
    fn test_weight_difference_single_point() {
        let rendered = format_weight_difference(
            None,
            Some(&Quantity::kilograms(80.0)),
            "earliest",
            "latest",
        )
        .unwrap();
        assert_eq!(rendered, "latest @ <code>80 kg</code>");
    }

    #[test]
    fn test_weight_difference_earlier_only_is_labeled_point() {
        let rendered = format_weight_difference(
            Some(&Quantity::kilograms(80.0)),
            None,
            "morning",
            "evening",
        )
        .unwrap();
        assert_eq!(rendered, "morning @ <code>80 kg</code>");
    }

    #[test]
    fn test_weight_difference_no_data() {
        let rendered = format_weight_difference(None, None, "a", "b").unwrap();
        assert_eq!(rendered, "No data");
    }

    #[test]
    fn test_weight_difference_unit_mismatch_is_hard_error() {
        assert!(format_weight_difference(
            Some(&Quantity::kilograms(80.0)),
            Some(&Quantity::kilocalories(80.0)),
            "a",
            "b",
        )
        .is_err());
    }

    #[test]
    fn test_no_data_day_renders_placeholder() {
        let summary = LastNDaysSummary {
            has_data: true,
            daily_summaries: vec![day("2024-03-10", "Sun", false)],
            overview: Some(Overview {
                average_calorie_deficit: None,
                earliest_weight: None,
                latest_weight: None,
            }),
        };
        let rendered = format_summary(&summary).unwrap();
        assert!(rendered.contains("<b>📆 [Sun] 2024-03-10</b>"));
        assert!(rendered.contains("  No data"));
        assert!(rendered.contains("🗒️ Summary Across All Days:"));
    }

    #[test]
    fn test_summary_prefers_morning_to_morning() {
        let mut first = day("2024-03-10", "Sun", true);
        first.first_morning_weight = Some(Quantity::kilograms(80.0));
        let mut second = day("2024-03-11", "Mon", true);
        second.first_morning_weight = Some(Quantity::kilograms(79.5));
        second.last_evening_weight = Some(Quantity::kilograms(79.8));

        let summary = LastNDaysSummary {
            has_data: true,
            daily_summaries: vec![first, second],
            overview: Some(Overview {
                average_calorie_deficit: None,
                earliest_weight: Some(Quantity::kilograms(80.0)),
                latest_weight: Some(Quantity::kilograms(79.8)),
            }),
        };
        let rendered = format_summary(&summary).unwrap();
        assert!(rendered.contains("[Weight] Initial @ <code>80 kg</code>"));
        assert!(rendered.contains("[Weight M2M]"));
        assert!(!rendered.contains("[Weight E2E]"));
    }

    #[test]
    fn test_summary_falls_back_to_evening_then_same_day() {
        let mut first = day("2024-03-10", "Sun", true);
        first.last_evening_weight = Some(Quantity::kilograms(80.0));
        let mut second = day("2024-03-11", "Mon", true);
        second.last_evening_weight = Some(Quantity::kilograms(79.0));
        let third = day("2024-03-12", "Tue", true);

        let summary = LastNDaysSummary {
            has_data: true,
            daily_summaries: vec![first, second, third],
            overview: Some(Overview {
                average_calorie_deficit: None,
                earliest_weight: Some(Quantity::kilograms(80.0)),
                latest_weight: Some(Quantity::kilograms(79.0)),
            }),
        };
        let rendered = format_summary(&summary).unwrap();
        assert!(rendered.contains("[Weight E2E]"));
        // Third day has no samples at all: morning-to-evening fallback with no data
        assert!(rendered.contains("[Weight M2E] No data"));
    }

    #[test]
    fn test_weight_summary_lists_each_day() {
        let mut first = day("2024-03-10", "Sun", true);
        first.first_morning_weight = Some(Quantity::kilograms(80.0));
        let summary = LastNDaysSummary {
            has_data: true,
            daily_summaries: vec![first],
            overview: None,
        };
        let rendered = format_weight_summary(&summary).unwrap();
        assert!(rendered.starts_with("Weight summary for the last 1 days:"));
        assert!(rendered.contains("[Sun] ☀️ <code>80 kg</code> | 🌙 No data"));
    }

    #[test]
    fn test_progress_update_block() {
        let mut d = day("2024-03-10", "Sun", true);
        d.calories_in = Some(Quantity::kilocalories(1200.0));
        d.calories_out = Some(Quantity::kilocalories(1800.0));
        let rendered = progress_update(&d).unwrap();
        assert!(rendered.contains("<b>Your progress for 2024-03-10</b>"));
        assert!(rendered.contains("🍔 In: <code>1200 kcal</code>"));
        assert!(rendered.contains("🔥 Out: <code>1800 kcal</code>"));
        assert!(rendered.contains("Deficit: 👍🏼 600 kcal"));
    }
}
