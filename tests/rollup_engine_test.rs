// ABOUTME: Integration tests for the daily rollup engine over real storage
// ABOUTME: Validates bucket coverage, timezone labeling, and overview math
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Healthbot Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use healthbot::constants::time::ONE_DAY_MS;
use healthbot::intelligence::rollup::last_n_days_summary;
use healthbot::models::{
    ActivityRecord, BurnEstimate, CalorieRange, Gender, MealItem, MealRecord, TelegramIdentity,
    User, WeightRecord,
};
use healthbot::storage::{Database, StorageProvider};
use healthbot::timeutil::{end_of_local_day, parse_local_datetime, parse_timezone};
use healthbot::units::{Quantity, Unit};
use chrono_tz::Tz;

fn sgt() -> Tz {
    parse_timezone("Asia/Singapore").unwrap()
}

async fn test_database() -> Database {
    let db = Database::new("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    db
}

async fn ready_user(db: &Database) -> User {
    let mut user = User::new(TelegramIdentity {
        user_id: 1001,
        first_name: Some("Alex".into()),
        last_name: None,
        username: None,
    });
    user.timezone = Some("Asia/Singapore".into());
    user.gender = Some(Gender::Male);
    user.year_of_birth = Some(1990);
    user.height = Some(Quantity::centimeters(175.0));
    user.weight = Some(Quantity::kilograms(80.0));
    db.create_user(&user).await.unwrap();
    user
}

fn egg_meal(user: &User, timestamp: i64) -> MealRecord {
    MealRecord::from_items(
        user.id,
        vec![MealItem {
            name: "eggs".into(),
            estimated_calories_per_portion: CalorieRange {
                min: 140.0,
                max: 160.0,
                unit: Unit::Kilocalories,
            },
            num_portions: 2.0,
        }],
        timestamp,
    )
}

#[tokio::test]
async fn test_meal_example_end_to_end() {
    let db = test_database().await;
    let user = ready_user(&db).await;
    let zone = sgt();

    // "ate 2 eggs, about 140-160 kcal each" -> persisted total 300 kcal
    let meal_ts = parse_local_datetime("2024-03-10 12:30:00", zone).unwrap();
    let meal = egg_meal(&user, meal_ts);
    assert!((meal.total_calories.value - 300.0).abs() < f64::EPSILON);
    db.record_meal(&meal).await.unwrap();

    let summary = last_n_days_summary(
        &db,
        &user,
        1,
        end_of_local_day(meal_ts, zone),
        zone,
        2024,
    )
    .await
    .unwrap();

    assert!(summary.has_data);
    assert_eq!(summary.daily_summaries.len(), 1);
    let day = &summary.daily_summaries[0];
    let calories_in = day.calories_in.as_ref().unwrap();
    assert!((calories_in.value - 300.0).abs() < f64::EPSILON);
    assert_eq!(calories_in.unit, Unit::Kilocalories);
    // Deficit present because both operands are
    assert!(day.deficit.is_some());
}

#[tokio::test]
async fn test_window_has_one_bucket_per_day() {
    let db = test_database().await;
    let user = ready_user(&db).await;
    let zone = sgt();

    let end = end_of_local_day(
        parse_local_datetime("2024-03-10 20:00:00", zone).unwrap(),
        zone,
    );
    let summary = last_n_days_summary(&db, &user, 7, end, zone, 2024).await.unwrap();

    assert_eq!(summary.daily_summaries.len(), 7);
    // Contiguous fixed-width buckets, oldest first, labeled with local dates
    let expected_dates = [
        "2024-03-04",
        "2024-03-05",
        "2024-03-06",
        "2024-03-07",
        "2024-03-08",
        "2024-03-09",
        "2024-03-10",
    ];
    for (day, expected) in summary.daily_summaries.iter().zip(expected_dates) {
        assert_eq!(day.date, expected);
    }
    for pair in summary.daily_summaries.windows(2) {
        assert_eq!(pair[1].date_ts - pair[0].date_ts, ONE_DAY_MS);
    }
    // Empty window: the no-data sentinel
    assert!(!summary.has_data);
    assert!(summary.overview.is_none());
}

#[tokio::test]
async fn test_calories_out_includes_bmr_and_activity() {
    let db = test_database().await;
    let user = ready_user(&db).await;
    let zone = sgt();

    let ts = parse_local_datetime("2024-03-10 18:00:00", zone).unwrap();
    db.record_activity(&ActivityRecord {
        user_id: user.id,
        activity: "30 min run".into(),
        calories_burned: BurnEstimate::from_range(280.0, 320.0),
        timestamp: ts,
    })
    .await
    .unwrap();

    let summary = last_n_days_summary(&db, &user, 1, end_of_local_day(ts, zone), zone, 2024)
        .await
        .unwrap();
    let day = &summary.daily_summaries[0];

    // Harris-Benedict for the stored profile (male, 34y, 175cm, 80kg)
    let bmr = 88.362 + 13.397 * 80.0 + 4.799 * 175.0 - 5.677 * 34.0;
    let out = day.calories_out.as_ref().unwrap();
    assert!((out.value - (bmr + 300.0)).abs() < 1e-6);
    // No meals: calories in and deficit are absent, not zero
    assert!(day.calories_in.is_none());
    assert!(day.deficit.is_none());
}

#[tokio::test]
async fn test_average_deficit_with_single_deficit_day() {
    let db = test_database().await;
    let user = ready_user(&db).await;
    let zone = sgt();

    // Meals on one day only; a weight sample on another day keeps that day
    // has_data without contributing a deficit.
    let meal_ts = parse_local_datetime("2024-03-09 13:00:00", zone).unwrap();
    db.record_meal(&egg_meal(&user, meal_ts)).await.unwrap();
    let weight_ts = parse_local_datetime("2024-03-10 07:00:00", zone).unwrap();
    db.record_weight(&WeightRecord {
        user_id: user.id,
        weight: Quantity::kilograms(79.4),
        timestamp: weight_ts,
    })
    .await
    .unwrap();

    let end = end_of_local_day(weight_ts, zone);
    let summary = last_n_days_summary(&db, &user, 2, end, zone, 2024).await.unwrap();

    let deficit_days: Vec<_> = summary
        .daily_summaries
        .iter()
        .filter_map(|d| d.deficit.as_ref())
        .collect();
    assert_eq!(deficit_days.len(), 1);

    // Exactly one day with a deficit: the average equals it exactly
    let overview = summary.overview.unwrap();
    let average = overview.average_calorie_deficit.unwrap();
    assert!((average.value - deficit_days[0].value).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_overview_weight_change_uses_raw_samples() {
    let db = test_database().await;
    let user = ready_user(&db).await;
    let zone = sgt();

    // Two morning samples and one midday sample; the overview endpoints are
    // the first and last raw samples regardless of morning/evening tags.
    for (when, kg) in [
        ("2024-03-09 07:00:00", 80.2),
        ("2024-03-09 13:00:00", 80.9),
        ("2024-03-10 07:00:00", 79.6),
    ] {
        db.record_weight(&WeightRecord {
            user_id: user.id,
            weight: Quantity::kilograms(kg),
            timestamp: parse_local_datetime(when, zone).unwrap(),
        })
        .await
        .unwrap();
    }

    let end = end_of_local_day(
        parse_local_datetime("2024-03-10 20:00:00", zone).unwrap(),
        zone,
    );
    let summary = last_n_days_summary(&db, &user, 2, end, zone, 2024).await.unwrap();
    let overview = summary.overview.unwrap();
    assert!((overview.earliest_weight.unwrap().value - 80.2).abs() < f64::EPSILON);
    assert!((overview.latest_weight.unwrap().value - 79.6).abs() < f64::EPSILON);

    // Morning classification: first sample of each day is before 08:00 local
    let day_one = &summary.daily_summaries[0];
    assert!((day_one.first_morning_weight.as_ref().unwrap().value - 80.2).abs() < f64::EPSILON);
    assert!(day_one.last_evening_weight.is_none());
}

#[tokio::test]
async fn test_records_outside_window_are_excluded() {
    let db = test_database().await;
    let user = ready_user(&db).await;
    let zone = sgt();

    let inside = parse_local_datetime("2024-03-10 12:00:00", zone).unwrap();
    let outside = parse_local_datetime("2024-03-01 12:00:00", zone).unwrap();
    db.record_meal(&egg_meal(&user, inside)).await.unwrap();
    db.record_meal(&egg_meal(&user, outside)).await.unwrap();

    let summary = last_n_days_summary(
        &db,
        &user,
        1,
        end_of_local_day(inside, zone),
        zone,
        2024,
    )
    .await
    .unwrap();
    let day = &summary.daily_summaries[0];
    assert!((day.calories_in.as_ref().unwrap().value - 300.0).abs() < f64::EPSILON);
}
