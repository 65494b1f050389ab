// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn chicago() -> Tz {
    "America/Chicago".parse().unwrap()
}

// 2026-03-05 is a Thursday, noon UTC (06:00 Chicago).
fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 5, 18, 0, 0).unwrap()
}

#[test]
fn iso_date_has_highest_confidence() {
    let result = normalize_datetime_local("let's say 2026-04-12", chicago(), now());
    assert!(result.ok);
    assert_eq!(result.date, NaiveDate::from_ymd_opt(2026, 4, 12));
    assert_eq!(result.confidence, 0.95);
    assert!(!result.needs_confirmation);
}

#[test]
fn tomorrow_resolves_to_next_local_day() {
    let result = normalize_datetime_local("I can pay tomorrow", chicago(), now());
    assert_eq!(result.date, NaiveDate::from_ymd_opt(2026, 3, 6));
    assert_eq!(result.confidence, 0.90);
}

#[test]
fn manana_resolves_like_tomorrow() {
    let result = normalize_datetime_local("puedo pagar ma\u{f1}ana", chicago(), now());
    assert_eq!(result.date, NaiveDate::from_ymd_opt(2026, 3, 6));
}

#[test]
fn end_of_month_resolves_to_last_day_of_current_month() {
    let result = normalize_datetime_local("end of month works for me", chicago(), now());
    assert_eq!(result.date, NaiveDate::from_ymd_opt(2026, 3, 31));
}

#[test]
fn month_and_day_english_rolls_to_next_year_if_passed() {
    // "January 10" has already passed relative to 2026-03-05 local -> 2027.
    let result = normalize_datetime_local("how about january 10", chicago(), now());
    assert_eq!(result.date, NaiveDate::from_ymd_opt(2027, 1, 10));
    assert_eq!(result.confidence, 0.90);
}

#[test]
fn month_and_day_english_future_stays_this_year() {
    let result = normalize_datetime_local("april 12 works", chicago(), now());
    assert_eq!(result.date, NaiveDate::from_ymd_opt(2026, 4, 12));
}

#[test]
fn day_de_month_spanish_order_is_recognized() {
    let result = normalize_datetime_local("el 12 de abril", chicago(), now());
    assert_eq!(result.date, NaiveDate::from_ymd_opt(2026, 4, 12));
}

#[test]
fn weekday_name_needs_confirmation() {
    // Today is Thursday; "friday" is the next day.
    let result = normalize_datetime_local("let's do friday", chicago(), now());
    assert_eq!(result.date, NaiveDate::from_ymd_opt(2026, 3, 6));
    assert_eq!(result.confidence, 0.80);
    assert!(result.needs_confirmation);
}

#[test]
fn weekday_name_matching_today_rolls_to_next_week() {
    // Today is Thursday; naming "thursday" should mean next week, not today.
    let result = normalize_datetime_local("thursday works", chicago(), now());
    assert_eq!(result.date, NaiveDate::from_ymd_opt(2026, 3, 12));
}

#[test]
fn spanish_accented_weekday_is_recognized() {
    let result = normalize_datetime_local("el mi\u{e9}rcoles que viene", chicago(), now());
    assert_eq!(result.date, NaiveDate::from_ymd_opt(2026, 3, 11));
    assert!(result.needs_confirmation);
}

#[test]
fn unrecognized_text_is_unresolved() {
    let result = normalize_datetime_local("I'm not sure when", chicago(), now());
    assert!(!result.ok);
    assert!(result.needs_confirmation);
    assert!(result.date.is_none());
}
