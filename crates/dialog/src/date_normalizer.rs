// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Normalizes a caller's spoken/typed date reference (English or Spanish)
//! into an ISO calendar date, resolved against the call's local timezone.
//!
//! Resolution cascade, in order: ISO date, "tomorrow"/"mañana", "end of
//! month", month-and-day, weekday name. Anything else is unresolved and
//! flagged for confirmation.

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;

/// Result of normalizing one date reference.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDate {
    pub ok: bool,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub datetime_local: Option<String>,
    pub timezone: String,
    pub confidence: f64,
    pub needs_confirmation: bool,
    pub notes: Option<String>,
}

impl NormalizedDate {
    fn resolved(date: NaiveDate, timezone: &str, confidence: f64, needs_confirmation: bool, notes: &str) -> Self {
        Self {
            ok: true,
            date: Some(date),
            time: None,
            datetime_local: Some(date.format("%Y-%m-%d").to_string()),
            timezone: timezone.to_string(),
            confidence,
            needs_confirmation,
            notes: Some(notes.to_string()),
        }
    }

    fn unresolved(timezone: &str) -> Self {
        Self {
            ok: false,
            date: None,
            time: None,
            datetime_local: None,
            timezone: timezone.to_string(),
            confidence: 0.0,
            needs_confirmation: true,
            notes: Some("no recognizable date reference".to_string()),
        }
    }
}

const MONTHS_EN: &[(&str, u32)] = &[
    ("january", 1), ("february", 2), ("march", 3), ("april", 4), ("may", 5), ("june", 6),
    ("july", 7), ("august", 8), ("september", 9), ("october", 10), ("november", 11), ("december", 12),
];

const MONTHS_ES: &[(&str, u32)] = &[
    ("enero", 1), ("febrero", 2), ("marzo", 3), ("abril", 4), ("mayo", 5), ("junio", 6),
    ("julio", 7), ("agosto", 8), ("septiembre", 9), ("octubre", 10), ("noviembre", 11), ("diciembre", 12),
];

const WEEKDAYS_EN: &[(&str, u32)] = &[
    ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3), ("friday", 4), ("saturday", 5), ("sunday", 6),
];

const WEEKDAYS_ES: &[(&str, u32)] = &[
    ("lunes", 0), ("martes", 1), ("mi\u{e9}rcoles", 2), ("jueves", 3), ("viernes", 4), ("s\u{e1}bado", 5), ("domingo", 6),
];

fn iso_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("iso date regex compiles"))
}

/// `month name` + `day number` in either order, EN or ES.
fn month_day_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let months = MONTHS_EN.iter().chain(MONTHS_ES.iter()).map(|(name, _)| *name).collect::<Vec<_>>().join("|");
        let pattern = format!(r"(?i)(?:({months})\s*(\d{{1,2}})|(\d{{1,2}})\s*(?:de\s+)?({months}))");
        Regex::new(&pattern).expect("month/day regex compiles")
    })
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS_EN.iter().chain(MONTHS_ES.iter()).find(|(n, _)| *n == lower).map(|(_, n)| *n)
}

fn weekday_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    WEEKDAYS_EN.iter().chain(WEEKDAYS_ES.iter()).find(|(n, _)| *n == lower).map(|(_, n)| *n)
}

fn next_weekday_on_or_after(today: NaiveDate, target_weekday: u32) -> NaiveDate {
    let current = today.weekday().num_days_from_monday();
    let delta = (target_weekday + 7 - current) % 7;
    let candidate = today + chrono::Duration::days(delta as i64);
    if candidate == today {
        candidate + chrono::Duration::days(7)
    } else {
        candidate
    }
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).expect("valid first-of-month") - chrono::Duration::days(1)
}

/// Normalize a spoken/typed date reference against `tz`'s current local date.
pub fn normalize_datetime_local(text: &str, tz: Tz, now_utc: chrono::DateTime<Utc>) -> NormalizedDate {
    let now_local = now_utc.with_timezone(&tz);
    let today = now_local.date_naive();
    let tz_name = tz.to_string();
    let lower = text.to_lowercase();

    if let Some(caps) = iso_regex().captures(text) {
        let year: i32 = caps[1].parse().unwrap_or(today.year());
        let month: u32 = caps[2].parse().unwrap_or(1);
        let day: u32 = caps[3].parse().unwrap_or(1);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return NormalizedDate::resolved(date, &tz_name, 0.95, false, "iso_date");
        }
    }

    if lower.contains("tomorrow") || lower.contains("ma\u{f1}ana") {
        return NormalizedDate::resolved(today + chrono::Duration::days(1), &tz_name, 0.90, false, "relative_tomorrow");
    }

    if lower.contains("end of month") || lower.contains("fin de mes") || lower.contains("a fin de mes") {
        return NormalizedDate::resolved(last_day_of_month(today.year(), today.month()), &tz_name, 0.90, false, "end_of_month");
    }

    if let Some(caps) = month_day_regex().captures(text) {
        let (month_name, day_str) = if caps.get(1).is_some() {
            (caps.get(1).unwrap().as_str(), caps.get(2).unwrap().as_str())
        } else {
            (caps.get(4).unwrap().as_str(), caps.get(3).unwrap().as_str())
        };
        if let (Some(month), Ok(day)) = (month_number(month_name), day_str.parse::<u32>()) {
            let mut year = today.year();
            if let Some(candidate) = NaiveDate::from_ymd_opt(year, month, day) {
                if candidate < today {
                    year += 1;
                }
            }
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return NormalizedDate::resolved(date, &tz_name, 0.90, false, "month_day");
            }
        }
    }

    for word in lower.split_whitespace() {
        let trimmed = word.trim_matches(|c: char| !c.is_alphabetic());
        if let Some(weekday) = weekday_number(trimmed) {
            let date = next_weekday_on_or_after(today, weekday);
            return NormalizedDate::resolved(date, &tz_name, 0.80, true, "weekday_name");
        }
    }

    NormalizedDate::unresolved(&tz_name)
}

#[cfg(test)]
#[path = "date_normalizer_tests.rs"]
mod tests;
