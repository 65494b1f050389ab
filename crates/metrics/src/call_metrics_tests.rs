// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use oc_core::{JobId, Phase};
use oc_storage::CallRecord;

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn ended_ptp_call(started: DateTime<Utc>, ended: DateTime<Utc>) -> CallRecord {
    let mut record = CallRecord::new(JobId::new(), "acct-1", started, oc_core::CallState::default());
    record.ended_at_utc = Some(ended);
    record.state.phase = Phase::Ended;
    record.state.promise_to_pay.confirmed = true;
    record
}

fn ended_no_ptp_call(started: DateTime<Utc>) -> CallRecord {
    let mut record = CallRecord::new(JobId::new(), "acct-2", started, oc_core::CallState::default());
    record.ended_at_utc = Some(started + chrono::Duration::minutes(5));
    record.state.phase = Phase::Ended;
    record
}

fn active_call(started: DateTime<Utc>) -> CallRecord {
    CallRecord::new(JobId::new(), "acct-3", started, oc_core::CallState::default())
}

#[test]
fn counts_active_and_ended_calls() {
    let records = vec![active_call(at(2026, 3, 5, 10)), ended_no_ptp_call(at(2026, 3, 5, 11))];
    let summary = build_call_metrics_summary(&records, at(2026, 3, 5, 12), 14);
    assert_eq!(summary.calls_total, 2);
    assert_eq!(summary.active_calls, 1);
    assert_eq!(summary.ended_calls, 1);
}

#[test]
fn ptp_success_rate_is_relative_to_ended_calls() {
    let records = vec![ended_ptp_call(at(2026, 3, 5, 10), at(2026, 3, 5, 10)), ended_no_ptp_call(at(2026, 3, 5, 11))];
    let summary = build_call_metrics_summary(&records, at(2026, 3, 5, 12), 14);
    assert_eq!(summary.ptp_calls_ended, 1);
    assert_eq!(summary.ended_calls, 2);
    assert_eq!(summary.ptp_success_rate_ended, Some(0.5));
}

#[test]
fn time_to_ptp_is_averaged_and_medianed_in_seconds_and_minutes() {
    let started = at(2026, 3, 5, 10);
    let ended = started + chrono::Duration::minutes(10);
    let records = vec![ended_ptp_call(started, ended)];
    let summary = build_call_metrics_summary(&records, at(2026, 3, 5, 12), 14);
    assert_eq!(summary.time_to_ptp_samples, 1);
    assert_eq!(summary.avg_time_to_ptp_seconds, Some(600.0));
    assert_eq!(summary.avg_time_to_ptp_minutes, Some(10.0));
    assert_eq!(summary.median_time_to_ptp_seconds, Some(600.0));
}

#[test]
fn empty_record_set_reports_no_rates() {
    let summary = build_call_metrics_summary(&[], at(2026, 3, 5, 12), 14);
    assert_eq!(summary.calls_total, 0);
    assert_eq!(summary.ptp_success_rate_ended, None);
    assert_eq!(summary.ptp_success_rate_all_calls, None);
    assert!(summary.daily.is_empty());
}

#[test]
fn daily_rows_are_grouped_by_utc_calendar_day_and_sorted() {
    let records = vec![
        ended_no_ptp_call(at(2026, 3, 6, 9)),
        ended_no_ptp_call(at(2026, 3, 5, 9)),
        active_call(at(2026, 3, 5, 23)),
    ];
    let summary = build_call_metrics_summary(&records, at(2026, 3, 6, 12), 14);
    assert_eq!(summary.daily.len(), 2);
    assert_eq!(summary.daily[0].date, "2026-03-05");
    assert_eq!(summary.daily[0].calls_total, 2);
    assert_eq!(summary.daily[1].date, "2026-03-06");
}

#[test]
fn trend_days_zero_keeps_the_full_daily_history() {
    let records = vec![ended_no_ptp_call(at(2026, 2, 1, 9)), ended_no_ptp_call(at(2026, 3, 5, 9))];
    let summary = build_call_metrics_summary(&records, at(2026, 3, 5, 12), 0);
    assert_eq!(summary.daily.len(), 2);
}

#[test]
fn trend_days_trims_to_the_most_recent_window() {
    let records = vec![ended_no_ptp_call(at(2026, 2, 1, 9)), ended_no_ptp_call(at(2026, 3, 5, 9))];
    let summary = build_call_metrics_summary(&records, at(2026, 3, 5, 12), 1);
    assert_eq!(summary.daily.len(), 1);
    assert_eq!(summary.daily[0].date, "2026-03-05");
}
