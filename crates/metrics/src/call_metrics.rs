// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rollup metrics over stored call records: volume, promise-to-pay
//! conversion, and time-to-PTP latency, plus a daily trend.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use oc_storage::CallRecord;
use serde::Serialize;

/// One day's slice of the call metrics rollup.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyCallRow {
    pub date: String,
    pub calls_total: u64,
    pub ended_calls: u64,
    pub ptp_calls_ended: u64,
    pub ptp_success_rate_ended: Option<f64>,
}

/// Aggregate call metrics over a set of stored call records.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CallMetricsSummary {
    pub generated_at_utc: DateTime<Utc>,
    pub calls_total: u64,
    pub active_calls: u64,
    pub ended_calls: u64,
    pub status_counts: BTreeMap<String, u64>,
    pub ptp_calls_total: u64,
    pub ptp_calls_ended: u64,
    pub ptp_success_rate_ended: Option<f64>,
    pub ptp_success_rate_all_calls: Option<f64>,
    pub time_to_ptp_samples: u64,
    pub avg_time_to_ptp_seconds: Option<f64>,
    pub median_time_to_ptp_seconds: Option<f64>,
    pub avg_time_to_ptp_minutes: Option<f64>,
    pub median_time_to_ptp_minutes: Option<f64>,
    pub daily: Vec<DailyCallRow>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(round4(numerator as f64 / denominator as f64))
    }
}

fn has_ptp(record: &CallRecord) -> bool {
    record.state.promise_to_pay.confirmed || record.state.end_reason.as_deref() == Some("ptp_set")
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Build a call metrics summary, including a trailing `trend_days`-day daily
/// trend (0 disables the trend window entirely).
pub fn build_call_metrics_summary(records: &[CallRecord], now_utc: DateTime<Utc>, trend_days: i64) -> CallMetricsSummary {
    let mut status_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut daily: BTreeMap<String, (u64, u64, u64)> = BTreeMap::new();
    let mut ptp_calls_total = 0u64;
    let mut ptp_calls_ended = 0u64;
    let mut time_to_ptp_seconds: Vec<f64> = Vec::new();
    let mut ended_calls = 0u64;
    let mut active_calls = 0u64;

    for record in records {
        let ended = record.state.is_ended();
        let status = if ended { "ended" } else { "active" };
        *status_counts.entry(status.to_string()).or_insert(0) += 1;
        if ended {
            ended_calls += 1;
        } else {
            active_calls += 1;
        }

        let day = record.started_at_utc.date_naive().to_string();
        let entry = daily.entry(day).or_insert((0, 0, 0));
        entry.0 += 1;
        if ended {
            entry.1 += 1;
        }

        if !has_ptp(record) {
            continue;
        }
        ptp_calls_total += 1;

        if ended {
            ptp_calls_ended += 1;
            entry.2 += 1;

            if let Some(ended_at) = record.ended_at_utc {
                let duration = (ended_at - record.started_at_utc).num_milliseconds() as f64 / 1000.0;
                if duration >= 0.0 {
                    time_to_ptp_seconds.push(duration);
                }
            }
        }
    }

    let calls_total = records.len() as u64;

    let mut sorted_latencies = time_to_ptp_seconds.clone();
    sorted_latencies.sort_by(|a, b| a.partial_cmp(b).expect("latencies are finite"));
    let avg_seconds = if sorted_latencies.is_empty() {
        None
    } else {
        Some(round2(sorted_latencies.iter().sum::<f64>() / sorted_latencies.len() as f64))
    };
    let median_seconds = if sorted_latencies.is_empty() { None } else { Some(round2(median(&sorted_latencies))) };

    let mut daily_rows: Vec<DailyCallRow> = daily
        .into_iter()
        .map(|(date, (calls, ended, ptp_ended))| DailyCallRow {
            date,
            calls_total: calls,
            ended_calls: ended,
            ptp_calls_ended: ptp_ended,
            ptp_success_rate_ended: ratio(ptp_ended, ended),
        })
        .collect();
    daily_rows.sort_by(|a, b| a.date.cmp(&b.date));
    if trend_days > 0 && daily_rows.len() as i64 > trend_days {
        let keep_from = daily_rows.len() - trend_days as usize;
        daily_rows = daily_rows.split_off(keep_from);
    }

    CallMetricsSummary {
        generated_at_utc: now_utc,
        calls_total,
        active_calls,
        ended_calls,
        status_counts,
        ptp_calls_total,
        ptp_calls_ended,
        ptp_success_rate_ended: ratio(ptp_calls_ended, ended_calls),
        ptp_success_rate_all_calls: ratio(ptp_calls_total, calls_total),
        time_to_ptp_samples: sorted_latencies.len() as u64,
        avg_time_to_ptp_seconds: avg_seconds,
        median_time_to_ptp_seconds: median_seconds,
        avg_time_to_ptp_minutes: avg_seconds.map(|s| round2(s / 60.0)),
        median_time_to_ptp_minutes: median_seconds.map(|s| round2(s / 60.0)),
        daily: daily_rows,
    }
}

#[cfg(test)]
#[path = "call_metrics_tests.rs"]
mod tests;
