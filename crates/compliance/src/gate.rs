// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pre-dial compliance gate: a deterministic function over suppression
//! flags, IANA call windows, daily attempt caps, and the minimum
//! inter-attempt gap. Evaluated fresh before every dial attempt.

use crate::error::{ComplianceError, ComplianceResult};
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use oc_core::{CallPolicySnapshot, SuppressionFlags};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Facts the gate needs beyond the job's policy snapshot: the ledger
/// lookups the storage crate would otherwise own. Kept as plain data so
/// this crate has no dependency on `oc-storage`.
#[derive(Debug, Clone, Copy)]
pub struct LedgerFacts {
    pub attempts_today: i32,
    pub last_counted_attempt_at_utc: Option<DateTime<Utc>>,
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreDialDecision {
    pub allowed: bool,
    pub decision_code: String,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_gap_blocked_minutes_remaining: Option<f64>,
}

impl PreDialDecision {
    fn allowed() -> Self {
        Self { allowed: true, decision_code: "allowed".to_string(), retryable: false, retry_after_seconds: None, min_gap_blocked_minutes_remaining: None }
    }

    fn blocked(code: &str, retryable: bool) -> Self {
        Self { allowed: false, decision_code: code.to_string(), retryable, retry_after_seconds: None, min_gap_blocked_minutes_remaining: None }
    }

    fn blocked_retry_after(code: &str, retry_after_seconds: i64) -> Self {
        Self { allowed: false, decision_code: code.to_string(), retryable: true, retry_after_seconds: Some(retry_after_seconds), min_gap_blocked_minutes_remaining: None }
    }
}

fn parse_window(window: &str) -> ComplianceResult<(NaiveTime, NaiveTime)> {
    let (start_s, end_s) = window
        .split_once('-')
        .ok_or_else(|| ComplianceError::MalformedWindow { window: window.to_string() })?;
    let start = NaiveTime::from_str(&format!("{start_s}:00"))
        .map_err(|_| ComplianceError::MalformedWindow { window: window.to_string() })?;
    let end = NaiveTime::from_str(&format!("{end_s}:00"))
        .map_err(|_| ComplianceError::MalformedWindow { window: window.to_string() })?;
    Ok((start, end))
}

/// True if `current` falls within `start..end`, treating `start > end` as a
/// midnight-wrapping window (e.g. `"22:00-06:00"`).
fn time_in_window(current: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start <= end {
        current >= start && current <= end
    } else {
        current >= start || current <= end
    }
}

fn is_local_time_allowed(local_time: NaiveTime, ranges: &[String]) -> ComplianceResult<bool> {
    for range in ranges {
        let (start, end) = parse_window(range)?;
        if time_in_window(local_time, start, end) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn seconds_to_next_local_midnight(now_local: DateTime<Tz>) -> i64 {
    let next_midnight = (now_local.date_naive() + chrono::Duration::days(1))
        .and_hms_opt(0, 0, 0)
        .expect("midnight always valid");
    let next_midnight_local = now_local.timezone().from_local_datetime(&next_midnight).single().unwrap_or(now_local);
    (next_midnight_local - now_local).num_seconds().max(0)
}

/// Evaluate the pre-dial gate, in the fixed order: DNC, cease-contact,
/// legal hold, call window, daily cap, minimum gap.
pub fn evaluate_pre_dial_gate(
    policy: &CallPolicySnapshot,
    suppression: SuppressionFlags,
    facts: LedgerFacts,
    now_utc: DateTime<Utc>,
) -> ComplianceResult<PreDialDecision> {
    if suppression.dnc {
        return Ok(PreDialDecision::blocked("blocked_suppression_dnc", false));
    }
    if suppression.cease_contact {
        return Ok(PreDialDecision::blocked("blocked_suppression_cease_contact", false));
    }
    if suppression.legal_hold {
        return Ok(PreDialDecision::blocked("blocked_suppression_legal_hold", false));
    }

    let tz: Tz = policy.timezone.parse().map_err(|_| ComplianceError::UnknownTimezone { tz: policy.timezone.clone() })?;
    let now_local = now_utc.with_timezone(&tz);

    if !is_local_time_allowed(now_local.time(), &policy.allowed_local_time_ranges)? {
        return Ok(PreDialDecision::blocked_retry_after("blocked_policy_outside_call_window", 900));
    }

    if facts.attempts_today >= policy.daily_attempt_cap {
        let retry_after = seconds_to_next_local_midnight(now_local).max(60);
        return Ok(PreDialDecision::blocked_retry_after("blocked_policy_daily_attempt_cap", retry_after));
    }

    if let Some(last_at) = facts.last_counted_attempt_at_utc {
        let elapsed_minutes = (now_utc - last_at).num_seconds() as f64 / 60.0;
        if elapsed_minutes < policy.min_gap_minutes as f64 {
            let remaining = policy.min_gap_minutes as f64 - elapsed_minutes;
            let retry_after = (remaining.round() as i64).max(1) * 60;
            let mut decision = PreDialDecision::blocked_retry_after("blocked_policy_min_gap", retry_after);
            decision.min_gap_blocked_minutes_remaining = Some(remaining);
            return Ok(decision);
        }
    }

    Ok(PreDialDecision::allowed())
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
