// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rollup metrics over stored jobs and attempt-ledger events: state and
//! outcome distribution, blocked-attempt totals split by suppression vs.
//! policy gates, and decision-code frequency.

use std::collections::BTreeMap;

use oc_core::{JobState, LedgerEvent, OutboundCallJob};
use serde::Serialize;

/// Aggregate job metrics over a set of stored jobs and ledger events.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobMetricsSummary {
    pub jobs_total: u64,
    pub state_counts: BTreeMap<String, u64>,
    pub outcome_counts: BTreeMap<String, u64>,
    pub error_counts: BTreeMap<String, u64>,
    pub blocked_policy_total: u64,
    pub blocked_suppression_total: u64,
    pub attempt_events_total: u64,
    pub contact_attempts_total: u64,
    pub decision_code_counts: BTreeMap<String, u64>,
}

fn state_label(state: JobState) -> &'static str {
    match state {
        JobState::Queued => "queued",
        JobState::Leased => "leased",
        JobState::Running => "running",
        JobState::Succeeded => "succeeded",
        JobState::Failed => "failed",
        JobState::WaitingRetry => "waiting_retry",
        JobState::DeadLetter => "dead_letter",
        JobState::Canceled => "canceled",
    }
}

fn bump(counts: &mut BTreeMap<String, u64>, key: &str) {
    *counts.entry(key.to_string()).or_insert(0) += 1;
}

fn bump_blocked_totals(code: &str, blocked_policy_total: &mut u64, blocked_suppression_total: &mut u64) {
    if code.starts_with("blocked_policy_") {
        *blocked_policy_total += 1;
    }
    if code.starts_with("blocked_suppression_") {
        *blocked_suppression_total += 1;
    }
}

/// Build a job metrics summary from stored jobs and (optionally) the
/// attempt-ledger events recorded alongside them.
pub fn build_job_metrics_summary(jobs: &[OutboundCallJob], attempt_events: &[LedgerEvent]) -> JobMetricsSummary {
    let mut state_counts = BTreeMap::new();
    let mut outcome_counts = BTreeMap::new();
    let mut error_counts = BTreeMap::new();
    let mut blocked_policy_total = 0u64;
    let mut blocked_suppression_total = 0u64;

    for job in jobs {
        bump(&mut state_counts, state_label(job.state));

        if let Some(last_attempt) = job.attempts.last() {
            if let Some(outcome) = &last_attempt.outcome {
                bump(&mut outcome_counts, outcome);
                bump_blocked_totals(outcome, &mut blocked_policy_total, &mut blocked_suppression_total);
            }
            if let Some(error) = &last_attempt.error_detail {
                bump(&mut error_counts, error);
                bump_blocked_totals(error, &mut blocked_policy_total, &mut blocked_suppression_total);
            }
        }
    }

    let mut decision_code_counts = BTreeMap::new();
    let mut contact_attempts_total = 0u64;
    for event in attempt_events {
        bump(&mut decision_code_counts, &event.decision_code);
        if event.counts_toward_attempt {
            contact_attempts_total += 1;
        }
    }

    JobMetricsSummary {
        jobs_total: jobs.len() as u64,
        state_counts,
        outcome_counts,
        error_counts,
        blocked_policy_total,
        blocked_suppression_total,
        attempt_events_total: attempt_events.len() as u64,
        contact_attempts_total,
        decision_code_counts,
    }
}

#[cfg(test)]
#[path = "job_metrics_tests.rs"]
mod tests;
