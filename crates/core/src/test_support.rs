// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixture constructors shared by this crate's tests and by the other
//! workspace crates' test suites (enabled via the `test-support` feature).

use crate::call::{CallState, Phase};
use crate::job::{
    CallPolicySnapshot, OutboundCallJob, OutboundCallPayload, PartyProfile, RetryPolicy,
    SuppressionFlags, TriggerSource,
};
use chrono::{DateTime, Utc};

/// A payload for a well-formed, unsuppressed account.
pub fn sample_payload(account_ref: &str) -> OutboundCallPayload {
    OutboundCallPayload {
        account_ref: account_ref.to_string(),
        party_profile: PartyProfile { target_name: "Jordan Rivera".to_string() },
        account_context_ref: format!("ctx-{account_ref}"),
        language: "en-US".to_string(),
        suppression_flags: SuppressionFlags::default(),
    }
}

/// A policy snapshot with a generous, always-open call window.
pub fn sample_policy(timezone: &str) -> CallPolicySnapshot {
    CallPolicySnapshot {
        timezone: timezone.to_string(),
        allowed_local_time_ranges: vec!["00:00-23:59".to_string()],
        daily_attempt_cap: 2,
        min_gap_minutes: 60,
    }
}

/// A job ready to be leased, scheduled for `scheduled_for_utc`.
pub fn sample_job(account_ref: &str, scheduled_for_utc: DateTime<Utc>) -> OutboundCallJob {
    OutboundCallJob::new(
        "campaign-test",
        sample_payload(account_ref),
        sample_policy("America/Chicago"),
        RetryPolicy::default(),
        scheduled_for_utc,
        TriggerSource::Api,
        scheduled_for_utc,
    )
}

/// A call state parked in `pre_verification`, as a fresh call begins.
pub fn sample_call_state() -> CallState {
    CallState { phase: Phase::PreVerification, ..CallState::default() }
}
