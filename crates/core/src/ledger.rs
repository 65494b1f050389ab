// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attempt-ledger event shape.
//!
//! A ledger event is an append-only record of a single dial attempt or
//! policy decision against an account. It is the unit the compliance gate
//! reads back (`attempts_today`, `last_counted_attempt_at`) and the unit
//! the worker writes after every dispatch.

use crate::call::CallId;
use crate::job::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a single ledger event.
    pub struct LedgerEventId("ldg-");
}

/// A single entry in an account's attempt ledger.
///
/// `decision_code` mirrors the compliance gate's decision codes
/// (e.g. `"allowed"`, `"blocked_suppression_dnc"`) or a call outcome code
/// when the event records a completed dial rather than a gate decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub id: LedgerEventId,
    pub account_ref: String,
    pub recorded_at_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<CallId>,
    pub decision_code: String,
    /// Whether this event counts toward the daily attempt cap and the
    /// minimum inter-attempt gap. Gate-blocked events never count;
    /// completed dial attempts (reached or not) do.
    pub counts_toward_attempt: bool,
}

impl LedgerEvent {
    pub fn new(account_ref: impl Into<String>, decision_code: impl Into<String>, recorded_at_utc: DateTime<Utc>, counts_toward_attempt: bool) -> Self {
        Self {
            id: LedgerEventId::new(),
            account_ref: account_ref.into(),
            recorded_at_utc,
            job_id: None,
            call_id: None,
            decision_code: decision_code.into(),
            counts_toward_attempt,
        }
    }

    pub fn with_job_id(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    pub fn with_call_id(mut self, call_id: CallId) -> Self {
        self.call_id = Some(call_id);
        self
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
