// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound call job: the durable unit of work dispatched by the worker,
//! its state machine, and its retry/idempotency helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

crate::define_id! {
    /// Unique identifier for an outbound call job.
    pub struct JobId("job-");
}

/// Where a job's initial enqueue originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Api,
    Scheduler,
    Manual,
}

crate::simple_display! {
    TriggerSource {
        Api => "api",
        Scheduler => "scheduler",
        Manual => "manual",
    }
}

/// State of a job's formal state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Leased,
    Running,
    Succeeded,
    Failed,
    WaitingRetry,
    DeadLetter,
    Canceled,
}

crate::simple_display! {
    JobState {
        Queued => "queued",
        Leased => "leased",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
        WaitingRetry => "waiting_retry",
        DeadLetter => "dead_letter",
        Canceled => "canceled",
    }
}

impl JobState {
    /// Terminal states never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::DeadLetter | JobState::Canceled)
    }
}

/// An event driving the job state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobEvent {
    Lease,
    Start,
    CallSucceeded,
    CallFailed,
    ScheduleRetry,
    RetryReady,
    ExhaustRetries,
    Cancel,
}

crate::simple_display! {
    JobEvent {
        Lease => "lease",
        Start => "start",
        CallSucceeded => "call_succeeded",
        CallFailed => "call_failed",
        ScheduleRetry => "schedule_retry",
        RetryReady => "retry_ready",
        ExhaustRetries => "exhaust_retries",
        Cancel => "cancel",
    }
}

/// Errors raised by the job state machine and job mutators.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JobError {
    #[error("cannot apply event {event} to job in state {state}")]
    IllegalTransition { state: JobState, event: JobEvent },
    #[error("job {job_id} has no attempts recorded")]
    NoAttempts { job_id: JobId },
    #[error("job {job_id} has exhausted its retry budget ({max_attempts} attempts)")]
    RetriesExhausted { job_id: JobId, max_attempts: u32 },
}

/// `(state, event) -> state` transition table. Returns
/// [`JobError::IllegalTransition`] for any pair not explicitly wired.
pub fn transition_state(state: JobState, event: JobEvent) -> Result<JobState, JobError> {
    use JobEvent::*;
    use JobState::*;
    match (state, event) {
        (Queued, Lease) => Ok(Leased),
        (Leased, Start) => Ok(Running),
        (Running, CallSucceeded) => Ok(Succeeded),
        (Running, CallFailed) => Ok(Failed),
        (Leased, ScheduleRetry) => Ok(WaitingRetry),
        (Failed, ScheduleRetry) => Ok(WaitingRetry),
        (WaitingRetry, RetryReady) => Ok(Queued),
        (Failed, ExhaustRetries) => Ok(DeadLetter),
        (Queued, Cancel) | (Leased, Cancel) | (Running, Cancel) | (WaitingRetry, Cancel) => Ok(Canceled),
        (state, event) => Err(JobError::IllegalTransition { state, event }),
    }
}

/// Default retry policy: 3 attempts, 120s base delay, capped at 3600s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_seconds: u64,
    pub max_delay_seconds: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay_seconds: 120, max_delay_seconds: 3600 }
    }
}

/// Exponential backoff with no jitter: `min(base * 2^(attempt-1), max)`.
pub fn compute_retry_delay_seconds(attempt_number: u32, policy: &RetryPolicy) -> u64 {
    let exponent = attempt_number.saturating_sub(1);
    let scaled = policy.base_delay_seconds.saturating_mul(1u64 << exponent.min(63));
    scaled.min(policy.max_delay_seconds)
}

/// The compliance-relevant policy facts attached to a job at enqueue time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallPolicySnapshot {
    pub timezone: String,
    pub allowed_local_time_ranges: Vec<String>,
    #[serde(default = "default_daily_attempt_cap")]
    pub daily_attempt_cap: i32,
    #[serde(default = "default_min_gap_minutes")]
    pub min_gap_minutes: i32,
}

fn default_daily_attempt_cap() -> i32 {
    2
}

fn default_min_gap_minutes() -> i32 {
    60
}

/// Suppression flags that unconditionally block a dial attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionFlags {
    #[serde(default)]
    pub dnc: bool,
    #[serde(default)]
    pub cease_contact: bool,
    #[serde(default)]
    pub legal_hold: bool,
}

/// Identifying details of the person the call is targeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyProfile {
    pub target_name: String,
}

/// Account facts looked up separately from the job payload at dial time,
/// used by the verification and negotiation phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContext {
    pub expected_zip: String,
    pub amount_due: String,
}

fn default_language() -> String {
    "en-US".to_string()
}

/// The domain payload carried by an outbound call job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundCallPayload {
    pub account_ref: String,
    pub party_profile: PartyProfile,
    pub account_context_ref: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub suppression_flags: SuppressionFlags,
}

/// A single dial attempt against a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAttempt {
    pub attempt_number: u32,
    pub leased_at_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

/// Build the idempotency key for a job: `job_` followed by the first 24
/// hex characters of `sha256(campaign_id|account_ref|scheduled_for_utc)`.
pub fn build_idempotency_key(campaign_id: &str, account_ref: &str, scheduled_for_utc: &DateTime<Utc>) -> String {
    let material = format!("{campaign_id}|{account_ref}|{}", scheduled_for_utc.to_rfc3339());
    let digest = Sha256::digest(material.as_bytes());
    let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    format!("job_{}", &hex[..24])
}

/// An outbound call job: the durable unit of work the worker leases,
/// dispatches, and retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundCallJob {
    pub job_id: JobId,
    pub idempotency_key: String,
    pub campaign_id: String,
    pub account_ref: String,
    pub scheduled_for_utc: DateTime<Utc>,
    pub payload: OutboundCallPayload,
    pub policy: CallPolicySnapshot,
    pub retry_policy: RetryPolicy,
    pub state: JobState,
    #[serde(default)]
    pub attempts: Vec<JobAttempt>,
    pub trigger_source: TriggerSource,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_utc: Option<DateTime<Utc>>,
    /// Dispatch priority for lease selection: lower sorts first among
    /// jobs equally due. Defaults to 0 (no preference).
    #[serde(default)]
    pub priority: i32,
}

impl OutboundCallJob {
    pub fn new(
        campaign_id: impl Into<String>,
        payload: OutboundCallPayload,
        policy: CallPolicySnapshot,
        retry_policy: RetryPolicy,
        scheduled_for_utc: DateTime<Utc>,
        trigger_source: TriggerSource,
        now_utc: DateTime<Utc>,
    ) -> Self {
        let campaign_id = campaign_id.into();
        let idempotency_key = build_idempotency_key(&campaign_id, &payload.account_ref, &scheduled_for_utc);
        Self {
            job_id: JobId::new(),
            idempotency_key,
            campaign_id,
            account_ref: payload.account_ref.clone(),
            scheduled_for_utc,
            payload,
            policy,
            retry_policy,
            state: JobState::Queued,
            attempts: Vec::new(),
            trigger_source,
            created_at_utc: now_utc,
            updated_at_utc: now_utc,
            retry_after_utc: None,
            priority: 0,
        }
    }

    /// Set the dispatch priority (lower sorts first). Builder-style, for
    /// use right after [`OutboundCallJob::new`].
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn apply(&mut self, event: JobEvent, now_utc: DateTime<Utc>) -> Result<(), JobError> {
        self.state = transition_state(self.state, event)?;
        self.updated_at_utc = now_utc;
        Ok(())
    }

    /// Lease the job for dispatch, recording a new attempt.
    pub fn lease(&mut self, now_utc: DateTime<Utc>) -> Result<&JobAttempt, JobError> {
        self.apply(JobEvent::Lease, now_utc)?;
        let attempt_number = self.attempts.len() as u32 + 1;
        self.attempts.push(JobAttempt {
            attempt_number,
            leased_at_utc: now_utc,
            started_at_utc: None,
            finished_at_utc: None,
            outcome: None,
            error_detail: None,
        });
        Ok(self.attempts.last().expect("attempt just pushed"))
    }

    /// Mark the leased attempt as started.
    pub fn mark_started(&mut self, now_utc: DateTime<Utc>) -> Result<(), JobError> {
        self.apply(JobEvent::Start, now_utc)?;
        if let Some(attempt) = self.attempts.last_mut() {
            attempt.started_at_utc = Some(now_utc);
        }
        Ok(())
    }

    /// Mark the running attempt succeeded.
    pub fn mark_succeeded(&mut self, outcome: impl Into<String>, now_utc: DateTime<Utc>) -> Result<(), JobError> {
        self.apply(JobEvent::CallSucceeded, now_utc)?;
        if let Some(attempt) = self.attempts.last_mut() {
            attempt.finished_at_utc = Some(now_utc);
            attempt.outcome = Some(outcome.into());
        }
        Ok(())
    }

    /// Whether another attempt may still be scheduled after a failure.
    pub fn can_attempt_again(&self) -> bool {
        (self.attempts.len() as u32) < self.retry_policy.max_attempts
    }

    /// Mark the running attempt failed and move to `waiting_retry` if the
    /// retry budget allows it, or `dead_letter` otherwise.
    pub fn mark_failed_and_schedule_retry(&mut self, error_detail: impl Into<String>, now_utc: DateTime<Utc>) -> Result<(), JobError> {
        self.apply(JobEvent::CallFailed, now_utc)?;
        let attempt_number = self.attempts.len() as u32;
        if let Some(attempt) = self.attempts.last_mut() {
            attempt.finished_at_utc = Some(now_utc);
            attempt.outcome = Some("failed".to_string());
            attempt.error_detail = Some(error_detail.into());
        }
        if self.can_attempt_again() {
            let delay = compute_retry_delay_seconds(attempt_number, &self.retry_policy);
            self.apply(JobEvent::ScheduleRetry, now_utc)?;
            self.retry_after_utc = Some(now_utc + chrono::Duration::seconds(delay as i64));
            Ok(())
        } else {
            self.apply(JobEvent::ExhaustRetries, now_utc)
        }
    }

    /// Move a job whose retry delay has elapsed back onto the queue.
    pub fn retry_ready(&mut self, now_utc: DateTime<Utc>) -> Result<(), JobError> {
        self.apply(JobEvent::RetryReady, now_utc)?;
        self.retry_after_utc = None;
        Ok(())
    }

    /// Defer a job that was leased but blocked by the pre-dial compliance
    /// gate before dialing started: `leased -> waiting_retry` directly,
    /// without consuming a retry-budget attempt.
    pub fn defer_leased(&mut self, error_code: impl Into<String>, delay_seconds: i64, now_utc: DateTime<Utc>) -> Result<(), JobError> {
        if let Some(attempt) = self.attempts.last_mut() {
            attempt.finished_at_utc = Some(now_utc);
            attempt.outcome = Some(error_code.into());
        }
        self.apply(JobEvent::ScheduleRetry, now_utc)?;
        self.retry_after_utc = Some(now_utc + chrono::Duration::seconds(delay_seconds.max(0)));
        Ok(())
    }

    /// Cancel the job from any non-terminal state, recording `reason_code`
    /// on the in-flight attempt (if any) for the compliance-gate's
    /// non-retryable blocks.
    pub fn cancel_with_outcome(&mut self, reason_code: impl Into<String>, now_utc: DateTime<Utc>) -> Result<(), JobError> {
        if let Some(attempt) = self.attempts.last_mut() {
            attempt.finished_at_utc = Some(now_utc);
            attempt.outcome = Some(reason_code.into());
        }
        self.apply(JobEvent::Cancel, now_utc)
    }

    /// Cancel the job from any non-terminal state.
    pub fn cancel(&mut self, now_utc: DateTime<Utc>) -> Result<(), JobError> {
        self.apply(JobEvent::Cancel, now_utc)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
