// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One lease/gate/dispatch cycle against the job, call, and attempt-ledger
//! stores, grounded on `run_outbound_worker.py`'s `_process_one_job`.

use chrono::{DateTime, Utc};
use oc_compliance::{evaluate_pre_dial_gate, LedgerFacts};
use oc_core::{CallState, JobId, JobState, LedgerEvent};
use oc_dialog::start_call;
use oc_storage::{CallRecord, JsonAttemptLedger, JsonCallStore, JsonJobStore};

use crate::error::{WorkerError, WorkerResult};

/// The three stores a worker cycle touches. Bundled so call sites don't
/// have to thread three references through every call.
pub struct WorkerStores<'a> {
    pub jobs: &'a JsonJobStore,
    pub calls: &'a JsonCallStore,
    pub ledger: &'a JsonAttemptLedger,
}

/// What happened in one `process_one_job` call, for the loop's logging
/// and `--max-jobs`/`--once` bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// No due job was available to lease.
    Idle,
    /// The gate blocked the call; the job was deferred for retry.
    Deferred { decision_code: String, retry_after_seconds: i64 },
    /// The gate blocked the call with no retry possible; the job was canceled.
    Blocked { decision_code: String },
    /// The call was initialized and a call record created.
    Initialized { call_id: String },
}

fn error_kind(err: &WorkerError) -> &'static str {
    match err {
        WorkerError::Storage(_) => "StorageError",
        WorkerError::Compliance(_) => "ComplianceError",
        WorkerError::Job(_) => "JobError",
    }
}

/// Lease the next due job and drive it through the compliance gate,
/// either deferring/canceling it on a block or initializing its call and
/// marking the job succeeded. Returns `Idle` when nothing was due.
///
/// Any error raised after a successful lease triggers the same
/// best-effort recovery the worker loop would otherwise have to perform
/// itself: a `running` job is failed (consuming retry budget), a job
/// still only `leased` is deferred (not consuming one).
pub fn process_one_job(stores: &WorkerStores, worker_id: &str, lease_seconds: i64, now_utc: DateTime<Utc>) -> WorkerResult<ProcessOutcome> {
    let Some(job) = stores.jobs.lease_next_due_job(worker_id, lease_seconds, now_utc)? else {
        return Ok(ProcessOutcome::Idle);
    };
    let job_id = job.job_id;

    match dispatch_leased_job(stores, job, now_utc) {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            recover_from_unexpected_error(stores, job_id, error_kind(&err), now_utc);
            Err(err)
        }
    }
}

fn dispatch_leased_job(stores: &WorkerStores, mut job: oc_core::OutboundCallJob, now_utc: DateTime<Utc>) -> WorkerResult<ProcessOutcome> {
    let tz: chrono_tz::Tz = job.policy.timezone.parse().unwrap_or(chrono_tz::UTC);
    let attempts_today = stores.ledger.attempts_today(&job.account_ref, tz, now_utc)?;
    let last_counted_attempt_at_utc = stores.ledger.last_counted_attempt_at(&job.account_ref)?;
    let facts = LedgerFacts { attempts_today, last_counted_attempt_at_utc };

    let decision = evaluate_pre_dial_gate(&job.policy, job.payload.suppression_flags, facts, now_utc)?;

    if !decision.allowed {
        stores.ledger.append(LedgerEvent::new(&job.account_ref, decision.decision_code.clone(), now_utc, false).with_job_id(job.job_id))?;

        if decision.retryable {
            let delay_seconds = decision.retry_after_seconds.unwrap_or(900);
            job.defer_leased(decision.decision_code.clone(), delay_seconds, now_utc)?;
            stores.jobs.save_job(&job)?;
            return Ok(ProcessOutcome::Deferred { decision_code: decision.decision_code, retry_after_seconds: delay_seconds });
        }

        job.cancel_with_outcome(decision.decision_code.clone(), now_utc)?;
        stores.jobs.save_job(&job)?;
        return Ok(ProcessOutcome::Blocked { decision_code: decision.decision_code });
    }

    job.mark_started(now_utc)?;
    stores.jobs.save_job(&job)?;

    let opening = start_call(&CallState::default(), &job.payload.party_profile.target_name);
    let record = CallRecord::new(job.job_id, job.account_ref.clone(), now_utc, opening.state);
    let record = stores.calls.create_call(record)?;

    job.mark_succeeded("call_initialized", now_utc)?;
    stores.jobs.save_job(&job)?;

    stores
        .ledger
        .append(LedgerEvent::new(&job.account_ref, "call_initialized", now_utc, true).with_job_id(job.job_id).with_call_id(record.call_id))?;

    Ok(ProcessOutcome::Initialized { call_id: record.call_id.to_string() })
}

/// Best-effort recovery from an unexpected error mid-cycle: if the job is
/// still `running`, fail it (consuming retry budget); if it's only
/// `leased`, defer it without consuming one. Mirrors the bare `except
/// Exception` handler in `run_outbound_worker.py`. Failures here are
/// swallowed — this is already the error path.
fn recover_from_unexpected_error(stores: &WorkerStores, job_id: JobId, kind: &str, now_utc: DateTime<Utc>) {
    let Ok(mut job) = stores.jobs.get_job(&job_id) else {
        return;
    };
    let error_code = format!("worker_exception:{kind}");
    let recovered = match job.state {
        JobState::Running => job.mark_failed_and_schedule_retry(error_code.clone(), now_utc).is_ok(),
        JobState::Leased => job.defer_leased(error_code.clone(), 120, now_utc).is_ok(),
        _ => false,
    };
    if recovered {
        let _ = stores.jobs.save_job(&job);
    }
    let _ = stores.ledger.append(LedgerEvent::new(&job.account_ref, error_code, now_utc, false).with_job_id(job_id));
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
