// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios spanning the worker loop, the pre-dial compliance
//! gate, and the per-call dialog engine together, the way a real dial
//! attempt would actually traverse them.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use oc_compliance::{evaluate_pre_dial_gate, LedgerFacts};
use oc_core::test_support::{sample_job, sample_policy};
use oc_core::{Action, AccountContext, CallId, JobState, Phase};
use oc_dialog::{handle_turn, PolicyLimits};
use oc_storage::{CallRecord, JsonAttemptLedger, JsonCallStore, JsonJobStore};
use oc_worker::{process_one_job, ProcessOutcome, WorkerStores};
use tempfile::tempdir;

fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 5, hour, minute, 0).unwrap()
}

struct Harness {
    _dir: tempfile::TempDir,
    jobs: JsonJobStore,
    calls: JsonCallStore,
    ledger: JsonAttemptLedger,
}

impl Harness {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let jobs = JsonJobStore::open(dir.path().join("jobs")).unwrap();
        let calls = JsonCallStore::open(dir.path().join("calls")).unwrap();
        let ledger = JsonAttemptLedger::open(dir.path().join("ledger")).unwrap();
        Self { _dir: dir, jobs, calls, ledger }
    }

    fn stores(&self) -> WorkerStores {
        WorkerStores { jobs: &self.jobs, calls: &self.calls, ledger: &self.ledger }
    }
}

const TARGET_NAME: &str = "Jordan Rivera";

fn account_context(expected_zip: &str, amount_due: &str) -> AccountContext {
    AccountContext { expected_zip: expected_zip.to_string(), amount_due: amount_due.to_string() }
}

/// Drive a job from lease through worker initialization (which itself
/// calls the dialog engine's opening prompt), returning the freshly
/// created `CallRecord` so a test can start feeding it turns.
fn lease_and_initialize(harness: &Harness, account_ref: &str, scheduled_for_utc: DateTime<Utc>, now_utc: DateTime<Utc>) -> CallRecord {
    harness.jobs.create_job(sample_job(account_ref, scheduled_for_utc)).unwrap();
    let outcome = process_one_job(&harness.stores(), "worker-1", 90, now_utc).unwrap();
    let call_id = match outcome {
        ProcessOutcome::Initialized { call_id } => call_id,
        other => panic!("expected the job to initialize a call, got {other:?}"),
    };
    harness.calls.get_call(&CallId::from_string(&call_id)).unwrap()
}

#[test]
fn happy_path_promise_to_pay_flows_through_verification_and_negotiation() {
    let harness = Harness::new();
    let mut record = lease_and_initialize(&harness, "acct-happy", ts(8, 0), ts(8, 5));
    assert_eq!(record.state.phase, Phase::PreVerification);
    assert_eq!(record.state.turn_count, 1);
    assert!(!record.state.last_assistant_question.as_deref().unwrap_or_default().to_lowercase().contains("debt"));

    let tz: Tz = "America/Chicago".parse().unwrap();
    let limits = PolicyLimits::default();
    let ctx = account_context("73301", "$120.00");

    // Turn 1: affirm identity, moving into verification without any disclosure.
    let out = handle_turn(&record.state, Some("This is Jordan Rivera."), TARGET_NAME, &ctx, tz, ts(8, 6), limits);
    assert_eq!(out.state.phase, Phase::Verification);
    assert!(!out.response_text.to_lowercase().contains("debt"));
    record.state = out.state;

    // Turn 2: verify ZIP, which delivers the disclosure and moves into negotiation.
    let out = handle_turn(&record.state, Some("it's 73301"), TARGET_NAME, &ctx, tz, ts(8, 7), limits);
    assert_eq!(out.state.phase, Phase::PostVerification);
    assert!(out.state.right_party_verified);
    assert!(out.state.disclosure_delivered);
    assert!(out.response_text.to_lowercase().contains("collect a debt"));
    record.state = out.state;

    // Turn 3: a direct "yes" to the disclosure's "can you pay today" ask
    // confirms the promise to pay immediately.
    let out = handle_turn(&record.state, Some("Yes, I can pay today."), TARGET_NAME, &ctx, tz, ts(8, 8), limits);
    assert_eq!(out.state.phase, Phase::Ended);
    assert!(out.state.promise_to_pay.confirmed);
    assert_eq!(out.state.end_reason.as_deref(), Some("ptp_set"));
    assert!(out.actions.iter().any(|a| matches!(a, Action::SetOutcome { outcome_code } if outcome_code == "ptp_set")));
    assert!(out.actions.iter().any(|a| matches!(a, Action::CreatePromiseToPay { .. })));

    record.state = out.state;
    record.ended_at_utc = Some(ts(8, 8));
    harness.calls.save_call(&record).unwrap();
    let reloaded = harness.calls.get_call(&record.call_id).unwrap();
    assert_eq!(reloaded.state.phase, Phase::Ended);
}

#[test]
fn weekday_payment_date_needs_confirmation_before_it_is_set() {
    let harness = Harness::new();
    let record = lease_and_initialize(&harness, "acct-weekday", ts(8, 0), ts(8, 5));
    let tz: Tz = "America/Chicago".parse().unwrap();
    let limits = PolicyLimits::default();
    let ctx = account_context("73301", "$120.00");

    let s = handle_turn(&record.state, Some("This is Jordan."), TARGET_NAME, &ctx, tz, ts(8, 6), limits).state;
    let s = handle_turn(&s, Some("it's 73301"), TARGET_NAME, &ctx, tz, ts(8, 7), limits).state;
    assert_eq!(s.phase, Phase::PostVerification);

    let out = handle_turn(&s, Some("Friday."), TARGET_NAME, &ctx, tz, ts(8, 8), limits);
    assert_eq!(out.state.last_assistant_intent.as_deref(), Some("confirm_payment_date"));
    assert!(out.actions.is_empty());
    assert!(out.state.last_proposed_payment_date.is_some());
    assert!(!out.state.is_ended());

    let out2 = handle_turn(&out.state, Some("Yes."), TARGET_NAME, &ctx, tz, ts(8, 9), limits);
    assert!(out2.state.promise_to_pay.confirmed);
    assert_eq!(out2.state.end_reason.as_deref(), Some("ptp_set"));
}

#[test]
fn wrong_party_indication_ends_the_call_without_verifying() {
    let harness = Harness::new();
    let record = lease_and_initialize(&harness, "acct-wrong", ts(8, 0), ts(8, 5));
    let tz: Tz = "America/Chicago".parse().unwrap();
    let limits = PolicyLimits::default();
    let ctx = account_context("73301", "$120.00");

    let out = handle_turn(&record.state, Some("Wrong number. Jordan does not live here."), TARGET_NAME, &ctx, tz, ts(8, 6), limits);

    assert_eq!(out.state.phase, Phase::Ended);
    assert!(out.state.wrong_party_indicated);
    assert_eq!(out.state.end_reason.as_deref(), Some("wrong_party"));
    assert!(out.actions.iter().any(|a| matches!(a, Action::SetOutcome { outcome_code } if outcome_code == "wrong_party")));
    assert!(out.actions.iter().any(|a| matches!(a, Action::EndCall { reason } if reason == "wrong_party")));
}

#[test]
fn dispute_raised_in_negotiation_escalates_to_a_human() {
    let harness = Harness::new();
    let record = lease_and_initialize(&harness, "acct-dispute", ts(8, 0), ts(8, 5));
    let tz: Tz = "America/Chicago".parse().unwrap();
    let limits = PolicyLimits::default();
    let ctx = account_context("73301", "$120.00");

    let s = handle_turn(&record.state, Some("yes, this is me"), TARGET_NAME, &ctx, tz, ts(8, 6), limits).state;
    let s = handle_turn(&s, Some("it's 73301"), TARGET_NAME, &ctx, tz, ts(8, 7), limits).state;
    assert_eq!(s.phase, Phase::PostVerification);

    let out = handle_turn(&s, Some("I don't owe this debt."), TARGET_NAME, &ctx, tz, ts(8, 8), limits);
    assert_eq!(out.state.phase, Phase::Ended);
    assert!(out.state.dispute_flag);
    assert!(out.state.escalation_flag);
    assert_eq!(out.state.escalation_reason.as_deref(), Some("dispute"));
    assert_eq!(out.state.end_reason.as_deref(), Some("escalated_dispute"));
    assert!(out.actions.iter().any(|a| matches!(a, Action::EscalateToHuman { reason } if reason == "dispute")));
}

#[test]
fn repeated_silence_ends_the_call_after_the_limit() {
    let harness = Harness::new();
    let record = lease_and_initialize(&harness, "acct-silent", ts(8, 0), ts(8, 5));
    let tz: Tz = "America/Chicago".parse().unwrap();
    let limits = PolicyLimits::default();
    let ctx = account_context("73301", "$120.00");

    let mut state = record.state;
    for minute in 6..8 {
        let out = handle_turn(&state, None, TARGET_NAME, &ctx, tz, ts(8, minute), limits);
        assert_eq!(out.state.phase, Phase::PreVerification, "should still be prompting, not yet timed out");
        state = out.state;
    }
    let out = handle_turn(&state, None, TARGET_NAME, &ctx, tz, ts(8, 8), limits);
    assert_eq!(out.state.phase, Phase::Ended);
    assert_eq!(out.state.end_reason.as_deref(), Some("silence_timeout"));
}

#[test]
fn dnc_suppression_blocks_the_dial_and_cancels_the_job_outright() {
    let harness = Harness::new();
    let mut job = sample_job("acct-dnc", ts(8, 0));
    job.payload.suppression_flags.dnc = true;
    harness.jobs.create_job(job).unwrap();

    let outcome = process_one_job(&harness.stores(), "worker-1", 90, ts(8, 5)).unwrap();
    assert_eq!(outcome, ProcessOutcome::Blocked { decision_code: "blocked_suppression_dnc".to_string() });
    assert!(harness.calls.list_calls().unwrap().is_empty(), "a blocked dial must never create a call record");
}

#[test]
fn daily_attempt_cap_produces_a_retryable_gate_decision_and_defers_the_job() {
    let harness = Harness::new();
    let mut job = sample_job("acct-capped", ts(8, 0));
    job.policy.daily_attempt_cap = 1;
    harness.jobs.create_job(job).unwrap();

    let first = process_one_job(&harness.stores(), "worker-1", 90, ts(8, 5)).unwrap();
    assert!(matches!(first, ProcessOutcome::Initialized { .. }));

    harness.jobs.create_job(sample_job("acct-capped", ts(8, 10))).unwrap();
    let second = process_one_job(&harness.stores(), "worker-1", 90, ts(8, 15)).unwrap();
    match second {
        ProcessOutcome::Deferred { decision_code, retry_after_seconds } => {
            assert_eq!(decision_code, "blocked_policy_daily_attempt_cap");
            assert!(retry_after_seconds > 0);
        }
        other => panic!("expected Deferred, got {other:?}"),
    }

    let jobs = harness
        .jobs
        .list_jobs()
        .unwrap()
        .into_iter()
        .find(|j| j.account_ref == "acct-capped" && j.state == JobState::WaitingRetry)
        .expect("the second attempt should be waiting_retry");
    assert!(jobs.can_attempt_again());
}

#[test]
fn evaluating_the_gate_directly_respects_minimum_inter_attempt_gap() {
    let policy = sample_policy("America/Chicago");
    let facts = LedgerFacts { attempts_today: 0, last_counted_attempt_at_utc: Some(ts(8, 0)) };
    let decision = evaluate_pre_dial_gate(&policy, Default::default(), facts, ts(8, 10)).unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.decision_code, "blocked_policy_min_gap");
    assert!(decision.retryable);
    assert!(decision.min_gap_blocked_minutes_remaining.unwrap() > 0.0);
}

#[test]
fn evaluating_the_gate_directly_allows_a_fresh_account_with_no_prior_attempts() {
    let policy = sample_policy("America/Chicago");
    let facts = LedgerFacts { attempts_today: 0, last_counted_attempt_at_utc: None };
    let decision = evaluate_pre_dial_gate(&policy, Default::default(), facts, ts(8, 0)).unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.decision_code, "allowed");
}
