// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use oc_core::{Action, JobId, Phase};
use tempfile::tempdir;

fn ts(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 5, hour, 0, 0).unwrap()
}

fn opening_state() -> CallState {
    let mut state = CallState::default();
    state.turn_count = 1;
    state.last_assistant_intent = Some("request_target".to_string());
    state
}

#[test]
fn create_then_get_round_trips() {
    let dir = tempdir().unwrap();
    let store = JsonCallStore::open(dir.path()).unwrap();
    let record = CallRecord::new(JobId::new(), "acct-1", ts(9), opening_state());
    let created = store.create_call(record).unwrap();
    let fetched = store.get_call(&created.call_id).unwrap();
    assert_eq!(fetched.account_ref, "acct-1");
    assert_eq!(fetched.state.phase, Phase::PreVerification);
    assert_eq!(fetched.status, CallStatus::Active);
    assert_eq!(fetched.turns.len(), 1);
    assert_eq!(fetched.turns[0].event_type, "system_start");
    assert_eq!(fetched.turns[0].assistant_intent.as_deref(), Some("request_target"));
}

#[test]
fn get_call_missing_returns_not_found() {
    let dir = tempdir().unwrap();
    let store = JsonCallStore::open(dir.path()).unwrap();
    let err = store.get_call(&CallId::new()).unwrap_err();
    assert!(matches!(err, StorageError::CallNotFound { .. }));
}

#[test]
fn save_call_persists_state_mutation() {
    let dir = tempdir().unwrap();
    let store = JsonCallStore::open(dir.path()).unwrap();
    let mut record = store.create_call(CallRecord::new(JobId::new(), "acct-1", ts(9), opening_state())).unwrap();
    record.state.phase = Phase::Ended;
    record.ended_at_utc = Some(ts(10));
    store.save_call(&record).unwrap();
    let reloaded = store.get_call(&record.call_id).unwrap();
    assert_eq!(reloaded.state.phase, Phase::Ended);
    assert_eq!(reloaded.ended_at_utc, Some(ts(10)));
}

#[test]
fn list_calls_skips_corrupt_files() {
    let dir = tempdir().unwrap();
    let store = JsonCallStore::open(dir.path()).unwrap();
    store.create_call(CallRecord::new(JobId::new(), "acct-1", ts(9), opening_state())).unwrap();
    std::fs::write(dir.path().join("garbage.json"), b"{not json").unwrap();
    assert_eq!(store.list_calls().unwrap().len(), 1);
}

#[test]
fn append_turn_tracks_transcript_and_marks_active() {
    let dir = tempdir().unwrap();
    let store = JsonCallStore::open(dir.path()).unwrap();
    let record = store.create_call(CallRecord::new(JobId::new(), "acct-1", ts(9), opening_state())).unwrap();

    let mut next_state = opening_state();
    next_state.turn_count = 2;
    next_state.phase = Phase::Verification;
    let updated = store
        .append_turn(
            &record.call_id,
            "turn",
            true,
            Some("verify_identity".to_string()),
            Vec::new(),
            next_state,
            Some("affirmation".to_string()),
            Some(0.9),
            ts(9),
            ts(9),
        )
        .unwrap();

    assert_eq!(updated.status, CallStatus::Active);
    assert_eq!(updated.turns.len(), 2);
    assert_eq!(updated.turns[1].turn_index, 2);
    assert_eq!(updated.turns[1].nlu_intent.as_deref(), Some("affirmation"));
    assert!(updated.final_outcome_code.is_none());
}

#[test]
fn append_turn_finalizes_outcome_when_the_call_ends() {
    let dir = tempdir().unwrap();
    let store = JsonCallStore::open(dir.path()).unwrap();
    let record = store.create_call(CallRecord::new(JobId::new(), "acct-1", ts(9), opening_state())).unwrap();

    let mut ended_state = opening_state();
    ended_state.turn_count = 2;
    ended_state.phase = Phase::Ended;
    ended_state.end_reason = Some("wrong_party".to_string());
    let actions = vec![Action::SetOutcome { outcome_code: "wrong_party".to_string() }, Action::EndCall { reason: "wrong_party".to_string() }];

    let updated = store
        .append_turn(&record.call_id, "turn", true, Some("close".to_string()), actions, ended_state, None, None, ts(9), ts(10))
        .unwrap();

    assert_eq!(updated.status, CallStatus::Ended);
    assert_eq!(updated.ended_at_utc, Some(ts(10)));
    assert_eq!(updated.final_outcome_code.as_deref(), Some("wrong_party"));
    assert_eq!(updated.final_end_reason.as_deref(), Some("wrong_party"));

    let summary = updated.summarize();
    assert_eq!(summary.status, CallStatus::Ended);
    assert_eq!(summary.turns_count, 2);
    assert_eq!(summary.last_assistant_intent.as_deref(), Some("close"));
    assert_eq!(summary.final_outcome_code.as_deref(), Some("wrong_party"));
}

#[test]
fn append_turn_falls_back_to_end_call_reason_when_no_outcome_is_set() {
    let dir = tempdir().unwrap();
    let store = JsonCallStore::open(dir.path()).unwrap();
    let record = store.create_call(CallRecord::new(JobId::new(), "acct-1", ts(9), opening_state())).unwrap();

    let mut ended_state = opening_state();
    ended_state.phase = Phase::Ended;
    let actions = vec![Action::EndCall { reason: "max_turns".to_string() }];

    let updated = store
        .append_turn(&record.call_id, "turn", true, None, actions, ended_state, None, None, ts(9), ts(10))
        .unwrap();

    assert_eq!(updated.final_outcome_code.as_deref(), Some("max_turns"));
    assert_eq!(updated.final_end_reason.as_deref(), Some("max_turns"));
}

#[test]
fn append_turn_missing_call_returns_not_found() {
    let dir = tempdir().unwrap();
    let store = JsonCallStore::open(dir.path()).unwrap();
    let err = store.append_turn(&CallId::new(), "turn", false, None, Vec::new(), opening_state(), None, None, ts(9), ts(9)).unwrap_err();
    assert!(matches!(err, StorageError::CallNotFound { .. }));
}
