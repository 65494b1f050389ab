// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_call_state_starts_in_pre_verification() {
    let state = CallState::default();
    assert_eq!(state.phase, Phase::PreVerification);
    assert_eq!(state.turn_count, 0);
    assert!(!state.is_ended());
    assert_eq!(state.target_reached, YesNoUnknown::Unknown);
    assert_eq!(state.user_sentiment, Sentiment::Neutral);
}

#[test]
fn is_ended_tracks_phase() {
    let mut state = CallState::default();
    assert!(!state.is_ended());
    state.phase = Phase::Ended;
    assert!(state.is_ended());
}

#[test]
fn phase_display_matches_wire_names() {
    assert_eq!(Phase::PreVerification.to_string(), "pre_verification");
    assert_eq!(Phase::Verification.to_string(), "verification");
    assert_eq!(Phase::PostVerification.to_string(), "post_verification");
    assert_eq!(Phase::Ended.to_string(), "ended");
}

#[test]
fn call_state_serde_round_trips() {
    let mut state = CallState::default();
    state.phase = Phase::Verification;
    state.turn_count = 3;
    state.promise_to_pay = PromiseToPay { date: Some("2026-03-10".into()), amount: Some("150.00".into()), confirmed: true };
    let json = serde_json::to_string(&state).unwrap();
    let back: CallState = serde_json::from_str(&json).unwrap();
    assert_eq!(back.phase, Phase::Verification);
    assert_eq!(back.turn_count, 3);
    assert_eq!(back.promise_to_pay, state.promise_to_pay);
}

#[test]
fn action_set_outcome_serializes_with_type_tag() {
    let action = Action::SetOutcome { outcome_code: "ptp_set".into() };
    let json = serde_json::to_value(&action).unwrap();
    assert_eq!(json["type"], "set_outcome");
    assert_eq!(json["outcome_code"], "ptp_set");
}

#[test]
fn action_create_promise_to_pay_carries_optional_amount() {
    let action = Action::CreatePromiseToPay { date: "2026-03-10".into(), amount: None };
    let json = serde_json::to_value(&action).unwrap();
    assert_eq!(json["type"], "create_promise_to_pay");
    assert!(json["amount"].is_null());
}

#[test]
fn call_id_has_expected_prefix() {
    let id = CallId::new();
    assert!(id.as_str().starts_with("call"));
}
