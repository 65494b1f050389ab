// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    stop_request = { "please stop calling me", Intent::StopRequest },
    goodbye = { "okay, goodbye", Intent::Goodbye },
    human_handoff = { "let me speak to a supervisor", Intent::HumanHandoff },
    wrong_party = { "you have the wrong number", Intent::WrongParty },
    dispute = { "this is not my debt", Intent::Dispute },
    busy = { "it's a bad time, can't talk right now", Intent::Busy },
    uncomfortable = { "i don't feel comfortable discussing this", Intent::Uncomfortable },
    refusal = { "i'm not paying this", Intent::Refusal },
    uncertain = { "i'm not sure about that", Intent::Uncertain },
    identity_question = { "who is this calling me", Intent::IdentityQuestion },
    affirmation = { "yes that's correct", Intent::Affirmation },
    negation = { "no, that's not right", Intent::Negation },
)]
fn classifies_primary_intent(text: &str, expected: Intent) {
    let result = classify_utterance(text);
    assert_eq!(result.primary_intent, expected);
}

#[test]
fn bare_why_matches_identity_question() {
    let result = classify_utterance("why");
    assert_eq!(result.primary_intent, Intent::IdentityQuestion);
}

#[test]
fn unmatched_text_is_unknown_with_zero_confidence() {
    let result = classify_utterance("the weather is nice today");
    assert_eq!(result.primary_intent, Intent::Unknown);
    assert_eq!(result.confidence, 0.0);
    assert!(result.is_low_confidence_unknown());
}

#[test]
fn affirmation_and_negation_without_strong_label_is_unknown() {
    // "no, yes, that's right" triggers both affirmation and negation with
    // nothing from the strong label set.
    let result = classify_utterance("no wait, yes that's right");
    assert_eq!(result.primary_intent, Intent::Unknown);
    assert_eq!(result.confidence, 0.30);
}

#[test]
fn strong_label_wins_even_when_affirmation_and_negation_both_present() {
    let result = classify_utterance("no, stop calling me, yes I mean it");
    assert_eq!(result.primary_intent, Intent::StopRequest);
}

#[test]
fn priority_order_prefers_stop_request_over_goodbye() {
    let result = classify_utterance("stop calling me, goodbye");
    assert_eq!(result.primary_intent, Intent::StopRequest);
}

#[test]
fn near_tie_reduces_primary_confidence() {
    // busy (0.82) and uncomfortable (0.75) are within 0.08 of each other.
    let result = classify_utterance("it's a bad time, i feel uncomfortable with this");
    assert_eq!(result.primary_intent, Intent::Busy);
    assert!((result.confidence - (0.82 - 0.15)).abs() < 1e-9);
}

#[test]
fn confidence_floor_is_respected_on_near_tie() {
    let result = classify_utterance("i'm not sure, who is this");
    // uncertain (0.74) and identity_question (0.76) are within 0.08.
    assert_eq!(result.primary_intent, Intent::Uncertain);
    assert!(result.confidence >= 0.35);
}
