// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn collapses_internal_whitespace() {
    assert_eq!(enforce_voice_first("Hello   there,\n  friend."), "Hello there, friend.");
}

#[test]
fn caps_output_at_two_sentences() {
    let result = enforce_voice_first("First sentence. Second sentence. Third sentence gets dropped.");
    assert_eq!(result, "First sentence. Second sentence.");
}

#[test]
fn decimal_amounts_are_not_treated_as_sentence_boundaries() {
    let result = enforce_voice_first("Your balance is 240.00 dollars.");
    assert_eq!(result, "Your balance is 240.00 dollars.");
}

#[test]
fn only_first_question_mark_survives() {
    let result = enforce_voice_first("Can you confirm the date? Is that correct?");
    assert_eq!(result, "Can you confirm the date? Is that correct.");
}

#[test]
fn missing_terminal_punctuation_gets_a_period() {
    assert_eq!(enforce_voice_first("Thanks for confirming"), "Thanks for confirming.");
}

#[test]
fn already_terminated_text_is_unchanged() {
    assert_eq!(enforce_voice_first("Got it!"), "Got it!");
}
