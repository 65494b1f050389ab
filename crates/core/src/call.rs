// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-call conversation state.
//!
//! [`CallState`] is the full mutable state threaded through a single call's
//! dialog turns, from `pre_verification` through `ended`. It mirrors the
//! fields a turn handler reads and writes every turn: verification
//! progress, negotiation state, and the bookkeeping needed to decide when
//! to escalate or close.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a single call instance.
    pub struct CallId("call");
}

/// Phase of the per-call conversation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PreVerification,
    Verification,
    PostVerification,
    Ended,
}

crate::simple_display! {
    Phase {
        PreVerification => "pre_verification",
        Verification => "verification",
        PostVerification => "post_verification",
        Ended => "ended",
    }
}

/// A tri-state yes/no/unknown flag used for facts the dialog can't always
/// establish in a single turn (e.g. whether the right party was reached).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YesNoUnknown {
    Yes,
    No,
    Unknown,
}

impl Default for YesNoUnknown {
    fn default() -> Self {
        YesNoUnknown::Unknown
    }
}

crate::simple_display! {
    YesNoUnknown {
        Yes => "yes",
        No => "no",
        Unknown => "unknown",
    }
}

/// Coarse read on the caller's disposition, used to decide whether to
/// soften phrasing or escalate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Neutral,
    Upset,
    Hostile,
    Confused,
    Cooperative,
}

impl Default for Sentiment {
    fn default() -> Self {
        Sentiment::Neutral
    }
}

crate::simple_display! {
    Sentiment {
        Neutral => "neutral",
        Upset => "upset",
        Hostile => "hostile",
        Confused => "confused",
        Cooperative => "cooperative",
    }
}

/// A promise-to-pay negotiated during the call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseToPay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default)]
    pub confirmed: bool,
}

/// A callback request made by the called party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callback {
    #[serde(default)]
    pub requested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime_local: Option<String>,
}

/// Full mutable state of a single call, threaded through every dialog turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallState {
    pub phase: Phase,
    #[serde(default)]
    pub turn_count: u32,
    #[serde(default)]
    pub right_party_verified: bool,
    #[serde(default)]
    pub right_party_confidence: f64,
    #[serde(default)]
    pub verification_attempts: u32,
    #[serde(default)]
    pub silence_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_proposed_payment_date: Option<String>,
    #[serde(default)]
    pub escalation_flag: bool,
    #[serde(default)]
    pub target_reached: YesNoUnknown,
    #[serde(default)]
    pub consent_to_continue: YesNoUnknown,
    #[serde(default)]
    pub disclosure_delivered: bool,
    #[serde(default)]
    pub mini_miranda_acknowledged: bool,
    #[serde(default)]
    pub negotiation_proposals_count: u32,
    #[serde(default)]
    pub reconduction_attempts: u32,
    #[serde(default)]
    pub clarification_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_user_utterance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_assistant_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_assistant_intent: Option<String>,
    #[serde(default)]
    pub user_sentiment: Sentiment,
    #[serde(default)]
    pub wrong_party_indicated: bool,
    #[serde(default)]
    pub voicemail_detected: bool,
    #[serde(default)]
    pub dispute_flag: bool,
    #[serde(default)]
    pub hardship_flag: bool,
    #[serde(default)]
    pub cease_contact_requested: bool,
    #[serde(default)]
    pub promise_to_pay: PromiseToPay,
    #[serde(default)]
    pub callback: Callback,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<String>,
}

impl Default for CallState {
    fn default() -> Self {
        Self {
            phase: Phase::PreVerification,
            turn_count: 0,
            right_party_verified: false,
            right_party_confidence: 0.0,
            verification_attempts: 0,
            silence_count: 0,
            last_proposed_payment_date: None,
            escalation_flag: false,
            target_reached: YesNoUnknown::Unknown,
            consent_to_continue: YesNoUnknown::Unknown,
            disclosure_delivered: false,
            mini_miranda_acknowledged: false,
            negotiation_proposals_count: 0,
            reconduction_attempts: 0,
            clarification_attempts: 0,
            last_user_utterance: None,
            last_assistant_question: None,
            last_assistant_intent: None,
            user_sentiment: Sentiment::Neutral,
            wrong_party_indicated: false,
            voicemail_detected: false,
            dispute_flag: false,
            hardship_flag: false,
            cease_contact_requested: false,
            promise_to_pay: PromiseToPay::default(),
            callback: Callback::default(),
            escalation_reason: None,
            end_reason: None,
        }
    }
}

impl CallState {
    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }
}

/// A side effect emitted by the dialog engine for a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SetOutcome { outcome_code: String },
    CreatePromiseToPay { date: String, amount: Option<String> },
    EscalateToHuman { reason: String },
    EndCall { reason: String },
}

#[cfg(test)]
#[path = "call_tests.rs"]
mod tests;
