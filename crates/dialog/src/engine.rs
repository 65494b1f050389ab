// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-call dialog engine: [`start_call`] produces the opening,
//! non-disclosing prompt, and [`handle_turn`] drives [`CallState`] through
//! `pre_verification` -> `verification` -> `post_verification` -> `ended`,
//! plus the universal guards (stop/goodbye/human-handoff) that apply
//! regardless of phase.

use crate::date_normalizer::normalize_datetime_local;
use crate::intent::{classify_utterance, Classification, Intent};
use crate::voice::enforce_voice_first;
use crate::zip_extractor::extract_zip;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use oc_core::{Action, AccountContext, CallState, Phase, YesNoUnknown};

/// Turn-level limits read from campaign policy configuration.
#[derive(Debug, Clone, Copy)]
pub struct PolicyLimits {
    pub max_total_turns: u32,
}

impl Default for PolicyLimits {
    fn default() -> Self {
        Self { max_total_turns: 25 }
    }
}

const SILENCE_LIMIT: u32 = 3;
const VERIFICATION_ATTEMPT_LIMIT: u32 = 3;
const RECONDUCTION_LIMIT: u32 = 2;
const CLARIFICATION_LIMIT: u32 = 2;
const NEGOTIATION_PUSHBACK_LIMIT: u32 = 2;

/// Result of driving the call state machine through one caller turn.
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub state: CallState,
    pub response_text: String,
    pub actions: Vec<Action>,
}

/// Produce the opening outbound prompt. Never mentions the brand or the
/// debt: the target person has not yet been confirmed.
pub fn start_call(state: &CallState, target_name: &str) -> TurnOutput {
    let mut state = state.clone();
    state.turn_count += 1;
    state.phase = Phase::PreVerification;
    let question = format!("Hello, I'm looking for {target_name}. Is this them?");
    state.last_assistant_question = Some(question.clone());
    state.last_assistant_intent = Some("request_target".to_string());
    TurnOutput { state, response_text: enforce_voice_first(&question), actions: Vec::new() }
}

fn wrap(mut state: CallState, message: &str, intent: &str, actions: Vec<Action>) -> TurnOutput {
    let response_text = enforce_voice_first(message);
    if response_text.contains('?') {
        state.last_assistant_question = Some(response_text.clone());
    }
    state.last_assistant_intent = Some(intent.to_string());
    TurnOutput { state, response_text, actions }
}

fn end_call(mut state: CallState, reason: &str, message: &str) -> TurnOutput {
    state.phase = Phase::Ended;
    state.end_reason = Some(reason.to_string());
    wrap(
        state,
        message,
        "close",
        vec![Action::SetOutcome { outcome_code: reason.to_string() }, Action::EndCall { reason: reason.to_string() }],
    )
}

fn escalate(mut state: CallState, reason: &str, message: &str) -> TurnOutput {
    state.phase = Phase::Ended;
    state.escalation_flag = true;
    state.escalation_reason = Some(reason.to_string());
    let outcome = format!("escalated_{reason}");
    state.end_reason = Some(outcome.clone());
    wrap(
        state,
        message,
        "escalate",
        vec![
            Action::SetOutcome { outcome_code: outcome.clone() },
            Action::EscalateToHuman { reason: reason.to_string() },
            Action::EndCall { reason: outcome },
        ],
    )
}

fn continue_turn(state: CallState, message: &str, intent: &str) -> TurnOutput {
    wrap(state, message, intent, Vec::new())
}

fn confirm_promise_to_pay(mut state: CallState, date: String, amount: &str) -> TurnOutput {
    state.promise_to_pay.date = Some(date.clone());
    state.promise_to_pay.amount = Some(amount.to_string());
    state.promise_to_pay.confirmed = true;
    state.last_proposed_payment_date = Some(date.clone());
    state.phase = Phase::Ended;
    state.end_reason = Some("ptp_set".to_string());
    wrap(
        state,
        &format!("Perfect. I've noted your commitment for {amount} on {date}. Thank you, and have a great day."),
        "close",
        vec![
            Action::SetOutcome { outcome_code: "ptp_set".to_string() },
            Action::CreatePromiseToPay { date: date.clone(), amount: Some(amount.to_string()) },
            Action::EndCall { reason: "ptp_set".to_string() },
        ],
    )
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = (date.year(), date.month());
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap_or(date).pred_opt().unwrap_or(date)
}

fn handle_silence(mut state: CallState) -> TurnOutput {
    state.silence_count += 1;
    if state.silence_count >= SILENCE_LIMIT {
        return end_call(state, "silence_timeout", "Since I haven't heard from you, I'll end the call for now. Goodbye.");
    }
    continue_turn(state, "Are you still there? I didn't catch that.", "handle_silence")
}

/// First occurrence of a low-confidence/unclassifiable utterance re-asks a
/// phase-appropriate question; a second escalates to a human.
fn handle_low_confidence(mut state: CallState, phase: Phase, target_name: &str) -> TurnOutput {
    state.clarification_attempts += 1;
    if state.clarification_attempts > 1 {
        return escalate(state, "low_confidence", "I'll connect you with a specialist who can help further. Please hold.");
    }
    match phase {
        Phase::PreVerification => continue_turn(state, &format!("Sorry, I didn't catch that. Are you {target_name}?"), "request_target"),
        Phase::Verification => continue_turn(state, "Sorry, I didn't catch that. Please confirm your 5-digit ZIP code.", "verify_identity"),
        _ => continue_turn(state, "Sorry, I didn't catch that. Could you repeat the payment date that works for you?", "negotiate"),
    }
}

fn handle_pre_verification(mut state: CallState, target_name: &str, classification: &Classification) -> TurnOutput {
    match classification.primary_intent {
        Intent::WrongParty => {
            state.wrong_party_indicated = true;
            state.target_reached = YesNoUnknown::No;
            end_call(state, "wrong_party", "My apologies, I must have the wrong number. I'll update my records.")
        }
        Intent::IdentityQuestion => continue_turn(
            state,
            &format!("I am an automated assistant calling regarding a personal business matter for {target_name}. Is this them?"),
            "request_target",
        ),
        Intent::Affirmation => {
            state.target_reached = YesNoUnknown::Yes;
            state.consent_to_continue = YesNoUnknown::Yes;
            state.phase = Phase::Verification;
            continue_turn(state, "For your privacy, can you confirm the ZIP code on your account?", "verify_identity")
        }
        _ if classification.is_low_confidence_unknown() => handle_low_confidence(state, Phase::PreVerification, target_name),
        _ => continue_turn(state, &format!("I'm trying to reach {target_name}. Is that you?"), "request_target"),
    }
}

fn handle_verification(mut state: CallState, transcript: &str, classification: &Classification, account_context: &AccountContext) -> TurnOutput {
    if matches!(classification.primary_intent, Intent::Uncomfortable | Intent::Negation) {
        state.reconduction_attempts += 1;
        if state.reconduction_attempts <= RECONDUCTION_LIMIT {
            return continue_turn(
                state,
                "I understand your concern for privacy. However, I can only discuss this matter with the account holder. Would it be better if I called back another time?",
                "negotiate",
            );
        }
        return end_call(state, "verification_refused", "Since we're unable to verify your identity, I'll have to end the call now. Goodbye.");
    }

    if matches!(classification.primary_intent, Intent::IdentityQuestion) {
        return continue_turn(
            state,
            "I understand. To protect your privacy, I need to verify your identity before discussing details. Please confirm your 5-digit ZIP code.",
            "verify_identity",
        );
    }

    match extract_zip(transcript) {
        Some(zip) if zip == account_context.expected_zip => {
            state.right_party_verified = true;
            state.right_party_confidence = 0.95;
            state.phase = Phase::PostVerification;
            state.disclosure_delivered = true;
            state.mini_miranda_acknowledged = true;
            continue_turn(
                state,
                &format!(
                    "This is an attempt to collect a debt, and any information obtained will be used for that purpose. Can you pay the {} balance today?",
                    account_context.amount_due
                ),
                "deliver_disclosure",
            )
        }
        Some(_) => {
            state.right_party_confidence = 0.2;
            state.verification_attempts += 1;
            if state.verification_attempts >= VERIFICATION_ATTEMPT_LIMIT {
                return end_call(state, "verification_failed", "I'm sorry, that doesn't match our records. I'll have to end the call for security. Goodbye.");
            }
            continue_turn(state, "I'm sorry, that ZIP code doesn't match our records. Could you please try again?", "verify_identity")
        }
        None if classification.is_low_confidence_unknown() => handle_low_confidence(state, Phase::Verification, ""),
        None => {
            state.verification_attempts += 1;
            if state.verification_attempts >= VERIFICATION_ATTEMPT_LIMIT {
                return end_call(state, "verification_failed", "I'm unable to verify your identity at this time. Goodbye.");
            }
            continue_turn(state, "To proceed, please tell me your 5-digit ZIP code clearly.", "verify_identity")
        }
    }
}

fn handle_negotiation(
    mut state: CallState,
    transcript: &str,
    classification: &Classification,
    amount_due: &str,
    tz: Tz,
    now_utc: DateTime<Utc>,
) -> TurnOutput {
    let intent = classification.primary_intent;
    let now_local_date = now_utc.with_timezone(&tz).date_naive();
    let today = now_local_date.format("%Y-%m-%d").to_string();
    let normalized = normalize_datetime_local(transcript, tz, now_utc);

    // An explicit date in the reply always wins over a bare "yes" reading —
    // otherwise "yes" inside "I can pay on the 10th" would short-circuit to
    // confirming today instead of the date the caller actually named.
    if state.last_assistant_intent.as_deref() == Some("deliver_disclosure") {
        match intent {
            Intent::Dispute => {
                state.dispute_flag = true;
                return escalate(state, "dispute", "I understand you're disputing this debt. I'll connect you with a representative who can help.");
            }
            Intent::Affirmation if !normalized.ok => return confirm_promise_to_pay(state, today, amount_due),
            Intent::Negation => return continue_turn(state, "I understand. What date before the end of the month would work for you?", "negotiate"),
            _ => {}
        }
    }

    if state.last_assistant_intent.as_deref() == Some("confirm_payment_date") {
        if let Some(pending) = state.last_proposed_payment_date.clone() {
            match intent {
                Intent::Affirmation if !normalized.ok => return confirm_promise_to_pay(state, pending, amount_due),
                Intent::Negation => {
                    state.last_proposed_payment_date = None;
                    return continue_turn(state, "No problem. What exact date before month end works for you?", "negotiate");
                }
                _ => {}
            }
        }
    }

    match intent {
        Intent::Dispute => {
            state.dispute_flag = true;
            return escalate(state, "dispute", "I understand you're disputing this debt. I'll connect you with a representative who can help.");
        }
        Intent::Refusal => {
            state.negotiation_proposals_count += 1;
            if state.negotiation_proposals_count >= NEGOTIATION_PUSHBACK_LIMIT {
                return escalate(state, "hard_refusal", "I'll connect you with a specialist who can help further. Please hold.");
            }
            return continue_turn(
                state,
                &format!("I understand things can be tight. However, we do need to find a way to resolve this {amount_due}. Is there a partial amount you can handle before the end of the month?"),
                "negotiate",
            );
        }
        Intent::Uncertain => {
            return continue_turn(state, "I can wait while you check your calendar. Or, would you prefer if I suggest a date near the end of the month?", "negotiate");
        }
        Intent::Busy => return end_call(state, "busy", "I understand. We'll try you again at a better time. Goodbye."),
        _ => {}
    }

    if normalized.ok {
        if let Some(date) = normalized.date {
            if (date.year(), date.month()) != (now_local_date.year(), now_local_date.month()) {
                let last_day = last_day_of_month(now_local_date);
                return continue_turn(
                    state,
                    &format!("I'm sorry, but our current policy requires a commitment by the end of this month. Do you have any options before {}?", last_day.format("%B %d")),
                    "negotiate",
                );
            }
        }
        let date_str = normalized.datetime_local.clone().unwrap_or(today);
        if normalized.needs_confirmation {
            state.last_proposed_payment_date = Some(date_str.clone());
            return continue_turn(state, &format!("Just to confirm, do you mean {date_str}?"), "confirm_payment_date");
        }
        return confirm_promise_to_pay(state, date_str, amount_due);
    }

    if matches!(intent, Intent::Negation | Intent::Refusal) {
        state.negotiation_proposals_count += 1;
        if state.negotiation_proposals_count >= NEGOTIATION_PUSHBACK_LIMIT {
            return escalate(state, "multiple_refusals", "I'll connect you with a specialist who can help further. Please hold.");
        }
        return continue_turn(
            state,
            &format!("I hear you. If a full payment isn't possible, can you do a partial payment of {amount_due} by the 25th of this month?"),
            "negotiate",
        );
    }

    if classification.is_low_confidence_unknown() {
        return handle_low_confidence(state, Phase::PostVerification, "");
    }

    continue_turn(state, &format!("Can you find a day before the end of the month to settle this {amount_due}?"), "negotiate")
}

/// Drive `state` through one caller turn. `transcript` is `None`/empty on
/// silence. `target_name` and `account_context` come from the job payload
/// and the looked-up account facts, respectively.
#[allow(clippy::too_many_arguments)]
pub fn handle_turn(
    state: &CallState,
    transcript: Option<&str>,
    target_name: &str,
    account_context: &AccountContext,
    tz: Tz,
    now_utc: DateTime<Utc>,
    limits: PolicyLimits,
) -> TurnOutput {
    if state.phase == Phase::Ended {
        return TurnOutput {
            state: state.clone(),
            response_text: "This call is already closed. Goodbye.".to_string(),
            actions: Vec::new(),
        };
    }

    let mut state = state.clone();
    state.turn_count += 1;

    if state.turn_count >= limits.max_total_turns {
        return end_call(state, "max_turns", "Thank you for your time. Goodbye.");
    }

    let transcript = transcript.map(str::trim).filter(|t| !t.is_empty());
    let Some(transcript) = transcript else {
        return handle_silence(state);
    };

    state.silence_count = 0;
    state.last_user_utterance = Some(transcript.to_string());
    let classification = classify_utterance(transcript);
    if !classification.is_low_confidence_unknown() {
        state.clarification_attempts = 0;
    }

    match classification.primary_intent {
        Intent::StopRequest => {
            state.cease_contact_requested = true;
            return end_call(state, "cease_contact", "Understood. I will update our records. Goodbye.");
        }
        Intent::Goodbye => return end_call(state, "user_ended", "Understood. Thanks for your time. Goodbye."),
        Intent::HumanHandoff => return escalate(state, "user_requested_human", "I'll connect you with a specialist who can help further. Please hold."),
        _ => {}
    }

    match state.phase {
        Phase::PreVerification => handle_pre_verification(state, target_name, &classification),
        Phase::Verification => handle_verification(state, transcript, &classification, account_context),
        Phase::PostVerification => handle_negotiation(state, transcript, &classification, &account_context.amount_due, tz, now_utc),
        Phase::Ended => unreachable!("handled above"),
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
