// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Utterance intent classification: a fixed table of labeled regexes over
//! the caller's transcript, each with its own base confidence, reduced to
//! one primary intent per turn.

use regex::RegexSet;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Intent {
    StopRequest,
    Goodbye,
    HumanHandoff,
    WrongParty,
    Dispute,
    Busy,
    Uncomfortable,
    Refusal,
    Uncertain,
    IdentityQuestion,
    Affirmation,
    Negation,
    Unknown,
}

oc_core::simple_display! {
    Intent {
        StopRequest => "stop_request",
        Goodbye => "goodbye",
        HumanHandoff => "human_handoff",
        WrongParty => "wrong_party",
        Dispute => "dispute",
        Busy => "busy",
        Uncomfortable => "uncomfortable",
        Refusal => "refusal",
        Uncertain => "uncertain",
        IdentityQuestion => "identity_question",
        Affirmation => "affirmation",
        Negation => "negation",
        Unknown => "unknown",
    }
}

/// Priority order used to pick the primary intent among everything matched.
const PRIORITY: &[Intent] = &[
    Intent::StopRequest,
    Intent::Goodbye,
    Intent::HumanHandoff,
    Intent::WrongParty,
    Intent::Dispute,
    Intent::Busy,
    Intent::Uncomfortable,
    Intent::Refusal,
    Intent::Uncertain,
    Intent::IdentityQuestion,
    Intent::Affirmation,
    Intent::Negation,
];

const STRONG: &[Intent] = &[
    Intent::StopRequest,
    Intent::HumanHandoff,
    Intent::WrongParty,
    Intent::Dispute,
    Intent::Busy,
    Intent::Uncomfortable,
    Intent::Refusal,
];

struct Rule {
    intent: Intent,
    pattern: &'static str,
    confidence: f64,
}

const RULES: &[Rule] = &[
    Rule { intent: Intent::StopRequest, pattern: r"(?i)\b(stop calling|do ?n[o']?t call me|remove my number|take me off (your|the) list|stop contacting me)\b", confidence: 0.93 },
    Rule { intent: Intent::Goodbye, pattern: r"(?i)\b(goodbye|good bye|bye|gotta go|have to go|talk to you later)\b", confidence: 0.90 },
    Rule { intent: Intent::HumanHandoff, pattern: r"(?i)\b(speak (to|with) a (human|person|representative|agent|supervisor|manager)|real person|let me talk to (a |your )?(manager|supervisor))\b", confidence: 0.88 },
    Rule { intent: Intent::WrongParty, pattern: r"(?i)\b(wrong (number|person)|you have the wrong|this is ?n[o']?t (him|her|them)|i am not (him|her|that person))\b", confidence: 0.90 },
    Rule { intent: Intent::Dispute, pattern: r"(?i)\b(don'?t owe|do not owe|not my (debt|bill|account)|i dispute this|identity theft|that'?s not mine|never signed up)\b", confidence: 0.90 },
    Rule { intent: Intent::Busy, pattern: r"(?i)\b(can'?t talk (right now|now)|bad time|call (me )?back later|i'?m busy|not a good time)\b", confidence: 0.82 },
    Rule { intent: Intent::Uncomfortable, pattern: r"(?i)\b(uncomfortable|rather not (discuss|talk about)|do ?n[o']?t feel comfortable)\b", confidence: 0.75 },
    Rule { intent: Intent::Refusal, pattern: r"(?i)\b(i won'?t pay|not going to pay|refuse to pay|i'?m not paying)\b", confidence: 0.86 },
    Rule { intent: Intent::Uncertain, pattern: r"(?i)\b(i'?m not sure|i do ?n[o']?t know|not certain|not positive)\b", confidence: 0.74 },
    Rule { intent: Intent::IdentityQuestion, pattern: r"(?i)\b(who is this|what company|why are you calling|what is this (about|regarding))\b", confidence: 0.76 },
    Rule { intent: Intent::Affirmation, pattern: r"(?i)\b(yes|yeah|yep|sure|correct|that'?s right|affirmative|speaking|this is|i can)\b", confidence: 0.72 },
    Rule { intent: Intent::Negation, pattern: r"(?i)\b(no|nope|not really|negative)\b", confidence: 0.72 },
];

struct CompiledRules {
    set: RegexSet,
}

static COMPILED: OnceLock<CompiledRules> = OnceLock::new();

fn compiled() -> &'static CompiledRules {
    COMPILED.get_or_init(|| CompiledRules { set: RegexSet::new(RULES.iter().map(|r| r.pattern)).expect("all intent patterns compile") })
}

/// Result of classifying a single utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub matched: Vec<(Intent, f64)>,
    pub primary_intent: Intent,
    pub confidence: f64,
}

impl Classification {
    pub fn is_low_confidence_unknown(&self) -> bool {
        self.primary_intent == Intent::Unknown && self.confidence < 0.45
    }
}

/// Classify a caller utterance against the fixed intent table.
pub fn classify_utterance(text: &str) -> Classification {
    let rules = compiled();
    let hits = rules.set.matches(text);
    let mut matched: Vec<(Intent, f64)> = RULES
        .iter()
        .enumerate()
        .filter(|(idx, _)| hits.matched(*idx))
        .map(|(_, rule)| (rule.intent, rule.confidence))
        .collect();

    if text.trim().to_lowercase() == "why" && !matched.iter().any(|(i, _)| *i == Intent::IdentityQuestion) {
        matched.push((Intent::IdentityQuestion, 0.76));
    }

    let has_affirmation = matched.iter().any(|(i, _)| *i == Intent::Affirmation);
    let has_negation = matched.iter().any(|(i, _)| *i == Intent::Negation);
    let has_strong = matched.iter().any(|(i, _)| STRONG.contains(i));

    if has_affirmation && has_negation && !has_strong {
        return Classification { matched, primary_intent: Intent::Unknown, confidence: 0.30 };
    }

    let primary = PRIORITY.iter().find(|intent| matched.iter().any(|(i, _)| i == *intent)).copied();

    let Some(primary) = primary else {
        return Classification { matched, primary_intent: Intent::Unknown, confidence: 0.0 };
    };

    let mut confidence = matched.iter().find(|(i, _)| *i == primary).map(|(_, c)| *c).unwrap_or(0.0);

    let near_tie = matched.iter().any(|(intent, conf)| *intent != primary && (confidence - conf).abs() <= 0.08);
    if near_tie {
        confidence = (confidence - 0.15).max(0.35);
    }

    Classification { matched, primary_intent: primary, confidence }
}

#[cfg(test)]
#[path = "intent_tests.rs"]
mod tests;
