// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Voice-first post-processing: collapses whitespace, caps the reply at
//! two sentences, allows at most one question mark, and guarantees
//! terminal punctuation. Keeps text-to-speech output short and
//! unambiguous about when the caller should respond.

/// Split `text` into sentences at a `[.!?]` immediately followed by
/// whitespace (or end of string). Equivalent to splitting on a
/// sentence-boundary lookbehind, without requiring regex lookaround.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            let next = i + c.len_utf8();
            let boundary = next >= text.len() || text[next..].starts_with(char::is_whitespace);
            if boundary {
                sentences.push(text[start..next].trim().to_string());
                start = next;
            }
        }
    }
    if start < text.len() {
        let rest = text[start..].trim();
        if !rest.is_empty() {
            sentences.push(rest.to_string());
        }
    }
    sentences.into_iter().filter(|s| !s.is_empty()).collect()
}

/// Collapse whitespace, take at most 2 sentences, allow at most one `?`,
/// and ensure the result ends with terminal punctuation.
pub fn enforce_voice_first(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let sentences = split_sentences(&collapsed);
    let limited = sentences.into_iter().take(2).collect::<Vec<_>>().join(" ");

    let mut seen_question_mark = false;
    let mut result = String::with_capacity(limited.len());
    for c in limited.chars() {
        if c == '?' {
            if seen_question_mark {
                result.push('.');
                continue;
            }
            seen_question_mark = true;
        }
        result.push(c);
    }

    if !result.ends_with(['.', '!', '?']) {
        result.push('.');
    }
    result
}

#[cfg(test)]
#[path = "voice_tests.rs"]
mod tests;
