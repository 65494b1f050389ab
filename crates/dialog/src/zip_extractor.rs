// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Extracts a 5-digit ZIP code from a caller's spoken utterance, falling
//! back through progressively looser strategies: a direct 5-digit token,
//! any five loose digit characters, spoken digit words, then a full
//! English number-word parse.

use regex::Regex;
use std::sync::OnceLock;

fn five_digit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{5}\b").expect("five digit regex compiles"))
}

fn digit_word(word: &str) -> Option<u8> {
    match word {
        "zero" | "oh" | "o" => Some(0),
        "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        _ => None,
    }
}

fn unit_value(word: &str) -> Option<u32> {
    match word {
        "zero" => Some(0),
        "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        "ten" => Some(10),
        "eleven" => Some(11),
        "twelve" => Some(12),
        "thirteen" => Some(13),
        "fourteen" => Some(14),
        "fifteen" => Some(15),
        "sixteen" => Some(16),
        "seventeen" => Some(17),
        "eighteen" => Some(18),
        "nineteen" => Some(19),
        _ => None,
    }
}

fn tens_value(word: &str) -> Option<u32> {
    match word {
        "twenty" => Some(20),
        "thirty" => Some(30),
        "forty" => Some(40),
        "fifty" => Some(50),
        "sixty" => Some(60),
        "seventy" => Some(70),
        "eighty" => Some(80),
        "ninety" => Some(90),
        _ => None,
    }
}

fn strip_punct(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Strategy 3: scan tokens left to right, collecting the first five
/// recognized spoken digit words.
fn extract_via_spoken_digits(text: &str) -> Option<String> {
    let mut digits = Vec::new();
    for word in text.to_lowercase().split_whitespace() {
        if let Some(d) = digit_word(strip_punct(word)) {
            digits.push(d.to_string());
            if digits.len() == 5 {
                return Some(digits.concat());
            }
        }
    }
    None
}

/// Strategy 4: parse a full English number phrase (e.g. "twelve thousand
/// three hundred forty five") into an integer in the valid ZIP range.
fn extract_via_number_words(text: &str) -> Option<String> {
    let mut total: u32 = 0;
    let mut current: u32 = 0;
    let mut seen_number = false;

    for raw_word in text.to_lowercase().split_whitespace() {
        let word = strip_punct(raw_word);
        if word == "and" {
            continue;
        }
        if let Some(v) = unit_value(word) {
            current += v;
            seen_number = true;
        } else if let Some(v) = tens_value(word) {
            current += v;
            seen_number = true;
        } else if word == "hundred" {
            current = current.max(1) * 100;
            seen_number = true;
        } else if word == "thousand" {
            total += current.max(1) * 1000;
            current = 0;
            seen_number = true;
        } else if seen_number {
            break;
        }
    }

    let value = total + current;
    if (10000..=99999).contains(&value) {
        Some(value.to_string())
    } else {
        None
    }
}

/// Extract a 5-digit ZIP code from `text`, or `None` if no strategy
/// resolves one.
pub fn extract_zip(text: &str) -> Option<String> {
    if let Some(m) = five_digit_regex().find(text) {
        return Some(m.as_str().to_string());
    }

    let loose_digits: String = text.chars().filter(|c| c.is_ascii_digit()).take(5).collect();
    if loose_digits.len() == 5 {
        return Some(loose_digits);
    }

    if let Some(zip) = extract_via_spoken_digits(text) {
        return Some(zip);
    }

    extract_via_number_words(text)
}

#[cfg(test)]
#[path = "zip_extractor_tests.rs"]
mod tests;
