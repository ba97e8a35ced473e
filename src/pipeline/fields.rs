//! Reservation field detection.
//!
//! Presence tests only: we report whether a time or a party size appears
//! somewhere in the text, never the value. Heuristic by nature.

use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::types::ReservationFields;

/// "7pm", "7 pm", "19:30", "7:30pm". A bare number is not a time.
static TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,2}(?::\d{2}\s?(?:am|pm)?|\s?(?:am|pm))\b").unwrap()
});

/// "for 2", "party of four", "6 people", "three guests".
static PEOPLE: LazyLock<Regex> = LazyLock::new(|| {
    const NUMBER: &str = r"(?:\d+|one|two|three|four|five|six|seven|eight|nine|ten)";
    Regex::new(&format!(
        r"(?i)\b(?:(?P<prefixed>(?:for|party\s+of)\s*{NUMBER})\b|(?P<counted>{NUMBER}\s*(?:people|persons|guests))\b)"
    ))
    .unwrap()
});

/// What may follow a number for it to read as a clock. Mirrors the tail of `TIME`.
static CLOCK_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?::\d|\s?(?i:am|pm)\b)").unwrap());

/// Detect which reservation details the text mentions.
pub fn detect_fields(text: &str) -> ReservationFields {
    ReservationFields {
        has_time: has_time(text),
        has_people_count: has_people_count(text),
    }
}

pub fn has_time(text: &str) -> bool {
    TIME.is_match(text)
}

pub fn has_people_count(text: &str) -> bool {
    PEOPLE.captures_iter(text).any(|caps| {
        if caps.name("counted").is_some() {
            return true;
        }
        // "for 7:30" / "for 8 pm" name a time, not a party size.
        caps.name("prefixed")
            .is_some_and(|m| !starts_with_clock_suffix(&text[m.end()..]))
    })
}

/// True when `rest` continues a number as a clock time (`:MM` or a meridiem).
fn starts_with_clock_suffix(rest: &str) -> bool {
    CLOCK_SUFFIX.is_match(rest)
}
