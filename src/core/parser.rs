//! Email subject parsing.
//!
//! Turns free text such as `"BOOK Pilates 16:00"`, `"Storo 1400 Pilates"` or
//! `"1345 hiit run"` into a [`BookingRequest`]. The only hard anchor is the
//! time token; everything else is resolved by position and by looking words up
//! in the [`LocationGazetteer`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::gazetteer::LocationGazetteer;
use crate::models::{BookingRequest, ClassTime, WILDCARD_CLASS};

/// Location used when neither the subject nor the configuration names one
pub const DEFAULT_LOCATION: &str = "Colosseum";

/// Subject prefixes removed before parsing, matched case-insensitively
const PREFIXES: &[&str] = &["RE:", "FW:", "BOOK", "SATS"];

static COLON_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap());
static BARE_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{2})(\d{2})\b").unwrap());
static DEFAULT_GAZETTEER: Lazy<LocationGazetteer> = Lazy::new(LocationGazetteer::default);

/// Parses booking requests out of email subjects
#[derive(Debug, Clone)]
pub struct SubjectParser {
    gazetteer: LocationGazetteer,
    default_location: String,
}

impl SubjectParser {
    pub fn new(gazetteer: LocationGazetteer, default_location: impl Into<String>) -> Self {
        Self {
            gazetteer,
            default_location: default_location.into(),
        }
    }

    /// Parser over the built-in SATS locations
    pub fn with_default_location(default_location: impl Into<String>) -> Self {
        Self::new(LocationGazetteer::default(), default_location)
    }

    pub fn default_location(&self) -> &str {
        &self.default_location
    }

    pub fn gazetteer(&self) -> &LocationGazetteer {
        &self.gazetteer
    }

    /// Parse a subject line, `None` when it holds no usable time
    pub fn parse(&self, subject: &str) -> Option<BookingRequest> {
        parse_with(&self.gazetteer, &self.default_location, subject)
    }
}

impl Default for SubjectParser {
    fn default() -> Self {
        Self::with_default_location(DEFAULT_LOCATION)
    }
}

/// Parse `subject` against the built-in SATS locations
pub fn parse_booking_request(subject: &str, default_location: &str) -> Option<BookingRequest> {
    parse_with(&DEFAULT_GAZETTEER, default_location, subject)
}

fn parse_with(
    gazetteer: &LocationGazetteer,
    default_location: &str,
    subject: &str,
) -> Option<BookingRequest> {
    let cleaned = strip_prefixes(subject);
    let token = find_time(cleaned)?;

    let before = cleaned[..token.start].trim();
    let after = cleaned[token.end..].trim();

    let (class_name, location) = resolve(gazetteer, before, after);
    let location = location.unwrap_or_else(|| default_location.to_string());

    Some(BookingRequest::new(class_name, token.time, location))
}

/// Time found in the subject, with its byte span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimeToken {
    time: ClassTime,
    start: usize,
    end: usize,
}

/// First valid `H:MM`/`HH:MM` token, else first valid bare `HHMM` token
fn find_time(text: &str) -> Option<TimeToken> {
    first_valid(&COLON_TIME, text).or_else(|| first_valid(&BARE_TIME, text))
}

fn first_valid(pattern: &Regex, text: &str) -> Option<TimeToken> {
    pattern.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        let hour = caps[1].parse().ok()?;
        let minute = caps[2].parse().ok()?;
        let time = ClassTime::from_hm(hour, minute)?;
        Some(TimeToken {
            time,
            start: whole.start(),
            end: whole.end(),
        })
    })
}

/// Remove leading `RE:`, `FW:`, `BOOK` and `SATS` markers, repeatedly
fn strip_prefixes(subject: &str) -> &str {
    let is_separator = |c: char| c.is_whitespace() || c == ':';
    let mut rest = subject.trim();

    'outer: loop {
        for prefix in PREFIXES {
            let Some(tail) = strip_prefix_ignore_case(rest, prefix) else {
                continue;
            };
            // BOOK and SATS must be whole words: "Booking" stays untouched
            if prefix.ends_with(':') || tail.is_empty() || tail.starts_with(is_separator) {
                rest = tail.trim_start_matches(is_separator);
                continue 'outer;
            }
        }
        return rest.trim();
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

/// Split the text around the time token into (class, location)
fn resolve(gazetteer: &LocationGazetteer, before: &str, after: &str) -> (String, Option<String>) {
    let location = |text: &str| gazetteer.lookup(text).map(str::to_string);

    match (before.is_empty(), after.is_empty()) {
        (false, false) => {
            if let Some(loc) = location(after) {
                (before.to_string(), Some(loc))
            } else if let Some(loc) = location(before) {
                (after.to_string(), Some(loc))
            } else {
                (format!("{} {}", before, after), None)
            }
        }
        (false, true) => match location(before) {
            Some(loc) => (WILDCARD_CLASS.to_string(), Some(loc)),
            None => (before.to_string(), None),
        },
        (true, false) => {
            let words: Vec<&str> = after.split_whitespace().collect();

            if words.len() == 1 {
                return match location(after) {
                    Some(loc) => (WILDCARD_CLASS.to_string(), Some(loc)),
                    None => (after.to_string(), None),
                };
            }

            if let Some(loc) = location(words[0]) {
                (words[1..].join(" "), Some(loc))
            } else if let Some(loc) = location(words[words.len() - 1]) {
                (words[..words.len() - 1].join(" "), Some(loc))
            } else {
                (after.to_string(), None)
            }
        }
        (true, true) => (WILDCARD_CLASS.to_string(), None),
    }
}
