use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Class name used when a request names a location but no class
pub const WILDCARD_CLASS: &str = "Any";

/// Error returned when a string is not a valid `HH:MM` wall-clock time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid class time: {0:?}")]
pub struct ParseClassTimeError(pub String);

/// Wall-clock start time of a class, always rendered as zero-padded `HH:MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassTime(NaiveTime);

impl ClassTime {
    /// Build from hour and minute, `None` when out of range
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for ClassTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClassTime {
    type Err = ParseClassTimeError;

    /// Accepts `H:MM` and `HH:MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseClassTimeError(s.to_string());
        let (hours, minutes) = s.trim().split_once(':').ok_or_else(err)?;

        if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
            return Err(err());
        }
        if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let hour: u32 = hours.parse().map_err(|_| err())?;
        let minute: u32 = minutes.parse().map_err(|_| err())?;
        Self::from_hm(hour, minute).ok_or_else(err)
    }
}

impl Serialize for ClassTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClassTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Structured booking request, parsed from an email subject or built from configuration
///
/// Fields are private so a request cannot be altered after it has been created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    #[serde(rename = "class")]
    class_name: String,
    time: ClassTime,
    location: String,
}

impl BookingRequest {
    pub fn new(class_name: impl Into<String>, time: ClassTime, location: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            time,
            location: location.into(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn time(&self) -> ClassTime {
        self.time
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// True when the request names no particular class
    pub fn is_any_class(&self) -> bool {
        self.class_name.eq_ignore_ascii_case(WILDCARD_CLASS)
    }

    /// Subject line in `class time location` order
    ///
    /// Parses back into an equivalent request unless the class starts with
    /// a subject prefix such as `Book`, or itself contains a time.
    pub fn to_subject(&self) -> String {
        format!("{} {} {}", self.class_name, self.time, self.location)
    }
}

/// Booking filter criteria
///
/// An empty list is a wildcard. Entries within one list are OR-ed,
/// the three lists are AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceSet {
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub times: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

impl PreferenceSet {
    /// Build a preference set, trimming entries and dropping blank ones
    pub fn new<I, S>(classes: I, times: I, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            classes: normalize(classes),
            times: normalize(times),
            locations: normalize(locations),
        }
    }

    /// Preference set that accepts every candidate
    pub fn wildcard() -> Self {
        Self::default()
    }

    pub fn is_wildcard(&self) -> bool {
        self.classes.is_empty() && self.times.is_empty() && self.locations.is_empty()
    }
}

impl From<&BookingRequest> for PreferenceSet {
    fn from(request: &BookingRequest) -> Self {
        let classes = if request.is_any_class() {
            vec![]
        } else {
            vec![request.class_name().to_string()]
        };

        Self::new(
            classes,
            vec![request.time().to_string()],
            vec![request.location().to_string()],
        )
    }
}

fn normalize<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|entry| entry.as_ref().trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Class slot scraped from the booking portal during a single run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateClass {
    pub id: String,
    pub name: String,
    pub time: String,
    pub location: String,
    #[serde(default)]
    pub date: Option<String>,
    pub bookable: bool,
}

/// Outcome of one attempted booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingResult {
    pub name: String,
    pub time: String,
    pub location: String,
    pub booked: bool,
}

impl BookingResult {
    pub fn from_candidate(candidate: &CandidateClass, booked: bool) -> Self {
        Self {
            name: candidate.name.clone(),
            time: candidate.time.clone(),
            location: candidate.location.clone(),
            booked,
        }
    }
}

/// What started a booking run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Trigger {
    Scheduled,
    Email { from: String },
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Scheduled => write!(f, "scheduled"),
            Trigger::Email { from } => write!(f, "email from {}", from),
            Trigger::Manual => write!(f, "manual"),
        }
    }
}

/// Everything a single booking run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingReport {
    #[serde(rename = "runId")]
    pub run_id: uuid::Uuid,
    pub trigger: Trigger,
    pub preferences: PreferenceSet,
    pub results: Vec<BookingResult>,
    #[serde(rename = "finishedAt")]
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

impl BookingReport {
    pub fn booked(&self) -> impl Iterator<Item = &BookingResult> {
        self.results.iter().filter(|r| r.booked)
    }

    pub fn failed(&self) -> impl Iterator<Item = &BookingResult> {
        self.results.iter().filter(|r| !r.booked)
    }
}
