// Unit tests for SATS Booker

use sats_booker::core::{
    filters::matches_preferences,
    matcher::select_candidate,
    parser::{parse_booking_request, SubjectParser, DEFAULT_LOCATION},
};
use sats_booker::models::{CandidateClass, PreferenceSet};

fn candidate(name: &str, time: &str, location: &str) -> CandidateClass {
    CandidateClass {
        id: format!("{}-{}", name, time),
        name: name.to_string(),
        time: time.to_string(),
        location: location.to_string(),
        date: None,
        bookable: true,
    }
}

#[test]
fn test_parse_class_and_time() {
    let request = parse_booking_request("Pilates 16:00", DEFAULT_LOCATION).unwrap();

    assert_eq!(request.class_name(), "Pilates");
    assert_eq!(request.time().to_string(), "16:00");
    assert_eq!(request.location(), DEFAULT_LOCATION);
}

#[test]
fn test_parse_unknown_location_folds_into_class() {
    // "Oslo City" is not a known facility
    let request = parse_booking_request("Yoga 1800 Oslo City", DEFAULT_LOCATION).unwrap();

    assert_eq!(request.class_name(), "Yoga Oslo City");
    assert_eq!(request.time().to_string(), "18:00");
    assert_eq!(request.location(), DEFAULT_LOCATION);
}

#[test]
fn test_parse_location_first() {
    let request = parse_booking_request("Storo 1400 Pilates", DEFAULT_LOCATION).unwrap();

    assert_eq!(request.class_name(), "Pilates");
    assert_eq!(request.time().to_string(), "14:00");
    assert_eq!(request.location(), "Storo");
}

#[test]
fn test_parse_without_time() {
    assert!(parse_booking_request("no numbers here", DEFAULT_LOCATION).is_none());
}

#[test]
fn test_parsed_time_is_always_normalized() {
    let parser = SubjectParser::default();

    for (subject, expected) in [
        ("Yoga 0:05", "00:05"),
        ("Yoga 7:45", "07:45"),
        ("Yoga 0745", "07:45"),
        ("Yoga 23:59", "23:59"),
        ("BOOK 2359 Ryen", "23:59"),
    ] {
        let request = parser.parse(subject).unwrap();
        assert_eq!(request.time().to_string(), expected, "subject {:?}", subject);
    }
}

#[test]
fn test_reconstructed_subject_reparses_equivalently() {
    let parser = SubjectParser::default();

    for subject in ["SATS Yoga 18:00 Storo", "hiit run 1345", "1400 bislett", "hot 1400 yoga"] {
        let request = parser.parse(subject).unwrap();
        assert_eq!(parser.parse(&request.to_subject()).unwrap(), request);
    }
}

#[test]
fn test_matches_wildcard_class() {
    let c = candidate("Yoga", "18:00", "Oslo City");
    let prefs = PreferenceSet::new(vec![], vec!["18:00"], vec!["Oslo"]);

    assert!(matches_preferences(&c, &prefs));
}

#[test]
fn test_matches_class_mismatch() {
    let c = candidate("Spinning", "18:00", "Storo");
    let prefs = PreferenceSet::new(vec!["Yoga"], vec![], vec![]);

    assert!(!matches_preferences(&c, &prefs));
}

#[test]
fn test_request_drives_selection() {
    let request = parse_booking_request("Storo 1800 yoga", DEFAULT_LOCATION).unwrap();
    let prefs = PreferenceSet::from(&request);

    let candidates = vec![
        candidate("Yoga", "18:00", "SATS Ryen"),
        candidate("Spinning", "18:00", "SATS Storo"),
        candidate("Hatha Yoga", "18:00 - 18:55", "SATS Storo"),
    ];

    let selected = select_candidate(&candidates, &prefs).unwrap();
    assert_eq!(selected.name, "Hatha Yoga");
}

#[test]
fn test_any_class_request_matches_every_class() {
    let request = parse_booking_request("1400 nydalen", DEFAULT_LOCATION).unwrap();
    let prefs = PreferenceSet::from(&request);

    assert!(prefs.classes.is_empty());
    assert!(matches_preferences(&candidate("Body Pump", "14:00", "SATS Nydalen"), &prefs));
}

#[test]
fn test_multi_word_location_before_time() {
    let request = parse_booking_request("Carl Berner 18:00 Yoga", DEFAULT_LOCATION).unwrap();

    assert_eq!(request.class_name(), "Yoga");
    assert_eq!(request.location(), "Carl Berner");
}
