use crate::models::{CandidateClass, PreferenceSet};

/// True when `wanted` is empty or any entry occurs in `field`, ignoring case
#[inline]
pub fn matches_any(field: &str, wanted: &[String]) -> bool {
    if wanted.is_empty() {
        return true;
    }

    let field = field.to_lowercase();
    wanted
        .iter()
        .any(|entry| field.contains(&entry.trim().to_lowercase()))
}

/// Class-name dimension
#[inline]
pub fn matches_class(candidate: &CandidateClass, preferences: &PreferenceSet) -> bool {
    matches_any(&candidate.name, &preferences.classes)
}

/// Time dimension: the preferred time must appear within the scraped time text,
/// so "18:00" matches "18:00 - 18:55"
#[inline]
pub fn matches_time(candidate: &CandidateClass, preferences: &PreferenceSet) -> bool {
    matches_any(&candidate.time, &preferences.times)
}

/// Location dimension
#[inline]
pub fn matches_location(candidate: &CandidateClass, preferences: &PreferenceSet) -> bool {
    matches_any(&candidate.location, &preferences.locations)
}

/// A candidate qualifies when all three dimensions qualify
#[inline]
pub fn matches_preferences(candidate: &CandidateClass, preferences: &PreferenceSet) -> bool {
    matches_class(candidate, preferences)
        && matches_time(candidate, preferences)
        && matches_location(candidate, preferences)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, time: &str, location: &str) -> CandidateClass {
        CandidateClass {
            id: "1".to_string(),
            name: name.to_string(),
            time: time.to_string(),
            location: location.to_string(),
            date: None,
            bookable: true,
        }
    }

    fn prefs(classes: &[&str], times: &[&str], locations: &[&str]) -> PreferenceSet {
        PreferenceSet::new(classes.to_vec(), times.to_vec(), locations.to_vec())
    }

    #[test]
    fn test_wildcard_class_substring_location() {
        let c = candidate("Yoga", "18:00", "Oslo City");
        assert!(matches_preferences(&c, &prefs(&[], &["18:00"], &["Oslo"])));
    }

    #[test]
    fn test_class_mismatch() {
        let c = candidate("Spinning", "18:00", "Storo");
        assert!(!matches_preferences(&c, &prefs(&["Yoga"], &[], &[])));
    }

    #[test]
    fn test_case_insensitive() {
        let c = candidate("Hot YOGA Flow", "18:00", "STORO");
        assert!(matches_preferences(&c, &prefs(&["yoga"], &[], &["storo"])));
    }

    #[test]
    fn test_any_entry_in_list_matches() {
        let c = candidate("Body Pump", "19:00", "Ryen");
        assert!(matches_preferences(&c, &prefs(&["Yoga", "pump"], &["18:00", "19:00"], &[])));
    }

    #[test]
    fn test_time_within_range_text() {
        let c = candidate("Yoga", "18:00 - 18:55", "Storo");
        assert!(matches_time(&c, &prefs(&[], &["18:00"], &[])));
        assert!(!matches_time(&c, &prefs(&[], &["17:00"], &[])));
    }

    #[test]
    fn test_all_dimensions_required() {
        let c = candidate("Yoga", "18:00", "Storo");
        assert!(!matches_preferences(&c, &prefs(&["Yoga"], &["18:00"], &["Ryen"])));
        assert!(!matches_preferences(&c, &prefs(&["Yoga"], &["19:00"], &["Storo"])));
    }

    #[test]
    fn test_empty_preferences_match_everything() {
        let c = candidate("Anything", "06:00", "Anywhere");
        assert!(matches_preferences(&c, &PreferenceSet::wildcard()));
    }
}
