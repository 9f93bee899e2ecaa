use crate::core::filters::matches_preferences;
use crate::models::{CandidateClass, PreferenceSet};

/// Result of filtering one scrape
#[derive(Debug)]
pub struct MatchResult<'a> {
    pub matches: Vec<&'a CandidateClass>,
    pub total_candidates: usize,
}

impl<'a> MatchResult<'a> {
    /// The candidate to book: the first match in scrape order
    pub fn first(&self) -> Option<&'a CandidateClass> {
        self.matches.first().copied()
    }
}

/// Picks which scraped classes qualify for booking
///
/// # Pipeline Stages
/// 1. Availability filter (fully booked slots are dropped)
/// 2. Preference matching on class, time and location
///
/// Selection is first-match-wins in scrape order. There is no ranking
/// and no closest-match tie-break.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    preferences: PreferenceSet,
}

impl Matcher {
    pub fn new(preferences: PreferenceSet) -> Self {
        Self { preferences }
    }

    pub fn preferences(&self) -> &PreferenceSet {
        &self.preferences
    }

    /// All bookable candidates that satisfy the preferences, in scrape order
    pub fn filter_candidates<'a>(&self, candidates: &'a [CandidateClass]) -> MatchResult<'a> {
        let matches = candidates
            .iter()
            .filter(|candidate| candidate.bookable)
            .filter(|candidate| matches_preferences(candidate, &self.preferences))
            .collect();

        MatchResult {
            matches,
            total_candidates: candidates.len(),
        }
    }

    /// First bookable candidate that satisfies the preferences
    pub fn select<'a>(&self, candidates: &'a [CandidateClass]) -> Option<&'a CandidateClass> {
        select_candidate(candidates, &self.preferences)
    }
}

/// First bookable candidate in `candidates` that satisfies `preferences`
pub fn select_candidate<'a>(
    candidates: &'a [CandidateClass],
    preferences: &PreferenceSet,
) -> Option<&'a CandidateClass> {
    candidates
        .iter()
        .find(|candidate| candidate.bookable && matches_preferences(candidate, preferences))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_candidate(id: &str, name: &str, time: &str, location: &str, bookable: bool) -> CandidateClass {
        CandidateClass {
            id: id.to_string(),
            name: name.to_string(),
            time: time.to_string(),
            location: location.to_string(),
            date: Some("2026-10-23".to_string()),
            bookable,
        }
    }

    fn create_preferences() -> PreferenceSet {
        PreferenceSet::new(vec!["Yoga"], vec!["18:00"], vec![])
    }

    #[test]
    fn test_first_match_wins() {
        let candidates = vec![
            create_candidate("1", "Spinning", "18:00", "Storo", true),
            create_candidate("2", "Yoga Flow", "18:00", "Ryen", true),
            create_candidate("3", "Yoga", "18:00", "Storo", true), // exact name, still second
        ];

        let selected = select_candidate(&candidates, &create_preferences()).unwrap();
        assert_eq!(selected.id, "2");
    }

    #[test]
    fn test_fully_booked_skipped() {
        let candidates = vec![
            create_candidate("1", "Yoga", "18:00", "Storo", false),
            create_candidate("2", "Yoga", "18:00", "Ryen", true),
        ];

        let matcher = Matcher::new(create_preferences());
        assert_eq!(matcher.select(&candidates).unwrap().id, "2");

        let result = matcher.filter_candidates(&candidates);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.total_candidates, 2);
    }

    #[test]
    fn test_no_match() {
        let candidates = vec![create_candidate("1", "Spinning", "07:00", "Storo", true)];
        let matcher = Matcher::new(create_preferences());

        assert!(matcher.select(&candidates).is_none());
        assert!(matcher.filter_candidates(&candidates).first().is_none());
        assert!(matcher.select(&[]).is_none());
    }

    #[test]
    fn test_filter_keeps_scrape_order() {
        let candidates = vec![
            create_candidate("a", "Yoga", "18:00", "Storo", true),
            create_candidate("b", "Spinning", "18:00", "Storo", true),
            create_candidate("c", "Yin Yoga", "18:00 - 19:00", "Ryen", true),
        ];

        let matcher = Matcher::new(create_preferences());
        let result = matcher.filter_candidates(&candidates);
        let ids: Vec<&str> = result.matches.iter().map(|c| c.id.as_str()).collect();

        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(result.first().unwrap().id, "a");
    }

    #[test]
    fn test_default_matcher_accepts_any_bookable() {
        let candidates = vec![
            create_candidate("1", "Spinning", "07:00", "Storo", false),
            create_candidate("2", "Pump", "08:00", "Ryen", true),
        ];

        assert_eq!(Matcher::default().select(&candidates).unwrap().id, "2");
    }
}
