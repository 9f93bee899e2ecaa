//! SATS Booker - automatic group-class booking for the SATS web portal
//!
//! The core is two pure functions: an email subject parser that turns free
//! text into a booking request, and a preference matcher that picks which
//! scraped class to book. Everything around them (portal client, runner,
//! scheduler, notifier, HTTP API) lives in `services` and `routes`.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{matches_preferences, parse_booking_request, select_candidate, Matcher, SubjectParser};
pub use crate::models::{BookingReport, BookingRequest, BookingResult, CandidateClass, ClassTime, PreferenceSet, Trigger};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let request = parse_booking_request("Pilates 16:00", "Storo").unwrap();
        assert_eq!(request.location(), "Storo");
    }
}
