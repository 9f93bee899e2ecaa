// Core algorithm exports
pub mod filters;
pub mod gazetteer;
pub mod matcher;
pub mod parser;

pub use filters::{matches_class, matches_location, matches_preferences, matches_time};
pub use gazetteer::{LocationGazetteer, SATS_LOCATIONS};
pub use matcher::{select_candidate, MatchResult, Matcher};
pub use parser::{parse_booking_request, SubjectParser, DEFAULT_LOCATION};
