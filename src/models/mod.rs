// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{BookingReport, BookingRequest, BookingResult, CandidateClass, ClassTime, ParseClassTimeError, PreferenceSet, Trigger, WILDCARD_CLASS};
pub use requests::{InboundEmailRequest, ParseSubjectRequest};
pub use responses::{ErrorResponse, HealthResponse, InboundEmailResponse};
