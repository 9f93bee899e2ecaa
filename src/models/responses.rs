use serde::{Deserialize, Serialize};
use crate::models::domain::{BookingReport, BookingRequest};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Response for the inbound email webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEmailResponse {
    pub accepted: bool,
    /// Why the email was not acted on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<BookingRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<BookingReport>,
}
