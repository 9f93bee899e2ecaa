use actix_web::{web, HttpRequest, HttpResponse, Responder};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use validator::Validate;

use crate::core::SubjectParser;
use crate::models::{
    ErrorResponse, HealthResponse, InboundEmailRequest, InboundEmailResponse, ParseSubjectRequest,
    PreferenceSet, Trigger,
};
use crate::services::BookingRunner;

const EXPECTED_FORMAT: &str = r#"Expected format: "BOOK Pilates 16:00" or "SATS Yoga 18:00 Storo""#;

const INBOUND_TOKEN_HEADER: &str = "X-Inbound-Token";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<BookingRunner>,
    pub parser: Arc<SubjectParser>,
    /// Preferences for scheduled and manual runs
    pub preferences: PreferenceSet,
    /// When set, inbound emails must carry this value in `X-Inbound-Token`
    pub inbound_token: Option<String>,
    pub seen_messages: Arc<SeenMessages>,
}

/// Message ids of recently handled inbound emails
///
/// Mail providers redeliver a webhook call when it times out; a message id
/// already in here is acknowledged without booking again.
pub struct SeenMessages {
    ids: Mutex<LruCache<String, ()>>,
}

impl SeenMessages {
    const CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
        Some(n) => n,
        None => panic!("capacity must be non-zero"),
    };

    /// Record `id`, returning `false` if it was already there
    pub fn insert(&self, id: &str) -> bool {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        ids.put(id.to_string(), ()).is_none()
    }
}

impl Default for SeenMessages {
    fn default() -> Self {
        Self {
            ids: Mutex::new(LruCache::new(Self::CAPACITY)),
        }
    }
}

/// Configure all booking-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/bookings/parse", web::post().to(parse_subject))
        .route("/bookings/run", web::post().to(run_booking))
        .route("/inbound/email", web::post().to(inbound_email));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Parse a subject line without booking
///
/// POST /api/v1/bookings/parse
///
/// Request body:
/// ```json
/// { "subject": "BOOK Pilates 16:00" }
/// ```
async fn parse_subject(
    state: web::Data<AppState>,
    req: web::Json<ParseSubjectRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    match state.parser.parse(&req.subject) {
        Some(request) => HttpResponse::Ok().json(request),
        None => HttpResponse::UnprocessableEntity().json(ErrorResponse {
            error: "unparseable_subject".to_string(),
            message: EXPECTED_FORMAT.to_string(),
            status_code: 422,
        }),
    }
}

/// Run a booking now with the configured preferences
///
/// POST /api/v1/bookings/run
async fn run_booking(state: web::Data<AppState>) -> impl Responder {
    tracing::info!("Manually triggering booking process...");

    let report = state
        .runner
        .run(Trigger::Manual, state.preferences.clone())
        .await;

    HttpResponse::Ok().json(report)
}

/// Inbound email webhook
///
/// POST /api/v1/inbound/email
///
/// Request body:
/// ```json
/// { "subject": "SATS Yoga 18:00 Storo", "from": "me@example.com" }
/// ```
///
/// Requires the `X-Inbound-Token` header when a token is configured. A subject
/// that cannot be parsed, or a message id seen before, is acknowledged with
/// `accepted: false`.
async fn inbound_email(
    state: web::Data<AppState>,
    http: HttpRequest,
    req: web::Json<InboundEmailRequest>,
) -> impl Responder {
    if let Some(expected) = &state.inbound_token {
        let given = http
            .headers()
            .get(INBOUND_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        if given != Some(expected.as_str()) {
            tracing::warn!("Rejected inbound email with missing or wrong token");
            return HttpResponse::Unauthorized().json(ErrorResponse {
                error: "unauthorized".to_string(),
                message: format!("Missing or invalid {} header", INBOUND_TOKEN_HEADER),
                status_code: 401,
            });
        }
    }

    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    if let Some(message_id) = &req.message_id {
        if !state.seen_messages.insert(message_id) {
            tracing::info!("Skipping redelivered email {}", message_id);
            return HttpResponse::Ok().json(InboundEmailResponse {
                accepted: false,
                reason: Some("duplicate".to_string()),
                request: None,
                report: None,
            });
        }
    }

    tracing::info!("Processing email from: {}", req.from);
    tracing::info!("Subject: {}", req.subject);

    let Some(request) = state.parser.parse(&req.subject) else {
        tracing::warn!("Could not parse booking request from email subject");
        tracing::info!("{}", EXPECTED_FORMAT);
        return HttpResponse::Ok().json(InboundEmailResponse {
            accepted: false,
            reason: Some("unparseable_subject".to_string()),
            request: None,
            report: None,
        });
    };

    tracing::info!(
        "Triggering booking for: {} at {} ({})",
        request.class_name(),
        request.time(),
        request.location()
    );

    let trigger = Trigger::Email {
        from: req.from.clone(),
    };
    let report = state
        .runner
        .run(trigger, PreferenceSet::from(&request))
        .await;

    HttpResponse::Ok().json(InboundEmailResponse {
        accepted: true,
        reason: None,
        request: Some(request),
        report: Some(report),
    })
}
