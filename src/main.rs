use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use sats_booker::config::{LoggingSettings, Settings};
use sats_booker::core::SubjectParser;
use sats_booker::models::Trigger;
use sats_booker::routes::{self, bookings::{AppState, SeenMessages}};
use sats_booker::services::{build_notifier, run_daily, BookingRunner, PortalClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;
use validator::Validate;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::other(format!("{}: {}", context, err))
}

/// Initialize logging; `RUST_LOG` takes precedence over the configured level
fn init_tracing(logging: &LoggingSettings) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level)))
        .with_target(false)
        .with_level(true);

    if logging.is_pretty() {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load();
    let logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default();

    init_tracing(&logging);

    info!("SATS Class Booker starting...");

    let settings = settings.map_err(|e| startup_error("Failed to load configuration", e))?;

    if let Err(errors) = settings.portal.validate() {
        return Err(startup_error("Missing SATS credentials, set SATS_EMAIL and SATS_PASSWORD", errors));
    }

    info!("Configuration loaded successfully");

    let portal = Arc::new(
        PortalClient::new(
            settings.portal.base_url.clone(),
            settings.portal.email.clone(),
            settings.portal.password.clone(),
            Duration::from_secs(settings.portal.timeout_secs),
        )
        .map_err(|e| startup_error("Failed to create portal client", e))?,
    );

    let notifier = build_notifier(&settings.notifications, &settings.portal.email)
        .map_err(|e| startup_error("Failed to create notifier", e))?;

    let runner = Arc::new(BookingRunner::new(portal, notifier, settings.portal.days_in_advance));
    let preferences = settings.booking.preferences();

    info!("Booking preferences: {:?}", preferences);

    // Run once and exit
    if std::env::args().skip(1).any(|arg| arg == "--now") {
        let report = runner.run(Trigger::Manual, preferences).await;
        info!("{}", report.subject());
        return Ok(());
    }

    if settings.schedule.enabled {
        let schedule = settings
            .schedule
            .daily_schedule()
            .map_err(|e| startup_error("Invalid booking schedule", e))?;
        actix_web::rt::spawn(run_daily(schedule, runner.clone(), preferences.clone()));
    } else {
        info!("Daily schedule disabled");
    }

    let parser = Arc::new(SubjectParser::with_default_location(settings.booking.fallback_location()));
    info!("Subject parser default location: {}", parser.default_location());

    // Build application state
    if settings.server.inbound_token.is_none() {
        tracing::warn!("No inbound token configured, the email webhook accepts unauthenticated calls");
    }

    let app_state = AppState {
        runner,
        parser,
        preferences,
        inbound_token: settings.server.inbound_token.clone(),
        seen_messages: Arc::new(SeenMessages::default()),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(2);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
