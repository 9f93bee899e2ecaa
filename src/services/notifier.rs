use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::NotificationSettings;
use crate::models::{BookingReport, BookingResult};

/// Errors that can occur while delivering a report
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Notification endpoint returned error: {0}")]
    ApiError(String),
}

/// Delivers the outcome of a booking run
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, report: &BookingReport) -> Result<(), NotifyError>;
}

impl BookingReport {
    /// One-line summary used as the message subject
    pub fn subject(&self) -> String {
        if self.results.is_empty() {
            "SATS Booking - No Classes Found".to_string()
        } else {
            format!("SATS Booking Success - {} class(es) booked!", self.booked().count())
        }
    }

    /// Plain-text message body
    pub fn body(&self) -> String {
        let mut body = String::from("SATS Class Booking Results\n");
        let when = self.finished_at.format("%Y-%m-%d %H:%M UTC");

        if self.results.is_empty() {
            let _ = writeln!(body, "Booking attempted at: {}", when);
            let _ = writeln!(body, "Trigger: {}", self.trigger);
            body.push_str("\nNo matching classes found for:\n");
            let _ = writeln!(body, "  Classes: {}", or_any(&self.preferences.classes));
            let _ = writeln!(body, "  Times: {}", or_any(&self.preferences.times));
            let _ = writeln!(body, "  Locations: {}", or_any(&self.preferences.locations));
            return body;
        }

        let _ = writeln!(body, "Booking completed at: {}", when);
        let _ = writeln!(body, "Trigger: {}", self.trigger);
        push_section(&mut body, "Successfully booked:", self.booked());
        push_section(&mut body, "Failed to book:", self.failed());
        body
    }
}

fn or_any(entries: &[String]) -> String {
    if entries.is_empty() {
        "Any".to_string()
    } else {
        entries.join(", ")
    }
}

fn push_section<'a>(body: &mut String, title: &str, results: impl Iterator<Item = &'a BookingResult>) {
    let mut results = results.peekable();
    if results.peek().is_none() {
        return;
    }

    let _ = writeln!(body, "\n{}", title);
    for result in results {
        let _ = writeln!(body, "  - {} at {} - {}", result.name, result.time, result.location);
    }
}

/// Writes reports to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, report: &BookingReport) -> Result<(), NotifyError> {
        tracing::info!(run_id = %report.run_id, "{}\n{}", report.subject(), report.body());
        Ok(())
    }
}

/// Discards reports; used when notifications are disabled
#[derive(Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _report: &BookingReport) -> Result<(), NotifyError> {
        tracing::debug!("Notifications disabled - skipping report");
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    to: &'a str,
    subject: String,
    body: String,
    report: &'a BookingReport,
}

/// POSTs reports as JSON to a mail relay or chat webhook
pub struct WebhookNotifier {
    url: String,
    recipient: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: String, recipient: String) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            url,
            recipient,
            client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, report: &BookingReport) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            to: &self.recipient,
            subject: report.subject(),
            body: report.body(),
            report,
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;

        if !response.status().is_success() {
            return Err(NotifyError::ApiError(format!(
                "Failed to deliver report: {}",
                response.status()
            )));
        }

        tracing::info!("Booking notification sent to {}", self.recipient);
        Ok(())
    }
}

/// Pick the notifier described by the configuration
///
/// Falls back to `fallback_recipient` (the portal account) when no recipient is set.
pub fn build_notifier(
    settings: &NotificationSettings,
    fallback_recipient: &str,
) -> Result<Arc<dyn Notifier>, NotifyError> {
    if !settings.enabled {
        tracing::info!("Email notifications disabled");
        return Ok(Arc::new(NoopNotifier));
    }

    match &settings.webhook_url {
        Some(url) if !url.trim().is_empty() => {
            let recipient = settings
                .recipient
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| fallback_recipient.to_string());
            tracing::info!("Webhook notifier initialized for {}", recipient);
            Ok(Arc::new(WebhookNotifier::new(url.clone(), recipient)?))
        }
        _ => {
            tracing::warn!("No notification webhook configured - reports go to the log");
            Ok(Arc::new(LogNotifier))
        }
    }
}
