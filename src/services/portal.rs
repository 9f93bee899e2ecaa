use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;

use crate::models::CandidateClass;

/// Errors that can occur while driving the booking portal
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Unexpected page markup: {0}")]
    UnexpectedMarkup(String),

    #[error("Booking rejected: {0}")]
    BookingRejected(String),

    #[error("Portal error: {0}")]
    ApiError(String),
}

/// Remote booking portal
///
/// Everything that depends on the portal's markup lives behind this trait.
#[async_trait]
pub trait BookingPortal: Send + Sync {
    /// Start an authenticated session
    async fn login(&self) -> Result<(), PortalError>;

    /// Class slots listed for `date`, in page order
    async fn scrape_candidates(&self, date: NaiveDate) -> Result<Vec<CandidateClass>, PortalError>;

    /// Reserve a single slot
    async fn book(&self, candidate: &CandidateClass) -> Result<(), PortalError>;
}

static SCHEDULE: Lazy<Selector> = Lazy::new(|| Selector::parse(".class-schedule").unwrap());
static CLASS_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse(".class-item").unwrap());
static CLASS_NAME: Lazy<Selector> = Lazy::new(|| Selector::parse(".class-name").unwrap());
static CLASS_TIME: Lazy<Selector> = Lazy::new(|| Selector::parse(".class-time").unwrap());
static CLASS_LOCATION: Lazy<Selector> = Lazy::new(|| Selector::parse(".class-location").unwrap());
static CLASS_DATE: Lazy<Selector> = Lazy::new(|| Selector::parse(".class-date").unwrap());

const FULLY_BOOKED: &str = "fully-booked";

/// HTTP client for the SATS web portal
///
/// Holds a cookie store, so `login` must run before scraping or booking.
pub struct PortalClient {
    base_url: String,
    email: String,
    password: String,
    client: Client,
}

impl PortalClient {
    /// Create a new portal client
    pub fn new(
        base_url: String,
        email: String,
        password: String,
        timeout: Duration,
    ) -> Result<Self, PortalError> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            base_url,
            email,
            password,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// The class id comes from scraped markup, so it is escaped as one path segment
    fn booking_url(&self, class_id: &str) -> String {
        self.url(&format!("/trening/gruppetimer/{}/book", urlencoding::encode(class_id)))
    }
}

#[async_trait]
impl BookingPortal for PortalClient {
    async fn login(&self) -> Result<(), PortalError> {
        tracing::info!("Logging into SATS as {}", self.email);

        let response = self
            .client
            .post(self.url("/login"))
            .form(&[("email", self.email.as_str()), ("password", self.password.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PortalError::LoginFailed(format!(
                "portal answered {}",
                response.status()
            )));
        }

        tracing::info!("Successfully logged into SATS");
        Ok(())
    }

    async fn scrape_candidates(&self, date: NaiveDate) -> Result<Vec<CandidateClass>, PortalError> {
        let date = date.format("%Y-%m-%d").to_string();
        tracing::debug!("Fetching class schedule for {}", date);

        let response = self
            .client
            .get(self.url("/trening/gruppetimer"))
            .query(&[("date", date.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PortalError::ApiError(format!(
                "schedule page answered {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let candidates = parse_schedule(&body)?;

        tracing::debug!("Scraped {} classes for {}", candidates.len(), date);
        Ok(candidates)
    }

    async fn book(&self, candidate: &CandidateClass) -> Result<(), PortalError> {
        let response = self.client.post(self.booking_url(&candidate.id)).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Booking {} failed: {} - {}", candidate.id, status, body);
            return Err(PortalError::BookingRejected(format!(
                "{} at {}: {}",
                candidate.name, candidate.time, status
            )));
        }

        Ok(())
    }
}

/// Extract class slots from the group-class schedule page
pub fn parse_schedule(html: &str) -> Result<Vec<CandidateClass>, PortalError> {
    let document = Html::parse_document(html);

    if document.select(&SCHEDULE).next().is_none() {
        return Err(PortalError::UnexpectedMarkup(
            "no .class-schedule container".to_string(),
        ));
    }

    let candidates = document
        .select(&CLASS_ITEM)
        .filter_map(|item| {
            let id = item.value().attr("data-class-id")?.trim().to_string();
            let name = child_text(&item, &CLASS_NAME)?;

            if id.is_empty() {
                return None;
            }

            Some(CandidateClass {
                id,
                name,
                time: child_text(&item, &CLASS_TIME).unwrap_or_default(),
                location: child_text(&item, &CLASS_LOCATION).unwrap_or_default(),
                date: child_text(&item, &CLASS_DATE),
                bookable: !item.value().classes().any(|class| class == FULLY_BOOKED),
            })
        })
        .collect();

    Ok(candidates)
}

/// Whitespace-collapsed text of the first `selector` match under `element`
fn child_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    let node = element.select(selector).next()?;
    let text = node.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ");

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
