use chrono::{Days, Local, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::Matcher;
use crate::models::{BookingReport, BookingResult, PreferenceSet, Trigger};
use crate::services::notifier::Notifier;
use crate::services::portal::BookingPortal;

/// Runs login → scrape → match → book → notify against one portal
///
/// Runs are single-flight: a trigger that arrives while another run holds the
/// portal waits for it to finish. Portal and notifier failures are logged and
/// folded into the report, never returned.
pub struct BookingRunner {
    portal: Arc<dyn BookingPortal>,
    notifier: Arc<dyn Notifier>,
    days_in_advance: u64,
    session: Mutex<()>,
}

impl BookingRunner {
    pub fn new(portal: Arc<dyn BookingPortal>, notifier: Arc<dyn Notifier>, days_in_advance: u64) -> Self {
        Self {
            portal,
            notifier,
            days_in_advance,
            session: Mutex::new(()),
        }
    }

    /// Day whose classes are booked when running on `today`
    pub fn target_date(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_days(Days::new(self.days_in_advance))
            .unwrap_or(today)
    }

    /// Perform one complete booking run
    pub async fn run(&self, trigger: Trigger, preferences: PreferenceSet) -> BookingReport {
        let run_id = Uuid::new_v4();

        let results = {
            let _session = match self.session.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    info!(%run_id, "Booking run already in progress, queueing {} run", trigger);
                    self.session.lock().await
                }
            };

            info!(%run_id, "Starting {} booking run", trigger);
            self.book_first_match(run_id, &preferences).await
        };

        let report = BookingReport {
            run_id,
            trigger,
            preferences,
            results,
            finished_at: Utc::now(),
        };

        if let Err(e) = self.notifier.notify(&report).await {
            error!(%run_id, "Failed to send booking notification: {}", e);
        }

        report
    }

    async fn book_first_match(&self, run_id: Uuid, preferences: &PreferenceSet) -> Vec<BookingResult> {
        if let Err(e) = self.portal.login().await {
            error!(%run_id, "Login failed: {}", e);
            return vec![];
        }

        let date = self.target_date(Local::now().date_naive());
        info!(%run_id, "Searching for available classes on {}", date);

        let candidates = match self.portal.scrape_candidates(date).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(%run_id, "Error finding classes: {}", e);
                return vec![];
            }
        };

        let matcher = Matcher::new(preferences.clone());
        let result = matcher.filter_candidates(&candidates);

        info!(
            %run_id,
            "Found {} matching classes (from {} candidates)",
            result.matches.len(),
            result.total_candidates
        );

        let Some(candidate) = result.first() else {
            warn!(%run_id, "No matching classes found for booking");
            return vec![];
        };

        info!(%run_id, "Attempting to book: {} at {} ({})", candidate.name, candidate.time, candidate.location);

        let booked = match self.portal.book(candidate).await {
            Ok(()) => {
                info!(%run_id, "Successfully booked: {} at {}", candidate.name, candidate.time);
                true
            }
            Err(e) => {
                error!(%run_id, "Failed to book class: {}", e);
                false
            }
        };

        vec![BookingResult::from_candidate(candidate, booked)]
    }
}
