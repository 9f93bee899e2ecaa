use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::models::{ClassTime, PreferenceSet, Trigger};
use crate::services::booker::BookingRunner;

/// Errors in the schedule configuration
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid schedule time {0:?}, expected HH:MM")]
    InvalidTime(String),

    #[error("Unknown timezone {0:?}")]
    InvalidTimezone(String),
}

/// Fires once a day at a wall-clock time in a named timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
    tz: Tz,
}

impl DailySchedule {
    pub fn new(at: NaiveTime, tz: Tz) -> Self {
        Self { at, tz }
    }

    /// Build from `"HH:MM"` and an IANA timezone name such as `"Europe/Oslo"`
    pub fn parse(at: &str, timezone: &str) -> Result<Self, ScheduleError> {
        let time: ClassTime = at
            .parse()
            .map_err(|_| ScheduleError::InvalidTime(at.to_string()))?;
        let tz: Tz = timezone
            .trim()
            .parse()
            .map_err(|_| ScheduleError::InvalidTimezone(timezone.to_string()))?;

        Ok(Self::new(time.as_naive(), tz))
    }

    /// Next firing strictly after `now`
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = now.with_timezone(&self.tz).date_naive();

        loop {
            if let Some(run) = self.firing_on(date) {
                if run > now {
                    return run;
                }
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => return now,
            }
        }
    }

    /// The instant `at` falls on `date` in local time
    ///
    /// An ambiguous time (clocks going back) resolves to the later instant.
    /// A skipped time (clocks going forward) fires one hour later.
    fn firing_on(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let local = date.and_time(self.at);

        self.tz
            .from_local_datetime(&local)
            .latest()
            .or_else(|| self.tz.from_local_datetime(&(local + Duration::hours(1))).latest())
            .map(|run| run.with_timezone(&Utc))
    }
}

/// Run the booking process at every firing of `schedule`; never returns
pub async fn run_daily(schedule: DailySchedule, runner: Arc<BookingRunner>, preferences: PreferenceSet) {
    info!(
        "Starting booking scheduler: daily at {} ({})",
        schedule.at.format("%H:%M"),
        schedule.tz
    );

    loop {
        let now = Utc::now();
        let next = schedule.next_run_after(now);
        info!("Next scheduled booking run at {}", next.with_timezone(&schedule.tz));

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        info!("Scheduled booking task triggered");
        let report = runner.run(Trigger::Scheduled, preferences.clone()).await;
        info!("Scheduled run {} finished: {}", report.run_id, report.subject());
    }
}
