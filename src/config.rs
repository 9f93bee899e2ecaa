use config::{Config, ConfigError, Environment, File, Value};
use serde::Deserialize;
use validator::Validate;

use crate::core::DEFAULT_LOCATION;
use crate::models::PreferenceSet;
use crate::services::scheduler::{DailySchedule, ScheduleError};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub portal: PortalSettings,
    pub booking: BookingSettings,
    pub schedule: ScheduleSettings,
    pub notifications: NotificationSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Shared secret expected in `X-Inbound-Token` on the inbound email webhook
    pub inbound_token: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: None,
            inbound_token: None,
        }
    }
}

/// Booking portal account and client settings
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct PortalSettings {
    #[validate(url)]
    pub base_url: String,
    #[validate(length(min = 1, message = "SATS email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "SATS password is required"))]
    pub password: String,
    pub timeout_secs: u64,
    /// SATS releases classes this many days ahead
    pub days_in_advance: u64,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            base_url: "https://sats.no".to_string(),
            email: String::new(),
            password: String::new(),
            timeout_secs: 30,
            days_in_advance: 7,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingSettings {
    pub preferred_classes: Vec<String>,
    pub preferred_times: Vec<String>,
    pub preferred_locations: Vec<String>,
    pub default_location: Option<String>,
}

impl BookingSettings {
    /// Preferences used by scheduled and manual runs
    pub fn preferences(&self) -> PreferenceSet {
        PreferenceSet::new(
            self.preferred_classes.iter(),
            self.preferred_times.iter(),
            self.preferred_locations.iter(),
        )
    }

    /// Location for parsed requests that name none
    pub fn fallback_location(&self) -> String {
        self.default_location
            .iter()
            .chain(self.preferred_locations.iter())
            .map(|loc| loc.trim())
            .find(|loc| !loc.is_empty())
            .unwrap_or(DEFAULT_LOCATION)
            .to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub enabled: bool,
    pub daily_at: String,
    /// IANA timezone `daily_at` is read in
    pub timezone: String,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_at: "10:00".to_string(),
            timezone: "Europe/Oslo".to_string(),
        }
    }
}

impl ScheduleSettings {
    pub fn daily_schedule(&self) -> Result<DailySchedule, ScheduleError> {
        DailySchedule::parse(&self.daily_at, &self.timezone)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub webhook_url: Option<String>,
    pub recipient: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl LoggingSettings {
    pub fn is_pretty(&self) -> bool {
        self.format.eq_ignore_ascii_case("pretty")
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

const LIST_KEYS: &[&str] = &[
    "booking.preferred_classes",
    "booking.preferred_times",
    "booking.preferred_locations",
];

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with SATS__)
    /// 4. Legacy flat variables such as SATS_EMAIL and PREFERRED_CLASSES
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // e.g., SATS__PORTAL__EMAIL -> portal.email
            .add_source(environment())
            .build()?;

        let settings = apply_legacy_env(settings, |key| std::env::var(key).ok())?;

        settings.try_deserialize()
    }
}

fn environment() -> Environment {
    let mut env = Environment::with_prefix("SATS")
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .try_parsing(true);

    for key in LIST_KEYS {
        env = env.with_list_parse_key(key);
    }
    env
}

/// Overrides taken from the flat variable names of the legacy `.env` layout
///
/// `lookup` resolves a variable name; list variables are split on commas.
fn legacy_overrides<F>(lookup: F) -> Vec<(&'static str, Value)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut overrides = Vec::new();

    let strings = [
        ("SATS_EMAIL", "portal.email"),
        ("SATS_PASSWORD", "portal.password"),
        ("EMAIL_TO", "notifications.recipient"),
        ("NOTIFICATION_WEBHOOK_URL", "notifications.webhook_url"),
        ("LOG_LEVEL", "logging.level"),
        ("LOG_FORMAT", "logging.format"),
        ("INBOUND_TOKEN", "server.inbound_token"),
    ];
    for (var, key) in strings {
        if let Some(value) = lookup(var) {
            overrides.push((key, Value::from(value)));
        }
    }

    let lists = [
        ("PREFERRED_CLASSES", "booking.preferred_classes"),
        ("PREFERRED_TIMES", "booking.preferred_times"),
        ("PREFERRED_LOCATIONS", "booking.preferred_locations"),
    ];
    for (var, key) in lists {
        if let Some(value) = lookup(var) {
            let entries: Vec<String> = value
                .split(',')
                .map(|entry| entry.trim().to_string())
                .filter(|entry| !entry.is_empty())
                .collect();
            overrides.push((key, Value::from(entries)));
        }
    }

    if let Some(pattern) = lookup("BOOKING_SCHEDULE") {
        match daily_at_from_cron(&pattern) {
            Some(at) => overrides.push(("schedule.daily_at", Value::from(at))),
            None => tracing::warn!(
                "Ignoring BOOKING_SCHEDULE {:?}: only daily patterns like \"0 10 * * *\" are supported",
                pattern
            ),
        }
    }

    if let Some(value) = lookup("ENABLE_NOTIFICATIONS") {
        overrides.push(("notifications.enabled", Value::from(value.trim() == "true")));
    }

    overrides
}

/// `"MM HH * * *"` as `"HH:MM"`; any other cron pattern yields `None`
fn daily_at_from_cron(pattern: &str) -> Option<String> {
    let fields: Vec<&str> = pattern.split_whitespace().collect();
    let [minute, hour, "*", "*", "*"] = fields.as_slice() else {
        return None;
    };

    let minute: u32 = minute.parse().ok()?;
    let hour: u32 = hour.parse().ok()?;
    (hour < 24 && minute < 60).then(|| format!("{:02}:{:02}", hour, minute))
}

fn apply_legacy_env<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    for (key, value) in legacy_overrides(lookup) {
        builder = builder.set_override(key, value)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let settings: Settings = Config::builder().build().unwrap().try_deserialize().unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.portal.base_url, "https://sats.no");
        assert_eq!(settings.portal.days_in_advance, 7);
        assert_eq!(settings.schedule.daily_at, "10:00");
        assert_eq!(settings.schedule.timezone, "Europe/Oslo");
        assert!(settings.schedule.enabled);
        assert!(!settings.notifications.enabled);
        assert!(settings.booking.preferences().is_wildcard());
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
        assert!(!LoggingSettings::default().is_pretty());
    }

    #[test]
    fn test_default_file_matches_defaults() {
        let config = Config::builder()
            .add_source(File::with_name(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default")))
            .build()
            .unwrap();
        let settings: Settings = config.try_deserialize().unwrap();

        assert_eq!(settings.schedule.timezone, "Europe/Oslo");
        assert_eq!(settings.booking.default_location.as_deref(), Some("Colosseum"));
        assert_eq!(settings.logging.level, "info");
        assert!(settings.schedule.daily_schedule().is_ok());
    }

    #[test]
    fn test_legacy_logging_and_schedule() {
        let lookup = lookup_from(&[
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "pretty"),
            ("BOOKING_SCHEDULE", "30 9 * * *"),
        ]);

        let config = apply_legacy_env(Config::builder().build().unwrap(), lookup).unwrap();
        let settings: Settings = config.try_deserialize().unwrap();

        assert_eq!(settings.logging.level, "debug");
        assert!(settings.logging.is_pretty());
        assert_eq!(settings.schedule.daily_at, "09:30");
    }

    #[test]
    fn test_daily_at_from_cron() {
        assert_eq!(daily_at_from_cron("0 10 * * *").as_deref(), Some("10:00"));
        assert_eq!(daily_at_from_cron(" 5  7 * * * ").as_deref(), Some("07:05"));
        // Weekday restrictions and steps are not daily schedules
        assert_eq!(daily_at_from_cron("0 10 * * 1-5"), None);
        assert_eq!(daily_at_from_cron("*/5 * * * *"), None);
        assert_eq!(daily_at_from_cron("0 25 * * *"), None);
        assert_eq!(daily_at_from_cron("0 10 * *"), None);
    }

    #[test]
    fn test_missing_credentials_fail_validation() {
        let portal = PortalSettings::default();
        assert!(portal.validate().is_err());

        let portal = PortalSettings {
            email: "me@example.com".to_string(),
            password: "secret".to_string(),
            ..PortalSettings::default()
        };
        assert!(portal.validate().is_ok());
    }

    #[test]
    fn test_legacy_env_overrides() {
        let lookup = lookup_from(&[
            ("SATS_EMAIL", "me@example.com"),
            ("PREFERRED_CLASSES", "Yoga, Body Pump,,"),
            ("PREFERRED_TIMES", "18:00,19:00"),
            ("ENABLE_NOTIFICATIONS", "true"),
        ]);

        let config = apply_legacy_env(Config::builder().build().unwrap(), lookup).unwrap();
        let settings: Settings = config.try_deserialize().unwrap();

        assert_eq!(settings.portal.email, "me@example.com");
        assert_eq!(settings.booking.preferred_classes, vec!["Yoga", "Body Pump"]);
        assert_eq!(settings.booking.preferred_times, vec!["18:00", "19:00"]);
        assert!(settings.booking.preferred_locations.is_empty());
        assert!(settings.notifications.enabled);
    }

    #[test]
    fn test_no_legacy_vars_no_overrides() {
        assert!(legacy_overrides(lookup_from(&[])).is_empty());
    }

    #[test]
    fn test_fallback_location() {
        let mut booking = BookingSettings::default();
        assert_eq!(booking.fallback_location(), DEFAULT_LOCATION);

        booking.preferred_locations = vec!["Storo".to_string(), "Ryen".to_string()];
        assert_eq!(booking.fallback_location(), "Storo");

        booking.default_location = Some("Nydalen".to_string());
        assert_eq!(booking.fallback_location(), "Nydalen");
    }

    #[test]
    fn test_daily_schedule_from_settings() {
        assert!(ScheduleSettings::default().daily_schedule().is_ok());

        let broken = ScheduleSettings {
            daily_at: "ten".to_string(),
            ..ScheduleSettings::default()
        };
        assert!(broken.daily_schedule().is_err());

        let unknown_zone = ScheduleSettings {
            timezone: "Oslo".to_string(),
            ..ScheduleSettings::default()
        };
        assert!(unknown_zone.daily_schedule().is_err());
    }
}
