use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Title used for every reminder notification.
pub const NOTIFICATION_TITLE: &str = "Smart Reminder";
/// Tag shared by reminder notifications; a newer one replaces the older.
pub const NOTIFICATION_TAG: &str = "reminder-notification";
/// Every shown notification is closed this long after it was created.
pub const DISMISS_AFTER: Duration = Duration::from_secs(10);
/// Click action that closes a notification without focusing the app.
pub const ACTION_DISMISS: &str = "dismiss";
/// Click action that focuses (or opens) the app.
pub const ACTION_OPEN: &str = "open";

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Seconds,
    #[default]
    Minutes,
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalUnit::Seconds => f.write_str("seconds"),
            IntervalUnit::Minutes => f.write_str("minutes"),
        }
    }
}

impl FromStr for IntervalUnit {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Ok(IntervalUnit::Seconds),
            "m" | "min" | "mins" | "minute" | "minutes" => Ok(IntervalUnit::Minutes),
            other => Err(format!("unknown interval unit: {other}")),
        }
    }
}

/// Interval length in milliseconds.
pub fn get_interval_ms(value: u64, unit: IntervalUnit) -> u64 {
    match unit {
        IntervalUnit::Seconds => value.saturating_mul(1000),
        IntervalUnit::Minutes => value.saturating_mul(60 * 1000),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigInvalid {
    #[error("reminder text must not be blank")]
    BlankText,
    #[error("interval must be at least 1")]
    IntervalTooSmall,
}

/// User-entered reminder text plus the interval that drives the timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    pub text: String,
    pub interval: u64,
    #[serde(default)]
    pub unit: IntervalUnit,
}

impl ReminderConfig {
    pub fn new(text: impl Into<String>, interval: u64, unit: IntervalUnit) -> Self {
        Self {
            text: text.into(),
            interval,
            unit,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigInvalid> {
        if self.text.trim().is_empty() {
            return Err(ConfigInvalid::BlankText);
        }
        if self.interval < 1 {
            return Err(ConfigInvalid::IntervalTooSmall);
        }
        Ok(())
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(get_interval_ms(self.interval, self.unit))
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            interval: 5,
            unit: IntervalUnit::Minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_ms_by_unit() {
        for v in [1u64, 2, 5, 30, 90, 1440] {
            assert_eq!(get_interval_ms(v, IntervalUnit::Seconds), v * 1000);
            assert_eq!(get_interval_ms(v, IntervalUnit::Minutes), v * 60 * 1000);
        }
    }

    #[test]
    fn validate_rejects_blank_and_zero() {
        assert_eq!(
            ReminderConfig::new("   ", 5, IntervalUnit::Minutes).validate(),
            Err(ConfigInvalid::BlankText)
        );
        assert_eq!(
            ReminderConfig::new("drink water", 0, IntervalUnit::Seconds).validate(),
            Err(ConfigInvalid::IntervalTooSmall)
        );
        assert!(
            ReminderConfig::new("drink water", 1, IntervalUnit::Seconds)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn unit_parses_short_forms() {
        assert_eq!("s".parse::<IntervalUnit>(), Ok(IntervalUnit::Seconds));
        assert_eq!("Minutes".parse::<IntervalUnit>(), Ok(IntervalUnit::Minutes));
        assert!("hours".parse::<IntervalUnit>().is_err());
    }

    #[test]
    fn config_deserializes_with_default_unit() {
        let cfg: ReminderConfig =
            serde_json::from_str(r#"{"text":"stretch","interval":3}"#).unwrap();
        assert_eq!(cfg.unit, IntervalUnit::Minutes);
        assert_eq!(cfg.period(), Duration::from_secs(180));
    }
}
