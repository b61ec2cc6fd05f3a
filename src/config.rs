//! Engine tuning knobs, loaded from `CHAT_*` environment variables.

use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

pub const DEFAULT_RETENTION_CAP: usize = 50;
pub const DEFAULT_BASE_INTERVAL_MS: u64 = 4000;
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 150;
pub const DEFAULT_BATCH_STAGGER_MS: u64 = 120;
pub const DEFAULT_BURST_STAGGER_MS: u64 = 60;
pub const DEFAULT_SCROLL_THRESHOLD_PX: f64 = 150.0;
pub const DEFAULT_SCROLL_THROTTLE_MS: u64 = 100;
pub const DEFAULT_PREDICTION_WINDOW_SECS: u64 = 120;
pub const DEFAULT_POLL_DURATION_SECS: u64 = 90;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatConfig {
    /// Most-recent messages kept by the store.
    pub retention_cap: usize,
    /// Emission interval for the quietest rooms.
    pub base_interval: Duration,
    /// Floor for every computed emission delay.
    pub min_interval: Duration,
    /// Gap between members of one emission batch.
    pub batch_stagger: Duration,
    /// Gap between hype messages inside a burst.
    pub burst_stagger: Duration,
    /// Distance from the bottom (px) beyond which auto-follow pauses.
    pub scroll_threshold_px: f64,
    /// Minimum spacing between two scroll evaluations.
    pub scroll_throttle: Duration,
    pub prediction_window: Duration,
    pub poll_duration: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            retention_cap: DEFAULT_RETENTION_CAP,
            base_interval: Duration::from_millis(DEFAULT_BASE_INTERVAL_MS),
            min_interval: Duration::from_millis(DEFAULT_MIN_INTERVAL_MS),
            batch_stagger: Duration::from_millis(DEFAULT_BATCH_STAGGER_MS),
            burst_stagger: Duration::from_millis(DEFAULT_BURST_STAGGER_MS),
            scroll_threshold_px: DEFAULT_SCROLL_THRESHOLD_PX,
            scroll_throttle: Duration::from_millis(DEFAULT_SCROLL_THROTTLE_MS),
            prediction_window: Duration::from_secs(DEFAULT_PREDICTION_WINDOW_SECS),
            poll_duration: Duration::from_secs(DEFAULT_POLL_DURATION_SECS),
        }
    }
}

impl ChatConfig {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// - `CHAT_RETENTION_CAP`: default 50
    /// - `CHAT_BASE_INTERVAL_MS`: default 4000
    /// - `CHAT_MIN_INTERVAL_MS`: default 150
    /// - `CHAT_BATCH_STAGGER_MS`: default 120
    /// - `CHAT_BURST_STAGGER_MS`: default 60
    /// - `CHAT_SCROLL_THRESHOLD_PX`: default 150
    /// - `CHAT_SCROLL_THROTTLE_MS`: default 100
    /// - `CHAT_PREDICTION_WINDOW_SECS`: default 120
    /// - `CHAT_POLL_DURATION_SECS`: default 90
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the resulting values are inconsistent.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let parse_ms = |key: &str, default: u64| Duration::from_millis(parse_or(&lookup, key, default));
        let parse_secs = |key: &str, default: u64| Duration::from_secs(parse_or(&lookup, key, default));

        let config = Self {
            retention_cap: parse_or(&lookup, "CHAT_RETENTION_CAP", DEFAULT_RETENTION_CAP),
            base_interval: parse_ms("CHAT_BASE_INTERVAL_MS", DEFAULT_BASE_INTERVAL_MS),
            min_interval: parse_ms("CHAT_MIN_INTERVAL_MS", DEFAULT_MIN_INTERVAL_MS),
            batch_stagger: parse_ms("CHAT_BATCH_STAGGER_MS", DEFAULT_BATCH_STAGGER_MS),
            burst_stagger: parse_ms("CHAT_BURST_STAGGER_MS", DEFAULT_BURST_STAGGER_MS),
            scroll_threshold_px: parse_or(&lookup, "CHAT_SCROLL_THRESHOLD_PX", DEFAULT_SCROLL_THRESHOLD_PX),
            scroll_throttle: parse_ms("CHAT_SCROLL_THROTTLE_MS", DEFAULT_SCROLL_THROTTLE_MS),
            prediction_window: parse_secs("CHAT_PREDICTION_WINDOW_SECS", DEFAULT_PREDICTION_WINDOW_SECS),
            poll_duration: parse_secs("CHAT_POLL_DURATION_SECS", DEFAULT_POLL_DURATION_SECS),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the knobs describe a runnable engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for zero caps/intervals, a non-finite or
    /// negative scroll threshold, or a base interval below the floor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retention_cap == 0 {
            return Err(ConfigError::Zero { field: "retention_cap" });
        }
        if self.min_interval.is_zero() {
            return Err(ConfigError::Zero { field: "min_interval" });
        }
        if self.scroll_throttle.is_zero() {
            return Err(ConfigError::Zero { field: "scroll_throttle" });
        }
        if !self.scroll_threshold_px.is_finite() || self.scroll_threshold_px < 0.0 {
            return Err(ConfigError::InvalidScrollThreshold);
        }
        if self.prediction_window.is_zero() {
            return Err(ConfigError::Zero { field: "prediction_window" });
        }
        if self.base_interval < self.min_interval {
            return Err(ConfigError::BaseBelowMinimum {
                base_ms: duration_ms(self.base_interval),
                min_ms: duration_ms(self.min_interval),
            });
        }
        Ok(())
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse::<T>().unwrap_or_else(|_| {
        warn!(key, value = %raw, "ignoring unparsable config value");
        default
    })
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
