//! Runtime configuration
//!
//! Layered lowest to highest: built-in defaults, environment (optionally from
//! a `.env` file), then command-line flags applied by the binary.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared::{NotificationMode, Settings};

use crate::core::activity::DEFAULT_ACTIVITY_CAPACITY;
use crate::core::proximity::DEFAULT_COOLDOWN_SECS;
use crate::core::schedule::DEFAULT_GRACE_MS;
use crate::core::StateOptions;
use crate::error::{MarketError, MarketResult};

pub const ENV_RADIUS_KM: &str = "MARKET_RADIUS_KM";
pub const ENV_NOTIFICATION_MODE: &str = "MARKET_NOTIFICATION_MODE";
pub const ENV_STATE_PATH: &str = "MARKET_STATE_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub proximity_radius_km: f64,
    pub notification_mode: NotificationMode,
    pub scan_interval: Duration,
    pub notify_cooldown: Duration,
    pub schedule_grace: Duration,
    /// How often the engine checks for due orders
    pub schedule_poll: Duration,
    pub state_path: PathBuf,
    pub activity_capacity: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            proximity_radius_km: 1.0,
            notification_mode: NotificationMode::Popup,
            scan_interval: Duration::from_secs(12),
            notify_cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS as u64),
            schedule_grace: Duration::from_millis(DEFAULT_GRACE_MS as u64),
            schedule_poll: Duration::from_millis(250),
            state_path: PathBuf::from("./data/marketplace.json"),
            activity_capacity: DEFAULT_ACTIVITY_CAPACITY,
        }
    }
}

impl MarketConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> MarketResult<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `MARKET_*` variables read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> MarketResult<()> {
        if let Some(raw) = lookup(ENV_RADIUS_KM) {
            self.proximity_radius_km = raw
                .trim()
                .parse()
                .map_err(|_| MarketError::invalid_input(ENV_RADIUS_KM, format!("'{raw}' is not a number")))?;
        }
        if let Some(raw) = lookup(ENV_NOTIFICATION_MODE) {
            self.notification_mode = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_STATE_PATH) {
            let raw = raw.trim();
            if !raw.is_empty() {
                self.state_path = PathBuf::from(raw);
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> MarketResult<()> {
        if !self.proximity_radius_km.is_finite() || self.proximity_radius_km <= 0.0 {
            return Err(MarketError::invalid_input(
                "proximity_radius_km",
                "must be a positive number of km",
            ));
        }
        if self.scan_interval.is_zero() {
            return Err(MarketError::invalid_input("scan_interval", "must be greater than zero"));
        }
        if self.schedule_poll.is_zero() {
            return Err(MarketError::invalid_input("schedule_poll", "must be greater than zero"));
        }
        if self.activity_capacity == 0 {
            return Err(MarketError::invalid_input("activity_capacity", "must be at least 1"));
        }
        if self.state_path.as_os_str().is_empty() {
            return Err(MarketError::invalid_input("state_path", "must not be empty"));
        }
        Ok(())
    }

    /// Settings used when no snapshot exists yet
    pub fn initial_settings(&self) -> Settings {
        Settings {
            proximity_radius_km: self.proximity_radius_km,
            notification_mode: self.notification_mode,
        }
    }

    pub fn state_options(&self) -> StateOptions {
        StateOptions {
            schedule_grace: to_chrono(self.schedule_grace),
            notify_cooldown: to_chrono(self.notify_cooldown),
            activity_capacity: self.activity_capacity,
            fallback_radius_km: self.proximity_radius_km,
        }
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
