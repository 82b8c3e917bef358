//! Shared logging utilities for consistent tracing across the marketplace

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{error, info};

/// Subsystem that emitted a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Engine,
    Catalog,
    Cart,
    Orders,
    Schedule,
    Proximity,
    Persistence,
    Presentation,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Engine => write!(f, "engine"),
            Component::Catalog => write!(f, "catalog"),
            Component::Cart => write!(f, "cart"),
            Component::Orders => write!(f, "orders"),
            Component::Schedule => write!(f, "schedule"),
            Component::Proximity => write!(f, "proximity"),
            Component::Persistence => write!(f, "persistence"),
            Component::Presentation => write!(f, "presentation"),
        }
    }
}

/// Initialize the stdout subscriber. `RUST_LOG` wins over `log_level` when set.
pub fn init_tracing_with_level(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let base_level = log_level.unwrap_or("info");
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("marketplace={base_level},shared={base_level}")));

    // try_init: tests and embedders may already have installed a subscriber
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init();
}

pub fn init_tracing() {
    init_tracing_with_level(None);
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for component-aware info logging
#[macro_export]
macro_rules! market_info {
    ($component:expr, $($arg:tt)*) => {
        tracing::info!(
            component = %$component,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for component-aware warning logging
#[macro_export]
macro_rules! market_warn {
    ($component:expr, $($arg:tt)*) => {
        tracing::warn!(
            component = %$component,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for component-aware error logging
#[macro_export]
macro_rules! market_error {
    ($component:expr, $($arg:tt)*) => {
        tracing::error!(
            component = %$component,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for component-aware debug logging
#[macro_export]
macro_rules! market_debug {
    ($component:expr, $($arg:tt)*) => {
        tracing::debug!(
            component = %$component,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(details: &str) {
    info!(
        component = %Component::Engine,
        timestamp = format_timestamp(),
        "🚀 Starting {}",
        details
    );
}

/// Contextual logging helper for shutdown messages
pub fn log_shutdown(reason: &str) {
    info!(
        component = %Component::Engine,
        timestamp = format_timestamp(),
        "🛑 Shutting down: {}",
        reason
    );
}

/// Contextual logging helper for error conditions
pub fn log_error(component: Component, context: &str, error: &dyn fmt::Display) {
    error!(
        component = %component,
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(component: Component, message: &str) {
    info!(
        component = %component,
        timestamp = format_timestamp(),
        "✅ {}",
        message
    );
}
