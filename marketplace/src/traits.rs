//! Collaborator traits with mockall annotations for testing
//!
//! The engine talks to the outside world only through these seams: a
//! key-value persistence store, a presentation layer, a location source and
//! a clock. Real implementations live in `services`; tests use the generated
//! mocks or `ManualClock`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use shared::{ActivityEntry, CartLine, Coordinate, Order, StateSnapshot, UserId};

use crate::core::{CartSummary, VendorListing};
use crate::error::MarketResult;

/// Data handed to the presentation layer for one re-render
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Vendors(Vec<VendorListing>),
    Cart { lines: Vec<CartLine>, summary: CartSummary },
    Orders(Vec<Order>),
    Activity(Vec<ActivityEntry>),
}

/// Persistence collaborator
///
/// Loads and saves the whole state snapshot. `load` returns `Ok(None)` when
/// nothing has been saved yet.
#[mockall::automock]
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> MarketResult<Option<StateSnapshot>>;

    async fn save(&self, snapshot: &StateSnapshot) -> MarketResult<()>;
}

/// Presentation collaborator
#[mockall::automock]
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Ephemeral in-app message
    async fn toast(&self, text: &str, duration: Duration) -> MarketResult<()>;

    /// Platform notification. Fails when the channel is unavailable or permission is denied.
    async fn platform_notify(&self, title: &str, body: &str) -> MarketResult<()>;

    async fn render(&self, view: View) -> MarketResult<()>;
}

/// Location collaborator, polled by the proximity scan
#[mockall::automock]
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync {
    /// Manual override or last known fix for the user
    async fn current_location(&self, user_id: UserId) -> Option<Coordinate>;
}

/// Source of the current time
#[mockall::automock]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
