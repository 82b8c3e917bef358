//! Local marketplace simulator
//!
//! Connects customers to nearby vendors: a catalog of vendors and products,
//! a session cart, per-vendor orders with a checked status state machine and
//! scheduled fulfilment, and a proximity monitor that tells customers when a
//! vendor is close by. Persistence, presentation, location and time are
//! injected collaborators.

pub mod commands;
pub mod config;
pub mod core;
pub mod demo;
pub mod dispatch;
pub mod error;
pub mod marketplace;
pub mod services;
pub mod traits;

pub use commands::{parse_command, MarketCommand, ScheduleRequest};
pub use config::MarketConfig;
pub use core::{CheckoutRequest, Effects, MarketState};
pub use dispatch::{Channel, NotificationDispatcher};
pub use error::{EntityKind, MarketError, MarketResult};
pub use marketplace::{Marketplace, Reply};
pub use traits::{Clock, LocationProvider, Notifier, StateStore, View};
pub use traits::{MockClock, MockLocationProvider, MockNotifier, MockStateStore};
