//! Core business logic
//!
//! Pure, synchronous code with no I/O. Time is always passed in by the
//! caller so every operation is deterministic under test.

pub mod activity;
pub mod cart;
pub mod catalog;
pub mod favorites;
pub mod geo;
pub mod orders;
pub mod proximity;
pub mod schedule;
pub mod state;

pub use activity::ActivityLog;
pub use cart::{Cart, CartSummary};
pub use catalog::{BrowseFilter, Catalog, ProductDraft, VendorDraft, VendorListing};
pub use favorites::Favorites;
pub use orders::{validate_transition, Actor, CheckoutRequest, OrderBook, ALLOWED_TRANSITIONS};
pub use proximity::{ProximityHit, ProximityMonitor, ScanSkip};
pub use schedule::FulfilmentSchedule;
pub use state::{Effects, MarketState, StateOptions};
