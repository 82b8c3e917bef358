//! Common test utilities and infrastructure
//!
//! Shared fixtures and a builder that wires the engine to mockall mocks, a
//! manual clock and a manual location provider.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{Event, MarketplaceBuilder, TestMarket};
