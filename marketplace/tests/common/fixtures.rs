//! Test fixtures and data for marketplace tests

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use shared::Coordinate;

pub struct TestFixtures;

impl TestFixtures {
    pub const CUSTOMER_NAME: &'static str = "Asha";
    pub const CUSTOMER_PHONE: &'static str = "555 0101";
    pub const OPERATOR_PHONE: &'static str = "555 0900";

    pub fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    /// Devaraja market stall
    pub fn vendor_location() -> Coordinate {
        Coordinate::new(12.307, 76.652).unwrap()
    }

    /// About 15 m from the stall
    pub fn customer_nearby() -> Coordinate {
        Coordinate::new(12.3071, 76.6521).unwrap()
    }

    /// Bengaluru, well outside any default radius
    pub fn customer_far_away() -> Coordinate {
        Coordinate::new(12.9716, 77.5946).unwrap()
    }

    pub fn price(units: i64, cents: u32) -> Decimal {
        Decimal::new(units * 100 + i64::from(cents), 2)
    }
}
