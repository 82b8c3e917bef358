//! Core types used throughout the marketplace

pub mod geo;
pub mod ids;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::SharedError;

pub use geo::Coordinate;
pub use ids::{OrderId, ProductId, UserId, VendorId};

/// Role a user registers with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Vendor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Customer => write!(f, "customer"),
            Role::Vendor => write!(f, "vendor"),
        }
    }
}

impl FromStr for Role {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "vendor" => Ok(Role::Vendor),
            other => Err(SharedError::InvalidConfig {
                field: "role".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// A registered user. Phone number is the re-login key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub phone: String,
    pub role: Role,
    #[serde(default)]
    pub category: Option<String>,
}

/// A seller with an optional location and a catalog of products
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub user_id: UserId,
    pub name: String,
    pub category: String,
    /// `None` until the vendor shares a location
    #[serde(default)]
    pub location: Option<Coordinate>,
    pub active: bool,
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
    #[serde(default)]
    pub order_ids: Vec<OrderId>,
    /// Free text. `None` is "never set", `Some("")` is a deliberate blank.
    #[serde(default)]
    pub meta: Option<String>,
}

impl Vendor {
    /// Whether the vendor takes part in proximity scans and radius browsing
    pub fn is_discoverable(&self) -> bool {
        self.active && self.location.is_some()
    }
}

/// A product owned by exactly one vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub vendor_id: VendorId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A pending cart entry. `vendor_id` is denormalized for checkout grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub vendor_id: VendorId,
    pub quantity: u32,
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// `true` once no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Accepted => write!(f, "accepted"),
            OrderStatus::Completed => write!(f, "completed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Contact details supplied at checkout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: String,
}

/// A vendor-scoped order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub vendor_id: VendorId,
    pub items: Vec<OrderItem>,
    /// Requested fulfilment time; `None` means as soon as possible
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub contact: Contact,
    /// Set once the ready notification has been dispatched
    #[serde(default)]
    pub notified_at: Option<DateTime<Utc>>,
}

/// Kinds of entries in the recent activity feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Login,
    VendorCreated,
    ProductAdded,
    OrderPlaced,
    OrderStatusChanged,
    OrderReady,
    VendorNearby,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub at: DateTime<Utc>,
    pub kind: ActivityKind,
    pub message: String,
}

/// How notifications reach the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMode {
    /// In-app toast only
    #[default]
    Popup,
    /// Platform notification, falling back to a toast
    Browser,
}

impl fmt::Display for NotificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationMode::Popup => write!(f, "popup"),
            NotificationMode::Browser => write!(f, "browser"),
        }
    }
}

impl FromStr for NotificationMode {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "popup" => Ok(NotificationMode::Popup),
            "browser" => Ok(NotificationMode::Browser),
            other => Err(SharedError::InvalidConfig {
                field: "notification_mode".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// User-editable settings carried in the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub proximity_radius_km: f64,
    pub notification_mode: NotificationMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            proximity_radius_km: 1.0,
            notification_mode: NotificationMode::Popup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Accepted.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn role_and_mode_parse_case_insensitively() {
        assert_eq!("Vendor".parse::<Role>().unwrap(), Role::Vendor);
        assert_eq!(" BROWSER ".parse::<NotificationMode>().unwrap(), NotificationMode::Browser);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn vendor_without_location_is_not_discoverable() {
        let vendor = Vendor {
            id: VendorId::new(),
            user_id: UserId::new(),
            name: "Dosa Corner".to_string(),
            category: "food".to_string(),
            location: None,
            active: true,
            product_ids: vec![],
            order_ids: vec![],
            meta: None,
        };
        assert!(!vendor.is_discoverable());
    }

    #[test]
    fn statuses_serialize_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Accepted).unwrap();
        assert_eq!(json, "\"accepted\"");
    }
}
