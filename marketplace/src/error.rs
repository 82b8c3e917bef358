//! Marketplace error types

use thiserror::Error;
use shared::{OrderStatus, SharedError};

/// Entity kinds named in `NotFound` errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Vendor,
    Product,
    Order,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::Vendor => write!(f, "vendor"),
            EntityKind::Product => write!(f, "product"),
            EntityKind::Order => write!(f, "order"),
        }
    }
}

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Please log in as a customer first")]
    NotLoggedIn,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Unknown {kind}: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("No usable location available")]
    LocationUnavailable,

    #[error("Not permitted: {reason}")]
    NotPermitted { reason: String },

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Persistence failed: {message}")]
    Persistence { message: String },

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MarketError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_permitted(reason: impl Into<String>) -> Self {
        Self::NotPermitted { reason: reason.into() }
    }
}

pub type MarketResult<T> = Result<T, MarketError>;
