//! Strongly typed identifiers for marketplace entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::SharedError;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_string(s: &str) -> Result<Self, SharedError> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| SharedError::InvalidId { input: s.to_string() })
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// First eight hex digits, used in console output
            pub fn short(&self) -> String {
                self.0.simple().to_string()[..8].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = SharedError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_string(s)
            }
        }
    };
}

define_id!(
    /// Identifier of a registered user (customer or vendor operator)
    UserId
);
define_id!(
    /// Identifier of a vendor profile
    VendorId
);
define_id!(
    /// Identifier of a product in a vendor's catalog
    ProductId
);
define_id!(
    /// Identifier of a vendor-scoped order
    OrderId
);
