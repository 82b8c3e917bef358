//! Versioned persistence snapshot
//!
//! Every collection defaults to empty so an older or partial snapshot merges
//! into a fresh state instead of failing to load.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{ActivityEntry, Order, Product, Settings, User, UserId, Vendor, VendorId};

/// Current on-disk schema version
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Absent in unversioned snapshots, which are treated as version 0
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub vendors: Vec<Vendor>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub favorites: BTreeMap<UserId, BTreeSet<VendorId>>,
    #[serde(default)]
    pub recent_activity: Vec<ActivityEntry>,
    #[serde(default)]
    pub settings: Settings,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            users: Vec::new(),
            vendors: Vec::new(),
            products: Vec::new(),
            orders: Vec::new(),
            favorites: BTreeMap::new(),
            recent_activity: Vec::new(),
            settings: Settings::default(),
        }
    }
}

impl StateSnapshot {
    /// Written by a newer build; fields this build does not know were dropped on load
    pub fn is_from_newer_schema(&self) -> bool {
        self.schema_version > SNAPSHOT_SCHEMA_VERSION
    }
}
