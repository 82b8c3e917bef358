//! Per-user saved vendors

use std::collections::{BTreeMap, BTreeSet};

use shared::{UserId, VendorId};

use crate::core::catalog::Catalog;
use crate::error::{EntityKind, MarketError, MarketResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Favorites {
    by_user: BTreeMap<UserId, BTreeSet<VendorId>>,
}

impl Favorites {
    pub fn from_map(by_user: BTreeMap<UserId, BTreeSet<VendorId>>) -> Self {
        Self { by_user }
    }

    pub fn to_map(&self) -> BTreeMap<UserId, BTreeSet<VendorId>> {
        self.by_user.clone()
    }

    /// Flip a vendor in or out of the user's favorites. Returns `true` if it is now a favorite.
    pub fn toggle(&mut self, catalog: &Catalog, user_id: UserId, vendor_id: VendorId) -> MarketResult<bool> {
        if catalog.vendor(vendor_id).is_none() {
            return Err(MarketError::not_found(EntityKind::Vendor, vendor_id));
        }
        let saved = self.by_user.entry(user_id).or_default();
        let now_favorite = if saved.remove(&vendor_id) {
            false
        } else {
            saved.insert(vendor_id);
            true
        };
        if saved.is_empty() {
            self.by_user.remove(&user_id);
        }
        Ok(now_favorite)
    }

    pub fn is_favorite(&self, user_id: UserId, vendor_id: VendorId) -> bool {
        self.by_user.get(&user_id).is_some_and(|s| s.contains(&vendor_id))
    }

    pub fn vendors_of(&self, user_id: UserId) -> impl Iterator<Item = VendorId> + '_ {
        self.by_user.get(&user_id).into_iter().flatten().copied()
    }

    /// Drop a removed vendor from every user's set
    pub fn remove_vendor(&mut self, vendor_id: VendorId) {
        for saved in self.by_user.values_mut() {
            saved.remove(&vendor_id);
        }
        self.by_user.retain(|_, saved| !saved.is_empty());
    }
}
