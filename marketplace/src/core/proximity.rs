//! Proximity monitor
//!
//! Compares the active customer's location against every discoverable vendor
//! and reports vendors within the radius, at most once per cooldown window for
//! each `(customer, vendor)` pair.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use shared::logging::Component;
use shared::{market_debug, market_warn, Coordinate, Role, User, UserId, VendorId};

use crate::core::catalog::Catalog;
use crate::core::geo;
use crate::error::{MarketError, MarketResult};

pub const DEFAULT_COOLDOWN_SECS: i64 = 120;

/// A vendor that came within range during a scan
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityHit {
    pub customer_id: UserId,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub distance_km: f64,
}

/// Why a scan did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSkip {
    NoActiveUser,
    NotACustomer,
    NoLocation,
}

#[derive(Debug, Clone)]
pub struct ProximityMonitor {
    cooldown: Duration,
    last_notified: HashMap<(UserId, VendorId), DateTime<Utc>>,
}

impl Default for ProximityMonitor {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_COOLDOWN_SECS))
    }
}

impl ProximityMonitor {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_notified: HashMap::new(),
        }
    }

    /// Decide whether a scan should run for `user` at `location`
    pub fn precheck(user: Option<&User>, location: Option<Coordinate>) -> Result<(UserId, Coordinate), ScanSkip> {
        let user = user.ok_or(ScanSkip::NoActiveUser)?;
        if user.role != Role::Customer {
            return Err(ScanSkip::NotACustomer);
        }
        let location = location.ok_or(ScanSkip::NoLocation)?;
        Ok((user.id, location))
    }

    /// Run one scan for `customer_id` standing at `location`.
    ///
    /// Fails with `LocationUnavailable` if the customer's coordinate is not
    /// usable. Vendors with a bad stored location are skipped.
    pub fn scan(
        &mut self,
        catalog: &Catalog,
        customer_id: UserId,
        location: Coordinate,
        radius_km: f64,
        now: DateTime<Utc>,
    ) -> MarketResult<Vec<ProximityHit>> {
        if !location.is_valid() {
            return Err(MarketError::LocationUnavailable);
        }

        let mut hits = Vec::new();
        for vendor in catalog.vendors().filter(|v| v.is_discoverable()) {
            let Some(vendor_location) = vendor.location else {
                continue;
            };
            if !vendor_location.is_valid() {
                market_warn!(Component::Proximity, "Skipping vendor {} with unusable location {}", vendor.id, vendor_location);
                continue;
            }

            let distance_km = geo::distance_km(&location, &vendor_location);
            if distance_km > radius_km {
                continue;
            }

            let key = (customer_id, vendor.id);
            if let Some(last) = self.last_notified.get(&key) {
                if now - *last < self.cooldown {
                    continue;
                }
            }
            self.last_notified.insert(key, now);
            hits.push(ProximityHit {
                customer_id,
                vendor_id: vendor.id,
                vendor_name: vendor.name.clone(),
                distance_km,
            });
        }

        hits.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        market_debug!(Component::Proximity, "Scan for {} found {} new vendor(s) nearby", customer_id, hits.len());
        Ok(hits)
    }

    /// Forget cooldown state for a vendor that no longer exists
    pub fn forget_vendor(&mut self, vendor_id: VendorId) {
        self.last_notified.retain(|(_, v), _| *v != vendor_id);
    }

    pub fn last_notified(&self, customer_id: UserId, vendor_id: VendorId) -> Option<DateTime<Utc>> {
        self.last_notified.get(&(customer_id, vendor_id)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::VendorDraft;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn catalog_with_vendor(active: bool) -> (Catalog, VendorId) {
        let mut catalog = Catalog::new();
        let vendor = catalog
            .create_vendor(VendorDraft {
                name: "Mysore Pak Stall".into(),
                category: "sweets".into(),
                location: Some(coord(12.307, 76.652)),
                active,
                ..Default::default()
            })
            .unwrap();
        (catalog, vendor.id)
    }

    #[test]
    fn nearby_vendor_fires_once_per_cooldown_window() {
        let (catalog, vendor_id) = catalog_with_vendor(true);
        let mut monitor = ProximityMonitor::default();
        let customer = UserId::new();
        let here = coord(12.3071, 76.6521);
        let start = Utc::now();

        let first = monitor.scan(&catalog, customer, here, 1.0, start).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].vendor_id, vendor_id);
        assert!((first[0].distance_km - 0.0154).abs() < 0.001);

        for tick in 1..10 {
            let at = start + Duration::seconds(12 * tick);
            assert!(monitor.scan(&catalog, customer, here, 1.0, at).unwrap().is_empty());
        }

        let after_window = start + Duration::seconds(DEFAULT_COOLDOWN_SECS);
        assert_eq!(monitor.scan(&catalog, customer, here, 1.0, after_window).unwrap().len(), 1);
    }

    #[test]
    fn cooldown_is_per_customer() {
        let (catalog, _) = catalog_with_vendor(true);
        let mut monitor = ProximityMonitor::default();
        let here = coord(12.3071, 76.6521);
        let now = Utc::now();

        assert_eq!(monitor.scan(&catalog, UserId::new(), here, 1.0, now).unwrap().len(), 1);
        assert_eq!(monitor.scan(&catalog, UserId::new(), here, 1.0, now).unwrap().len(), 1);
    }

    #[test]
    fn inactive_and_distant_vendors_are_ignored() {
        let (catalog, _) = catalog_with_vendor(false);
        let mut monitor = ProximityMonitor::default();
        let here = coord(12.3071, 76.6521);
        assert!(monitor.scan(&catalog, UserId::new(), here, 1.0, Utc::now()).unwrap().is_empty());

        let (catalog, _) = catalog_with_vendor(true);
        let far = coord(12.9716, 77.5946);
        assert!(monitor.scan(&catalog, UserId::new(), far, 1.0, Utc::now()).unwrap().is_empty());
    }

    #[test]
    fn unusable_customer_location_is_an_error() {
        let (catalog, _) = catalog_with_vendor(true);
        let mut monitor = ProximityMonitor::default();
        let bad = Coordinate { lat: f64::NAN, lng: 0.0 };
        assert!(matches!(
            monitor.scan(&catalog, UserId::new(), bad, 1.0, Utc::now()),
            Err(MarketError::LocationUnavailable)
        ));
    }

    #[test]
    fn precheck_requires_a_located_customer() {
        let customer = User {
            id: UserId::new(),
            name: "Ravi".into(),
            phone: "1".into(),
            role: Role::Customer,
            category: None,
        };
        let operator = User { role: Role::Vendor, ..customer.clone() };
        let here = Some(coord(1.0, 1.0));

        assert_eq!(ProximityMonitor::precheck(None, here), Err(ScanSkip::NoActiveUser));
        assert_eq!(ProximityMonitor::precheck(Some(&operator), here), Err(ScanSkip::NotACustomer));
        assert_eq!(ProximityMonitor::precheck(Some(&customer), None), Err(ScanSkip::NoLocation));
        assert!(ProximityMonitor::precheck(Some(&customer), here).is_ok());
    }

    #[test]
    fn forgetting_a_vendor_clears_its_cooldown() {
        let (catalog, vendor_id) = catalog_with_vendor(true);
        let mut monitor = ProximityMonitor::default();
        let customer = UserId::new();
        let here = coord(12.3071, 76.6521);
        monitor.scan(&catalog, customer, here, 1.0, Utc::now()).unwrap();
        assert!(monitor.last_notified(customer, vendor_id).is_some());

        monitor.forget_vendor(vendor_id);
        assert!(monitor.last_notified(customer, vendor_id).is_none());
    }
}
