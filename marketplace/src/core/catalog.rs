//! Catalog store: users, vendors and products
//!
//! The catalog is the relational graph every other component reads from.
//! Vendors own their products by id; a vendor user owns at most one vendor
//! profile. Cross-component cascades (orders, favorites) live in
//! [`crate::core::MarketState`].

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use shared::logging::Component;
use shared::{
    market_debug, market_warn, Coordinate, OrderId, Product, ProductId, Role, User, UserId, Vendor,
    VendorId,
};

use crate::core::geo;
use crate::error::{EntityKind, MarketError, MarketResult};

/// Category used when a vendor does not name one
pub const DEFAULT_CATEGORY: &str = "general";

/// Input for [`Catalog::create_vendor`]
#[derive(Debug, Clone, Default)]
pub struct VendorDraft {
    pub name: String,
    pub category: String,
    pub location: Option<Coordinate>,
    pub active: bool,
    pub meta: Option<String>,
    /// Login phone for the paired vendor user. Without one the vendor cannot log in.
    pub phone: Option<String>,
}

/// Input for [`Catalog::add_product`]
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: String,
    /// Missing prices are stored as zero
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Vendor browsing filter
#[derive(Debug, Clone, Default)]
pub struct BrowseFilter {
    pub category: Option<String>,
    /// Origin and radius in km. Restricts results to discoverable vendors.
    pub near: Option<(Coordinate, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VendorListing {
    pub vendor: Vendor,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Default)]
pub struct Catalog {
    users: HashMap<UserId, User>,
    vendors: HashMap<VendorId, Vendor>,
    products: HashMap<ProductId, Product>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records, repairing what would break invariants:
    /// duplicate phones keep the first user, orphaned products are dropped,
    /// and vendor product lists only reference products that exist.
    pub fn from_parts(users: Vec<User>, vendors: Vec<Vendor>, products: Vec<Product>) -> Self {
        let mut catalog = Self::new();

        let mut seen_phones = HashSet::new();
        for user in users {
            if !user.phone.is_empty() && !seen_phones.insert(user.phone.clone()) {
                market_warn!(Component::Catalog, "Dropping user {} with duplicate phone", user.id);
                continue;
            }
            catalog.users.insert(user.id, user);
        }

        for vendor in vendors {
            catalog.vendors.insert(vendor.id, vendor);
        }

        for product in products {
            if !catalog.vendors.contains_key(&product.vendor_id) {
                market_warn!(Component::Catalog, "Dropping orphaned product {}", product.id);
                continue;
            }
            catalog.products.insert(product.id, product);
        }

        let known: HashSet<ProductId> = catalog.products.keys().copied().collect();
        for vendor in catalog.vendors.values_mut() {
            vendor.product_ids.retain(|id| known.contains(id));
        }
        for product in catalog.products.values() {
            if let Some(vendor) = catalog.vendors.get_mut(&product.vendor_id) {
                if !vendor.product_ids.contains(&product.id) {
                    vendor.product_ids.push(product.id);
                }
            }
        }

        catalog
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn vendors(&self) -> impl Iterator<Item = &Vendor> {
        self.vendors.values()
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn vendor(&self, id: VendorId) -> Option<&Vendor> {
        self.vendors.get(&id)
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn find_user_by_phone(&self, phone: &str) -> Option<&User> {
        let phone = normalize_phone(phone);
        if phone.is_empty() {
            return None;
        }
        self.users.values().find(|u| u.phone == phone)
    }

    pub fn vendor_for_user(&self, user_id: UserId) -> Option<&Vendor> {
        self.vendors.values().find(|v| v.user_id == user_id)
    }

    /// Products of a vendor in the order they were added
    pub fn products_of(&self, vendor_id: VendorId) -> Vec<&Product> {
        self.vendors
            .get(&vendor_id)
            .map(|v| v.product_ids.iter().filter_map(|id| self.products.get(id)).collect())
            .unwrap_or_default()
    }

    /// Return the user registered under `phone`, or create one.
    ///
    /// The boolean is `true` when a new user was created. An existing user
    /// keeps its original name and role.
    pub fn register_or_find_user(&mut self, name: &str, phone: &str, role: Role) -> MarketResult<(User, bool)> {
        let phone = normalize_phone(phone);
        if phone.is_empty() {
            return Err(MarketError::invalid_input("phone", "must not be empty"));
        }
        if let Some(existing) = self.users.values().find(|u| u.phone == phone) {
            return Ok((existing.clone(), false));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(MarketError::invalid_input("name", "must not be empty"));
        }

        let user = User {
            id: UserId::new(),
            name: name.to_string(),
            phone,
            role,
            category: None,
        };
        self.users.insert(user.id, user.clone());
        market_debug!(Component::Catalog, "Registered {} user {}", role, user.id);
        Ok((user, true))
    }

    /// Create a vendor together with its paired vendor-role user.
    pub fn create_vendor(&mut self, draft: VendorDraft) -> MarketResult<Vendor> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(MarketError::invalid_input("name", "must not be empty"));
        }
        if let Some(location) = draft.location {
            if !location.is_valid() {
                return Err(MarketError::LocationUnavailable);
            }
        }
        let category = normalize_category(&draft.category);

        let owner = match draft.phone.as_deref() {
            Some(phone) => {
                let (user, _) = self.register_or_find_user(&name, phone, Role::Vendor)?;
                if user.role != Role::Vendor {
                    return Err(MarketError::not_permitted("phone belongs to a customer account"));
                }
                if self.vendor_for_user(user.id).is_some() {
                    return Err(MarketError::not_permitted("user already has a vendor profile"));
                }
                user.id
            }
            None => {
                let user = User {
                    id: UserId::new(),
                    name: name.clone(),
                    phone: String::new(),
                    role: Role::Vendor,
                    category: Some(category.clone()),
                };
                let id = user.id;
                self.users.insert(id, user);
                id
            }
        };

        let vendor = Vendor {
            id: VendorId::new(),
            user_id: owner,
            name,
            category,
            location: draft.location,
            active: draft.active,
            product_ids: Vec::new(),
            order_ids: Vec::new(),
            meta: draft.meta,
        };
        self.vendors.insert(vendor.id, vendor.clone());
        market_debug!(Component::Catalog, "Created vendor '{}' ({})", vendor.name, vendor.id);
        Ok(vendor)
    }

    /// Find the vendor profile of a vendor-role user, creating it on first use.
    ///
    /// Returns the vendor id and whether the profile was just created.
    pub fn ensure_vendor_for_user(&mut self, user_id: UserId) -> MarketResult<(VendorId, bool)> {
        let user = self
            .users
            .get(&user_id)
            .ok_or_else(|| MarketError::not_found(EntityKind::User, user_id))?;
        if user.role != Role::Vendor {
            return Err(MarketError::not_permitted("only vendor accounts have a vendor profile"));
        }
        if let Some(vendor) = self.vendor_for_user(user_id) {
            return Ok((vendor.id, false));
        }

        let vendor = Vendor {
            id: VendorId::new(),
            user_id,
            name: user.name.clone(),
            category: user
                .category
                .as_deref()
                .map(normalize_category)
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            location: None,
            active: true,
            product_ids: Vec::new(),
            order_ids: Vec::new(),
            meta: None,
        };
        let id = vendor.id;
        self.vendors.insert(id, vendor);
        market_debug!(Component::Catalog, "Lazily created vendor profile {} for user {}", id, user_id);
        Ok((id, true))
    }

    pub fn set_vendor_location(&mut self, vendor_id: VendorId, location: Coordinate) -> MarketResult<&Vendor> {
        if !location.is_valid() {
            return Err(MarketError::LocationUnavailable);
        }
        let vendor = self.vendor_mut(vendor_id)?;
        vendor.location = Some(location);
        Ok(vendor)
    }

    pub fn set_vendor_active(&mut self, vendor_id: VendorId, active: bool) -> MarketResult<&Vendor> {
        let vendor = self.vendor_mut(vendor_id)?;
        vendor.active = active;
        Ok(vendor)
    }

    /// Append a product to a vendor's catalog.
    ///
    /// Fails with `NotFound` for an unknown vendor, leaving the registry untouched.
    pub fn add_product(&mut self, vendor_id: VendorId, draft: ProductDraft) -> MarketResult<Product> {
        if !self.vendors.contains_key(&vendor_id) {
            return Err(MarketError::not_found(EntityKind::Vendor, vendor_id));
        }
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(MarketError::invalid_input("name", "must not be empty"));
        }
        let price = coerce_price(draft.price)?;

        let product = Product {
            id: ProductId::new(),
            vendor_id,
            name,
            price,
            description: draft.description,
            image: draft.image,
        };
        self.vendor_mut(vendor_id)?.product_ids.push(product.id);
        self.products.insert(product.id, product.clone());
        Ok(product)
    }

    pub fn remove_product(&mut self, product_id: ProductId) -> MarketResult<Product> {
        let product = self
            .products
            .remove(&product_id)
            .ok_or_else(|| MarketError::not_found(EntityKind::Product, product_id))?;
        if let Some(vendor) = self.vendors.get_mut(&product.vendor_id) {
            vendor.product_ids.retain(|id| *id != product_id);
        }
        Ok(product)
    }

    /// Remove a vendor and every product it owns. The paired user is kept.
    pub fn remove_vendor(&mut self, vendor_id: VendorId) -> MarketResult<(Vendor, Vec<Product>)> {
        let vendor = self
            .vendors
            .remove(&vendor_id)
            .ok_or_else(|| MarketError::not_found(EntityKind::Vendor, vendor_id))?;
        let products = vendor
            .product_ids
            .iter()
            .filter_map(|id| self.products.remove(id))
            .collect();
        Ok((vendor, products))
    }

    pub fn record_order(&mut self, vendor_id: VendorId, order_id: OrderId) -> MarketResult<()> {
        self.vendor_mut(vendor_id)?.order_ids.push(order_id);
        Ok(())
    }

    /// List vendors matching `filter`.
    ///
    /// With a radius, only discoverable vendors within range are returned,
    /// nearest first. Otherwise vendors are sorted by name.
    pub fn browse(&self, filter: &BrowseFilter) -> MarketResult<Vec<VendorListing>> {
        let category = filter.category.as_deref().map(normalize_category);
        let matches_category =
            |v: &Vendor| category.as_deref().map_or(true, |c| v.category.eq_ignore_ascii_case(c));

        let mut listings: Vec<VendorListing> = match filter.near {
            Some((origin, radius_km)) => {
                if !origin.is_valid() {
                    return Err(MarketError::LocationUnavailable);
                }
                if !radius_km.is_finite() || radius_km <= 0.0 {
                    return Err(MarketError::invalid_input("radius", "must be a positive number of km"));
                }
                self.vendors
                    .values()
                    .filter(|v| v.is_discoverable() && matches_category(v))
                    .filter_map(|v| {
                        let location = v.location.filter(Coordinate::is_valid)?;
                        let distance = geo::distance_km(&origin, &location);
                        (distance <= radius_km).then(|| VendorListing {
                            vendor: v.clone(),
                            distance_km: Some(distance),
                        })
                    })
                    .collect()
            }
            None => self
                .vendors
                .values()
                .filter(|v| matches_category(v))
                .map(|v| VendorListing {
                    vendor: v.clone(),
                    distance_km: None,
                })
                .collect(),
        };

        listings.sort_by(|a, b| match (a.distance_km, b.distance_km) {
            (Some(da), Some(db)) => da.total_cmp(&db),
            _ => a.vendor.name.cmp(&b.vendor.name),
        });
        Ok(listings)
    }

    fn vendor_mut(&mut self, vendor_id: VendorId) -> MarketResult<&mut Vendor> {
        self.vendors
            .get_mut(&vendor_id)
            .ok_or_else(|| MarketError::not_found(EntityKind::Vendor, vendor_id))
    }
}

fn normalize_phone(phone: &str) -> String {
    phone.split_whitespace().collect()
}

fn normalize_category(category: &str) -> String {
    let category = category.trim();
    if category.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        category.to_lowercase()
    }
}

/// Missing prices become zero; negative prices are rejected. Stored to the cent.
fn coerce_price(price: Option<Decimal>) -> MarketResult<Decimal> {
    match price {
        None => Ok(Decimal::ZERO),
        Some(p) if p.is_sign_negative() && !p.is_zero() => {
            Err(MarketError::invalid_input("price", "must not be negative"))
        }
        Some(p) => Ok(p.round_dp(2)),
    }
}
