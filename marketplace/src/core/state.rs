//! Aggregate marketplace state
//!
//! `MarketState` is the single application context: catalog, orders,
//! fulfilment schedule, proximity cooldowns, favorites, activity feed, the
//! session cart and the active user. Every operation runs to completion on
//! `&mut self` and reports what the outside world should see through
//! [`Effects`], which the engine dispatches after the mutation is done.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use shared::logging::Component;
use shared::{
    market_debug, market_info, market_warn, ActivityEntry, ActivityKind, CartLine, Coordinate, Notification,
    NotificationMode, Order, OrderId, OrderStatus, ProductId, RenderTarget, Role, Settings, StateSnapshot, User,
    UserId, Vendor, VendorId, SNAPSHOT_SCHEMA_VERSION,
};

use super::activity::{ActivityLog, DEFAULT_ACTIVITY_CAPACITY};
use super::cart::{Cart, CartSummary};
use super::catalog::{BrowseFilter, Catalog, ProductDraft, VendorDraft, VendorListing};
use super::favorites::Favorites;
use super::orders::{Actor, CheckoutRequest, OrderBook};
use super::proximity::{ProximityMonitor, DEFAULT_COOLDOWN_SECS};
use super::schedule::{FulfilmentSchedule, DEFAULT_GRACE_MS};
use crate::error::{EntityKind, MarketError, MarketResult};

/// Tunables that are not user-editable settings
#[derive(Debug, Clone, Copy)]
pub struct StateOptions {
    pub schedule_grace: Duration,
    pub notify_cooldown: Duration,
    pub activity_capacity: usize,
    /// Replaces a saved radius that is not a positive number of km
    pub fallback_radius_km: f64,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            schedule_grace: Duration::milliseconds(DEFAULT_GRACE_MS),
            notify_cooldown: Duration::seconds(DEFAULT_COOLDOWN_SECS),
            activity_capacity: DEFAULT_ACTIVITY_CAPACITY,
            fallback_radius_km: Settings::default().proximity_radius_km,
        }
    }
}

/// Outbox filled by state operations
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Effects {
    /// Notifications routed through the configured channel
    pub notifications: Vec<Notification>,
    /// Plain informational toasts for whoever is at the screen
    pub toasts: Vec<String>,
    pub renders: Vec<RenderTarget>,
    /// State changed and should be saved
    pub dirty: bool,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn toast(&mut self, text: impl Into<String>) {
        self.toasts.push(text.into());
    }

    pub fn render(&mut self, target: RenderTarget) {
        if !self.renders.contains(&target) {
            self.renders.push(target);
        }
    }

    pub fn touch(&mut self) {
        self.dirty = true;
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty() && self.toasts.is_empty() && self.renders.is_empty() && !self.dirty
    }
}

#[derive(Debug)]
pub struct MarketState {
    catalog: Catalog,
    orders: OrderBook,
    schedule: FulfilmentSchedule,
    proximity: ProximityMonitor,
    favorites: Favorites,
    activity: ActivityLog,
    cart: Cart,
    session: Option<UserId>,
    settings: Settings,
}

impl MarketState {
    pub fn new(settings: Settings, options: StateOptions) -> Self {
        Self {
            catalog: Catalog::new(),
            orders: OrderBook::new(),
            schedule: FulfilmentSchedule::new(options.schedule_grace),
            proximity: ProximityMonitor::new(options.notify_cooldown),
            favorites: Favorites::default(),
            activity: ActivityLog::new(options.activity_capacity),
            cart: Cart::new(),
            session: None,
            settings,
        }
    }

    /// Restore from a persisted snapshot and rebuild the fulfilment schedule.
    ///
    /// Pending orders that were never processed become due again: immediately
    /// if their time has passed, otherwise at their requested time.
    pub fn from_snapshot(snapshot: StateSnapshot, options: StateOptions, now: DateTime<Utc>) -> Self {
        if snapshot.is_from_newer_schema() {
            market_warn!(
                Component::Persistence,
                "Snapshot schema {} is newer than {}; unknown fields were ignored",
                snapshot.schema_version,
                SNAPSHOT_SCHEMA_VERSION
            );
        }
        let mut settings = snapshot.settings;
        if !is_valid_radius(settings.proximity_radius_km) {
            market_warn!(
                Component::Persistence,
                "Saved proximity radius {} km is invalid, using {} km",
                settings.proximity_radius_km,
                options.fallback_radius_km
            );
            settings.proximity_radius_km = options.fallback_radius_km;
        }
        let orders = OrderBook::from_orders(snapshot.orders);
        let schedule = FulfilmentSchedule::rebuild(options.schedule_grace, orders.awaiting_processing(), now);
        let state = Self {
            catalog: Catalog::from_parts(snapshot.users, snapshot.vendors, snapshot.products),
            orders,
            schedule,
            proximity: ProximityMonitor::new(options.notify_cooldown),
            favorites: Favorites::from_map(snapshot.favorites),
            activity: ActivityLog::from_entries(snapshot.recent_activity, options.activity_capacity),
            cart: Cart::new(),
            session: None,
            settings,
        };
        market_info!(
            Component::Persistence,
            "Restored {} vendor(s), {} order(s), {} awaiting processing",
            state.catalog.vendors().count(),
            state.orders.len(),
            state.schedule.len()
        );
        state
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let mut orders: Vec<Order> = self.orders.iter().cloned().collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        StateSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            users: sorted_by_id(self.catalog.users().cloned().collect(), |u| u.id),
            vendors: sorted_by_id(self.catalog.vendors().cloned().collect(), |v| v.id),
            products: sorted_by_id(self.catalog.products().cloned().collect(), |p| p.id),
            orders,
            favorites: self.favorites.to_map(),
            recent_activity: self.activity.to_vec(),
            settings: self.settings,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn orders(&self) -> &OrderBook {
        &self.orders
    }

    pub fn schedule(&self) -> &FulfilmentSchedule {
        &self.schedule
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn activity(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.activity.entries()
    }

    // ---- session ----

    pub fn current_user(&self) -> Option<&User> {
        self.session.and_then(|id| self.catalog.user(id))
    }

    fn require_user(&self) -> MarketResult<&User> {
        self.current_user().ok_or(MarketError::NotLoggedIn)
    }

    fn require_customer(&self) -> MarketResult<UserId> {
        match self.current_user() {
            Some(user) if user.role == Role::Customer => Ok(user.id),
            _ => Err(MarketError::NotLoggedIn),
        }
    }

    /// Log in by phone, registering a new user on first sight
    pub fn login(&mut self, name: &str, phone: &str, role: Role, now: DateTime<Utc>, fx: &mut Effects) -> MarketResult<User> {
        let (user, created) = self.catalog.register_or_find_user(name, phone, role)?;
        if self.session != Some(user.id) {
            self.cart.clear();
        }
        self.session = Some(user.id);

        let verb = if created { "Registered" } else { "Welcome back" };
        self.activity
            .record(ActivityKind::Login, format!("{} logged in as {}", user.name, user.role), now);
        fx.toast(format!("{verb}, {}", user.name));
        fx.render(RenderTarget::Vendors);
        fx.render(RenderTarget::Cart);
        fx.render(RenderTarget::Orders);
        fx.touch();
        Ok(user)
    }

    pub fn logout(&mut self, fx: &mut Effects) {
        if self.session.take().is_some() {
            self.cart.clear();
            fx.toast("Logged out");
            fx.render(RenderTarget::Cart);
            fx.render(RenderTarget::Orders);
        }
    }

    // ---- settings ----

    pub fn update_settings(
        &mut self,
        radius_km: Option<f64>,
        mode: Option<NotificationMode>,
        fx: &mut Effects,
    ) -> MarketResult<Settings> {
        if let Some(radius_km) = radius_km {
            if !is_valid_radius(radius_km) {
                return Err(MarketError::invalid_input("radius", "must be a positive number of km"));
            }
            self.settings.proximity_radius_km = radius_km;
        }
        if let Some(mode) = mode {
            self.settings.notification_mode = mode;
        }
        fx.toast(format!(
            "Settings saved: radius {} km, notifications via {}",
            self.settings.proximity_radius_km, self.settings.notification_mode
        ));
        fx.touch();
        Ok(self.settings)
    }

    // ---- vendors and products ----

    pub fn create_vendor(&mut self, draft: VendorDraft, now: DateTime<Utc>, fx: &mut Effects) -> MarketResult<Vendor> {
        let vendor = self.catalog.create_vendor(draft)?;
        self.activity
            .record(ActivityKind::VendorCreated, format!("Vendor {} opened", vendor.name), now);
        fx.toast(format!("Vendor {} created", vendor.name));
        fx.render(RenderTarget::Vendors);
        fx.touch();
        Ok(vendor)
    }

    /// Set the location of a vendor user's profile, creating the profile on first use
    pub fn set_vendor_location(
        &mut self,
        user_id: UserId,
        location: Coordinate,
        now: DateTime<Utc>,
        fx: &mut Effects,
    ) -> MarketResult<Vendor> {
        if !location.is_valid() {
            return Err(MarketError::LocationUnavailable);
        }
        let (vendor_id, created) = self.catalog.ensure_vendor_for_user(user_id)?;
        let vendor = self.catalog.set_vendor_location(vendor_id, location)?.clone();
        if created {
            self.activity
                .record(ActivityKind::VendorCreated, format!("Vendor {} opened", vendor.name), now);
        }
        fx.toast(format!("{} is now at {}", vendor.name, location));
        fx.render(RenderTarget::Vendors);
        fx.touch();
        Ok(vendor)
    }

    /// Location update for whoever is logged in
    pub fn set_my_location(&mut self, location: Coordinate, now: DateTime<Utc>, fx: &mut Effects) -> MarketResult<Vendor> {
        let user_id = self.require_user()?.id;
        self.set_vendor_location(user_id, location, now, fx)
    }

    pub fn set_vendor_active(&mut self, vendor_id: VendorId, active: bool, fx: &mut Effects) -> MarketResult<Vendor> {
        let vendor = self.catalog.set_vendor_active(vendor_id, active)?.clone();
        let state = if active { "open" } else { "closed" };
        fx.toast(format!("{} is {}", vendor.name, state));
        fx.render(RenderTarget::Vendors);
        fx.touch();
        Ok(vendor)
    }

    pub fn add_product(
        &mut self,
        vendor_id: VendorId,
        draft: ProductDraft,
        now: DateTime<Utc>,
        fx: &mut Effects,
    ) -> MarketResult<shared::Product> {
        let product = self.catalog.add_product(vendor_id, draft)?;
        let vendor_name = self
            .catalog
            .vendor(vendor_id)
            .map(|v| v.name.clone())
            .unwrap_or_default();
        self.activity.record(
            ActivityKind::ProductAdded,
            format!("{} added {} at {}", vendor_name, product.name, product.price),
            now,
        );
        fx.toast(format!("Added {}", product.name));
        fx.render(RenderTarget::Vendors);
        fx.touch();
        Ok(product)
    }

    pub fn remove_product(&mut self, product_id: ProductId, fx: &mut Effects) -> MarketResult<shared::Product> {
        let product = self.catalog.remove_product(product_id)?;
        fx.toast(format!("Removed {}", product.name));
        fx.render(RenderTarget::Vendors);
        fx.render(RenderTarget::Cart);
        fx.touch();
        Ok(product)
    }

    /// Remove a vendor with its products and favorites, cancelling its open orders
    pub fn remove_vendor(&mut self, vendor_id: VendorId, now: DateTime<Utc>, fx: &mut Effects) -> MarketResult<Vendor> {
        let (vendor, products) = self.catalog.remove_vendor(vendor_id)?;
        self.favorites.remove_vendor(vendor_id);
        self.proximity.forget_vendor(vendor_id);
        self.cart.prune(&self.catalog);

        for order_id in self.orders.cancel_open_for_vendor(vendor_id) {
            self.schedule.cancel(order_id);
            if let Some(order) = self.orders.get(order_id) {
                fx.notify(Notification::to(
                    order.customer_id,
                    "Order cancelled",
                    format!("{} closed and order {} was cancelled", vendor.name, order_id.short()),
                ));
            }
            self.activity.record(
                ActivityKind::OrderStatusChanged,
                format!("Order {} cancelled: vendor removed", order_id.short()),
                now,
            );
        }

        market_info!(Component::Catalog, "Removed vendor {} and {} product(s)", vendor.id, products.len());
        fx.toast(format!("Removed {}", vendor.name));
        fx.render(RenderTarget::Vendors);
        fx.render(RenderTarget::Cart);
        fx.render(RenderTarget::Orders);
        fx.touch();
        Ok(vendor)
    }

    pub fn browse(&self, filter: &BrowseFilter) -> MarketResult<Vec<VendorListing>> {
        self.catalog.browse(filter)
    }

    // ---- cart ----

    pub fn add_to_cart(&mut self, product_id: ProductId, quantity: u32, fx: &mut Effects) -> MarketResult<CartLine> {
        let line = self.cart.add(&self.catalog, product_id, quantity)?.clone();
        fx.render(RenderTarget::Cart);
        Ok(line)
    }

    pub fn remove_from_cart(&mut self, product_id: ProductId, fx: &mut Effects) -> bool {
        let removed = self.cart.remove(product_id);
        if removed {
            fx.render(RenderTarget::Cart);
        }
        removed
    }

    pub fn clear_cart(&mut self, fx: &mut Effects) {
        self.cart.clear();
        fx.render(RenderTarget::Cart);
    }

    pub fn cart_summary(&mut self) -> CartSummary {
        self.cart.summary(&self.catalog)
    }

    // ---- orders ----

    /// Check out the cart for the active customer, then process anything already due
    pub fn checkout(&mut self, request: CheckoutRequest, now: DateTime<Utc>, fx: &mut Effects) -> MarketResult<Vec<Order>> {
        let customer_id = self.require_customer().ok();
        let orders = self
            .orders
            .checkout(&mut self.cart, &mut self.catalog, customer_id, &request, now)?;

        for order in &orders {
            let fire_at = self.schedule.schedule(order, now);
            let vendor_name = self.vendor_name(order.vendor_id);
            self.activity.record(
                ActivityKind::OrderPlaced,
                format!("Order {} placed with {}", order.id.short(), vendor_name),
                now,
            );
            if fire_at > now {
                fx.toast(format!(
                    "Order {} with {} scheduled for {}",
                    order.id.short(),
                    vendor_name,
                    fire_at.format("%Y-%m-%d %H:%M")
                ));
            }
            if let Some(vendor) = self.catalog.vendor(order.vendor_id) {
                fx.notify(Notification::to(
                    vendor.user_id,
                    "New order",
                    format!("Order {} from {} ({} item(s))", order.id.short(), order.contact.name, order.items.len()),
                ));
            }
        }

        fx.toast(format!("Placed {} order(s)", orders.len()));
        fx.render(RenderTarget::Cart);
        fx.render(RenderTarget::Orders);
        fx.touch();

        self.process_due(now, fx);
        Ok(orders)
    }

    fn actor(&self) -> MarketResult<Actor> {
        let user = self.require_user()?;
        match user.role {
            Role::Customer => Ok(Actor::Customer(user.id)),
            Role::Vendor => self
                .catalog
                .vendor_for_user(user.id)
                .map(|v| Actor::VendorOperator(v.id))
                .ok_or_else(|| MarketError::not_permitted("set up your vendor profile first")),
        }
    }

    /// Move an order on behalf of the active user
    pub fn transition_order(
        &mut self,
        order_id: OrderId,
        to: OrderStatus,
        now: DateTime<Utc>,
        fx: &mut Effects,
    ) -> MarketResult<Order> {
        let actor = self.actor()?;
        let order = self.orders.transition(order_id, to, actor)?;
        if to == OrderStatus::Cancelled {
            self.schedule.cancel(order_id);
        }

        let vendor_name = self.vendor_name(order.vendor_id);
        self.activity.record(
            ActivityKind::OrderStatusChanged,
            format!("Order {} with {} is {}", order.id.short(), vendor_name, to),
            now,
        );
        let counterpart = match actor {
            Actor::Customer(_) => self.catalog.vendor(order.vendor_id).map(|v| v.user_id),
            Actor::VendorOperator(_) => Some(order.customer_id),
        };
        if let Some(recipient) = counterpart {
            fx.notify(Notification::to(
                recipient,
                format!("Order {to}"),
                format!("Order {} with {} is now {}", order.id.short(), vendor_name, to),
            ));
        }
        fx.render(RenderTarget::Orders);
        fx.touch();
        Ok(order)
    }

    /// Process every scheduled order that is due. Returns how many were processed.
    ///
    /// An order that stopped being pending while it waited is skipped.
    pub fn process_due(&mut self, now: DateTime<Utc>, fx: &mut Effects) -> usize {
        let mut processed = 0;
        for order_id in self.schedule.take_due(now) {
            let Some(order) = self.orders.get(order_id) else {
                market_debug!(Component::Schedule, "Order {} vanished before processing", order_id);
                continue;
            };
            if order.status != OrderStatus::Pending || order.notified_at.is_some() {
                market_debug!(Component::Schedule, "Skipping order {} ({})", order_id, order.status);
                continue;
            }

            let customer_id = order.customer_id;
            let vendor = self.catalog.vendor(order.vendor_id);
            let vendor_name = vendor.map(|v| v.name.clone()).unwrap_or_else(|| "a vendor".to_string());
            let operator = vendor.map(|v| v.user_id);
            let short = order_id.short();
            let contact = order.contact.name.clone();

            if let Err(e) = self.orders.mark_notified(order_id, now) {
                market_warn!(Component::Schedule, "Could not mark order {} processed: {}", order_id, e);
                continue;
            }
            if let Some(operator) = operator {
                fx.notify(Notification::to(
                    operator,
                    "Order ready",
                    format!("Order {short} for {contact} is ready for attention"),
                ));
            }
            fx.notify(Notification::to(
                customer_id,
                "Order ready",
                format!("Your order {short} with {vendor_name} is being prepared"),
            ));
            self.activity
                .record(ActivityKind::OrderReady, format!("Order {short} with {vendor_name} is ready"), now);
            processed += 1;
        }

        if processed > 0 {
            market_info!(Component::Schedule, "Processed {} due order(s)", processed);
            fx.render(RenderTarget::Orders);
            fx.touch();
        }
        processed
    }

    pub fn next_due_at(&self) -> Option<DateTime<Utc>> {
        self.schedule.next_fire_at()
    }

    /// Orders visible to the active user, newest first
    pub fn my_orders(&self) -> MarketResult<Vec<&Order>> {
        match self.actor()? {
            Actor::Customer(user_id) => Ok(self.orders.for_customer(user_id)),
            Actor::VendorOperator(vendor_id) => Ok(self.orders.for_vendor(vendor_id)),
        }
    }

    // ---- proximity ----

    /// The customer a proximity scan would run for, if any
    pub fn scan_target(&self) -> Option<UserId> {
        self.current_user()
            .filter(|u| u.role == Role::Customer)
            .map(|u| u.id)
    }

    /// One proximity scan for the active customer. Returns how many vendors were announced.
    pub fn proximity_scan(&mut self, location: Option<Coordinate>, now: DateTime<Utc>, fx: &mut Effects) -> MarketResult<usize> {
        let (customer_id, location) = match ProximityMonitor::precheck(self.current_user(), location) {
            Ok(target) => target,
            Err(skip) => {
                market_debug!(Component::Proximity, "Scan skipped: {:?}", skip);
                return Ok(0);
            }
        };

        let radius_km = self.settings.proximity_radius_km;
        let hits = self.proximity.scan(&self.catalog, customer_id, location, radius_km, now)?;
        for hit in &hits {
            fx.notify(Notification::to(
                customer_id,
                "Vendor nearby",
                format!("{} is {:.2} km away", hit.vendor_name, hit.distance_km),
            ));
            self.activity.record(
                ActivityKind::VendorNearby,
                format!("{} came within {:.2} km", hit.vendor_name, hit.distance_km),
                now,
            );
        }
        if !hits.is_empty() {
            fx.touch();
        }
        Ok(hits.len())
    }

    // ---- favorites ----

    pub fn toggle_favorite(&mut self, vendor_id: VendorId, fx: &mut Effects) -> MarketResult<bool> {
        let user_id = self.require_user()?.id;
        let now_favorite = self.favorites.toggle(&self.catalog, user_id, vendor_id)?;
        let name = self.vendor_name(vendor_id);
        fx.toast(if now_favorite {
            format!("Saved {name} to favorites")
        } else {
            format!("Removed {name} from favorites")
        });
        fx.render(RenderTarget::Vendors);
        fx.touch();
        Ok(now_favorite)
    }

    pub fn favorite_vendors(&self) -> MarketResult<Vec<&Vendor>> {
        let user_id = self.require_user()?.id;
        Ok(self
            .favorites
            .vendors_of(user_id)
            .filter_map(|id| self.catalog.vendor(id))
            .collect())
    }

    // ---- reference resolution ----

    /// Resolve a full id or unique id prefix
    pub fn resolve_vendor(&self, reference: &str) -> MarketResult<VendorId> {
        resolve_prefix(reference, EntityKind::Vendor, self.catalog.vendors().map(|v| v.id))
    }

    pub fn resolve_product(&self, reference: &str) -> MarketResult<ProductId> {
        resolve_prefix(reference, EntityKind::Product, self.catalog.products().map(|p| p.id))
    }

    pub fn resolve_order(&self, reference: &str) -> MarketResult<OrderId> {
        resolve_prefix(reference, EntityKind::Order, self.orders.iter().map(|o| o.id))
    }

    /// Resolve against products in the cart, which may already be gone from the catalog
    pub fn resolve_cart_line(&self, reference: &str) -> MarketResult<ProductId> {
        resolve_prefix(reference, EntityKind::Product, self.cart.lines().iter().map(|l| l.product_id))
    }

    /// Vendor profile of the active user
    pub fn my_vendor(&self) -> MarketResult<VendorId> {
        let user = self.require_user()?;
        self.catalog
            .vendor_for_user(user.id)
            .map(|v| v.id)
            .ok_or_else(|| MarketError::not_permitted("no vendor profile for this account"))
    }

    fn vendor_name(&self, vendor_id: VendorId) -> String {
        self.catalog
            .vendor(vendor_id)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| vendor_id.short())
    }
}

fn is_valid_radius(radius_km: f64) -> bool {
    radius_km.is_finite() && radius_km > 0.0
}

fn sorted_by_id<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    items
}

fn resolve_prefix<T: Copy + fmt::Display>(
    reference: &str,
    kind: EntityKind,
    candidates: impl Iterator<Item = T>,
) -> MarketResult<T> {
    let needle = reference.trim().to_lowercase();
    if needle.is_empty() {
        return Err(MarketError::invalid_input(kind.to_string(), "id must not be empty"));
    }
    let mut matches = candidates.filter(|id| id.to_string().starts_with(&needle));
    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id),
        (None, _) => Err(MarketError::not_found(kind, reference.trim())),
        (Some(_), Some(_)) => Err(MarketError::invalid_input(kind.to_string(), format!("'{needle}' is ambiguous"))),
    }
}
