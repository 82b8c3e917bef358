//! Order engine: checkout split and the order status state machine
//!
//! # State diagram
//!
//! ```text
//!   checkout ──► Pending ──accept──► Accepted ──complete──► Completed (term.)
//!                   │                    │
//!                   └──────cancel────────┴──────────────► Cancelled (term.)
//! ```
//!
//! Every status change is checked against [`ALLOWED_TRANSITIONS`] before the
//! order is touched; a rejected transition leaves the order unchanged.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use shared::logging::Component;
use shared::{
    market_debug, CartLine, Contact, Order, OrderId, OrderItem, OrderStatus, UserId, VendorId,
};

use crate::core::cart::Cart;
use crate::core::catalog::Catalog;
use crate::error::{EntityKind, MarketError, MarketResult};

/// The only legal `(from, to)` status pairs
pub const ALLOWED_TRANSITIONS: [(OrderStatus, OrderStatus); 4] = [
    (OrderStatus::Pending, OrderStatus::Accepted),
    (OrderStatus::Accepted, OrderStatus::Completed),
    (OrderStatus::Pending, OrderStatus::Cancelled),
    (OrderStatus::Accepted, OrderStatus::Cancelled),
];

pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> MarketResult<()> {
    if ALLOWED_TRANSITIONS.contains(&(from, to)) {
        Ok(())
    } else {
        Err(MarketError::InvalidTransition { from, to })
    }
}

/// Who is asking for a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Customer(UserId),
    VendorOperator(VendorId),
}

/// Checkout input besides the cart itself
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    pub contact: Contact,
    /// Requested fulfilment time; `None` for as soon as possible
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// Group cart lines by vendor into one pending order per vendor.
///
/// Vendors appear in the order their first line appears in the cart, and
/// items keep their cart order within a vendor.
pub fn split_by_vendor(
    lines: &[CartLine],
    customer_id: UserId,
    request: &CheckoutRequest,
    now: DateTime<Utc>,
) -> Vec<Order> {
    let mut orders: Vec<Order> = Vec::new();
    for line in lines {
        let item = OrderItem {
            product_id: line.product_id,
            quantity: line.quantity,
        };
        match orders.iter_mut().find(|o| o.vendor_id == line.vendor_id) {
            Some(order) => order.items.push(item),
            None => orders.push(Order {
                id: OrderId::new(),
                customer_id,
                vendor_id: line.vendor_id,
                items: vec![item],
                scheduled_for: request.scheduled_for,
                status: OrderStatus::Pending,
                created_at: now,
                contact: request.contact.clone(),
                notified_at: None,
            }),
        }
    }
    orders
}

#[derive(Debug, Default)]
pub struct OrderBook {
    orders: HashMap<OrderId, Order>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_orders(orders: Vec<Order>) -> Self {
        Self {
            orders: orders.into_iter().map(|o| (o.id, o)).collect(),
        }
    }

    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Turn the cart into per-vendor orders and empty it.
    ///
    /// All checks run before anything is written, so a failure leaves the
    /// cart, catalog and order book exactly as they were.
    pub fn checkout(
        &mut self,
        cart: &mut Cart,
        catalog: &mut Catalog,
        customer_id: Option<UserId>,
        request: &CheckoutRequest,
        now: DateTime<Utc>,
    ) -> MarketResult<Vec<Order>> {
        let customer_id = customer_id.ok_or(MarketError::NotLoggedIn)?;
        cart.prune(catalog);
        if cart.is_empty() {
            return Err(MarketError::EmptyCart);
        }
        for line in cart.lines() {
            let owner = catalog.product(line.product_id).map(|p| p.vendor_id);
            if owner != Some(line.vendor_id) || catalog.vendor(line.vendor_id).is_none() {
                return Err(MarketError::not_found(EntityKind::Product, line.product_id));
            }
        }

        let orders = split_by_vendor(cart.lines(), customer_id, request, now);
        for order in &orders {
            catalog.record_order(order.vendor_id, order.id)?;
            self.orders.insert(order.id, order.clone());
        }
        cart.clear();

        market_debug!(Component::Orders, "Checkout by {} produced {} order(s)", customer_id, orders.len());
        Ok(orders)
    }

    /// Move an order to `to` on behalf of `actor`.
    ///
    /// Accepting and completing are for the vendor's operator; either party
    /// may cancel.
    pub fn transition(&mut self, order_id: OrderId, to: OrderStatus, actor: Actor) -> MarketResult<Order> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| MarketError::not_found(EntityKind::Order, order_id))?;

        let permitted = match (actor, to) {
            (Actor::VendorOperator(vendor_id), _) => vendor_id == order.vendor_id,
            (Actor::Customer(user_id), OrderStatus::Cancelled) => user_id == order.customer_id,
            (Actor::Customer(_), _) => false,
        };
        if !permitted {
            return Err(MarketError::not_permitted(format!("cannot mark order {} as {}", order_id, to)));
        }

        validate_transition(order.status, to)?;
        let from = order.status;
        order.status = to;
        market_debug!(Component::Orders, "Order {} {} -> {}", order_id, from, to);
        Ok(order.clone())
    }

    /// Record that the ready notification went out
    pub fn mark_notified(&mut self, order_id: OrderId, at: DateTime<Utc>) -> MarketResult<()> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| MarketError::not_found(EntityKind::Order, order_id))?;
        order.notified_at = Some(at);
        Ok(())
    }

    /// Orders still waiting for their ready notification
    pub fn awaiting_processing(&self) -> impl Iterator<Item = &Order> {
        self.orders
            .values()
            .filter(|o| o.status == OrderStatus::Pending && o.notified_at.is_none())
    }

    /// Cancel every open order of a vendor that is going away. Returns the ids touched.
    pub fn cancel_open_for_vendor(&mut self, vendor_id: VendorId) -> Vec<OrderId> {
        self.orders
            .values_mut()
            .filter(|o| o.vendor_id == vendor_id && !o.status.is_terminal())
            .map(|o| {
                o.status = OrderStatus::Cancelled;
                o.id
            })
            .collect()
    }

    pub fn for_vendor(&self, vendor_id: VendorId) -> Vec<&Order> {
        self.newest_first(|o| o.vendor_id == vendor_id)
    }

    pub fn for_customer(&self, customer_id: UserId) -> Vec<&Order> {
        self.newest_first(|o| o.customer_id == customer_id)
    }

    fn newest_first(&self, keep: impl Fn(&Order) -> bool) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self.orders.values().filter(|o| keep(o)).collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        orders
    }
}
