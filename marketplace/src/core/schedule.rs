//! Durable fulfilment schedule
//!
//! Holds one `(fire_at, order)` entry per pending order that has not been
//! processed yet. The schedule itself is never persisted: it is rebuilt from
//! the order records on startup, and processed orders carry `notified_at`, so
//! a restart does not fire them again.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use shared::logging::Component;
use shared::{market_debug, Order, OrderId};

/// Buffer in milliseconds added to future fire times so they never fire marginally early
pub const DEFAULT_GRACE_MS: i64 = 500;

#[derive(Debug, Clone)]
pub struct FulfilmentSchedule {
    grace: Duration,
    entries: BTreeSet<(DateTime<Utc>, OrderId)>,
    by_order: HashMap<OrderId, DateTime<Utc>>,
}

impl Default for FulfilmentSchedule {
    fn default() -> Self {
        Self::new(Duration::milliseconds(DEFAULT_GRACE_MS))
    }
}

impl FulfilmentSchedule {
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            entries: BTreeSet::new(),
            by_order: HashMap::new(),
        }
    }

    /// Rebuild from the orders still awaiting processing, see [`crate::core::OrderBook::awaiting_processing`]
    pub fn rebuild<'a>(grace: Duration, orders: impl IntoIterator<Item = &'a Order>, now: DateTime<Utc>) -> Self {
        let mut schedule = Self::new(grace);
        for order in orders {
            schedule.schedule(order, now);
        }
        market_debug!(Component::Schedule, "Rebuilt schedule with {} entries", schedule.len());
        schedule
    }

    /// Fire time for an order created or reloaded at `now`.
    ///
    /// Orders without a requested time, or whose time has already passed, are
    /// due immediately.
    pub fn fire_time(&self, scheduled_for: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
        match scheduled_for {
            Some(at) if at > now => at.checked_add_signed(self.grace).unwrap_or(at),
            _ => now,
        }
    }

    /// Add or replace the entry for `order`. Returns when it will fire.
    pub fn schedule(&mut self, order: &Order, now: DateTime<Utc>) -> DateTime<Utc> {
        self.cancel(order.id);
        let fire_at = self.fire_time(order.scheduled_for, now);
        self.entries.insert((fire_at, order.id));
        self.by_order.insert(order.id, fire_at);
        fire_at
    }

    /// Drop the entry for an order. Returns `true` if there was one.
    pub fn cancel(&mut self, order_id: OrderId) -> bool {
        match self.by_order.remove(&order_id) {
            Some(fire_at) => self.entries.remove(&(fire_at, order_id)),
            None => false,
        }
    }

    /// Remove and return every entry due at or before `now`, earliest first
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<OrderId> {
        let mut due = Vec::new();
        while let Some(&(fire_at, order_id)) = self.entries.first() {
            if fire_at > now {
                break;
            }
            self.entries.pop_first();
            self.by_order.remove(&order_id);
            due.push(order_id);
        }
        due
    }

    pub fn next_fire_at(&self) -> Option<DateTime<Utc>> {
        self.entries.first().map(|(at, _)| *at)
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.by_order.contains_key(&order_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::orders::OrderBook;
    use shared::{Contact, OrderStatus, UserId, VendorId};

    fn grace() -> Duration {
        Duration::milliseconds(DEFAULT_GRACE_MS)
    }

    fn order(scheduled_for: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Order {
        Order {
            id: OrderId::new(),
            customer_id: UserId::new(),
            vendor_id: VendorId::new(),
            items: vec![],
            scheduled_for,
            status: OrderStatus::Pending,
            created_at: now,
            contact: Contact::default(),
            notified_at: None,
        }
    }

    #[test]
    fn immediate_and_past_orders_are_due_now() {
        let now = Utc::now();
        let mut schedule = FulfilmentSchedule::default();
        let asap = order(None, now);
        let past = order(Some(now - Duration::minutes(5)), now);
        let present = order(Some(now), now);

        assert_eq!(schedule.schedule(&asap, now), now);
        assert_eq!(schedule.schedule(&past, now), now);
        assert_eq!(schedule.schedule(&present, now), now);
        assert_eq!(schedule.take_due(now).len(), 3);
        assert!(schedule.is_empty());
    }

    #[test]
    fn future_orders_fire_after_the_grace_buffer() {
        let now = Utc::now();
        let mut schedule = FulfilmentSchedule::default();
        let at = now + Duration::minutes(10);
        let deferred = order(Some(at), now);

        assert_eq!(schedule.schedule(&deferred, now), at + grace());
        assert!(schedule.take_due(at).is_empty());
        assert_eq!(schedule.take_due(at + grace()), vec![deferred.id]);
    }

    #[test]
    fn due_entries_come_out_earliest_first() {
        let now = Utc::now();
        let mut schedule = FulfilmentSchedule::new(Duration::zero());
        let late = order(Some(now + Duration::seconds(20)), now);
        let early = order(Some(now + Duration::seconds(10)), now);
        schedule.schedule(&late, now);
        schedule.schedule(&early, now);

        assert_eq!(schedule.next_fire_at(), Some(now + Duration::seconds(10)));
        assert_eq!(schedule.take_due(now + Duration::minutes(1)), vec![early.id, late.id]);
    }

    #[test]
    fn cancel_removes_the_entry() {
        let now = Utc::now();
        let mut schedule = FulfilmentSchedule::default();
        let deferred = order(Some(now + Duration::minutes(10)), now);
        schedule.schedule(&deferred, now);

        assert!(schedule.cancel(deferred.id));
        assert!(!schedule.cancel(deferred.id));
        assert!(schedule.take_due(now + Duration::hours(1)).is_empty());
    }

    #[test]
    fn rescheduling_replaces_the_previous_entry() {
        let now = Utc::now();
        let mut schedule = FulfilmentSchedule::default();
        let mut deferred = order(Some(now + Duration::minutes(10)), now);
        schedule.schedule(&deferred, now);
        deferred.scheduled_for = None;
        schedule.schedule(&deferred, now);

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.take_due(now), vec![deferred.id]);
    }

    #[test]
    fn rebuild_skips_processed_and_non_pending_orders() {
        let now = Utc::now();
        let waiting = order(Some(now + Duration::minutes(3)), now);
        let mut notified = order(None, now);
        notified.notified_at = Some(now);
        let mut accepted = order(None, now);
        accepted.status = OrderStatus::Accepted;

        let book = OrderBook::from_orders(vec![waiting.clone(), notified, accepted]);

        let schedule = FulfilmentSchedule::rebuild(grace(), book.awaiting_processing(), now);
        assert_eq!(schedule.len(), 1);
        assert!(schedule.contains(waiting.id));
    }

    #[test]
    fn grace_saturates_at_the_end_of_the_calendar() {
        let now = Utc::now();
        let schedule = FulfilmentSchedule::default();
        let at = DateTime::<Utc>::MAX_UTC;

        assert_eq!(schedule.fire_time(Some(at), now), at);
    }
}
