//! Marketplace engine
//!
//! Owns the application state behind a mutex and drives it from a single
//! `tokio::select!` loop: user commands, the proximity scan interval, the
//! fulfilment poll and the shutdown signal. Each trigger locks the state,
//! runs to completion, then dispatches the collected effects, so no two
//! mutations ever interleave.

use std::sync::Arc;

use shared::logging::{self, Component};
use shared::messages::notifications::{ALERT_TOAST_DURATION, TOAST_DURATION};
use shared::{
    market_debug, market_error, market_info, market_warn, ActivityEntry, CartLine, Contact, Order, OrderStatus,
    Product, RenderTarget, Settings, User, Vendor,
};
use tokio::sync::{mpsc, Mutex};
use tokio::time::interval;

use crate::commands::MarketCommand;
use crate::config::MarketConfig;
use crate::core::{BrowseFilter, CartSummary, CheckoutRequest, Effects, MarketState, VendorDraft, VendorListing};
use crate::demo;
use crate::dispatch::NotificationDispatcher;
use crate::error::{MarketError, MarketResult};
use crate::traits::{Clock, LocationProvider, Notifier, StateStore, View};

/// Result of a successfully executed command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Done,
    User(User),
    Vendor(Vendor),
    Product(Product),
    CartLine(CartLine),
    Cart { lines: Vec<CartLine>, summary: CartSummary },
    Placed(Vec<Order>),
    Order(Order),
    Orders(Vec<Order>),
    Listings(Vec<VendorListing>),
    Favorite(bool),
    Activity(Vec<ActivityEntry>),
    Settings(Settings),
}

impl Reply {
    /// Replies to show-style commands are rendered as views
    pub fn into_view(self) -> Option<View> {
        match self {
            Reply::Cart { lines, summary } => Some(View::Cart { lines, summary }),
            Reply::Orders(orders) => Some(View::Orders(orders)),
            Reply::Listings(listings) => Some(View::Vendors(listings)),
            Reply::Activity(entries) => Some(View::Activity(entries)),
            _ => None,
        }
    }
}

pub struct Marketplace<S, N, L, C>
where
    S: StateStore + 'static,
    N: Notifier + 'static,
    L: LocationProvider + 'static,
    C: Clock + 'static,
{
    state: Arc<Mutex<MarketState>>,
    config: MarketConfig,

    /// Injected collaborators
    store: S,
    notifier: N,
    location: L,
    clock: C,

    command_tx: mpsc::Sender<MarketCommand>,
    command_rx: mpsc::Receiver<MarketCommand>,

    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl<S, N, L, C> Marketplace<S, N, L, C>
where
    S: StateStore + 'static,
    N: Notifier + 'static,
    L: LocationProvider + 'static,
    C: Clock + 'static,
{
    pub fn new(config: MarketConfig, store: S, notifier: N, location: L, clock: C) -> Self {
        let state = MarketState::new(config.initial_settings(), config.state_options());
        let (command_tx, command_rx) = mpsc::channel(64);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        Self {
            state: Arc::new(Mutex::new(state)),
            config,
            store,
            notifier,
            location,
            clock,
            command_tx,
            command_rx,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Load the persisted snapshot, or start empty, and process anything already due.
    ///
    /// A snapshot that cannot be read is not fatal: the session starts empty
    /// and the user is warned.
    pub async fn initialize(&self) -> MarketResult<()> {
        self.config.validate()?;
        let now = self.clock.now();
        let options = self.config.state_options();

        let loaded = match self.store.load().await {
            Ok(Some(snapshot)) => Some(MarketState::from_snapshot(snapshot, options, now)),
            Ok(None) => {
                market_info!(Component::Persistence, "No saved state found, starting fresh");
                None
            }
            Err(e) => {
                logging::log_error(Component::Persistence, "Loading saved state", &e);
                self.alert(&format!("Saved data could not be loaded, starting fresh: {e}")).await;
                None
            }
        };

        let mut state = self.state.lock().await;
        if let Some(loaded) = loaded {
            *state = loaded;
        }
        let mut fx = Effects::new();
        state.process_due(now, &mut fx);
        self.dispatch(&mut state, fx).await;

        logging::log_success(Component::Engine, "Marketplace initialized");
        Ok(())
    }

    /// Seed the demo catalog unless vendors already exist. Returns how many vendors were added.
    pub async fn seed_demo(&self) -> MarketResult<usize> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        if state.catalog().vendors().next().is_some() {
            return Ok(0);
        }

        let mut fx = Effects::new();
        let mut seeded = 0;
        for (draft, products) in demo::demo_vendors()? {
            let vendor = state.create_vendor(draft, now, &mut fx)?;
            for product in products {
                state.add_product(vendor.id, product, now, &mut fx)?;
            }
            seeded += 1;
        }
        // Quiet seeding: save and re-render only
        fx.toasts.clear();
        self.dispatch(&mut state, fx).await;
        market_info!(Component::Catalog, "Seeded {} demo vendor(s)", seeded);
        Ok(seeded)
    }

    /// Run one command to completion and dispatch its effects
    pub async fn execute(&self, command: MarketCommand) -> MarketResult<Reply> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let mut fx = Effects::new();
        let reply = self.apply(&mut state, command, now, &mut fx).await;
        self.dispatch(&mut state, fx).await;
        reply
    }

    /// Action boundary: errors become toasts and never escape
    pub async fn handle_command(&self, command: MarketCommand) {
        market_debug!(Component::Engine, "Handling {:?}", command);
        match self.execute(command).await {
            Ok(reply) => {
                if let Some(view) = reply.into_view() {
                    if let Err(e) = self.notifier.render(view).await {
                        market_warn!(Component::Presentation, "Render failed: {}", e);
                    }
                }
            }
            Err(e) => {
                market_warn!(Component::Engine, "Command rejected: {}", e);
                self.alert(&e.to_string()).await;
            }
        }
    }

    async fn apply(
        &self,
        state: &mut MarketState,
        command: MarketCommand,
        now: chrono::DateTime<chrono::Utc>,
        fx: &mut Effects,
    ) -> MarketResult<Reply> {
        let reply = match command {
            MarketCommand::Login { name, phone, role } => Reply::User(state.login(&name, &phone, role, now, fx)?),
            MarketCommand::Logout => {
                state.logout(fx);
                Reply::Done
            }
            MarketCommand::CreateVendor {
                name,
                category,
                location,
                phone,
            } => {
                let draft = VendorDraft {
                    name,
                    category,
                    location,
                    active: true,
                    meta: None,
                    phone,
                };
                Reply::Vendor(state.create_vendor(draft, now, fx)?)
            }
            MarketCommand::SetVendorLocation { location } => Reply::Vendor(state.set_my_location(location, now, fx)?),
            MarketCommand::SetVendorActive { vendor, active } => {
                let vendor_id = state.resolve_vendor(&vendor)?;
                Reply::Vendor(state.set_vendor_active(vendor_id, active, fx)?)
            }
            MarketCommand::RemoveVendor { vendor } => {
                let vendor_id = state.resolve_vendor(&vendor)?;
                Reply::Vendor(state.remove_vendor(vendor_id, now, fx)?)
            }
            MarketCommand::AddProduct {
                vendor,
                name,
                price,
                description,
            } => {
                let vendor_id = match vendor {
                    Some(reference) => state.resolve_vendor(&reference)?,
                    None => state.my_vendor()?,
                };
                let draft = crate::core::ProductDraft {
                    name,
                    price,
                    description,
                    image: None,
                };
                Reply::Product(state.add_product(vendor_id, draft, now, fx)?)
            }
            MarketCommand::RemoveProduct { product } => {
                let product_id = state.resolve_product(&product)?;
                Reply::Product(state.remove_product(product_id, fx)?)
            }
            MarketCommand::Browse { category, radius_km } => {
                let near = match radius_km {
                    Some(radius_km) => {
                        let user_id = state.current_user().map(|u| u.id).ok_or(MarketError::NotLoggedIn)?;
                        let origin = self
                            .location
                            .current_location(user_id)
                            .await
                            .ok_or(MarketError::LocationUnavailable)?;
                        Some((origin, radius_km))
                    }
                    None => None,
                };
                Reply::Listings(state.browse(&BrowseFilter { category, near })?)
            }
            MarketCommand::AddToCart { product, quantity } => {
                let product_id = state.resolve_product(&product)?;
                Reply::CartLine(state.add_to_cart(product_id, quantity, fx)?)
            }
            MarketCommand::RemoveFromCart { product } => {
                let product_id = state.resolve_cart_line(&product)?;
                state.remove_from_cart(product_id, fx);
                Reply::Done
            }
            MarketCommand::ClearCart => {
                state.clear_cart(fx);
                Reply::Done
            }
            MarketCommand::ShowCart => {
                let summary = state.cart_summary();
                Reply::Cart {
                    lines: state.cart().lines().to_vec(),
                    summary,
                }
            }
            MarketCommand::Checkout { schedule } => {
                let contact = state
                    .current_user()
                    .map(|u| Contact {
                        name: u.name.clone(),
                        phone: u.phone.clone(),
                    })
                    .unwrap_or_default();
                let request = CheckoutRequest {
                    contact,
                    scheduled_for: schedule.map(|s| s.resolve(now)).transpose()?,
                };
                Reply::Placed(state.checkout(request, now, fx)?)
            }
            MarketCommand::AcceptOrder { order } => {
                let order_id = state.resolve_order(&order)?;
                Reply::Order(state.transition_order(order_id, OrderStatus::Accepted, now, fx)?)
            }
            MarketCommand::CompleteOrder { order } => {
                let order_id = state.resolve_order(&order)?;
                Reply::Order(state.transition_order(order_id, OrderStatus::Completed, now, fx)?)
            }
            MarketCommand::CancelOrder { order } => {
                let order_id = state.resolve_order(&order)?;
                Reply::Order(state.transition_order(order_id, OrderStatus::Cancelled, now, fx)?)
            }
            MarketCommand::ShowOrders => Reply::Orders(state.my_orders()?.into_iter().cloned().collect()),
            MarketCommand::ToggleFavorite { vendor } => {
                let vendor_id = state.resolve_vendor(&vendor)?;
                Reply::Favorite(state.toggle_favorite(vendor_id, fx)?)
            }
            MarketCommand::ShowFavorites => Reply::Listings(
                state
                    .favorite_vendors()?
                    .into_iter()
                    .map(|vendor| VendorListing {
                        vendor: vendor.clone(),
                        distance_km: None,
                    })
                    .collect(),
            ),
            MarketCommand::ShowActivity => Reply::Activity(state.activity().cloned().collect()),
            MarketCommand::UpdateSettings {
                radius_km,
                notification_mode,
            } => Reply::Settings(state.update_settings(radius_km, notification_mode, fx)?),
        };
        Ok(reply)
    }

    /// Process due orders. Returns how many were processed.
    pub async fn tick_schedule(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let mut fx = Effects::new();
        let processed = state.process_due(now, &mut fx);
        self.dispatch(&mut state, fx).await;
        processed
    }

    /// One proximity scan for the active customer. Returns how many vendors were announced.
    pub async fn tick_proximity(&self) -> MarketResult<usize> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let Some(customer_id) = state.scan_target() else {
            return Ok(0);
        };
        let location = self.location.current_location(customer_id).await;

        let mut fx = Effects::new();
        let result = state.proximity_scan(location, now, &mut fx);
        self.dispatch(&mut state, fx).await;
        result
    }

    /// Main event loop
    pub async fn run(&mut self) -> MarketResult<()> {
        self.config.validate()?;
        let mut scan_interval = interval(self.config.scan_interval);
        let mut schedule_interval = interval(self.config.schedule_poll);

        loop {
            tokio::select! {
                Some(command) = self.command_rx.recv() => {
                    self.handle_command(command).await;
                },

                _ = scan_interval.tick() => {
                    if let Err(e) = self.tick_proximity().await {
                        market_error!(Component::Proximity, "⚠️ Proximity scan failed: {}. Will retry on next interval.", e);
                    }
                },

                _ = schedule_interval.tick() => {
                    self.tick_schedule().await;
                },

                Some(_) = self.shutdown_rx.recv() => {
                    self.shutdown().await?;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Flush state to the store
    pub async fn shutdown(&self) -> MarketResult<()> {
        let state = self.state.lock().await;
        let result = self.store.save(&state.snapshot()).await;
        if let Err(e) = &result {
            logging::log_error(Component::Persistence, "Final save", e);
        }
        logging::log_shutdown("marketplace stopped");
        result
    }

    pub fn command_sender(&self) -> mpsc::Sender<MarketCommand> {
        self.command_tx.clone()
    }

    pub fn shutdown_sender(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Read-only access to the state
    pub async fn with_state<R>(&self, f: impl FnOnce(&MarketState) -> R) -> R {
        let state = self.state.lock().await;
        f(&*state)
    }

    async fn dispatch(&self, state: &mut MarketState, fx: Effects) {
        let dispatcher = NotificationDispatcher::new(state.settings().notification_mode);
        for notification in &fx.notifications {
            if let Err(e) = dispatcher.deliver(&self.notifier, notification).await {
                market_warn!(Component::Presentation, "Notification '{}' not delivered: {}", notification.title, e);
            }
        }
        for text in &fx.toasts {
            if let Err(e) = self.notifier.toast(text, TOAST_DURATION).await {
                market_warn!(Component::Presentation, "Toast not shown: {}", e);
            }
        }
        for target in &fx.renders {
            if let Some(view) = Self::view_for(state, *target) {
                if let Err(e) = self.notifier.render(view).await {
                    market_warn!(Component::Presentation, "Render of {} failed: {}", target, e);
                }
            }
        }
        if fx.dirty {
            self.persist(state).await;
        }
    }

    fn view_for(state: &mut MarketState, target: RenderTarget) -> Option<View> {
        match target {
            RenderTarget::Vendors => match state.browse(&BrowseFilter::default()) {
                Ok(listings) => Some(View::Vendors(listings)),
                Err(e) => {
                    market_warn!(Component::Presentation, "Vendor list unavailable: {}", e);
                    None
                }
            },
            RenderTarget::Cart => {
                let summary = state.cart_summary();
                Some(View::Cart {
                    lines: state.cart().lines().to_vec(),
                    summary,
                })
            }
            RenderTarget::Orders => state
                .my_orders()
                .ok()
                .map(|orders| View::Orders(orders.into_iter().cloned().collect())),
        }
    }

    /// Save a snapshot. Failure is a warning; in-memory state stays authoritative.
    async fn persist(&self, state: &MarketState) -> bool {
        match self.store.save(&state.snapshot()).await {
            Ok(()) => true,
            Err(e) => {
                market_warn!(Component::Persistence, "Could not save state: {}", e);
                self.alert(&format!("Changes are not being saved: {e}")).await;
                false
            }
        }
    }

    async fn alert(&self, text: &str) {
        if let Err(e) = self.notifier.toast(text, ALERT_TOAST_DURATION).await {
            market_warn!(Component::Presentation, "Alert not shown: {}", e);
        }
    }
}
