//! Test helpers and builder patterns for marketplace tests

use std::sync::{Arc, Mutex};

use chrono::Duration;
use marketplace::services::{ManualClock, ManualLocationProvider};
use marketplace::{
    MarketCommand, MarketConfig, MarketError, MarketResult, Marketplace, MockNotifier, MockStateStore, Reply, View,
};
use rust_decimal::Decimal;
use shared::{NotificationMode, ProductId, Role, StateSnapshot, UserId, VendorId};

use super::fixtures::TestFixtures;

/// Something the presentation layer was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Toast(String),
    Platform { title: String, body: String },
    Render(View),
}

pub type Engine = Marketplace<MockStateStore, MockNotifier, ManualLocationProvider, ManualClock>;

pub struct MarketplaceBuilder {
    config: MarketConfig,
    snapshot: Option<StateSnapshot>,
    load_fails: bool,
    save_fails: bool,
    platform_available: bool,
}

impl MarketplaceBuilder {
    pub fn new() -> Self {
        Self {
            config: MarketConfig::default(),
            snapshot: None,
            load_fails: false,
            save_fails: false,
            platform_available: false,
        }
    }

    pub fn with_snapshot(mut self, snapshot: StateSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn with_radius(mut self, radius_km: f64) -> Self {
        self.config.proximity_radius_km = radius_km;
        self
    }

    pub fn with_notification_mode(mut self, mode: NotificationMode) -> Self {
        self.config.notification_mode = mode;
        self
    }

    pub fn with_platform_notifications(mut self) -> Self {
        self.platform_available = true;
        self
    }

    pub fn with_failing_load(mut self) -> Self {
        self.load_fails = true;
        self
    }

    pub fn with_failing_save(mut self) -> Self {
        self.save_fails = true;
        self
    }

    pub fn with_config(mut self, setup: impl FnOnce(&mut MarketConfig)) -> Self {
        setup(&mut self.config);
        self
    }

    pub fn build(self) -> TestMarket {
        let events = Arc::new(Mutex::new(Vec::new()));
        let saves = Arc::new(Mutex::new(Vec::new()));

        let mut store = MockStateStore::new();
        let snapshot = self.snapshot;
        let load_fails = self.load_fails;
        store.expect_load().returning(move || {
            if load_fails {
                Err(MarketError::Persistence { message: "disk on fire".to_string() })
            } else {
                Ok(snapshot.clone())
            }
        });
        let recorded = saves.clone();
        let save_fails = self.save_fails;
        store.expect_save().returning(move |snapshot| {
            if save_fails {
                return Err(MarketError::Persistence { message: "quota exceeded".to_string() });
            }
            recorded.lock().unwrap().push(snapshot.clone());
            Ok(())
        });

        let mut notifier = MockNotifier::new();
        let log = events.clone();
        notifier.expect_toast().returning(move |text, _| {
            log.lock().unwrap().push(Event::Toast(text.to_string()));
            Ok(())
        });
        let log = events.clone();
        let platform_available = self.platform_available;
        notifier.expect_platform_notify().returning(move |title, body| {
            if !platform_available {
                return Err(MarketError::not_permitted("permission denied"));
            }
            log.lock().unwrap().push(Event::Platform {
                title: title.to_string(),
                body: body.to_string(),
            });
            Ok(())
        });
        let log = events.clone();
        notifier.expect_render().returning(move |view| {
            log.lock().unwrap().push(Event::Render(view));
            Ok(())
        });

        let clock = ManualClock::new(TestFixtures::start());
        let location = ManualLocationProvider::new();
        let market = Marketplace::new(self.config, store, notifier, location.clone(), clock.clone());

        TestMarket {
            market,
            clock,
            location,
            events,
            saves,
        }
    }

    /// Build and initialize
    pub async fn start(self) -> TestMarket {
        let test = self.build();
        test.market.initialize().await.expect("initialize");
        test
    }
}

pub struct TestMarket {
    pub market: Engine,
    pub clock: ManualClock,
    pub location: ManualLocationProvider,
    pub events: Arc<Mutex<Vec<Event>>>,
    pub saves: Arc<Mutex<Vec<StateSnapshot>>>,
}

impl TestMarket {
    pub async fn run(&self, command: MarketCommand) -> MarketResult<Reply> {
        self.market.execute(command).await
    }

    pub async fn login_customer(&self) -> UserId {
        match self
            .run(MarketCommand::Login {
                name: TestFixtures::CUSTOMER_NAME.to_string(),
                phone: TestFixtures::CUSTOMER_PHONE.to_string(),
                role: Role::Customer,
            })
            .await
            .expect("customer login")
        {
            Reply::User(user) => user.id,
            other => panic!("unexpected reply {other:?}"),
        }
    }

    pub async fn login_operator(&self, phone: &str) -> UserId {
        match self
            .run(MarketCommand::Login {
                name: "Operator".to_string(),
                phone: phone.to_string(),
                role: Role::Vendor,
            })
            .await
            .expect("operator login")
        {
            Reply::User(user) => user.id,
            other => panic!("unexpected reply {other:?}"),
        }
    }

    /// Vendor owned by an operator account with `phone`, with one product per price
    pub async fn vendor_with_products(&self, name: &str, phone: &str, prices: &[Decimal]) -> (VendorId, Vec<ProductId>) {
        let vendor = match self
            .run(MarketCommand::CreateVendor {
                name: name.to_string(),
                category: "food".to_string(),
                location: Some(TestFixtures::vendor_location()),
                phone: Some(phone.to_string()),
            })
            .await
            .expect("create vendor")
        {
            Reply::Vendor(vendor) => vendor,
            other => panic!("unexpected reply {other:?}"),
        };

        let mut products = Vec::new();
        for (i, price) in prices.iter().enumerate() {
            let reply = self
                .run(MarketCommand::AddProduct {
                    vendor: Some(vendor.id.to_string()),
                    name: format!("{name} item {i}"),
                    price: Some(*price),
                    description: None,
                })
                .await
                .expect("add product");
            match reply {
                Reply::Product(product) => products.push(product.id),
                other => panic!("unexpected reply {other:?}"),
            }
        }
        (vendor.id, products)
    }

    pub async fn add_to_cart(&self, product: ProductId, quantity: u32) {
        self.run(MarketCommand::AddToCart {
            product: product.to_string(),
            quantity,
        })
        .await
        .expect("add to cart");
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn toasts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Toast(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Toasts and platform notifications whose text starts with `title`
    pub fn notifications_titled(&self, title: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| match e {
                Event::Toast(text) => text.starts_with(&format!("{title}:")),
                Event::Platform { title: t, .. } => t == title,
                Event::Render(_) => false,
            })
            .count()
    }

    pub fn last_save(&self) -> Option<StateSnapshot> {
        self.saves.lock().unwrap().last().cloned()
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }
}

impl TestMarket {
    pub fn clock_now(&self) -> chrono::DateTime<chrono::Utc> {
        use marketplace::Clock;
        self.clock.now()
    }
}
