//! Component-level tests through the public API
//!
//! These drive the engine with parsed console lines and with the real
//! file-backed store, complementing the mock-based scenarios in `integration.rs`.

use marketplace::services::{ConsoleNotifier, JsonFileStore, ManualClock, ManualLocationProvider};
use marketplace::{parse_command, MarketConfig, Marketplace, Reply};
use shared::OrderStatus;
use tempfile::TempDir;

mod common;
use common::{MarketplaceBuilder, TestFixtures};

/// Test a vendor and a customer session typed at the console
#[tokio::test]
async fn test_console_script_round_trip() {
    // Arrange
    let t = MarketplaceBuilder::new().start().await;
    for line in [
        "login Lakshmi | 555 0900 | vendor",
        "here 12.307,76.652",
        "product Mysore Pak | 120.50 | 250 g",
    ] {
        t.run(parse_command(line).unwrap()).await.unwrap();
    }
    let product = t
        .market
        .with_state(|s| s.catalog().products().next().map(|p| p.id))
        .await
        .expect("product listed");

    // Act - customer orders using short ids
    t.run(parse_command("login Asha | 555 0101 | customer").unwrap()).await.unwrap();
    t.run(parse_command(&format!("add {} 2", product.short())).unwrap())
        .await
        .unwrap();
    let order = match t.run(parse_command("checkout in 5").unwrap()).await.unwrap() {
        Reply::Placed(mut orders) => orders.remove(0),
        other => panic!("unexpected reply {other:?}"),
    };
    t.run(parse_command("login Lakshmi | 555 0900 | vendor").unwrap()).await.unwrap();
    let accepted = t
        .run(parse_command(&format!("accept {}", order.id.short())).unwrap())
        .await
        .unwrap();

    // Assert
    assert!(matches!(accepted, Reply::Order(o) if o.status == OrderStatus::Accepted));
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.scheduled_for, Some(TestFixtures::start() + chrono::Duration::minutes(5)));
    assert_eq!(t.notifications_titled("Order accepted"), 1);
}

/// Test that state written by one engine is picked up by the next
#[tokio::test]
async fn test_file_backed_restart() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state").join("marketplace.json");
    let config = MarketConfig {
        state_path: path.clone(),
        ..MarketConfig::default()
    };
    let clock = ManualClock::new(TestFixtures::start());

    let first = Marketplace::new(
        config.clone(),
        JsonFileStore::new(&path),
        ConsoleNotifier::new(false),
        ManualLocationProvider::new(),
        clock.clone(),
    );
    first.initialize().await.unwrap();
    assert_eq!(first.seed_demo().await.unwrap(), 4);
    first
        .execute(parse_command("login Asha | 555 0101 | customer").unwrap())
        .await
        .unwrap();
    let favorite = first
        .with_state(|s| s.catalog().vendors().find(|v| v.name == "Mylari Dosa").map(|v| v.id))
        .await
        .expect("demo vendor");
    first
        .execute(parse_command(&format!("fav {favorite}")).unwrap())
        .await
        .unwrap();

    // Act
    first.shutdown().await.unwrap();
    let second = Marketplace::new(
        config,
        JsonFileStore::new(&path),
        ConsoleNotifier::new(false),
        ManualLocationProvider::new(),
        clock,
    );
    second.initialize().await.unwrap();

    // Assert
    second
        .with_state(|s| {
            assert_eq!(s.catalog().vendors().count(), 4);
            assert_eq!(s.catalog().products().count(), 6);
            assert!(s.current_user().is_none());
            let user = s
                .catalog()
                .find_user_by_phone(TestFixtures::CUSTOMER_PHONE)
                .expect("customer persisted");
            assert_eq!(user.name, TestFixtures::CUSTOMER_NAME);
            assert!(s.favorites().is_favorite(user.id, favorite));
            assert!(s.activity().count() >= 2);
        })
        .await;
}
