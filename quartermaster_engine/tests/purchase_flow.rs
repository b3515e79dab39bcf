use chrono::Duration;
use qm_common::Coins;
use quartermaster_engine::{
    db_types::OrderStatus,
    events::EventProducers,
    LedgerDatabase,
    LedgerError,
    OrderFlowApi,
    PlayerManagement,
};

mod support;
use support::{seed_catalog, seed_player, setup, tear_down};

#[tokio::test]
async fn purchase_debits_balance_and_creates_pending_order() {
    let db = setup().await;
    seed_player(&db, "discord:alice", "Alice", 500).await;
    seed_catalog(&db).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    let order = api.purchase("discord:alice", "MedKit", 3, None).await.expect("Error authorizing purchase");
    assert_eq!(order.quantity, 3);
    assert_eq!(order.total_price, Coins::from(150));
    assert_eq!(order.status, OrderStatus::Pending);

    let balance = db.balance_for("discord:alice").await.unwrap();
    assert_eq!(balance, Coins::from(350));
    tear_down(db).await;
}

#[tokio::test]
async fn purchase_is_refused_when_funds_are_insufficient() {
    let db = setup().await;
    seed_player(&db, "discord:bob", "Bob", 40).await;
    seed_catalog(&db).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    let err = api.purchase("discord:bob", "MedKit", 1, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { required, available }
        if required == Coins::from(50) && available == Coins::from(40)));

    // Nothing moved and nothing was recorded.
    assert_eq!(db.balance_for("discord:bob").await.unwrap(), Coins::from(40));
    assert!(db.fetch_pending_orders(10).await.unwrap().is_empty());
    tear_down(db).await;
}

#[tokio::test]
async fn purchase_rejects_unknown_items_and_bad_quantities() {
    let db = setup().await;
    seed_player(&db, "discord:carol", "Carol", 1000).await;
    seed_catalog(&db).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    let err = api.purchase("discord:carol", "Bazooka", 1, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::ItemNotFound(name) if name == "Bazooka"));

    let err = api.purchase("discord:carol", "MedKit", 0, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidQuantity(0)));

    let err = api.purchase("discord:nobody", "MedKit", 1, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::PlayerNotFound(_)));
    tear_down(db).await;
}

#[tokio::test]
async fn purchase_rejects_quantities_that_overflow_the_total() {
    let db = setup().await;
    seed_player(&db, "discord:mallory", "Mallory", 1000).await;
    seed_catalog(&db).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    // A 50-coin item: this quantity pushes the total past i64::MAX.
    let quantity = i64::MAX / 50 + 1;
    let err = api.purchase("discord:mallory", "MedKit", quantity, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidQuantity(q) if q == quantity));

    // Nothing moved and nothing was recorded.
    assert_eq!(db.balance_for("discord:mallory").await.unwrap(), Coins::from(1000));
    assert!(db.fetch_pending_orders(10).await.unwrap().is_empty());
    tear_down(db).await;
}

#[tokio::test]
async fn item_lookup_is_case_insensitive() {
    let db = setup().await;
    seed_player(&db, "discord:dan", "Dan", 500).await;
    seed_catalog(&db).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    let order = api.purchase("discord:dan", "medkit", 1, None).await.expect("Error authorizing purchase");
    assert_eq!(order.total_price, Coins::from(50));
    tear_down(db).await;
}

#[tokio::test]
async fn cooldown_blocks_rapid_purchases_and_reports_remaining_time() {
    let db = setup().await;
    seed_player(&db, "discord:eve", "Eve", 10_000).await;
    seed_catalog(&db).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());
    let cooldown = Some(Duration::seconds(60));

    api.purchase("discord:eve", "MedKit", 1, cooldown).await.expect("Error authorizing purchase");
    let err = api.purchase("discord:eve", "MedKit", 1, cooldown).await.unwrap_err();
    match err {
        LedgerError::RateLimited(secs) => assert!(secs > 0 && secs <= 60, "unexpected remaining time {secs}"),
        other => panic!("Expected RateLimited, got {other:?}"),
    }
    // Only the first purchase went through.
    assert_eq!(db.balance_for("discord:eve").await.unwrap(), Coins::from(9950));
    tear_down(db).await;
}

#[tokio::test]
async fn any_purchase_attempt_consumes_the_cooldown_window() {
    let db = setup().await;
    seed_player(&db, "discord:frank", "Frank", 10).await;
    seed_catalog(&db).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());
    let cooldown = Some(Duration::seconds(60));

    // The window starts on the attempt, not on success, so even a refused purchase is throttled.
    let err = api.purchase("discord:frank", "MedKit", 1, cooldown).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    let err = api.purchase("discord:frank", "MedKit", 1, cooldown).await.unwrap_err();
    assert!(matches!(err, LedgerError::RateLimited(_)));
    tear_down(db).await;
}

#[tokio::test]
async fn simultaneous_attempts_start_exactly_one_cooldown_window() {
    let db = setup().await;
    let window = Duration::seconds(60);

    let mut handles = Vec::with_capacity(10);
    for _ in 0..10 {
        let db = db.clone();
        handles.push(tokio::spawn(async move { db.check_rate_limit("discord:heidi", window).await }));
    }
    let mut passed = 0;
    for handle in handles {
        match handle.await.expect("rate limit task panicked") {
            Ok(()) => passed += 1,
            Err(LedgerError::RateLimited(secs)) => assert!(secs > 0 && secs <= 60),
            Err(e) => panic!("Unexpected error: {e:?}"),
        }
    }
    assert_eq!(passed, 1);
    tear_down(db).await;
}

/// A burst of concurrent purchases against one balance must never drive it negative, and must
/// authorize exactly as many orders as the balance covers.
#[tokio::test]
async fn concurrent_purchases_never_overspend() {
    let db = setup().await;
    // 500 coins and a 50-coin item: exactly 10 of the 25 attempts can succeed.
    seed_player(&db, "discord:grace", "Grace", 500).await;
    seed_catalog(&db).await;

    let mut handles = Vec::with_capacity(25);
    for _ in 0..25 {
        let db = db.clone();
        handles.push(tokio::spawn(async move { db.authorize_purchase("discord:grace", "MedKit", 1).await }));
    }
    let mut authorized = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.expect("purchase task panicked") {
            Ok(_) => authorized += 1,
            Err(LedgerError::InsufficientFunds { .. }) => refused += 1,
            Err(e) => panic!("Unexpected error: {e:?}"),
        }
    }
    assert_eq!(authorized, 10);
    assert_eq!(refused, 15);
    assert_eq!(db.balance_for("discord:grace").await.unwrap(), Coins::from(0));
    tear_down(db).await;
}
