//! The order lifecycle hooks: subscribers are notified after authorizations commit and after the
//! dispatcher seals an order.

use std::sync::{atomic::AtomicI32, Arc};

use futures_util::FutureExt;
use log::*;
use quartermaster_engine::{
    events::{EventHandlers, EventHooks},
    DispatchApi,
    OrderFlowApi,
};
use tokio::time::{sleep, Duration};

mod support;
use support::{seed_catalog, seed_player, setup, tear_down};

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn count(&self) -> i32 {
        self.called.load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[tokio::test]
async fn order_created_and_delivered_hooks_fire() {
    let db = setup().await;
    seed_player(&db, "discord:alice", "Alice", 1000).await;
    seed_catalog(&db).await;

    let created = HookCalled::default();
    let created_copy = created.clone();
    let delivered = HookCalled::default();
    let delivered_copy = delivered.clone();

    let mut hooks = EventHooks::default();
    hooks.on_order_created(move |ev| {
        info!("🪝️ created: {ev:?}");
        created_copy.called();
        async {}.boxed()
    });
    hooks.on_order_delivered(move |ev| {
        info!("🪝️ delivered: {ev:?}");
        delivered_copy.called();
        async {}.boxed()
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let flow = OrderFlowApi::new(db.clone(), producers.clone());
    let dispatch = DispatchApi::new(db.clone(), producers);

    let order1 = flow.purchase("discord:alice", "MedKit", 1, None).await.unwrap();
    let _order2 = flow.purchase("discord:alice", "MedKit", 2, None).await.unwrap();
    dispatch.complete_order(order1.id).await.unwrap();

    // Handlers run on spawned tasks; give them a beat to drain.
    sleep(Duration::from_millis(200)).await;
    assert_eq!(created.count(), 2);
    assert_eq!(delivered.count(), 1);
    tear_down(db).await;
}

#[tokio::test]
async fn failure_hook_carries_the_reason() {
    let db = setup().await;
    seed_player(&db, "discord:bob", "Bob", 1000).await;
    seed_catalog(&db).await;

    let failed = HookCalled::default();
    let failed_copy = failed.clone();
    let mut hooks = EventHooks::default();
    hooks.on_order_failed(move |ev| {
        assert_eq!(ev.reason, "Player offline");
        failed_copy.called();
        async {}.boxed()
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let flow = OrderFlowApi::new(db.clone(), producers.clone());
    let dispatch = DispatchApi::new(db.clone(), producers);
    let order = flow.purchase("discord:bob", "MedKit", 1, None).await.unwrap();
    dispatch.fail_order(order.id, "Player offline").await.unwrap();

    sleep(Duration::from_millis(200)).await;
    assert_eq!(failed.count(), 1);
    tear_down(db).await;
}
