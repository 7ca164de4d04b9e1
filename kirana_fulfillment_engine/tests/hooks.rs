use std::{
    collections::HashMap,
    sync::{atomic::AtomicI32, Arc},
    time::Duration,
};

use futures_util::FutureExt;
use kdm_common::Money;
use kirana_fulfillment_engine::{
    create_dispatch_handlers,
    db_types::{DeliveryAddress, NewOrder, NewOrderItem, NewPantryItem, NotificationType, OrderStatusType},
    events::{EventHandlers, EventHooks},
    DeliveryResult,
    FulfillmentDatabase,
    NotificationApi,
    NullNotifier,
    OrderFlowApi,
    PantryFlowApi,
    PushNotifier,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::runtime::Runtime;

use crate::support::{
    prepare_env::{prepare_test_env, random_db_path},
    seed::{seed_consumer, seed_product, seed_shop, set_push_token},
};

mod support;

async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn tear_down(mut db: SqliteDatabase) {
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(db.url()).await.unwrap();
}

fn address() -> DeliveryAddress {
    DeliveryAddress::new("Koramangala", "Bengaluru", "560034")
}

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

/// A notifier whose transport is down.
#[derive(Clone, Default)]
struct UnreachableNotifier;

impl PushNotifier for UnreachableNotifier {
    async fn send(&self, _: &str, _: &str, _: &str, _: &HashMap<String, String>) -> DeliveryResult {
        DeliveryResult::Failed("connection timed out".to_string())
    }
}

/// Polls the recipient's notifications until one shows up or the wait budget runs out.
/// Dispatch runs decoupled from the response path, so tests wait rather than assume ordering.
async fn wait_for_notifications(db: &SqliteDatabase, user_id: i64, count: usize) -> Vec<kirana_fulfillment_engine::db_types::Notification> {
    let api = NotificationApi::new(db.clone());
    for _ in 0..100 {
        let notes = api.notifications_for_user(user_id).await.expect("Error fetching notifications");
        if notes.len() >= count {
            return notes;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("Expected {count} notification(s) for user {user_id}, but they never arrived");
}

#[test]
fn on_order_placed_hook_fires_per_order() {
    let rt = Runtime::new().unwrap();
    let event = HookCalled::default();
    let event_copy = event.clone();
    rt.block_on(async move {
        let db = setup().await;
        let mut hooks = EventHooks::default();
        hooks.on_order_placed(move |ev| {
            info!("🪝️ {ev:?}");
            event_copy.called();
            async {}.boxed()
        });
        let handlers = EventHandlers::new(25, hooks);
        let api = OrderFlowApi::new(db.clone(), handlers.producers());

        let customer = seed_consumer(&db, "Asha", "asha@example.com").await;
        let (_owner, shop) = seed_shop(&db, "Sharma", "sharma@example.com", "Sharma Kirana").await;
        let p1 = seed_product(&db, shop, "Toor Dal", Money::from(9000), 10).await;
        for _ in 0..2 {
            api.place_order(NewOrder::new(
                customer,
                shop,
                vec![NewOrderItem::new(p1.id, 1, Money::from(9000))],
                address(),
            ))
            .await
            .expect("Error placing order");
        }

        // dropping the API drops the producers, so the handler drains and shuts down
        drop(api);
        if let Some(handler) = handlers.on_order_placed {
            handler.start_handler().await;
        }
        tear_down(db).await;
    });
    assert_eq!(event.count(), 2);
    info!("🪝️ test complete");
}

#[test]
fn order_placement_records_a_notification_for_the_shop_owner() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let db = setup().await;
        let handlers = create_dispatch_handlers(db.clone(), NullNotifier);
        let api = OrderFlowApi::new(db.clone(), handlers.producers());
        handlers.start_handlers().await;

        let customer = seed_consumer(&db, "Asha", "asha@example.com").await;
        let (owner, shop) = seed_shop(&db, "Sharma", "sharma@example.com", "Sharma Kirana").await;
        let p1 = seed_product(&db, shop, "Toor Dal", Money::from(9000), 5).await;
        let order = api
            .place_order(NewOrder::new(customer, shop, vec![NewOrderItem::new(p1.id, 3, Money::from(9000))], address()))
            .await
            .expect("Error placing order");

        let notes = wait_for_notifications(&db, owner, 1).await;
        let note = &notes[0];
        assert_eq!(note.kind, NotificationType::Order);
        assert_eq!(note.recipient_id, owner);
        assert_eq!(note.sender_id, Some(customer));
        assert_eq!(note.order_id, Some(order.id));
        assert!(note.action_required);
        assert_eq!(note.message, "Asha placed an order: 3 x Toor Dal");
        assert_eq!(note.metadata.items.as_deref(), Some("3 x Toor Dal"));
        tear_down(db).await;
    });
}

#[test]
fn refill_request_notifies_the_shop_owner_with_the_pack_snapshot() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let db = setup().await;
        let handlers = create_dispatch_handlers(db.clone(), NullNotifier);
        let pantry_api = PantryFlowApi::new(db.clone(), handlers.producers());
        handlers.start_handlers().await;

        let user = seed_consumer(&db, "Asha", "asha@example.com").await;
        let (owner, shop) = seed_shop(&db, "Sharma", "sharma@example.com", "Sharma Kirana").await;
        let product = seed_product(&db, shop, "Toor Dal", Money::from(9000), 50).await;
        let item = pantry_api
            .add_pantry_item(NewPantryItem::new(user, shop, product.id, "Toor Dal", 1, "kg", 4, Money::from(9000)))
            .await
            .expect("Error adding pantry item");
        pantry_api.record_consumption(item.id, 1).await.expect("Error recording consumption");
        pantry_api.request_refill(item.id).await.expect("Error requesting refill");

        let notes = wait_for_notifications(&db, owner, 1).await;
        let note = &notes[0];
        assert_eq!(note.kind, NotificationType::RefillRequest);
        assert_eq!(note.sender_id, Some(user));
        assert_eq!(note.pantry_item_id, Some(item.id));
        assert!(note.action_required);
        assert_eq!(note.message, "Asha needs Toor Dal refill (1 packs remaining)");
        assert_eq!(note.metadata.quantity, Some(1));
        tear_down(db).await;
    });
}

#[test]
fn status_update_survives_an_unreachable_notifier() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let db = setup().await;
        let handlers = create_dispatch_handlers(db.clone(), UnreachableNotifier);
        let api = OrderFlowApi::new(db.clone(), handlers.producers());
        handlers.start_handlers().await;

        let customer = seed_consumer(&db, "Asha", "asha@example.com").await;
        set_push_token(&db, customer, "device-asha").await;
        let (_owner, shop) = seed_shop(&db, "Sharma", "sharma@example.com", "Sharma Kirana").await;
        let p1 = seed_product(&db, shop, "Toor Dal", Money::from(9000), 5).await;
        let order = api
            .place_order(NewOrder::new(customer, shop, vec![NewOrderItem::new(p1.id, 1, Money::from(9000))], address()))
            .await
            .expect("Error placing order");

        // The transition succeeds and is durable even though every push delivery fails.
        let confirmed = api.advance_order_status(order.id, OrderStatusType::Confirmed).await.unwrap();
        assert_eq!(confirmed.status, OrderStatusType::Confirmed);
        let stored = api.order_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatusType::Confirmed);

        // ... and the notification record is still persisted for polling clients.
        let notes = wait_for_notifications(&db, customer, 1).await;
        assert_eq!(notes[0].kind, NotificationType::OrderConfirmed);
        assert_eq!(notes[0].message, "Your order from Sharma Kirana has been confirmed");
        tear_down(db).await;
    });
}

#[test]
fn recipients_can_read_and_clear_their_notifications() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let db = setup().await;
        let handlers = create_dispatch_handlers(db.clone(), NullNotifier);
        let api = OrderFlowApi::new(db.clone(), handlers.producers());
        handlers.start_handlers().await;

        let customer = seed_consumer(&db, "Asha", "asha@example.com").await;
        let (owner, shop) = seed_shop(&db, "Sharma", "sharma@example.com", "Sharma Kirana").await;
        let p1 = seed_product(&db, shop, "Toor Dal", Money::from(9000), 5).await;
        api.place_order(NewOrder::new(customer, shop, vec![NewOrderItem::new(p1.id, 1, Money::from(9000))], address()))
            .await
            .expect("Error placing order");

        let notes = wait_for_notifications(&db, owner, 1).await;
        let notification_api = NotificationApi::new(db.clone());
        assert_eq!(notification_api.unread_count(owner).await.unwrap(), 1);

        let read = notification_api.mark_as_read(notes[0].id, owner).await.unwrap();
        assert!(read.is_read);
        assert_eq!(notification_api.unread_count(owner).await.unwrap(), 0);

        // someone else's notification id behaves as missing
        let err = notification_api.mark_as_read(notes[0].id, customer).await.unwrap_err();
        assert!(matches!(err, kirana_fulfillment_engine::FulfillmentError::NotificationNotFound(_)));

        notification_api.delete_notification(notes[0].id, owner).await.unwrap();
        assert!(notification_api.notifications_for_user(owner).await.unwrap().is_empty());
        tear_down(db).await;
    });
}
