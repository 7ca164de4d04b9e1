use kdm_common::Money;
use kirana_fulfillment_engine::{
    db_types::{NewPantryItem, RefillStatusType},
    events::EventProducers,
    FulfillmentDatabase,
    FulfillmentError,
    PantryFlowApi,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::runtime::Runtime;

use crate::support::{
    prepare_env::{prepare_test_env, random_db_path},
    seed::{seed_consumer, seed_product, seed_shop},
};

mod support;

async fn setup() -> PantryFlowApi<SqliteDatabase> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    PantryFlowApi::new(db, EventProducers::default())
}

async fn tear_down(mut api: PantryFlowApi<SqliteDatabase>) {
    if let Err(e) = api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(api.db().url()).await.unwrap();
}

/// Seeds a consumer, a shop and a product, and returns a NewPantryItem builder for them.
async fn seeded_item(db: &SqliteDatabase) -> NewPantryItem {
    let user = seed_consumer(db, "Asha", "asha@example.com").await;
    let (_owner, shop) = seed_shop(db, "Sharma", "sharma@example.com", "Sharma Kirana").await;
    let product = seed_product(db, shop, "Toor Dal", Money::from(9000), 50).await;
    NewPantryItem::new(user, shop, product.id, "Toor Dal", 1, "kg", 4, Money::from(9000))
}

#[test]
fn pantry_items_are_unique_per_user_shop_product() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let new_item = seeded_item(api.db()).await;
        let item = api.add_pantry_item(new_item.clone()).await.expect("Error adding pantry item");
        assert_eq!(item.status, RefillStatusType::Stocked);
        assert_eq!(item.current_packs, item.packs_owned);

        let err = api.add_pantry_item(new_item).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::DuplicatePantryItem));
        tear_down(api).await;
    });
}

#[test]
fn consumption_auto_demotes_to_low_at_the_threshold() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let new_item = seeded_item(api.db()).await;
        let item = api.add_pantry_item(new_item).await.unwrap();

        let item2 = api.record_consumption(item.id, 2).await.unwrap();
        assert_eq!(item2.status, RefillStatusType::Stocked);
        assert_eq!(item2.current_packs, 2);

        let item3 = api.record_consumption(item.id, 1).await.unwrap();
        assert_eq!(item3.status, RefillStatusType::Low);

        // an upward correction restores Stocked
        let item4 = api.record_consumption(item.id, 3).await.unwrap();
        assert_eq!(item4.status, RefillStatusType::Stocked);
        tear_down(api).await;
    });
}

#[test]
fn consumption_cannot_exceed_packs_owned_or_go_negative() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let new_item = seeded_item(api.db()).await;
        let item = api.add_pantry_item(new_item).await.unwrap();

        let err = api.record_consumption(item.id, 5).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::ValidationError(_)));
        let err = api.record_consumption(item.id, -1).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::ValidationError(_)));
        let err = api.record_consumption(999, 1).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::PantryItemNotFound(999)));
        tear_down(api).await;
    });
}

#[test]
fn refill_request_snapshots_the_remaining_packs() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let new_item = seeded_item(api.db()).await;
        let item = api.add_pantry_item(new_item).await.unwrap();
        api.record_consumption(item.id, 1).await.unwrap();

        let requested = api.request_refill(item.id).await.expect("Error requesting refill");
        assert_eq!(requested.status, RefillStatusType::RefillRequested);
        assert_eq!(requested.current_packs, 1);

        // a second request is rejected - the item is no longer Stocked or Low
        let err = api.request_refill(item.id).await.unwrap_err();
        assert!(matches!(
            err,
            FulfillmentError::InvalidRefillTransition {
                from: RefillStatusType::RefillRequested,
                to: RefillStatusType::RefillRequested
            }
        ));
        tear_down(api).await;
    });
}

#[test]
fn refill_can_be_requested_while_still_stocked() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let new_item = seeded_item(api.db()).await.with_refill_threshold(1);
        let item = api.add_pantry_item(new_item).await.unwrap();
        let requested = api.request_refill(item.id).await.expect("Error requesting refill");
        assert_eq!(requested.status, RefillStatusType::RefillRequested);
        tear_down(api).await;
    });
}

#[test]
fn delivery_closes_the_refill_cycle() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let new_item = seeded_item(api.db()).await;
        let item = api.add_pantry_item(new_item).await.unwrap();
        api.record_consumption(item.id, 1).await.unwrap();
        api.request_refill(item.id).await.unwrap();

        let confirmed = api.advance_refill_status(item.id, RefillStatusType::Confirmed).await.unwrap();
        assert_eq!(confirmed.status, RefillStatusType::Confirmed);
        let out = api.advance_refill_status(item.id, RefillStatusType::OutForDelivery).await.unwrap();
        assert_eq!(out.status, RefillStatusType::OutForDelivery);

        let delivered = api.advance_refill_status(item.id, RefillStatusType::Delivered).await.unwrap();
        assert_eq!(delivered.status, RefillStatusType::Stocked);
        assert_eq!(delivered.current_packs, delivered.packs_owned);
        assert!(delivered.last_refilled.is_some());
        tear_down(api).await;
    });
}

#[test]
fn refill_stages_cannot_be_skipped() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let new_item = seeded_item(api.db()).await;
        let item = api.add_pantry_item(new_item).await.unwrap();
        api.record_consumption(item.id, 1).await.unwrap();
        api.request_refill(item.id).await.unwrap();

        let err = api.advance_refill_status(item.id, RefillStatusType::Delivered).await.unwrap_err();
        assert!(matches!(
            err,
            FulfillmentError::InvalidRefillTransition {
                from: RefillStatusType::RefillRequested,
                to: RefillStatusType::Delivered
            }
        ));

        // Low is not a shopkeeper-driven stage at all
        let err = api.advance_refill_status(item.id, RefillStatusType::Low).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::ValidationError(_)));
        tear_down(api).await;
    });
}

#[test]
fn shop_worklist_shows_active_refills_only() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let api = setup().await;
        let db = api.db().clone();
        let user = seed_consumer(&db, "Asha", "asha@example.com").await;
        let (_owner, shop) = seed_shop(&db, "Sharma", "sharma@example.com", "Sharma Kirana").await;
        let dal = seed_product(&db, shop, "Toor Dal", Money::from(9000), 50).await;
        let ghee = seed_product(&db, shop, "Ghee", Money::from(55000), 20).await;

        let requested = api
            .add_pantry_item(NewPantryItem::new(user, shop, dal.id, "Toor Dal", 1, "kg", 4, Money::from(9000)))
            .await
            .unwrap();
        api.request_refill(requested.id).await.unwrap();
        let stocked = api
            .add_pantry_item(NewPantryItem::new(user, shop, ghee.id, "Ghee", 1, "jar", 2, Money::from(55000)))
            .await
            .unwrap();

        let worklist = api.refill_requests_for_shop(shop).await.unwrap();
        assert_eq!(worklist.len(), 1);
        assert_eq!(worklist[0].id, requested.id);

        api.remove_pantry_item(stocked.id).await.unwrap();
        assert!(api.item_by_id(stocked.id).await.unwrap().is_none());
        let err = api.remove_pantry_item(stocked.id).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::PantryItemNotFound(_)));
        tear_down(api).await;
    });
}
