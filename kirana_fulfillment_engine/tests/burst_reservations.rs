//! Hammering the inventory ledger's conditional decrement from concurrent tasks.
use kdm_common::Money;
use kirana_fulfillment_engine::{FulfillmentDatabase, FulfillmentError, InventoryManagement, SqliteDatabase};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::runtime::Runtime;

use crate::support::{
    prepare_env::{prepare_test_env, random_db_path},
    seed::{seed_product, seed_shop, stock_of},
};

mod support;

const NUM_TASKS: usize = 20;
const STOCK: i64 = 10;

#[test]
fn concurrent_reservations_never_oversell() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let (_owner, shop) = seed_shop(&db, "Sharma", "sharma@example.com", "Sharma Kirana").await;
        let product = seed_product(&db, shop, "Toor Dal", Money::from(9000), STOCK).await;

        info!("🚀️ Injecting {NUM_TASKS} concurrent reservations for {STOCK} units of stock");
        let mut handles = Vec::with_capacity(NUM_TASKS);
        for _ in 0..NUM_TASKS {
            let db = db.clone();
            let product_id = product.id;
            handles.push(tokio::spawn(async move { db.reserve_stock(product_id, 1).await }));
        }
        let mut reserved = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.expect("reservation task panicked") {
                Ok(_) => reserved += 1,
                Err(FulfillmentError::InsufficientStock { available, .. }) => {
                    assert!(available >= 0);
                    rejected += 1;
                },
                Err(e) => panic!("Unexpected reservation error: {e}"),
            }
        }
        assert_eq!(reserved, STOCK as usize);
        assert_eq!(rejected, NUM_TASKS - STOCK as usize);
        assert_eq!(stock_of(&db, product.id).await, 0);

        let mut db = db;
        if let Err(e) = db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        Sqlite::drop_database(&url).await.unwrap();
    });
    info!("🚀️ test complete");
}

#[test]
fn reserve_and_release_edge_cases() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let (_owner, shop) = seed_shop(&db, "Sharma", "sharma@example.com", "Sharma Kirana").await;
        let product = seed_product(&db, shop, "Ghee", Money::from(55000), 2).await;

        let err = db.reserve_stock(product.id, 3).await.unwrap_err();
        match err {
            FulfillmentError::InsufficientStock { product_id, name, available } => {
                assert_eq!(product_id, product.id);
                assert_eq!(name, "Ghee");
                assert_eq!(available, 2);
            },
            other => panic!("Expected InsufficientStock, got {other}"),
        }

        let err = db.reserve_stock(404, 1).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::ProductNotFound(404)));

        // releasing against a vanished product is logged, not failed
        let released = db.release_stock(404, 1).await.expect("Release should not fail");
        assert!(released.is_none());

        let released = db.release_stock(product.id, 1).await.unwrap().unwrap();
        assert_eq!(released.stock, 3);

        let mut db = db;
        if let Err(e) = db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        Sqlite::drop_database(&url).await.unwrap();
    });
}
