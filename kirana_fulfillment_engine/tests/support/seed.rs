//! Seeding helpers for the tables the engine only ever reads (users, shops) plus a shortcut
//! for stocking the product ledger.
use kdm_common::Money;
use kirana_fulfillment_engine::{
    db_types::{NewProduct, Product},
    InventoryManagement,
    SqliteDatabase,
};

pub async fn seed_user(db: &SqliteDatabase, name: &str, email: &str, role: &str, push_token: Option<&str>) -> i64 {
    sqlx::query_scalar("INSERT INTO users (name, email, role, push_token) VALUES ($1, $2, $3, $4) RETURNING id")
        .bind(name)
        .bind(email)
        .bind(role)
        .bind(push_token)
        .fetch_one(db.pool())
        .await
        .expect("Error seeding user")
}

pub async fn seed_consumer(db: &SqliteDatabase, name: &str, email: &str) -> i64 {
    seed_user(db, name, email, "CONSUMER", None).await
}

/// Creates a shopkeeper and their shop, returning `(owner_id, shop_id)`.
pub async fn seed_shop(db: &SqliteDatabase, owner_name: &str, owner_email: &str, shop_name: &str) -> (i64, i64) {
    let owner_id = seed_user(db, owner_name, owner_email, "SHOPKEEPER", None).await;
    let shop_id: i64 = sqlx::query_scalar("INSERT INTO shops (owner_id, name) VALUES ($1, $2) RETURNING id")
        .bind(owner_id)
        .bind(shop_name)
        .fetch_one(db.pool())
        .await
        .expect("Error seeding shop");
    (owner_id, shop_id)
}

pub async fn seed_product(db: &SqliteDatabase, shop_id: i64, name: &str, price: Money, stock: i64) -> Product {
    db.add_product(NewProduct::new(shop_id, name, price, stock)).await.expect("Error seeding product")
}

pub async fn set_push_token(db: &SqliteDatabase, user_id: i64, token: &str) {
    sqlx::query("UPDATE users SET push_token = $1 WHERE id = $2")
        .bind(token)
        .bind(user_id)
        .execute(db.pool())
        .await
        .expect("Error setting push token");
}

pub async fn stock_of(db: &SqliteDatabase, product_id: i64) -> i64 {
    db.fetch_product(product_id).await.expect("Error fetching product").expect("Product should exist").stock
}
