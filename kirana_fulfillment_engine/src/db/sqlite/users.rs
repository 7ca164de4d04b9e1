use sqlx::SqliteConnection;

use crate::db_types::{Shop, User, UserRole};

/// The engine reads users and shops for contact freezing and notification routing. The insert
/// functions below exist for provisioning and test environments; nothing in the fulfilment
/// flows writes these tables.

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await
}

pub async fn fetch_shop(shop_id: i64, conn: &mut SqliteConnection) -> Result<Option<Shop>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM shops WHERE id = $1").bind(shop_id).fetch_optional(conn).await
}

pub async fn fetch_push_token(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<String>, sqlx::Error> {
    let token: Option<Option<String>> = sqlx::query_scalar("SELECT push_token FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(token.flatten())
}

pub async fn insert_user(
    name: &str,
    email: &str,
    role: UserRole,
    push_token: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<User, sqlx::Error> {
    sqlx::query_as("INSERT INTO users (name, email, role, push_token) VALUES ($1, $2, $3, $4) RETURNING *")
        .bind(name)
        .bind(email)
        .bind(role)
        .bind(push_token)
        .fetch_one(conn)
        .await
}

pub async fn insert_shop(owner_id: i64, name: &str, conn: &mut SqliteConnection) -> Result<Shop, sqlx::Error> {
    sqlx::query_as("INSERT INTO shops (owner_id, name) VALUES ($1, $2) RETURNING *")
        .bind(owner_id)
        .bind(name)
        .fetch_one(conn)
        .await
}
