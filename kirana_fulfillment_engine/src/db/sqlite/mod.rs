//! # SQLite database methods
//!
//! This module contains the "low-level" SQLite database interactions.
//!
//! All these interactions are maintained by simple functions (rather than stateful structs)
//! that accept a `&mut SqliteConnection` argument. Callers can obtain a connection from a
//! pool, or create an atomic transaction as the need arises and call through to the functions
//! without any other changes.
mod db;

pub mod notifications;
pub mod orders;
pub mod pantry;
pub mod products;
pub mod users;

use std::{env, str::FromStr};

pub use db::SqliteDatabase;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

use crate::traits::FulfillmentError;

const SQLITE_DB_URL: &str = "sqlite://data/kirana_store.db";

pub fn db_url() -> String {
    let result = env::var("KDM_DATABASE_URL").unwrap_or_else(|_| {
        info!("KDM_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, FulfillmentError> {
    // A pooled connection that has only read falls back to a WAL read snapshot (sqlx's default
    // journal mode) that can predate writes committed on sibling connections, so an
    // acquire-per-operation read can miss a row a prior operation just inserted. Pin the
    // rollback journal so every acquired connection observes the latest committed state.
    let opts = SqliteConnectOptions::from_str(url)?.journal_mode(SqliteJournalMode::Delete);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(opts).await?;
    Ok(pool)
}
