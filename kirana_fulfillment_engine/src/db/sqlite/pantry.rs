use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPantryItem, PantryItem, RefillStatusType},
    traits::FulfillmentError,
};

/// Inserts a pantry item. The (user, shop, product) triple is unique; a second insert for the
/// same triple fails with [`FulfillmentError::DuplicatePantryItem`].
pub async fn insert_pantry_item(
    item: NewPantryItem,
    conn: &mut SqliteConnection,
) -> Result<PantryItem, FulfillmentError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO pantry_items (
                user_id,
                shop_id,
                product_id,
                product_name,
                brand_name,
                quantity_per_pack,
                unit,
                packs_owned,
                current_packs,
                refill_threshold,
                price,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9, $10, 'STOCKED')
            RETURNING *;
        "#,
    )
    .bind(item.user_id)
    .bind(item.shop_id)
    .bind(item.product_id)
    .bind(&item.product_name)
    .bind(&item.brand_name)
    .bind(item.quantity_per_pack)
    .bind(&item.unit)
    .bind(item.packs_owned)
    .bind(item.refill_threshold)
    .bind(item.price)
    .fetch_one(conn)
    .await;
    match result {
        Ok(item) => Ok(item),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(FulfillmentError::DuplicatePantryItem),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_pantry_item(
    item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PantryItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM pantry_items WHERE id = $1").bind(item_id).fetch_optional(conn).await
}

pub async fn pantry_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<PantryItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM pantry_items WHERE user_id = $1 ORDER BY updated_at DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await
}

/// Applies a consumption update and the automatic status adjustment in one statement:
/// `STOCKED -> LOW` when the new count reaches the refill threshold, and `LOW -> STOCKED` when
/// a correction raises it back above. Statuses past `LOW` are left alone; a refill already in
/// flight is not cancelled by the consumer updating pack counts.
pub async fn record_consumption(
    item_id: i64,
    current_packs: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PantryItem>, FulfillmentError> {
    let updated: Option<PantryItem> = sqlx::query_as(
        r#"
            UPDATE pantry_items SET
                current_packs = $1,
                status = CASE
                    WHEN status = 'STOCKED' AND $1 <= refill_threshold THEN 'LOW'
                    WHEN status = 'LOW' AND $1 > refill_threshold THEN 'STOCKED'
                    ELSE status
                END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *;
        "#,
    )
    .bind(current_packs)
    .bind(item_id)
    .fetch_optional(conn)
    .await?;
    Ok(updated)
}

/// Moves an item to `REFILL_REQUESTED`, guarded by the item currently being stocked or low.
pub async fn mark_refill_requested(
    item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PantryItem>, FulfillmentError> {
    let updated: Option<PantryItem> = sqlx::query_as(
        "UPDATE pantry_items SET status = 'REFILL_REQUESTED', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND \
         status IN ('STOCKED', 'LOW') RETURNING *",
    )
    .bind(item_id)
    .fetch_optional(conn)
    .await?;
    Ok(updated)
}

/// Moves an item from `from` to `to` along the refill ring, guarded by `from`.
///
/// Delivery closes the cycle in the same statement: the stored status wraps to `STOCKED`, the
/// pack count resets to `packs_owned`, and `last_refilled` is stamped.
pub async fn advance_refill_status(
    item_id: i64,
    from: RefillStatusType,
    to: RefillStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<PantryItem>, FulfillmentError> {
    let updated: Option<PantryItem> = if to == RefillStatusType::Delivered {
        sqlx::query_as(
            "UPDATE pantry_items SET status = 'STOCKED', current_packs = packs_owned, last_refilled = \
             CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(item_id)
        .bind(from)
        .fetch_optional(conn)
        .await?
    } else {
        sqlx::query_as(
            "UPDATE pantry_items SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3 \
             RETURNING *",
        )
        .bind(to)
        .bind(item_id)
        .bind(from)
        .fetch_optional(conn)
        .await?
    };
    if let Some(item) = &updated {
        debug!("🗃️ Pantry item {} moved to {} (requested {to})", item.id, item.status);
    }
    Ok(updated)
}

/// The shopkeeper's worklist: refills requested, confirmed or out for delivery.
pub async fn refill_requests_for_shop(
    shop_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PantryItem>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM pantry_items WHERE shop_id = $1 AND status IN ('REFILL_REQUESTED', 'CONFIRMED', \
         'OUT_FOR_DELIVERY') ORDER BY updated_at DESC",
    )
    .bind(shop_id)
    .fetch_all(conn)
    .await
}

pub async fn delete_pantry_item(item_id: i64, conn: &mut SqliteConnection) -> Result<(), FulfillmentError> {
    let result = sqlx::query("DELETE FROM pantry_items WHERE id = $1").bind(item_id).execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(FulfillmentError::PantryItemNotFound(item_id));
    }
    debug!("🗃️ Pantry item {item_id} deleted");
    Ok(())
}
