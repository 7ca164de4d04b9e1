use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewNotification, Notification},
    traits::FulfillmentError,
};

pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, FulfillmentError> {
    let inserted: Notification = sqlx::query_as(
        r#"
            INSERT INTO notifications (
                recipient_id,
                sender_id,
                shop_id,
                order_id,
                pantry_item_id,
                kind,
                title,
                message,
                action_required,
                metadata
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(notification.recipient_id)
    .bind(notification.sender_id)
    .bind(notification.shop_id)
    .bind(notification.order_id)
    .bind(notification.pantry_item_id)
    .bind(notification.kind)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(notification.action_required)
    .bind(Json(&notification.metadata))
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Notification {} ({}) recorded for user {}", inserted.id, inserted.kind, inserted.recipient_id);
    Ok(inserted)
}

pub async fn notifications_for_user(
    user_id: i64,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM notifications WHERE recipient_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2")
        .bind(user_id)
        .bind(limit)
        .fetch_all(conn)
        .await
}

pub async fn unread_count(user_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND is_read = 0")
        .bind(user_id)
        .fetch_one(conn)
        .await
}

/// Marks a notification as read. Scoped to the recipient: someone else's notification id is
/// indistinguishable from a missing one.
pub async fn mark_as_read(
    notification_id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Notification, FulfillmentError> {
    let updated: Option<Notification> =
        sqlx::query_as("UPDATE notifications SET is_read = 1 WHERE id = $1 AND recipient_id = $2 RETURNING *")
            .bind(notification_id)
            .bind(user_id)
            .fetch_optional(conn)
            .await?;
    updated.ok_or(FulfillmentError::NotificationNotFound(notification_id))
}

pub async fn delete_notification(
    notification_id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), FulfillmentError> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
        .bind(notification_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(FulfillmentError::NotificationNotFound(notification_id));
    }
    Ok(())
}
