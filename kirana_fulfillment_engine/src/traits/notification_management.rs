use crate::{
    db_types::{NewNotification, Notification},
    traits::FulfillmentError,
};

/// Notification record storage and recipient lookup.
///
/// Records are created only by the dispatch coordinator. Recipients own their records for
/// read/delete purposes; `is_read` is the only field ever mutated.
#[allow(async_fn_in_trait)]
pub trait NotificationManagement: Clone {
    /// Persists a notification record.
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, FulfillmentError>;

    /// The most recent notifications for a recipient, newest first, up to `limit`.
    async fn notifications_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<Notification>, FulfillmentError>;

    /// Number of unread notifications for a recipient.
    async fn unread_count(&self, user_id: i64) -> Result<i64, FulfillmentError>;

    /// Marks a notification as read. The recipient id must match; anyone else gets
    /// [`FulfillmentError::NotificationNotFound`].
    async fn mark_as_read(&self, notification_id: i64, user_id: i64) -> Result<Notification, FulfillmentError>;

    /// Deletes a notification. The recipient id must match, as for
    /// [`mark_as_read`](NotificationManagement::mark_as_read).
    async fn delete_notification(&self, notification_id: i64, user_id: i64) -> Result<(), FulfillmentError>;

    /// Resolves a recipient's push-delivery token. Absence is a normal case, not an error.
    async fn fetch_push_token(&self, user_id: i64) -> Result<Option<String>, FulfillmentError>;
}
