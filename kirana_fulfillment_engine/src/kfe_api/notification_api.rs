use std::fmt::Debug;

use crate::{
    db_types::Notification,
    traits::{FulfillmentError, NotificationManagement},
};

/// How many notifications a recipient sees per fetch.
pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 50;

/// Recipient-facing read side of the notification store.
///
/// Records are owned by their recipient: every operation here is scoped to the requesting
/// user, and a record belonging to someone else behaves as if it did not exist.
pub struct NotificationApi<B> {
    db: B,
}

impl<B> Debug for NotificationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationApi")
    }
}

impl<B> NotificationApi<B>
where B: NotificationManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The user's most recent notifications, newest first.
    pub async fn notifications_for_user(&self, user_id: i64) -> Result<Vec<Notification>, FulfillmentError> {
        self.db.notifications_for_user(user_id, DEFAULT_NOTIFICATION_LIMIT).await
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<i64, FulfillmentError> {
        self.db.unread_count(user_id).await
    }

    pub async fn mark_as_read(&self, notification_id: i64, user_id: i64) -> Result<Notification, FulfillmentError> {
        self.db.mark_as_read(notification_id, user_id).await
    }

    pub async fn delete_notification(&self, notification_id: i64, user_id: i64) -> Result<(), FulfillmentError> {
        self.db.delete_notification(notification_id, user_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
