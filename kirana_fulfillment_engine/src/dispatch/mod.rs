//! # Notification dispatch coordinator
//!
//! Turns transition events into durable notification records plus best-effort push delivery.
//!
//! The coordinator sits on the consumer end of the event channels: fulfilment flows publish
//! events and carry on; the handler task hands each event to
//! [`NotificationDispatcher::dispatch_event`] here. For each recipient the coordinator
//!
//! 1. persists a notification record (the durable step - a crash between the transition commit
//!    and this insert loses at most the notification, never the transition; that at-most-once
//!    window is the accepted cost of dispatching off the request path),
//! 2. looks up the recipient's push token (absence is normal and just skips delivery),
//! 3. attempts push delivery through the [`PushNotifier`], logging failures.
//!
//! Nothing in here ever propagates an error back to the operation that triggered the event:
//! the fulfilment transition has already committed, and a notification problem must not undo
//! it. Recipients are dispatched independently, so one recipient's failure cannot block
//! another's.
use std::collections::HashMap;

use log::*;

use crate::{
    db_types::{NewNotification, Notification},
    events::EventType,
    traits::{DeliveryResult, NotificationManagement, PushNotifier},
};

#[cfg(feature = "sqlite")]
mod wiring;

#[cfg(feature = "sqlite")]
pub use wiring::create_dispatch_handlers;

pub const DISPATCH_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone)]
pub struct NotificationDispatcher<B, N> {
    db: B,
    notifier: N,
}

impl<B, N> NotificationDispatcher<B, N>
where
    B: NotificationManagement,
    N: PushNotifier,
{
    pub fn new(db: B, notifier: N) -> Self {
        Self { db, notifier }
    }

    /// Dispatches every notification an event renders to, one recipient at a time.
    pub async fn dispatch_event(&self, event: EventType) {
        for note in event.notifications() {
            let _ = self.dispatch(note).await;
        }
    }

    /// Dispatches a single notification: persist, then best-effort push.
    ///
    /// Returns the persisted record, or `None` if even the persist step failed (which is
    /// logged and swallowed - see the module docs for why).
    pub async fn dispatch(&self, note: NewNotification) -> Option<Notification> {
        let recipient = note.recipient_id;
        let kind = note.kind;
        let saved = match self.db.insert_notification(note).await {
            Ok(saved) => saved,
            Err(e) => {
                error!("🛎️ Failed to persist {kind} notification for user {recipient}: {e}");
                return None;
            },
        };
        let token = match self.db.fetch_push_token(recipient).await {
            Ok(token) => token,
            Err(e) => {
                warn!("🛎️ Could not look up a push token for user {recipient}: {e}. Skipping push delivery.");
                None
            },
        };
        let Some(token) = token else {
            debug!("🛎️ User {recipient} has no push token registered. Skipping push delivery.");
            return Some(saved);
        };
        let data = push_data(&saved);
        match self.notifier.send(&token, &saved.title, &saved.message, &data).await {
            DeliveryResult::Delivered => {
                debug!("🛎️ Push for notification {} delivered to user {recipient}", saved.id);
            },
            DeliveryResult::Failed(reason) => {
                warn!(
                    "🛎️ Push for notification {} to user {recipient} failed: {reason}. The record remains \
                     available for polling.",
                    saved.id
                );
            },
        }
        Some(saved)
    }
}

/// Client-side deep-link payload attached to the push message.
fn push_data(note: &Notification) -> HashMap<String, String> {
    let mut data = HashMap::new();
    data.insert("kind".to_string(), note.kind.to_string());
    if let Some(order_id) = note.order_id {
        data.insert("orderId".to_string(), order_id.to_string());
    }
    if let Some(item_id) = note.pantry_item_id {
        data.insert("pantryItemId".to_string(), item_id.to_string());
    }
    if let Some(shop_id) = note.shop_id {
        data.insert("shopId".to_string(), shop_id.to_string());
    }
    data
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;
    use sqlx::types::Json;

    use super::*;
    use crate::{
        db_types::NotificationType,
        traits::{FulfillmentError, NullNotifier},
    };

    /// In-memory notification store so the coordinator can be exercised without a database.
    #[derive(Clone, Default)]
    struct MemoryStore {
        records: Arc<Mutex<Vec<Notification>>>,
        push_token: Option<String>,
    }

    impl MemoryStore {
        fn with_token(token: &str) -> Self {
            Self { push_token: Some(token.to_string()), ..Default::default() }
        }

        fn count(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    impl NotificationManagement for MemoryStore {
        async fn insert_notification(&self, note: NewNotification) -> Result<Notification, FulfillmentError> {
            let mut records = self.records.lock().unwrap();
            let saved = Notification {
                id: records.len() as i64 + 1,
                recipient_id: note.recipient_id,
                sender_id: note.sender_id,
                shop_id: note.shop_id,
                order_id: note.order_id,
                pantry_item_id: note.pantry_item_id,
                kind: note.kind,
                title: note.title,
                message: note.message,
                is_read: false,
                action_required: note.action_required,
                metadata: Json(note.metadata),
                created_at: Utc::now(),
            };
            records.push(saved.clone());
            Ok(saved)
        }

        async fn notifications_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<Notification>, FulfillmentError> {
            let records = self.records.lock().unwrap();
            Ok(records.iter().filter(|n| n.recipient_id == user_id).take(limit as usize).cloned().collect())
        }

        async fn unread_count(&self, user_id: i64) -> Result<i64, FulfillmentError> {
            let records = self.records.lock().unwrap();
            Ok(records.iter().filter(|n| n.recipient_id == user_id && !n.is_read).count() as i64)
        }

        async fn mark_as_read(&self, notification_id: i64, user_id: i64) -> Result<Notification, FulfillmentError> {
            let mut records = self.records.lock().unwrap();
            let note = records
                .iter_mut()
                .find(|n| n.id == notification_id && n.recipient_id == user_id)
                .ok_or(FulfillmentError::NotificationNotFound(notification_id))?;
            note.is_read = true;
            Ok(note.clone())
        }

        async fn delete_notification(&self, notification_id: i64, user_id: i64) -> Result<(), FulfillmentError> {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|n| !(n.id == notification_id && n.recipient_id == user_id));
            if records.len() == before {
                return Err(FulfillmentError::NotificationNotFound(notification_id));
            }
            Ok(())
        }

        async fn fetch_push_token(&self, _user_id: i64) -> Result<Option<String>, FulfillmentError> {
            Ok(self.push_token.clone())
        }
    }

    /// A notifier that always fails delivery.
    #[derive(Clone, Default)]
    struct UnreachableNotifier;

    impl PushNotifier for UnreachableNotifier {
        async fn send(&self, _: &str, _: &str, _: &str, _: &HashMap<String, String>) -> DeliveryResult {
            DeliveryResult::Failed("connection refused".to_string())
        }
    }

    fn note_for(recipient: i64) -> NewNotification {
        NewNotification::new(recipient, NotificationType::OrderConfirmed, "✅ Order Confirmed", "On its way")
    }

    #[tokio::test]
    async fn record_is_persisted_when_push_fails() {
        let store = MemoryStore::with_token("device-1");
        let dispatcher = NotificationDispatcher::new(store.clone(), UnreachableNotifier);
        let saved = dispatcher.dispatch(note_for(3)).await;
        assert!(saved.is_some());
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn missing_push_token_is_not_an_error() {
        let store = MemoryStore::default();
        let dispatcher = NotificationDispatcher::new(store.clone(), NullNotifier);
        let saved = dispatcher.dispatch(note_for(3)).await.expect("record should persist");
        assert_eq!(saved.recipient_id, 3);
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn one_failing_recipient_does_not_block_another() {
        let store = MemoryStore::with_token("device-1");
        let dispatcher = NotificationDispatcher::new(store.clone(), UnreachableNotifier);
        dispatcher.dispatch(note_for(1)).await;
        dispatcher.dispatch(note_for(2)).await;
        assert_eq!(store.count(), 2);
    }
}
