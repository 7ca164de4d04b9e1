//! Wires the dispatch coordinator into the fulfilment event hooks.
use crate::{
    dispatch::{NotificationDispatcher, DISPATCH_EVENT_BUFFER_SIZE},
    events::{EventHandlers, EventHooks},
    traits::PushNotifier,
    SqliteDatabase,
};

/// Assigns a notification-dispatching handler to every fulfilment event.
///
/// The returned [`EventHandlers`] still needs to be started
/// ([`EventHandlers::start_handlers`]) and its [`EventHandlers::producers`] handed to the flow
/// APIs. Typical setup:
///
/// ```rust,ignore
/// let db = SqliteDatabase::new(25).await?;
/// let handlers = create_dispatch_handlers(db.clone(), notifier);
/// let api = OrderFlowApi::new(db, handlers.producers());
/// handlers.start_handlers().await;
/// ```
pub fn create_dispatch_handlers<N: PushNotifier>(db: SqliteDatabase, notifier: N) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let dispatcher = NotificationDispatcher::new(db, notifier);
    let d = dispatcher.clone();
    hooks.on_order_placed(move |ev| {
        let d = d.clone();
        Box::pin(async move { d.dispatch_event(ev.into()).await })
    });
    let d = dispatcher.clone();
    hooks.on_order_status_changed(move |ev| {
        let d = d.clone();
        Box::pin(async move { d.dispatch_event(ev.into()).await })
    });
    let d = dispatcher.clone();
    hooks.on_refill_requested(move |ev| {
        let d = d.clone();
        Box::pin(async move { d.dispatch_event(ev.into()).await })
    });
    let d = dispatcher;
    hooks.on_refill_status_changed(move |ev| {
        let d = d.clone();
        Box::pin(async move { d.dispatch_event(ev.into()).await })
    });
    EventHandlers::new(DISPATCH_EVENT_BUFFER_SIZE, hooks)
}
