//! # Fulfilment engine public API
//!
//! The `kfe_api` module exposes the programmatic API for the fulfilment engine. The API is
//! modular, so that clients can pick and choose the functionality they want: an HTTP layer
//! serving consumers might only construct a [`pantry_flow_api::PantryFlowApi`] and a
//! [`notification_api::NotificationApi`], while the shopkeeper-facing service also holds an
//! [`order_flow_api::OrderFlowApi`].
//!
//! * [`order_flow_api`] drives orders through their lifecycle: placement (with stock
//!   reservation), status advancement, and compensating deletion.
//! * [`pantry_flow_api`] drives pantry items around the refill ring: consumption tracking,
//!   refill requests, and shopkeeper-side status advancement.
//! * [`notification_api`] is the recipient-facing read side of the notification store.
//!
//! # API usage
//!
//! The pattern for all the APIs is the same. An API instance is created by supplying a
//! database backend that implements the traits the API requires, plus (for the flow APIs) the
//! producer ends of the event channels:
//!
//! ```rust,ignore
//! use kirana_fulfillment_engine::{create_dispatch_handlers, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new(25).await?;
//! let handlers = create_dispatch_handlers(db.clone(), notifier);
//! let api = OrderFlowApi::new(db, handlers.producers());
//! handlers.start_handlers().await;
//! let order = api.place_order(new_order).await?;
//! ```
pub mod notification_api;
pub mod order_flow_api;
pub mod pantry_flow_api;
