//! Kirana Fulfilment Engine
//!
//! The fulfilment engine is the core of the Kirana grocery-delivery marketplace: it reserves
//! inventory for multi-item orders, drives orders and pantry-refill requests through their
//! status state machines, and fans out notifications to the right stakeholders on every
//! transition. This library is transport-agnostic; the HTTP layer sits on top of it.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You
//!    should never need to access the database directly; instead, use the public APIs. The
//!    exception is the data types used in the database, which are defined in the [`db_types`]
//!    module and are public.
//! 2. The engine public API ([`mod@kfe_api`]). [`OrderFlowApi`] and [`PantryFlowApi`] drive
//!    the two fulfilment workflows, and [`NotificationApi`] is the recipient-facing read side
//!    of the notification store. Backends implement the traits in [`mod@traits`] to support
//!    these APIs.
//! 3. Transition events and notification dispatch ([`mod@events`], [`mod@dispatch`]). Every
//!    successful fulfilment transition emits an event. A simple actor framework lets you hook
//!    into these events; [`dispatch::create_dispatch_handlers`] wires in the standard
//!    notification dispatch coordinator, which persists a notification record per recipient
//!    and attempts best-effort push delivery without ever failing the transition that caused
//!    it.
mod db;

pub mod db_types;
pub mod dispatch;
pub mod events;
pub mod kfe_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
#[cfg(feature = "sqlite")]
pub use dispatch::create_dispatch_handlers;
pub use dispatch::NotificationDispatcher;
pub use kfe_api::{
    notification_api::NotificationApi,
    order_flow_api::OrderFlowApi,
    pantry_flow_api::PantryFlowApi,
};
pub use traits::{
    DeliveryResult,
    FulfillmentDatabase,
    FulfillmentError,
    InventoryManagement,
    NotificationManagement,
    NullNotifier,
    PantryManagement,
    PushNotifier,
};
