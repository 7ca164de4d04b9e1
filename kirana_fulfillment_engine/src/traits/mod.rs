//! # Storage and collaborator boundaries
//!
//! This module defines the interface contracts that backends and external collaborators must
//! implement for the fulfilment engine.
//!
//! ## Traits
//!
//! * [`FulfillmentDatabase`] is the order-workflow storage contract: order creation (with the
//!   stock-reservation saga), guarded status updates, and compensating deletion.
//! * [`InventoryManagement`] is the inventory ledger: conditional stock reservation and the
//!   compensating release.
//! * [`PantryManagement`] covers the pantry-refill workflow storage.
//! * [`NotificationManagement`] persists and queries notification records and resolves
//!   push-delivery tokens.
//! * [`PushNotifier`] is the external push-delivery capability. It is non-throwing by
//!   construction: delivery outcomes are values, never errors.
mod fulfillment_database;
mod inventory_management;
mod notification_management;
mod notifier;
mod pantry_management;

pub use fulfillment_database::{FulfillmentDatabase, FulfillmentError};
pub use inventory_management::InventoryManagement;
pub use notification_management::NotificationManagement;
pub use notifier::{DeliveryResult, NullNotifier, PushNotifier};
pub use pantry_management::PantryManagement;
