//! Core data types shared by the storage layer and the public APIs.
//!
//! Status enums carry their transition tables as methods ([`OrderStatusType::successors`],
//! [`RefillStatusType::successors`]). Anything absent from those tables is an illegal transition,
//! and the storage layer re-checks the expected current status in its UPDATE guards.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use kdm_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been placed and stock has been reserved for every item.
    Pending,
    /// The shopkeeper has accepted the order.
    Confirmed,
    /// The order has left the shop.
    Shipped,
    /// The order has reached the customer. Terminal.
    Delivered,
    /// The order was cancelled by the customer or the shopkeeper. Terminal.
    Cancelled,
}

impl OrderStatusType {
    /// The set of statuses this status may legally move to.
    pub fn successors(self) -> &'static [OrderStatusType] {
        use OrderStatusType::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Shipped, Cancelled],
            Shipped => &[Delivered, Cancelled],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatusType) -> bool {
        self.successors().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Pending => "PENDING",
            OrderStatusType::Confirmed => "CONFIRMED",
            OrderStatusType::Shipped => "SHIPPED",
            OrderStatusType::Delivered => "DELIVERED",
            OrderStatusType::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    /// Parses a status, normalising first: surrounding whitespace is trimmed and the
    /// comparison is case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(ConversionError(format!("Invalid order status: {other}"))),
        }
    }
}

//--------------------------------------   RefillStatusType    -------------------------------------------------------
/// Pantry refill lifecycle. Unlike orders, this is a ring, not a DAG: a delivered refill resets
/// the item back to `Stocked` and the cycle begins again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefillStatusType {
    /// The consumer has enough packs on hand.
    Stocked,
    /// Consumption dropped the pack count to the refill threshold or below.
    Low,
    /// The consumer has asked the shop for a refill.
    RefillRequested,
    /// The shopkeeper has accepted the refill request.
    Confirmed,
    /// The refill has left the shop.
    OutForDelivery,
    /// The refill arrived. Transient: delivery immediately stores `Stocked` with a full pack count.
    Delivered,
}

impl RefillStatusType {
    pub fn successors(self) -> &'static [RefillStatusType] {
        use RefillStatusType::*;
        match self {
            Stocked => &[Low, RefillRequested],
            Low => &[RefillRequested],
            RefillRequested => &[Confirmed],
            Confirmed => &[OutForDelivery],
            OutForDelivery => &[Delivered],
            Delivered => &[Stocked],
        }
    }

    pub fn can_transition_to(self, next: RefillStatusType) -> bool {
        self.successors().contains(&next)
    }

    /// A refill may be requested while the item is `Stocked` or `Low`.
    pub fn can_request_refill(self) -> bool {
        matches!(self, RefillStatusType::Stocked | RefillStatusType::Low)
    }
}

impl Display for RefillStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RefillStatusType::Stocked => "STOCKED",
            RefillStatusType::Low => "LOW",
            RefillStatusType::RefillRequested => "REFILL_REQUESTED",
            RefillStatusType::Confirmed => "CONFIRMED",
            RefillStatusType::OutForDelivery => "OUT_FOR_DELIVERY",
            RefillStatusType::Delivered => "DELIVERED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RefillStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STOCKED" => Ok(Self::Stocked),
            "LOW" => Ok(Self::Low),
            "REFILL_REQUESTED" => Ok(Self::RefillRequested),
            "CONFIRMED" => Ok(Self::Confirmed),
            "OUT_FOR_DELIVERY" => Ok(Self::OutForDelivery),
            "DELIVERED" => Ok(Self::Delivered),
            other => Err(ConversionError(format!("Invalid refill status: {other}"))),
        }
    }
}

//--------------------------------------    DeliveryAddress    -------------------------------------------------------
/// A delivery address. `area`, `city` and `pincode` are required for fulfilment; the rest is
/// courier detail.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub flat: Option<String>,
    pub street: Option<String>,
    pub area: String,
    pub landmark: Option<String>,
    pub city: String,
    pub pincode: String,
}

impl DeliveryAddress {
    pub fn new<S1: Into<String>, S2: Into<String>, S3: Into<String>>(area: S1, city: S2, pincode: S3) -> Self {
        Self { area: area.into(), city: city.into(), pincode: pincode.into(), ..Default::default() }
    }

    /// True when every required component is present and non-blank.
    pub fn is_complete(&self) -> bool {
        !(self.area.trim().is_empty() || self.city.trim().is_empty() || self.pincode.trim().is_empty())
    }
}

impl Display for DeliveryAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {} {}", self.area, self.city, self.pincode)
    }
}

//--------------------------------------    CustomerContact    -------------------------------------------------------
/// Contact details frozen onto an order at creation time, so later profile edits do not
/// rewrite order history.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CustomerContact {
    #[sqlx(rename = "contact_name")]
    pub name: String,
    #[sqlx(rename = "contact_email")]
    pub email: String,
    #[sqlx(rename = "contact_phone")]
    pub phone: Option<String>,
}

//--------------------------------------        Product        -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub shop_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub price: Money,
    /// Available stock. Never negative; mutated only through the inventory ledger.
    pub stock: i64,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub shop_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub price: Money,
    pub stock: i64,
    pub unit: Option<String>,
}

impl NewProduct {
    pub fn new<S: Into<String>>(shop_id: i64, name: S, price: Money, stock: i64) -> Self {
        Self { shop_id, name: name.into(), category: None, price, stock, unit: None }
    }
}

//--------------------------------------       OrderItem       -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: i64,
    /// Product name frozen at order time, used for notification summaries.
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewOrderItem {
    pub fn new(product_id: i64, quantity: i64, unit_price: Money) -> Self {
        Self { product_id, quantity, unit_price }
    }
}

//--------------------------------------         Order         -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub shop_id: i64,
    /// Computed by the engine as the sum of item line totals.
    pub total_amount: Money,
    pub status: OrderStatusType,
    #[sqlx(flatten)]
    pub delivery_address: DeliveryAddress,
    #[sqlx(flatten)]
    pub customer_contact: CustomerContact,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Loaded separately from the `order_items` table.
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// A human summary of the item lines, e.g. "2 x Toor Dal, 1 x Ghee".
    pub fn items_summary(&self) -> String {
        self.items.iter().map(|i| format!("{} x {}", i.quantity, i.product_name)).collect::<Vec<_>>().join(", ")
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: i64,
    pub shop_id: i64,
    pub items: Vec<NewOrderItem>,
    pub delivery_address: DeliveryAddress,
}

impl NewOrder {
    pub fn new(customer_id: i64, shop_id: i64, items: Vec<NewOrderItem>, delivery_address: DeliveryAddress) -> Self {
        Self { customer_id, shop_id, items, delivery_address }
    }

    pub fn total_amount(&self) -> Money {
        self.items.iter().map(|i| i.unit_price * i.quantity).sum()
    }
}

//--------------------------------------      PantryItem       -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PantryItem {
    pub id: i64,
    pub user_id: i64,
    pub shop_id: i64,
    pub product_id: i64,
    /// Product name frozen when the item was added to the pantry.
    pub product_name: String,
    pub brand_name: Option<String>,
    pub quantity_per_pack: i64,
    pub unit: String,
    pub packs_owned: i64,
    pub current_packs: i64,
    pub refill_threshold: i64,
    pub price: Money,
    pub status: RefillStatusType,
    pub last_refilled: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPantryItem {
    pub user_id: i64,
    pub shop_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub brand_name: Option<String>,
    pub quantity_per_pack: i64,
    pub unit: String,
    pub packs_owned: i64,
    pub refill_threshold: i64,
    pub price: Money,
}

impl NewPantryItem {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        user_id: i64,
        shop_id: i64,
        product_id: i64,
        product_name: S1,
        quantity_per_pack: i64,
        unit: S2,
        packs_owned: i64,
        price: Money,
    ) -> Self {
        Self {
            user_id,
            shop_id,
            product_id,
            product_name: product_name.into(),
            brand_name: None,
            quantity_per_pack,
            unit: unit.into(),
            packs_owned,
            refill_threshold: 1,
            price,
        }
    }

    pub fn with_brand<S: Into<String>>(mut self, brand: S) -> Self {
        self.brand_name = Some(brand.into());
        self
    }

    pub fn with_refill_threshold(mut self, threshold: i64) -> Self {
        self.refill_threshold = threshold;
        self
    }
}

//--------------------------------------       User/Shop       -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Consumer,
    Shopkeeper,
}

/// The slice of a user record the engine reads. The engine never writes users.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub address: Option<String>,
    /// Push-delivery token for the user's device, if one has been registered.
    pub push_token: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Shop {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
}

//--------------------------------------    NotificationType   -------------------------------------------------------
/// Closed enum of notification kinds, one per triggering transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// A new order was placed (addressed to the shop owner).
    Order,
    OrderConfirmed,
    OrderShipped,
    OrderDelivered,
    OrderCancelled,
    /// A pantry refill was requested (addressed to the shop owner).
    RefillRequest,
    RefillConfirmed,
    OutForDelivery,
    Delivered,
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationType::Order => "ORDER",
            NotificationType::OrderConfirmed => "ORDER_CONFIRMED",
            NotificationType::OrderShipped => "ORDER_SHIPPED",
            NotificationType::OrderDelivered => "ORDER_DELIVERED",
            NotificationType::OrderCancelled => "ORDER_CANCELLED",
            NotificationType::RefillRequest => "REFILL_REQUEST",
            NotificationType::RefillConfirmed => "REFILL_CONFIRMED",
            NotificationType::OutForDelivery => "OUT_FOR_DELIVERY",
            NotificationType::Delivered => "DELIVERED",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------      Notification     -------------------------------------------------------
/// Structured context attached to a notification for client-side rendering and deep links.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<String>,
}

/// A durable notification record. Created only by the dispatch coordinator; only `is_read` is
/// ever mutated afterwards. There is no referential-integrity enforcement back onto the
/// originating entity - this is a denormalised delivery/audit record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub sender_id: Option<i64>,
    pub shop_id: Option<i64>,
    pub order_id: Option<i64>,
    pub pantry_item_id: Option<i64>,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub action_required: bool,
    pub metadata: Json<NotificationMetadata>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: i64,
    pub sender_id: Option<i64>,
    pub shop_id: Option<i64>,
    pub order_id: Option<i64>,
    pub pantry_item_id: Option<i64>,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub action_required: bool,
    pub metadata: NotificationMetadata,
}

impl NewNotification {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        recipient_id: i64,
        kind: NotificationType,
        title: S1,
        message: S2,
    ) -> Self {
        Self {
            recipient_id,
            sender_id: None,
            shop_id: None,
            order_id: None,
            pantry_item_id: None,
            kind,
            title: title.into(),
            message: message.into(),
            action_required: false,
            metadata: NotificationMetadata::default(),
        }
    }
}
