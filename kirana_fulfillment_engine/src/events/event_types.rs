//! Transition events and their notification templates.
//!
//! Events are pure value snapshots captured at transition time: they carry everything the
//! dispatch coordinator needs (recipient routing, names, counts), so rendering a notification
//! never re-reads state that a concurrent update may have moved on. Rendering lives here, on
//! the events themselves, which keeps it testable without any storage or notifier present.
use crate::db_types::{
    NewNotification,
    NotificationMetadata,
    NotificationType,
    Order,
    OrderStatusType,
    PantryItem,
    RefillStatusType,
    Shop,
    User,
};

//--------------------------------------    OrderPlacedEvent   -------------------------------------------------------
/// A new order was created in `Pending` status. Addressed to the shop owner.
#[derive(Debug, Clone)]
pub struct OrderPlacedEvent {
    pub order: Order,
    pub shop: Shop,
}

impl OrderPlacedEvent {
    pub fn new(order: Order, shop: Shop) -> Self {
        Self { order, shop }
    }

    pub fn notifications(&self) -> Vec<NewNotification> {
        let customer_name = self.order.customer_contact.name.clone();
        let items = self.order.items_summary();
        let mut note = NewNotification::new(
            self.shop.owner_id,
            NotificationType::Order,
            "🛒 New Order Received",
            format!("{customer_name} placed an order: {items}"),
        );
        note.sender_id = Some(self.order.customer_id);
        note.shop_id = Some(self.shop.id);
        note.order_id = Some(self.order.id);
        note.action_required = true;
        note.metadata = NotificationMetadata {
            customer_name: Some(customer_name),
            items: Some(items),
            address: Some(self.order.delivery_address.to_string()),
            ..Default::default()
        };
        vec![note]
    }
}

//------------------------------------ OrderStatusChangedEvent -------------------------------------------------------
/// An order moved to a new status. Addressed to the customer.
#[derive(Debug, Clone)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub previous: OrderStatusType,
    pub shop: Shop,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, previous: OrderStatusType, shop: Shop) -> Self {
        Self { order, previous, shop }
    }

    pub fn notifications(&self) -> Vec<NewNotification> {
        let shop_name = &self.shop.name;
        let template = match self.order.status {
            OrderStatusType::Confirmed => Some((
                NotificationType::OrderConfirmed,
                "✅ Order Confirmed".to_string(),
                format!("Your order from {shop_name} has been confirmed"),
            )),
            OrderStatusType::Shipped => Some((
                NotificationType::OrderShipped,
                "🚚 Order Shipped".to_string(),
                format!("Your order from {shop_name} is on its way!"),
            )),
            OrderStatusType::Delivered => Some((
                NotificationType::OrderDelivered,
                "📦 Delivered Successfully".to_string(),
                "Your order has been delivered. Thank you!".to_string(),
            )),
            OrderStatusType::Cancelled => Some((
                NotificationType::OrderCancelled,
                "❌ Order Cancelled".to_string(),
                format!("Your order from {shop_name} has been cancelled"),
            )),
            // An order never moves back to Pending, so there is no template for it.
            OrderStatusType::Pending => None,
        };
        let Some((kind, title, message)) = template else {
            return Vec::new();
        };
        let mut note = NewNotification::new(self.order.customer_id, kind, title, message);
        note.sender_id = Some(self.shop.owner_id);
        note.shop_id = Some(self.shop.id);
        note.order_id = Some(self.order.id);
        note.metadata = NotificationMetadata {
            customer_name: Some(self.order.customer_contact.name.clone()),
            items: Some(self.order.items_summary()),
            ..Default::default()
        };
        vec![note]
    }
}

//------------------------------------  RefillRequestedEvent   -------------------------------------------------------
/// A consumer asked for a pantry refill. Addressed to the shop owner.
///
/// The pack count in `item` is the value captured when the request was accepted, not a later
/// re-read, so concurrent consumption updates cannot skew the message.
#[derive(Debug, Clone)]
pub struct RefillRequestedEvent {
    pub item: PantryItem,
    pub customer: User,
    pub shop: Shop,
}

impl RefillRequestedEvent {
    pub fn new(item: PantryItem, customer: User, shop: Shop) -> Self {
        Self { item, customer, shop }
    }

    pub fn notifications(&self) -> Vec<NewNotification> {
        let mut note = NewNotification::new(
            self.shop.owner_id,
            NotificationType::RefillRequest,
            "🔔 Refill Request",
            format!(
                "{} needs {} refill ({} packs remaining)",
                self.customer.name, self.item.product_name, self.item.current_packs
            ),
        );
        note.sender_id = Some(self.item.user_id);
        note.shop_id = Some(self.shop.id);
        note.pantry_item_id = Some(self.item.id);
        note.action_required = true;
        note.metadata = NotificationMetadata {
            customer_name: Some(self.customer.name.clone()),
            product_name: Some(self.item.product_name.clone()),
            quantity: Some(self.item.current_packs),
            address: self.customer.address.clone(),
            ..Default::default()
        };
        vec![note]
    }
}

//----------------------------------- RefillStatusChangedEvent -------------------------------------------------------
/// A shopkeeper moved a refill along the ring. Addressed to the consumer.
///
/// `status` is the requested target; on delivery the stored item has already wrapped back to
/// `Stocked`, but the consumer is told about the delivery itself.
#[derive(Debug, Clone)]
pub struct RefillStatusChangedEvent {
    pub item: PantryItem,
    pub status: RefillStatusType,
    pub shop: Shop,
}

impl RefillStatusChangedEvent {
    pub fn new(item: PantryItem, status: RefillStatusType, shop: Shop) -> Self {
        Self { item, status, shop }
    }

    pub fn notifications(&self) -> Vec<NewNotification> {
        let product = &self.item.product_name;
        let template = match self.status {
            RefillStatusType::Confirmed => Some((
                NotificationType::RefillConfirmed,
                "✅ Order Confirmed".to_string(),
                format!("Your {product} refill has been confirmed by {}", self.shop.name),
            )),
            RefillStatusType::OutForDelivery => Some((
                NotificationType::OutForDelivery,
                "🚚 Out for Delivery".to_string(),
                format!("Your {product} is out for delivery!"),
            )),
            RefillStatusType::Delivered => Some((
                NotificationType::Delivered,
                "📦 Delivered Successfully".to_string(),
                format!("Your {product} has been delivered. Thank you!"),
            )),
            _ => None,
        };
        let Some((kind, title, message)) = template else {
            return Vec::new();
        };
        let mut note = NewNotification::new(self.item.user_id, kind, title, message);
        note.sender_id = Some(self.shop.owner_id);
        note.shop_id = Some(self.shop.id);
        note.pantry_item_id = Some(self.item.id);
        note.metadata = NotificationMetadata {
            product_name: Some(product.clone()),
            quantity: Some(self.item.current_packs),
            ..Default::default()
        };
        vec![note]
    }
}

//--------------------------------------      EventType        -------------------------------------------------------
/// All transition events, as one tagged type for consumers that handle every kind of event
/// uniformly (the dispatch coordinator does).
#[derive(Debug, Clone)]
pub enum EventType {
    OrderPlaced(OrderPlacedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    RefillRequested(RefillRequestedEvent),
    RefillStatusChanged(RefillStatusChangedEvent),
}

impl EventType {
    /// Renders the event into one notification per recipient.
    pub fn notifications(&self) -> Vec<NewNotification> {
        match self {
            EventType::OrderPlaced(ev) => ev.notifications(),
            EventType::OrderStatusChanged(ev) => ev.notifications(),
            EventType::RefillRequested(ev) => ev.notifications(),
            EventType::RefillStatusChanged(ev) => ev.notifications(),
        }
    }
}

impl From<OrderPlacedEvent> for EventType {
    fn from(ev: OrderPlacedEvent) -> Self {
        EventType::OrderPlaced(ev)
    }
}

impl From<OrderStatusChangedEvent> for EventType {
    fn from(ev: OrderStatusChangedEvent) -> Self {
        EventType::OrderStatusChanged(ev)
    }
}

impl From<RefillRequestedEvent> for EventType {
    fn from(ev: RefillRequestedEvent) -> Self {
        EventType::RefillRequested(ev)
    }
}

impl From<RefillStatusChangedEvent> for EventType {
    fn from(ev: RefillStatusChangedEvent) -> Self {
        EventType::RefillStatusChanged(ev)
    }
}
