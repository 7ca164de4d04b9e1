use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, Order, OrderStatusType, Shop},
    events::{EventProducers, OrderPlacedEvent, OrderStatusChangedEvent},
    traits::{FulfillmentDatabase, FulfillmentError},
};

/// `OrderFlowApi` is the primary API for driving orders through their lifecycle: placement,
/// status advancement, and compensating deletion.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: FulfillmentDatabase
{
    /// Places a new order.
    ///
    /// The delivery address (area, city, pincode) and item quantities are validated before
    /// anything is touched. The shop is resolved up front - both to reject unknown shops
    /// before any mutation and to route the [`OrderPlacedEvent`] to its owner afterwards.
    /// Stock reservation and the compensating rollback on partial failure happen inside
    /// [`FulfillmentDatabase::create_order`]; on full success the order lands in `Pending`
    /// status and the shop owner is notified.
    pub async fn place_order(&self, order: NewOrder) -> Result<Order, FulfillmentError> {
        validate_new_order(&order)?;
        let shop =
            self.db.fetch_shop(order.shop_id).await?.ok_or(FulfillmentError::ShopNotFound(order.shop_id))?;
        let order = self.db.create_order(order).await?;
        debug!("📦️ Order {} placed by customer {} at shop {}", order.id, order.customer_id, shop.id);
        self.call_order_placed_hook(&order, &shop).await;
        Ok(order)
    }

    async fn call_order_placed_hook(&self, order: &Order, shop: &Shop) {
        for emitter in &self.producers.order_placed_producer {
            debug!("📦️ Notifying order placed hook subscribers");
            let event = OrderPlacedEvent::new(order.clone(), shop.clone());
            emitter.publish_event(event).await;
        }
    }

    /// Advances an order to `new_status`.
    ///
    /// The target must be a legal successor of the order's current status per
    /// [`OrderStatusType::successors`]; anything else fails with
    /// [`FulfillmentError::InvalidOrderTransition`] and mutates nothing. Textual status input
    /// is normalised by [`OrderStatusType::from_str`](std::str::FromStr) (trimmed,
    /// case-folded) before it reaches this method.
    ///
    /// On success the customer is sent a status-specific notification via the
    /// [`OrderStatusChangedEvent`] hook.
    pub async fn advance_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
    ) -> Result<Order, FulfillmentError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(FulfillmentError::OrderNotFound(order_id))?;
        let current = order.status;
        if !current.can_transition_to(new_status) {
            return Err(FulfillmentError::InvalidOrderTransition { from: current, to: new_status });
        }
        let updated = match self.db.update_order_status(order_id, current, new_status).await? {
            Some(order) => order,
            None => {
                // A concurrent transition won the race between our fetch and the guarded
                // update. Report against whatever the status is now.
                let fresh =
                    self.db.fetch_order(order_id).await?.ok_or(FulfillmentError::OrderNotFound(order_id))?;
                return Err(FulfillmentError::InvalidOrderTransition { from: fresh.status, to: new_status });
            },
        };
        debug!("📦️ Order {} moved from {current} to {}", updated.id, updated.status);
        let shop = self
            .db
            .fetch_shop(updated.shop_id)
            .await?
            .ok_or(FulfillmentError::ShopNotFound(updated.shop_id))?;
        self.call_status_changed_hook(&updated, current, &shop).await;
        Ok(updated)
    }

    async fn call_status_changed_hook(&self, order: &Order, previous: OrderStatusType, shop: &Shop) {
        for emitter in &self.producers.order_status_changed_producer {
            debug!("📦️ Notifying status changed hook subscribers");
            let event = OrderStatusChangedEvent::new(order.clone(), previous, shop.clone());
            emitter.publish_event(event).await;
        }
    }

    /// Deletes an order, returning its reserved stock to the shelf first.
    ///
    /// This is an administrative/compensating action and emits no notification; callers that
    /// want one must dispatch it themselves.
    pub async fn delete_order(&self, order_id: i64) -> Result<Order, FulfillmentError> {
        let order = self.db.delete_order(order_id).await?;
        info!("📦️ Order {order_id} deleted and its stock released");
        Ok(order)
    }

    pub async fn order_by_id(&self, order_id: i64) -> Result<Option<Order>, FulfillmentError> {
        self.db.fetch_order(order_id).await
    }

    pub async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, FulfillmentError> {
        self.db.orders_for_customer(customer_id).await
    }

    pub async fn orders_for_shop(&self, shop_id: i64) -> Result<Vec<Order>, FulfillmentError> {
        self.db.orders_for_shop(shop_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

fn validate_new_order(order: &NewOrder) -> Result<(), FulfillmentError> {
    if !order.delivery_address.is_complete() {
        return Err(FulfillmentError::ValidationError(
            "Complete delivery address (area, city, pincode) is required".to_string(),
        ));
    }
    if order.items.is_empty() {
        return Err(FulfillmentError::ValidationError("An order needs at least one item".to_string()));
    }
    if let Some(item) = order.items.iter().find(|i| i.quantity <= 0) {
        return Err(FulfillmentError::ValidationError(format!(
            "Quantity for product {} must be positive",
            item.product_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use kdm_common::Money;

    use super::*;
    use crate::db_types::{DeliveryAddress, NewOrderItem};

    fn items() -> Vec<NewOrderItem> {
        vec![NewOrderItem::new(1, 2, Money::from(9000))]
    }

    #[test]
    fn rejects_incomplete_address() {
        let order = NewOrder::new(1, 1, items(), DeliveryAddress::new("", "Bengaluru", "560034"));
        assert!(matches!(validate_new_order(&order), Err(FulfillmentError::ValidationError(_))));
        let order = NewOrder::new(1, 1, items(), DeliveryAddress::new("Koramangala", "Bengaluru", "  "));
        assert!(matches!(validate_new_order(&order), Err(FulfillmentError::ValidationError(_))));
    }

    #[test]
    fn rejects_empty_and_non_positive_items() {
        let order = NewOrder::new(1, 1, vec![], DeliveryAddress::new("Koramangala", "Bengaluru", "560034"));
        assert!(matches!(validate_new_order(&order), Err(FulfillmentError::ValidationError(_))));
        let order = NewOrder::new(
            1,
            1,
            vec![NewOrderItem::new(1, 0, Money::from(9000))],
            DeliveryAddress::new("Koramangala", "Bengaluru", "560034"),
        );
        assert!(matches!(validate_new_order(&order), Err(FulfillmentError::ValidationError(_))));
    }

    #[test]
    fn accepts_a_well_formed_order() {
        let order = NewOrder::new(1, 1, items(), DeliveryAddress::new("Koramangala", "Bengaluru", "560034"));
        assert!(validate_new_order(&order).is_ok());
    }
}
