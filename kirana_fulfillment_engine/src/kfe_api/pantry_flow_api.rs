use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewPantryItem, PantryItem, RefillStatusType},
    events::{EventProducers, RefillRequestedEvent, RefillStatusChangedEvent},
    traits::{FulfillmentDatabase, FulfillmentError, PantryManagement},
};

/// `PantryFlowApi` drives pantry items around the refill ring: consumption tracking on the
/// consumer side, refill requests, and status advancement on the shopkeeper side.
pub struct PantryFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for PantryFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PantryFlowApi")
    }
}

impl<B> PantryFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> PantryFlowApi<B>
where B: PantryManagement + FulfillmentDatabase
{
    /// Adds an item to a consumer's pantry. One item per (user, shop, product) triple; a
    /// duplicate fails with [`FulfillmentError::DuplicatePantryItem`].
    pub async fn add_pantry_item(&self, item: NewPantryItem) -> Result<PantryItem, FulfillmentError> {
        if item.quantity_per_pack <= 0 {
            return Err(FulfillmentError::ValidationError("Pack size must be positive".to_string()));
        }
        if item.packs_owned < 0 || item.refill_threshold < 0 {
            return Err(FulfillmentError::ValidationError(
                "Pack counts and the refill threshold cannot be negative".to_string(),
            ));
        }
        let item = self.db.add_pantry_item(item).await?;
        debug!("🧺️ Pantry item {} added for user {}", item.id, item.user_id);
        Ok(item)
    }

    /// Records a consumption update for a pantry item.
    ///
    /// Sets `current_packs` and applies the automatic status adjustment (`Stocked -> Low` at
    /// or below the threshold; a `Low` item corrected back above the threshold returns to
    /// `Stocked`). No notification is emitted - consumption is informational and surfaced via
    /// client polling.
    pub async fn record_consumption(&self, item_id: i64, current_packs: i64) -> Result<PantryItem, FulfillmentError> {
        if current_packs < 0 {
            return Err(FulfillmentError::ValidationError("Pack count cannot be negative".to_string()));
        }
        let item =
            self.db.fetch_pantry_item(item_id).await?.ok_or(FulfillmentError::PantryItemNotFound(item_id))?;
        if current_packs > item.packs_owned {
            return Err(FulfillmentError::ValidationError(format!(
                "Pack count {current_packs} cannot exceed the {} packs owned",
                item.packs_owned
            )));
        }
        let updated = self
            .db
            .record_consumption(item_id, current_packs)
            .await?
            .ok_or(FulfillmentError::PantryItemNotFound(item_id))?;
        trace!("🧺️ Pantry item {} now at {} packs ({})", updated.id, updated.current_packs, updated.status);
        Ok(updated)
    }

    /// Requests a refill for a pantry item.
    ///
    /// Legal from `Stocked` or `Low`. The [`RefillRequestedEvent`] sent to the shop owner
    /// carries the consumer identity, product name and remaining-pack count as captured by the
    /// guarded update, not a later re-read, so concurrent consumption updates cannot skew the
    /// request.
    pub async fn request_refill(&self, item_id: i64) -> Result<PantryItem, FulfillmentError> {
        let item = match self.db.mark_refill_requested(item_id).await? {
            Some(item) => item,
            None => {
                let fresh = self
                    .db
                    .fetch_pantry_item(item_id)
                    .await?
                    .ok_or(FulfillmentError::PantryItemNotFound(item_id))?;
                return Err(FulfillmentError::InvalidRefillTransition {
                    from: fresh.status,
                    to: RefillStatusType::RefillRequested,
                });
            },
        };
        debug!("🧺️ Refill requested for pantry item {} ({} packs remaining)", item.id, item.current_packs);
        let customer =
            self.db.fetch_user(item.user_id).await?.ok_or(FulfillmentError::CustomerNotFound(item.user_id))?;
        let shop = self.db.fetch_shop(item.shop_id).await?.ok_or(FulfillmentError::ShopNotFound(item.shop_id))?;
        for emitter in &self.producers.refill_requested_producer {
            let event = RefillRequestedEvent::new(item.clone(), customer.clone(), shop.clone());
            emitter.publish_event(event).await;
        }
        Ok(item)
    }

    /// Advances a refill along the ring: `Confirmed`, `OutForDelivery` or `Delivered`.
    ///
    /// Each target requires the item to currently sit at its predecessor; anything else fails
    /// with [`FulfillmentError::InvalidRefillTransition`]. Delivery closes the cycle: the
    /// stored status wraps back to `Stocked`, `current_packs` resets to `packs_owned` and
    /// `last_refilled` is stamped. The consumer is notified through the
    /// [`RefillStatusChangedEvent`] hook with a template for the requested stage.
    pub async fn advance_refill_status(
        &self,
        item_id: i64,
        new_status: RefillStatusType,
    ) -> Result<PantryItem, FulfillmentError> {
        if !matches!(
            new_status,
            RefillStatusType::Confirmed | RefillStatusType::OutForDelivery | RefillStatusType::Delivered
        ) {
            return Err(FulfillmentError::ValidationError(format!(
                "{new_status} is not a shopkeeper-driven refill stage"
            )));
        }
        let item =
            self.db.fetch_pantry_item(item_id).await?.ok_or(FulfillmentError::PantryItemNotFound(item_id))?;
        if !item.status.can_transition_to(new_status) {
            return Err(FulfillmentError::InvalidRefillTransition { from: item.status, to: new_status });
        }
        let updated = match self.db.advance_refill_status(item_id, item.status, new_status).await? {
            Some(item) => item,
            None => {
                let fresh = self
                    .db
                    .fetch_pantry_item(item_id)
                    .await?
                    .ok_or(FulfillmentError::PantryItemNotFound(item_id))?;
                return Err(FulfillmentError::InvalidRefillTransition { from: fresh.status, to: new_status });
            },
        };
        debug!("🧺️ Pantry item {} advanced to {new_status} (stored status {})", updated.id, updated.status);
        let shop =
            self.db.fetch_shop(updated.shop_id).await?.ok_or(FulfillmentError::ShopNotFound(updated.shop_id))?;
        for emitter in &self.producers.refill_status_changed_producer {
            let event = RefillStatusChangedEvent::new(updated.clone(), new_status, shop.clone());
            emitter.publish_event(event).await;
        }
        Ok(updated)
    }

    pub async fn item_by_id(&self, item_id: i64) -> Result<Option<PantryItem>, FulfillmentError> {
        self.db.fetch_pantry_item(item_id).await
    }

    pub async fn pantry_for_user(&self, user_id: i64) -> Result<Vec<PantryItem>, FulfillmentError> {
        self.db.pantry_for_user(user_id).await
    }

    /// The shopkeeper's worklist: refills requested, confirmed or out for delivery.
    pub async fn refill_requests_for_shop(&self, shop_id: i64) -> Result<Vec<PantryItem>, FulfillmentError> {
        self.db.refill_requests_for_shop(shop_id).await
    }

    pub async fn remove_pantry_item(&self, item_id: i64) -> Result<(), FulfillmentError> {
        self.db.remove_pantry_item(item_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
