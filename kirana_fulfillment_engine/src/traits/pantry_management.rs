use crate::{
    db_types::{NewPantryItem, PantryItem, RefillStatusType},
    traits::FulfillmentError,
};

/// Pantry-refill workflow storage.
///
/// Status changes are guarded updates: each method that moves an item's status names the
/// status(es) it expects to find, and returns `None` when the guard does not match, so that a
/// concurrent update loses cleanly rather than clobbering. Transition legality itself lives on
/// [`RefillStatusType`].
#[allow(async_fn_in_trait)]
pub trait PantryManagement: Clone {
    /// Adds an item to a consumer's pantry. At most one item may exist per
    /// (user, shop, product) triple; a duplicate fails with
    /// [`FulfillmentError::DuplicatePantryItem`].
    ///
    /// The new item starts `Stocked` with `current_packs = packs_owned`.
    async fn add_pantry_item(&self, item: NewPantryItem) -> Result<PantryItem, FulfillmentError>;

    /// Fetches a pantry item. `None` if it does not exist.
    async fn fetch_pantry_item(&self, item_id: i64) -> Result<Option<PantryItem>, FulfillmentError>;

    /// All pantry items belonging to the given consumer, most recently updated first.
    async fn pantry_for_user(&self, user_id: i64) -> Result<Vec<PantryItem>, FulfillmentError>;

    /// Records a consumption update: sets `current_packs` and applies the automatic status
    /// adjustment in the same statement (`Stocked -> Low` when the count reaches the refill
    /// threshold, `Low -> Stocked` when a correction raises it back above).
    ///
    /// Returns `None` if the item does not exist.
    async fn record_consumption(&self, item_id: i64, current_packs: i64)
        -> Result<Option<PantryItem>, FulfillmentError>;

    /// Moves an item to `RefillRequested`, guarded by the item currently being `Stocked` or
    /// `Low`. Returns `None` when the guard does not match.
    async fn mark_refill_requested(&self, item_id: i64) -> Result<Option<PantryItem>, FulfillmentError>;

    /// Moves an item from `from` to `to` along the refill ring, guarded by `from`.
    ///
    /// When `to` is [`RefillStatusType::Delivered`], delivery closes the cycle in the same
    /// statement: `current_packs` is reset to `packs_owned`, `last_refilled` is stamped, and
    /// the stored status becomes `Stocked`.
    async fn advance_refill_status(
        &self,
        item_id: i64,
        from: RefillStatusType,
        to: RefillStatusType,
    ) -> Result<Option<PantryItem>, FulfillmentError>;

    /// The shopkeeper's worklist: items for this shop in `RefillRequested`, `Confirmed` or
    /// `OutForDelivery`, most recently updated first.
    async fn refill_requests_for_shop(&self, shop_id: i64) -> Result<Vec<PantryItem>, FulfillmentError>;

    /// Removes an item from the pantry. Fails with [`FulfillmentError::PantryItemNotFound`]
    /// if it does not exist.
    async fn remove_pantry_item(&self, item_id: i64) -> Result<(), FulfillmentError>;
}
