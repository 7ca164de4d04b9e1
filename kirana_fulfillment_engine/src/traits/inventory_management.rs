use crate::{
    db_types::{NewProduct, Product},
    traits::FulfillmentError,
};

/// The inventory ledger: per-product stock counts with conditional reserve/release operations.
///
/// `Product.stock` is the one shared mutable resource contended by concurrent order creations.
/// It is protected exclusively by [`reserve_stock`](InventoryManagement::reserve_stock)'s
/// atomic conditional decrement; no broader lock exists.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement: Clone {
    /// Adds a product to the ledger. Catalog management beyond this seeding entry point lives
    /// outside the engine.
    async fn add_product(&self, product: NewProduct) -> Result<Product, FulfillmentError>;

    /// Fetches a product. `None` if it does not exist.
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, FulfillmentError>;

    /// Reserves `quantity` units of the product: a single conditional decrement that succeeds
    /// only if `stock >= quantity`, applied as one statement at the storage layer.
    ///
    /// Fails with [`FulfillmentError::InsufficientStock`] (carrying the available count) or
    /// [`FulfillmentError::ProductNotFound`]. Returns the product as it is after the decrement.
    async fn reserve_stock(&self, product_id: i64, quantity: i64) -> Result<Product, FulfillmentError>;

    /// Returns `quantity` units to the shelf (compensating restock).
    ///
    /// Used by the reservation saga's rollback and by the order-delete/refund path. If the
    /// product no longer exists this is **not** an error: the release is logged and `None` is
    /// returned.
    async fn release_stock(&self, product_id: i64, quantity: i64) -> Result<Option<Product>, FulfillmentError>;
}
