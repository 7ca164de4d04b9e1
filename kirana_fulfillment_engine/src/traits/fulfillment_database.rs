use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderStatusType, RefillStatusType, Shop, User};

/// This trait defines the order-workflow storage contract for backends supporting the
/// fulfilment engine.
///
/// The behaviour includes:
/// * Creating orders, which runs the per-item stock reservation saga and freezes customer
///   contact details onto the record.
/// * Guarded status updates, so that two concurrent transitions on the same order cannot both
///   succeed.
/// * Compensating deletion, which returns reserved stock to the shelf.
#[allow(async_fn_in_trait)]
pub trait FulfillmentDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Creates a new order in `Pending` status.
    ///
    /// In order:
    /// * the customer's contact details are resolved and frozen onto the order,
    /// * stock is reserved for each item via the inventory ledger's conditional decrement. The
    ///   loop is **not** atomic across items: if item k cannot be reserved, items 1..k-1 are
    ///   released again (in reverse order) before the error is returned,
    /// * the order and its item lines are inserted in a single transaction.
    ///
    /// The total amount is computed from the item lines; callers cannot supply it.
    async fn create_order(&self, order: NewOrder) -> Result<Order, FulfillmentError>;

    /// Fetches an order with its item lines. `None` if no such order exists.
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, FulfillmentError>;

    /// All orders placed by the given customer, newest first.
    async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, FulfillmentError>;

    /// All orders placed against the given shop, newest first.
    async fn orders_for_shop(&self, shop_id: i64) -> Result<Vec<Order>, FulfillmentError>;

    /// Moves an order from `from` to `to`, guarded by the expected current status.
    ///
    /// Returns `None` if the order no longer has status `from` (either it does not exist, or a
    /// concurrent transition won). Legality of the `(from, to)` pair is the caller's
    /// responsibility; this method only enforces the guard.
    async fn update_order_status(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Option<Order>, FulfillmentError>;

    /// Deletes an order, releasing the stock of every item line first.
    ///
    /// This is an administrative/compensating action. The release tolerates products that no
    /// longer exist (logged and skipped). Returns the deleted order.
    async fn delete_order(&self, order_id: i64) -> Result<Order, FulfillmentError>;

    /// Fetches the shop record (for owner routing of notifications).
    async fn fetch_shop(&self, shop_id: i64) -> Result<Option<Shop>, FulfillmentError>;

    /// Fetches the user record (for contact freezing and notification routing).
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, FulfillmentError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), FulfillmentError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum FulfillmentError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Pantry item {0} does not exist")]
    PantryItemNotFound(i64),
    #[error("Customer {0} does not exist")]
    CustomerNotFound(i64),
    #[error("Shop {0} does not exist")]
    ShopNotFound(i64),
    #[error("Notification {0} does not exist")]
    NotificationNotFound(i64),
    #[error("Insufficient stock for {name}. Only {available} available.")]
    InsufficientStock { product_id: i64, name: String, available: i64 },
    #[error("An order cannot move from {from} to {to}")]
    InvalidOrderTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("A refill cannot move from {from} to {to}")]
    InvalidRefillTransition { from: RefillStatusType, to: RefillStatusType },
    #[error("This item is already in the pantry")]
    DuplicatePantryItem,
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for FulfillmentError {
    fn from(e: sqlx::Error) -> Self {
        FulfillmentError::DatabaseError(e.to_string())
    }
}
