use log::{debug, error, trace, warn};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrderItem, NewProduct, Product},
    traits::FulfillmentError,
};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, FulfillmentError> {
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (shop_id, name, category, price, stock, unit)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(product.shop_id)
    .bind(product.name)
    .bind(product.category)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.unit)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product [{}] added to the ledger with id {}", product.name, product.id);
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

/// Reserves `quantity` units of a product with a single conditional decrement.
///
/// The decrement and the stock check are one statement, so two concurrent reservations can
/// never both take the last unit. No row matching means either the product does not exist or
/// the stock is short; a follow-up fetch tells the two apart for the error report.
pub async fn reserve_stock(
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Product, FulfillmentError> {
    let reserved: Option<Product> = sqlx::query_as(
        "UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND stock >= $1 \
         RETURNING *",
    )
    .bind(quantity)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;
    match reserved {
        Some(product) => {
            trace!("🗃️ Reserved {quantity} x product #{product_id}. {} units remain.", product.stock);
            Ok(product)
        },
        None => match fetch_product(product_id, conn).await? {
            Some(product) => Err(FulfillmentError::InsufficientStock {
                product_id,
                name: product.name,
                available: product.stock,
            }),
            None => Err(FulfillmentError::ProductNotFound(product_id)),
        },
    }
}

/// Returns `quantity` units of a product to the shelf.
///
/// The compensating half of [`reserve_stock`]. A missing product is logged and skipped, never
/// an error: this path must always make forward progress during rollback and refunds.
pub async fn release_stock(
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, FulfillmentError> {
    let released: Option<Product> = sqlx::query_as(
        "UPDATE products SET stock = stock + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(quantity)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;
    match &released {
        Some(product) => trace!("🗃️ Released {quantity} x product #{product_id}. Stock is now {}.", product.stock),
        None => warn!("🗃️ Tried to release {quantity} x product #{product_id}, but it no longer exists. Continuing."),
    }
    Ok(released)
}

/// The multi-item reservation saga.
///
/// Items are reserved independently, in the order given; there is no transaction spanning the
/// loop. If item k cannot be reserved, items 1..k-1 are released again in reverse order before
/// the failure is returned, so a failed call leaves every stock count exactly where it started.
///
/// On success, returns the reserved products in item order (callers use these to freeze
/// product names onto the order lines).
pub async fn reserve_all(
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, FulfillmentError> {
    let mut reservation = StockReservation::default();
    for item in items {
        match reserve_stock(item.product_id, item.quantity, &mut *conn).await {
            Ok(product) => reservation.add(product, item.quantity),
            Err(e) => {
                debug!("🗃️ Reservation failed at product #{}. Rolling back {} prior reservation(s).",
                    item.product_id,
                    reservation.len()
                );
                reservation.rollback(conn).await;
                return Err(e);
            },
        }
    }
    Ok(reservation.into_products())
}

/// Releases stock for every item, in reverse order. Used by the explicit order-delete path and
/// by [`reserve_all`]'s internal rollback when a later step fails.
pub async fn release_all(items: &[(i64, i64)], conn: &mut SqliteConnection) {
    for (product_id, quantity) in items.iter().rev() {
        if let Err(e) = release_stock(*product_id, *quantity, &mut *conn).await {
            error!("🗃️ Failed to release {quantity} x product #{product_id} during compensation: {e}");
        }
    }
}

/// The successfully reserved prefix of a multi-item reservation, in reservation order.
#[derive(Default)]
struct StockReservation {
    products: Vec<Product>,
    reserved: Vec<(i64, i64)>,
}

impl StockReservation {
    fn add(&mut self, product: Product, quantity: i64) {
        self.reserved.push((product.id, quantity));
        self.products.push(product);
    }

    fn len(&self) -> usize {
        self.reserved.len()
    }

    async fn rollback(self, conn: &mut SqliteConnection) {
        release_all(&self.reserved, conn).await;
    }

    fn into_products(self) -> Vec<Product> {
        self.products
    }
}
