use kdm_common::Money;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{CustomerContact, NewOrder, Order, OrderItem, OrderStatusType},
    traits::FulfillmentError,
};

/// Inserts a new order and its item lines. This is not atomic on its own; callers embed it in
/// a transaction and pass `&mut *tx` as the connection argument.
///
/// `items` carries the product names frozen from the reservation step, and `total` has been
/// computed from the item lines.
pub async fn insert_order(
    order: &NewOrder,
    contact: &CustomerContact,
    items: &[OrderItem],
    total: Money,
    conn: &mut SqliteConnection,
) -> Result<Order, FulfillmentError> {
    let addr = &order.delivery_address;
    let mut inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                customer_id,
                shop_id,
                total_amount,
                status,
                flat,
                street,
                area,
                landmark,
                city,
                pincode,
                contact_name,
                contact_email,
                contact_phone
            ) VALUES ($1, $2, $3, 'PENDING', $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *;
        "#,
    )
    .bind(order.customer_id)
    .bind(order.shop_id)
    .bind(total)
    .bind(&addr.flat)
    .bind(&addr.street)
    .bind(&addr.area)
    .bind(&addr.landmark)
    .bind(&addr.city)
    .bind(&addr.pincode)
    .bind(&contact.name)
    .bind(&contact.email)
    .bind(&contact.phone)
    .fetch_one(&mut *conn)
    .await?;
    for item in items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price) VALUES ($1, $2, $3, \
             $4, $5)",
        )
        .bind(inserted.id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *conn)
        .await?;
    }
    inserted.items = items.to_vec();
    debug!("🗃️ Order inserted with id {} ({} item lines)", inserted.id, inserted.items.len());
    Ok(inserted)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, FulfillmentError> {
    let order: Option<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(&mut *conn).await?;
    match order {
        Some(mut order) => {
            order.items = fetch_order_items(order.id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as(
        "SELECT product_id, product_name, quantity, unit_price FROM order_items WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await
}

pub async fn orders_for_customer(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, FulfillmentError> {
    let orders: Vec<Order> = sqlx::query_as("SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at DESC")
        .bind(customer_id)
        .fetch_all(&mut *conn)
        .await?;
    attach_items(orders, conn).await
}

pub async fn orders_for_shop(shop_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, FulfillmentError> {
    let orders: Vec<Order> = sqlx::query_as("SELECT * FROM orders WHERE shop_id = $1 ORDER BY created_at DESC")
        .bind(shop_id)
        .fetch_all(&mut *conn)
        .await?;
    attach_items(orders, conn).await
}

async fn attach_items(mut orders: Vec<Order>, conn: &mut SqliteConnection) -> Result<Vec<Order>, FulfillmentError> {
    for order in &mut orders {
        order.items = fetch_order_items(order.id, conn).await?;
    }
    Ok(orders)
}

/// Moves an order from `from` to `to` in one guarded statement. `None` means the order no
/// longer had status `from` (it does not exist, or a concurrent transition won the race).
pub async fn update_order_status(
    order_id: i64,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, FulfillmentError> {
    let updated: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3 RETURNING *",
    )
    .bind(to)
    .bind(order_id)
    .bind(from)
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(mut order) => {
            order.items = fetch_order_items(order.id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

/// Removes the order row and its item lines. Stock release is the caller's job and happens
/// before this call, on the same transaction.
pub async fn delete_order(order_id: i64, conn: &mut SqliteConnection) -> Result<(), FulfillmentError> {
    sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(order_id).execute(&mut *conn).await?;
    let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(order_id).execute(&mut *conn).await?;
    if result.rows_affected() == 0 {
        return Err(FulfillmentError::OrderNotFound(order_id));
    }
    debug!("🗃️ Order {order_id} deleted");
    Ok(())
}
