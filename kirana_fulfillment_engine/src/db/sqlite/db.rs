//! `SqliteDatabase` is a concrete implementation of a fulfilment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`crate::traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{db_url, new_pool, notifications, orders, pantry, products, users};
use crate::{
    db_types::{
        CustomerContact,
        NewNotification,
        NewOrder,
        NewPantryItem,
        NewProduct,
        Notification,
        Order,
        OrderItem,
        OrderStatusType,
        PantryItem,
        Product,
        RefillStatusType,
        Shop,
        User,
    },
    traits::{
        FulfillmentDatabase,
        FulfillmentError,
        InventoryManagement,
        NotificationManagement,
        PantryManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new connection pool against the URL from the environment
    /// (`KDM_DATABASE_URL`, with a compiled-in default).
    pub async fn new(max_connections: u32) -> Result<Self, FulfillmentError> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, FulfillmentError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl FulfillmentDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(order.customer_id, &mut conn)
            .await?
            .ok_or(FulfillmentError::CustomerNotFound(order.customer_id))?;
        let contact = CustomerContact { name: user.name, email: user.email, phone: user.phone };
        // Reserve stock item by item. reserve_all rolls its own reservations back on failure,
        // so from here on only the insert can fail, and then the whole reservation must be
        // released again.
        let reserved_products = products::reserve_all(&order.items, &mut conn).await?;
        let items: Vec<OrderItem> = order
            .items
            .iter()
            .zip(reserved_products.iter())
            .map(|(item, product)| OrderItem {
                product_id: item.product_id,
                product_name: product.name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();
        let total = order.total_amount();
        let inserted = async {
            let mut tx = self.pool.begin().await?;
            let inserted = orders::insert_order(&order, &contact, &items, total, &mut tx).await?;
            tx.commit().await?;
            Ok::<_, FulfillmentError>(inserted)
        }
        .await;
        match inserted {
            Ok(order) => {
                debug!("🗃️ Order {} saved in Pending status. Total: {}", order.id, order.total_amount);
                Ok(order)
            },
            Err(e) => {
                error!("🗃️ Order insert failed after stock was reserved. Releasing the reservations. {e}");
                let reserved: Vec<(i64, i64)> = order.items.iter().map(|i| (i.product_id, i.quantity)).collect();
                products::release_all(&reserved, &mut conn).await;
                Err(e)
            },
        }
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        orders::orders_for_customer(customer_id, &mut conn).await
    }

    async fn orders_for_shop(&self, shop_id: i64) -> Result<Vec<Order>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        orders::orders_for_shop(shop_id, &mut conn).await
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Option<Order>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(order_id, from, to, &mut conn).await
    }

    async fn delete_order(&self, order_id: i64) -> Result<Order, FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::fetch_order(order_id, &mut tx).await?.ok_or(FulfillmentError::OrderNotFound(order_id))?;
        let reserved: Vec<(i64, i64)> = order.items.iter().map(|i| (i.product_id, i.quantity)).collect();
        products::release_all(&reserved, &mut tx).await;
        orders::delete_order(order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} deleted and its stock returned to the shelf");
        Ok(order)
    }

    async fn fetch_shop(&self, shop_id: i64) -> Result<Option<Shop>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_shop(shop_id, &mut conn).await?)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user(user_id, &mut conn).await?)
    }

    async fn close(&mut self) -> Result<(), FulfillmentError> {
        self.pool.close().await;
        Ok(())
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn add_product(&self, product: NewProduct) -> Result<Product, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        products::insert_product(product, &mut conn).await
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::fetch_product(product_id, &mut conn).await?)
    }

    async fn reserve_stock(&self, product_id: i64, quantity: i64) -> Result<Product, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        products::reserve_stock(product_id, quantity, &mut conn).await
    }

    async fn release_stock(&self, product_id: i64, quantity: i64) -> Result<Option<Product>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        products::release_stock(product_id, quantity, &mut conn).await
    }
}

impl PantryManagement for SqliteDatabase {
    async fn add_pantry_item(&self, item: NewPantryItem) -> Result<PantryItem, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        pantry::insert_pantry_item(item, &mut conn).await
    }

    async fn fetch_pantry_item(&self, item_id: i64) -> Result<Option<PantryItem>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(pantry::fetch_pantry_item(item_id, &mut conn).await?)
    }

    async fn pantry_for_user(&self, user_id: i64) -> Result<Vec<PantryItem>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(pantry::pantry_for_user(user_id, &mut conn).await?)
    }

    async fn record_consumption(
        &self,
        item_id: i64,
        current_packs: i64,
    ) -> Result<Option<PantryItem>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        pantry::record_consumption(item_id, current_packs, &mut conn).await
    }

    async fn mark_refill_requested(&self, item_id: i64) -> Result<Option<PantryItem>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        pantry::mark_refill_requested(item_id, &mut conn).await
    }

    async fn advance_refill_status(
        &self,
        item_id: i64,
        from: RefillStatusType,
        to: RefillStatusType,
    ) -> Result<Option<PantryItem>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        pantry::advance_refill_status(item_id, from, to, &mut conn).await
    }

    async fn refill_requests_for_shop(&self, shop_id: i64) -> Result<Vec<PantryItem>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(pantry::refill_requests_for_shop(shop_id, &mut conn).await?)
    }

    async fn remove_pantry_item(&self, item_id: i64) -> Result<(), FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        pantry::delete_pantry_item(item_id, &mut conn).await
    }
}

impl NotificationManagement for SqliteDatabase {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        notifications::insert_notification(notification, &mut conn).await
    }

    async fn notifications_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<Notification>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::notifications_for_user(user_id, limit, &mut conn).await?)
    }

    async fn unread_count(&self, user_id: i64) -> Result<i64, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::unread_count(user_id, &mut conn).await?)
    }

    async fn mark_as_read(&self, notification_id: i64, user_id: i64) -> Result<Notification, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        notifications::mark_as_read(notification_id, user_id, &mut conn).await
    }

    async fn delete_notification(&self, notification_id: i64, user_id: i64) -> Result<(), FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        notifications::delete_notification(notification_id, user_id, &mut conn).await
    }

    async fn fetch_push_token(&self, user_id: i64) -> Result<Option<String>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_push_token(user_id, &mut conn).await?)
    }
}
