//! Order repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use priceworth_core::{
    CustomerId, OrderId, OrderItemId, OrderStatus, PaymentStatus, Quantity, VariantId,
};

use super::{RepositoryError, map_constraint_error};
use crate::models::order::{NewOrder, Order, OrderItem};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    customer_id: Option<i32>,
    billing_address: String,
    shipping_method_id: i32,
    shipping_address: String,
    is_pickup: bool,
    pickup_address: String,
    payment_status: PaymentStatus,
    order_status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, order_items: Vec<OrderItem>) -> Order {
        Order {
            id: OrderId::new(self.id),
            customer_id: self.customer_id.map(CustomerId::new),
            billing_address: self.billing_address,
            shipping_method_id: self.shipping_method_id,
            shipping_address: self.shipping_address,
            is_pickup: self.is_pickup,
            pickup_address: self.pickup_address,
            payment_status: self.payment_status,
            order_status: self.order_status,
            order_items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_variant_id: i32,
    quantity: i32,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order item quantity: {e}"))
        })?;

        Ok(Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_variant_id: VariantId::new(row.product_variant_id),
            quantity,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its items in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ForeignKey` if the customer or a variant does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        customer_id: Option<CustomerId>,
        order: &NewOrder,
        items: &[(VariantId, Quantity)],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO shop.customer_order
                (customer_id, billing_address, shipping_method_id, shipping_address,
                 is_pickup, pickup_address, payment_status, order_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, customer_id, billing_address, shipping_method_id, shipping_address,
                      is_pickup, pickup_address, payment_status, order_status,
                      created_at, updated_at
            ",
        )
        .bind(customer_id)
        .bind(&order.billing_address)
        .bind(order.shipping_method_id)
        .bind(&order.shipping_address)
        .bind(order.is_pickup)
        .bind(&order.pickup_address)
        .bind(order.payment_status)
        .bind(order.order_status)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, "order"))?;

        let mut order_items = Vec::with_capacity(items.len());
        for &(variant_id, quantity) in items {
            let item = sqlx::query_as::<_, OrderItemRow>(
                r"
                INSERT INTO shop.order_item (order_id, product_variant_id, quantity)
                VALUES ($1, $2, $3)
                RETURNING id, order_id, product_variant_id, quantity
                ",
            )
            .bind(row.id)
            .bind(variant_id)
            .bind(quantity.get())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_constraint_error(e, "order item"))?;

            order_items.push(OrderItem::try_from(item)?);
        }

        tx.commit().await?;

        Ok(row.into_order(order_items))
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, customer_id, billing_address, shipping_method_id, shipping_address,
                   is_pickup, pickup_address, payment_status, order_status,
                   created_at, updated_at
            FROM shop.customer_order
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.items_for(&[OrderId::new(row.id)]).await?;
        let order_items = items.remove(&OrderId::new(row.id)).unwrap_or_default();
        Ok(Some(row.into_order(order_items)))
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, customer_id, billing_address, shipping_method_id, shipping_address,
                   is_pickup, pickup_address, payment_status, order_status,
                   created_at, updated_at
            FROM shop.customer_order
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// Orders placed by one customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, customer_id, billing_address, shipping_method_id, shipping_address,
                   is_pickup, pickup_address, payment_status, order_status,
                   created_at, updated_at
            FROM shop.customer_order
            WHERE customer_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// Delete an order and its items.
    ///
    /// Returns `false` if the order did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.customer_order WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<OrderId> = rows.iter().map(|row| OrderId::new(row.id)).collect();
        let mut items = self.items_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_items = items.remove(&OrderId::new(row.id)).unwrap_or_default();
                row.into_order(order_items)
            })
            .collect())
    }

    async fn items_for(
        &self,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<i32> = order_ids.iter().map(OrderId::as_i32).collect();
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_variant_id, quantity
            FROM shop.order_item
            WHERE order_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let item = OrderItem::try_from(row)?;
            grouped.entry(item.order_id).or_default().push(item);
        }
        Ok(grouped)
    }
}
