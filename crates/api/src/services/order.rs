//! Order capture.

use sqlx::PgPool;
use tracing::info;

use priceworth_core::{CustomerId, OrderId, Quantity, VariantId};

use crate::db::{CustomerRepository, OrderRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::order::{NewOrder, NewOrderItem, Order};

/// Order service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    customers: CustomerRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            customers: CustomerRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Place an order, as a guest when `customer_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if an item quantity is not positive.
    /// Returns `AppError::NotFound` if the customer or an item's variant does not exist.
    pub async fn create(&self, order: NewOrder, customer_id: Option<CustomerId>) -> Result<Order> {
        let items = validate_items(&order.items)?;

        if let Some(id) = customer_id {
            self.require_customer(id).await?;
        }

        let requested: Vec<VariantId> = items.iter().map(|&(variant, _)| variant).collect();
        let existing = self.products.existing_variant_ids(&requested).await?;
        if let Some(missing) = requested.iter().find(|id| !existing.contains(id)) {
            return Err(AppError::NotFound(format!(
                "Product Variant with ID {missing} not found"
            )));
        }

        let created = self
            .orders
            .create(customer_id, &order, &items)
            .await
            .map_err(|e| match e {
                RepositoryError::ForeignKey(constraint) => AppError::NotFound(format!(
                    "Order references a missing record ({constraint})"
                )),
                other => other.into(),
            })?;

        info!(
            order_id = %created.id,
            customer_id = ?customer_id.map(|id| id.as_i32()),
            items = created.order_items.len(),
            "Order placed"
        );
        Ok(created)
    }

    /// An order with its items.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order does not exist.
    pub async fn get(&self, id: OrderId) -> Result<Order> {
        self.orders.get(id).await?.ok_or_else(|| not_found(id))
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>> {
        Ok(self.orders.list().await?)
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the customer does not exist.
    pub async fn list_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        self.require_customer(customer_id).await?;
        Ok(self.orders.list_for_customer(customer_id).await?)
    }

    /// Delete an order and its items.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order does not exist.
    pub async fn delete(&self, id: OrderId) -> Result<()> {
        if !self.orders.delete(id).await? {
            return Err(not_found(id));
        }
        info!(order_id = %id, "Order deleted");
        Ok(())
    }

    async fn require_customer(&self, id: CustomerId) -> Result<()> {
        if !self.customers.exists(id).await? {
            return Err(AppError::NotFound(format!(
                "Customer with id #{id} not found"
            )));
        }
        Ok(())
    }
}

/// Check every item quantity before touching the database.
fn validate_items(items: &[NewOrderItem]) -> Result<Vec<(VariantId, Quantity)>> {
    items
        .iter()
        .map(|item| {
            Quantity::new(item.quantity)
                .map(|quantity| (item.product_variant_id, quantity))
                .map_err(|_| {
                    AppError::BadRequest(format!(
                        "Quantity of product variant {} should be more than 0",
                        item.product_variant_id
                    ))
                })
        })
        .collect()
}

fn not_found(id: OrderId) -> AppError {
    AppError::NotFound(format!("Order with id #{id} not found"))
}
