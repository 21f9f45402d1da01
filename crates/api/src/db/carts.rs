//! Shopping cart repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use priceworth_core::{
    CartItemId, ProductId, Quantity, ShoppingCartId, VariantId, cart_total, round_money,
};

use super::RepositoryError;
use crate::models::cart::{
    CartItemView, CartLine, CartView, LineChange, ProductSummary, ShoppingCart, VariantSummary,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: ShoppingCartId,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartRow {
    // NUMERIC columns come back with the scale of the stored value, so a
    // zero total decodes as `0` rather than `0.00`.
    fn into_view(self, items: Vec<CartItemView>) -> CartView {
        CartView {
            id: self.id,
            total: round_money(self.total),
            shopping_cart_items: items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    product_variant_id: i32,
    quantity: i32,
    subtotal: Decimal,
}

impl TryFrom<LineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: LineRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid cart line quantity: {e}"))
        })?;

        Ok(Self {
            variant_id: VariantId::new(row.product_variant_id),
            quantity,
            subtotal: round_money(row.subtotal),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemViewRow {
    id: i32,
    quantity: i32,
    subtotal: Decimal,
    variant_id: i32,
    variant_name: String,
    sku: String,
    color: String,
    price: Decimal,
    images: Vec<String>,
    product_id: i32,
    product_name: String,
    model: String,
}

impl TryFrom<ItemViewRow> for CartItemView {
    type Error = RepositoryError;

    fn try_from(row: ItemViewRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid cart line quantity: {e}"))
        })?;

        Ok(Self {
            id: CartItemId::new(row.id),
            quantity,
            subtotal: round_money(row.subtotal),
            product_variant: VariantSummary {
                id: VariantId::new(row.variant_id),
                name: row.variant_name,
                sku: row.sku,
                color: row.color,
                price: round_money(row.price),
                images: row.images,
                product: ProductSummary {
                    id: ProductId::new(row.product_id),
                    name: row.product_name,
                    model: row.model,
                },
            },
        })
    }
}

/// Repository for shopping cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, id: ShoppingCartId) -> Result<CartView, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO shop.shopping_cart (id)
            VALUES ($1)
            RETURNING id, total, created_at, updated_at
            ",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into_view(Vec::new()))
    }

    /// Whether a cart exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: ShoppingCartId) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM shop.shopping_cart WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }

    /// Load a cart's priced lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored quantity is not positive.
    pub async fn load(&self, id: ShoppingCartId) -> Result<Option<ShoppingCart>, RepositoryError> {
        if !self.exists(id).await? {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, LineRow>(
            r"
            SELECT product_variant_id, quantity, subtotal
            FROM shop.shopping_cart_item
            WHERE shopping_cart_id = $1
            ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(CartLine::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(ShoppingCart { id, lines }))
    }

    /// Load a cart with its items, variants and product summaries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored quantity is not positive.
    pub async fn view(&self, id: ShoppingCartId) -> Result<Option<CartView>, RepositoryError> {
        let cart = sqlx::query_as::<_, CartRow>(
            "SELECT id, total, created_at, updated_at FROM shop.shopping_cart WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(cart) = cart else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, ItemViewRow>(
            r"
            SELECT i.id, i.quantity, i.subtotal,
                   v.id AS variant_id, v.name AS variant_name, v.sku, v.color, v.price, v.images,
                   p.id AS product_id, p.name AS product_name, p.model
            FROM shop.shopping_cart_item i
            JOIN shop.product_variant v ON v.id = i.product_variant_id
            JOIN shop.product p ON p.id = v.product_id
            WHERE i.shopping_cart_id = $1
            ORDER BY i.id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(CartItemView::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(cart.into_view(items)))
    }

    /// Persist a line change and recompute the cart total in one transaction.
    ///
    /// Returns the new total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn apply(
        &self,
        id: ShoppingCartId,
        change: LineChange,
    ) -> Result<Decimal, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        match change {
            LineChange::Upsert(line) => {
                sqlx::query(
                    r"
                    INSERT INTO shop.shopping_cart_item
                        (shopping_cart_id, product_variant_id, quantity, subtotal)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (shopping_cart_id, product_variant_id)
                    DO UPDATE SET quantity = EXCLUDED.quantity, subtotal = EXCLUDED.subtotal
                    ",
                )
                .bind(id)
                .bind(line.variant_id)
                .bind(line.quantity.get())
                .bind(line.subtotal)
                .execute(&mut *tx)
                .await?;
            }
            LineChange::Remove(variant_id) => {
                sqlx::query(
                    r"
                    DELETE FROM shop.shopping_cart_item
                    WHERE shopping_cart_id = $1 AND product_variant_id = $2
                    ",
                )
                .bind(id)
                .bind(variant_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        let total = recompute_total(&mut tx, id).await?;
        tx.commit().await?;

        Ok(total)
    }
}

/// Recompute and store the totals of several carts.
///
/// Used after catalog deletes that cascade into cart lines.
pub(crate) async fn refresh_totals(
    tx: &mut Transaction<'_, Postgres>,
    cart_ids: &[ShoppingCartId],
) -> Result<(), RepositoryError> {
    for &id in cart_ids {
        recompute_total(tx, id).await?;
    }
    Ok(())
}

/// Recompute a cart total from scratch over its persisted line subtotals.
async fn recompute_total(
    conn: &mut PgConnection,
    id: ShoppingCartId,
) -> Result<Decimal, RepositoryError> {
    let subtotals: Vec<(Decimal,)> =
        sqlx::query_as("SELECT subtotal FROM shop.shopping_cart_item WHERE shopping_cart_id = $1")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

    let total = cart_total(subtotals.into_iter().map(|(subtotal,)| subtotal));

    sqlx::query("UPDATE shop.shopping_cart SET total = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(total)
        .execute(&mut *conn)
        .await?;

    Ok(total)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_row_zero_total_renders_two_places() {
        let row = CartRow {
            id: ShoppingCartId::generate(),
            total: Decimal::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let view = row.into_view(Vec::new());
        assert_eq!(view.total.to_string(), "0.00");
    }

    #[test]
    fn test_line_row_subtotal_renders_two_places() {
        let row = LineRow {
            product_variant_id: 3,
            quantity: 2,
            subtotal: Decimal::new(40, 0),
        };

        let line = CartLine::try_from(row).unwrap();
        assert_eq!(line.subtotal.to_string(), "40.00");
    }

    #[test]
    fn test_line_row_rejects_non_positive_quantity() {
        let row = LineRow {
            product_variant_id: 3,
            quantity: 0,
            subtotal: Decimal::ZERO,
        };

        assert!(matches!(
            CartLine::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_item_view_row_money_renders_two_places() {
        let row = ItemViewRow {
            id: 1,
            quantity: 1,
            subtotal: Decimal::ZERO,
            variant_id: 2,
            variant_name: "Blue".to_owned(),
            sku: "SKU-1".to_owned(),
            color: "blue".to_owned(),
            price: Decimal::new(5, 0),
            images: Vec::new(),
            product_id: 4,
            product_name: "Lamp".to_owned(),
            model: "L-1".to_owned(),
        };

        let item = CartItemView::try_from(row).unwrap();
        assert_eq!(item.subtotal.to_string(), "0.00");
        assert_eq!(item.product_variant.price.to_string(), "5.00");
    }
}
