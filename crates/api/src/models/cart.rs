//! Shopping cart aggregate and its priced lines.
//!
//! The [`ShoppingCart`] type is the pure half of every cart mutation: it
//! decides what a line should look like after an add or an update, and what
//! the cart total is. Repositories persist the resulting [`LineChange`] and
//! recompute the stored total from the persisted lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use priceworth_core::{
    CartItemId, MONEY_LIMIT, ProductId, Quantity, QuantityError, ShoppingCartId, VariantId,
    cart_total, line_subtotal,
};

/// Why a planned line change was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error(transparent)]
    Quantity(#[from] QuantityError),
    /// The cart has no line for the variant.
    #[error("Product Variant with ID {0} is not in the shopping cart")]
    LineNotFound(VariantId),
    /// `unit_price * quantity` does not fit in NUMERIC(10,2).
    #[error("line subtotal must be less than {max}")]
    SubtotalTooLarge { max: Decimal },
    /// The cart total after the change does not fit in NUMERIC(10,2).
    #[error("cart total must be less than {max}")]
    TotalTooLarge { max: Decimal },
}

/// One priced line of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub variant_id: VariantId,
    pub quantity: Quantity,
    pub subtotal: Decimal,
}

/// A cart reduced to what pricing needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingCart {
    pub id: ShoppingCartId,
    pub lines: Vec<CartLine>,
}

/// A change to a single cart line, ready to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    /// Insert the line, or overwrite the existing line for the same variant.
    Upsert(CartLine),
    /// Remove the line for this variant if present.
    Remove(VariantId),
}

impl ShoppingCart {
    /// The line holding `variant_id`, if any.
    #[must_use]
    pub fn line(&self, variant_id: VariantId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.variant_id == variant_id)
    }

    /// Plan adding `quantity` units of a variant priced at `unit_price`.
    ///
    /// An existing line for the variant has its quantity incremented and its
    /// subtotal recomputed at the current price; otherwise a new line is
    /// created.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Quantity`] if the combined quantity overflows.
    /// Returns [`CartError::SubtotalTooLarge`] or [`CartError::TotalTooLarge`]
    /// if the new line or the cart total would not fit in a stored amount.
    pub fn plan_add(
        &self,
        variant_id: VariantId,
        unit_price: Decimal,
        quantity: Quantity,
    ) -> Result<LineChange, CartError> {
        let quantity = match self.line(variant_id) {
            Some(existing) => existing.quantity.checked_add(quantity)?,
            None => quantity,
        };
        self.bounded_upsert(variant_id, unit_price, quantity)
    }

    /// Plan replacing the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] when the cart has no line for the
    /// variant.
    /// Returns [`CartError::SubtotalTooLarge`] or [`CartError::TotalTooLarge`]
    /// if the new line or the cart total would not fit in a stored amount.
    pub fn plan_set_quantity(
        &self,
        variant_id: VariantId,
        unit_price: Decimal,
        quantity: Quantity,
    ) -> Result<LineChange, CartError> {
        if self.line(variant_id).is_none() {
            return Err(CartError::LineNotFound(variant_id));
        }
        self.bounded_upsert(variant_id, unit_price, quantity)
    }

    fn bounded_upsert(
        &self,
        variant_id: VariantId,
        unit_price: Decimal,
        quantity: Quantity,
    ) -> Result<LineChange, CartError> {
        // i32::MAX units at the largest price stays well inside Decimal's range
        let subtotal = line_subtotal(unit_price, quantity);
        if subtotal >= MONEY_LIMIT {
            return Err(CartError::SubtotalTooLarge { max: MONEY_LIMIT });
        }

        let others = self
            .lines
            .iter()
            .filter(|line| line.variant_id != variant_id)
            .map(|line| line.subtotal);
        if cart_total(others.chain([subtotal])) >= MONEY_LIMIT {
            return Err(CartError::TotalTooLarge { max: MONEY_LIMIT });
        }

        Ok(LineChange::Upsert(CartLine {
            variant_id,
            quantity,
            subtotal,
        }))
    }

    /// Apply a change in memory.
    pub fn apply(&mut self, change: LineChange) {
        match change {
            LineChange::Upsert(line) => {
                match self
                    .lines
                    .iter_mut()
                    .find(|existing| existing.variant_id == line.variant_id)
                {
                    Some(existing) => *existing = line,
                    None => self.lines.push(line),
                }
            }
            LineChange::Remove(variant_id) => {
                self.lines.retain(|line| line.variant_id != variant_id);
            }
        }
    }

    /// Total recomputed from scratch over every line subtotal.
    #[must_use]
    pub fn total(&self) -> Decimal {
        cart_total(self.lines.iter().map(|line| line.subtotal))
    }
}

// =============================================================================
// Views
// =============================================================================

/// A cart as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: ShoppingCartId,
    pub total: Decimal,
    pub shopping_cart_items: Vec<CartItemView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: CartItemId,
    pub quantity: Quantity,
    pub subtotal: Decimal,
    pub product_variant: VariantSummary,
}

/// The variant on a cart line, with just enough product context to render it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSummary {
    pub id: VariantId,
    pub name: String,
    pub sku: String,
    pub color: String,
    pub price: Decimal,
    pub images: Vec<String>,
    pub product: ProductSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub model: String,
}

// =============================================================================
// Inputs
// =============================================================================

/// Body of the add and update item endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub shopping_cart_id: ShoppingCartId,
    pub product_variant_id: VariantId,
    pub quantity: i32,
}

/// Body of the delete item endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRemoval {
    pub shopping_cart_id: ShoppingCartId,
    pub product_variant_id: VariantId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn qty(n: i32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn empty_cart() -> ShoppingCart {
        ShoppingCart {
            id: ShoppingCartId::generate(),
            lines: Vec::new(),
        }
    }

    #[test]
    fn test_plan_add_new_line() {
        let cart = empty_cart();
        let change = cart
            .plan_add(VariantId::new(1), dec("19.99"), qty(2))
            .unwrap();
        assert_eq!(
            change,
            LineChange::Upsert(CartLine {
                variant_id: VariantId::new(1),
                quantity: qty(2),
                subtotal: dec("39.98"),
            })
        );
    }

    #[test]
    fn test_adding_same_variant_increments_instead_of_duplicating() {
        let mut cart = empty_cart();
        let first = cart.plan_add(VariantId::new(1), dec("10"), qty(1)).unwrap();
        cart.apply(first);
        let second = cart.plan_add(VariantId::new(1), dec("10"), qty(1)).unwrap();
        cart.apply(second);

        assert_eq!(cart.lines.len(), 1);
        let line = cart.line(VariantId::new(1)).unwrap();
        assert_eq!(line.quantity, qty(2));
        assert_eq!(line.subtotal.to_string(), "20.00");
    }

    #[test]
    fn test_increment_reprices_at_current_price() {
        let mut cart = empty_cart();
        cart.apply(cart.plan_add(VariantId::new(1), dec("10.00"), qty(1)).unwrap());
        // Price went up since the first add
        cart.apply(cart.plan_add(VariantId::new(1), dec("12.50"), qty(1)).unwrap());
        assert_eq!(cart.total().to_string(), "25.00");
    }

    #[test]
    fn test_plan_set_quantity_requires_existing_line() {
        let mut cart = empty_cart();
        assert_eq!(
            cart.plan_set_quantity(VariantId::new(9), dec("1"), qty(1)),
            Err(CartError::LineNotFound(VariantId::new(9)))
        );

        cart.apply(cart.plan_add(VariantId::new(9), dec("0.335"), qty(1)).unwrap());
        let change = cart
            .plan_set_quantity(VariantId::new(9), dec("0.335"), qty(3))
            .unwrap();
        cart.apply(change);
        // 0.335 * 3 = 1.005 -> 1.01 (half away from zero)
        assert_eq!(cart.total().to_string(), "1.01");
    }

    #[test]
    fn test_total_matches_sum_of_subtotals_after_every_mutation() {
        let mut cart = empty_cart();
        let steps = [
            cart.plan_add(VariantId::new(1), dec("19.99"), qty(3)).unwrap(),
            LineChange::Upsert(CartLine {
                variant_id: VariantId::new(2),
                quantity: qty(1),
                subtotal: dec("0.01"),
            }),
            LineChange::Remove(VariantId::new(1)),
            LineChange::Remove(VariantId::new(42)),
        ];
        for change in steps {
            cart.apply(change);
            let expected: Decimal = cart.lines.iter().map(|l| l.subtotal).sum();
            assert_eq!(cart.total(), expected.round_dp(2));
        }
        assert_eq!(cart.total().to_string(), "0.01");
    }

    #[test]
    fn test_plan_add_overflow() {
        let mut cart = empty_cart();
        cart.apply(
            cart.plan_add(VariantId::new(1), Decimal::ZERO, qty(i32::MAX))
                .unwrap(),
        );
        assert_eq!(
            cart.plan_add(VariantId::new(1), Decimal::ZERO, qty(1)),
            Err(CartError::Quantity(QuantityError::Overflow))
        );
    }

    #[test]
    fn test_line_subtotal_must_fit_stored_amount() {
        let cart = empty_cart();
        // 99999.99 * 2000 = 199999980.00
        assert_eq!(
            cart.plan_add(VariantId::new(1), dec("99999.99"), qty(2000)),
            Err(CartError::SubtotalTooLarge { max: MONEY_LIMIT })
        );
        assert!(
            cart.plan_add(VariantId::new(1), dec("99999.99"), qty(1000))
                .is_ok()
        );
    }

    #[test]
    fn test_set_quantity_subtotal_must_fit_stored_amount() {
        let mut cart = empty_cart();
        cart.apply(cart.plan_add(VariantId::new(1), dec("99999.99"), qty(1)).unwrap());
        assert_eq!(
            cart.plan_set_quantity(VariantId::new(1), dec("99999.99"), qty(2000)),
            Err(CartError::SubtotalTooLarge { max: MONEY_LIMIT })
        );
    }

    #[test]
    fn test_cart_total_must_fit_stored_amount() {
        let mut cart = empty_cart();
        cart.apply(cart.plan_add(VariantId::new(1), dec("60000000"), qty(1)).unwrap());

        assert_eq!(
            cart.plan_add(VariantId::new(2), dec("40000000"), qty(1)),
            Err(CartError::TotalTooLarge { max: MONEY_LIMIT })
        );
        // Replacing the same line does not count its old subtotal
        assert!(
            cart.plan_set_quantity(VariantId::new(1), dec("90000000"), qty(1))
                .is_ok()
        );
        assert!(
            cart.plan_add(VariantId::new(2), dec("39999999.99"), qty(1))
                .is_ok()
        );
    }
}
