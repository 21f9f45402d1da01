//! Cart service.
//!
//! Every mutation validates the quantity first, loads the cart and the
//! variant, plans the line change on the in-memory [`ShoppingCart`], then
//! persists it; the stored total is recomputed in the same transaction.

use sqlx::PgPool;
use tracing::info;

use priceworth_core::{CustomerId, Quantity, QuantityError, ShoppingCartId, VariantId};

use crate::db::{CartRepository, CustomerRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::cart::{
    CartError, CartItemRemoval, CartItemRequest, CartView, LineChange, ShoppingCart,
};
use crate::models::product::ProductVariant;

/// Cart service.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    customers: CustomerRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            customers: CustomerRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Open a new empty cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the insert fails.
    pub async fn create(&self) -> Result<CartView> {
        let cart = self.carts.create(ShoppingCartId::generate()).await?;
        info!(cart_id = %cart.id, "Cart created");
        Ok(cart)
    }

    /// A cart with its items.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the cart does not exist.
    pub async fn get(&self, id: ShoppingCartId) -> Result<CartView> {
        self.carts.view(id).await?.ok_or_else(cart_not_found)
    }

    /// The cart owned by a customer.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the customer or the cart does not exist.
    pub async fn get_for_customer(&self, customer_id: CustomerId) -> Result<CartView> {
        let cart_id = self
            .customers
            .cart_id(customer_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Customer with ID #{customer_id} not found"))
            })?;

        self.carts
            .view(cart_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))
    }

    /// Add units of a variant, incrementing an existing line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the quantity is not positive or the
    /// line subtotal or cart total would not fit a stored amount.
    /// Returns `AppError::NotFound` if the cart or the variant does not exist.
    pub async fn add_item(&self, request: CartItemRequest) -> Result<CartView> {
        let quantity = positive_quantity(request.quantity)?;
        let cart = self.load(request.shopping_cart_id).await?;
        let variant = self.variant(request.product_variant_id).await?;

        let change = cart
            .plan_add(variant.id, variant.price, quantity)
            .map_err(cart_error)?;
        let total = self.carts.apply(cart.id, change).await?;

        info!(
            cart_id = %cart.id,
            variant_id = %variant.id,
            quantity = quantity.get(),
            total = %total,
            "Cart item added"
        );
        self.get(cart.id).await
    }

    /// Replace the quantity of a line and reprice it at the current price.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the quantity is not positive or the
    /// line subtotal or cart total would not fit a stored amount.
    /// Returns `AppError::NotFound` if the cart, the variant or the line does not exist.
    pub async fn update_item(&self, request: CartItemRequest) -> Result<CartView> {
        let quantity = positive_quantity(request.quantity)?;
        let cart = self.load(request.shopping_cart_id).await?;
        let variant = self.variant(request.product_variant_id).await?;

        let change = cart
            .plan_set_quantity(variant.id, variant.price, quantity)
            .map_err(cart_error)?;
        let total = self.carts.apply(cart.id, change).await?;

        info!(
            cart_id = %cart.id,
            variant_id = %variant.id,
            quantity = quantity.get(),
            total = %total,
            "Cart item updated"
        );
        self.get(cart.id).await
    }

    /// Remove a variant's line. Removing an absent line is not an error.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the cart does not exist.
    pub async fn delete_item(&self, request: CartItemRemoval) -> Result<CartView> {
        if !self.carts.exists(request.shopping_cart_id).await? {
            return Err(cart_not_found());
        }

        let total = self
            .carts
            .apply(
                request.shopping_cart_id,
                LineChange::Remove(request.product_variant_id),
            )
            .await?;

        info!(
            cart_id = %request.shopping_cart_id,
            variant_id = %request.product_variant_id,
            total = %total,
            "Cart item removed"
        );
        self.get(request.shopping_cart_id).await
    }

    async fn load(&self, id: ShoppingCartId) -> Result<ShoppingCart> {
        self.carts.load(id).await?.ok_or_else(cart_not_found)
    }

    async fn variant(&self, id: VariantId) -> Result<ProductVariant> {
        self.products
            .get_variant(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product Variant with ID {id} not found")))
    }
}

/// Reject non-positive quantities before any database access.
fn positive_quantity(value: i32) -> Result<Quantity> {
    Quantity::new(value).map_err(|e| match e {
        QuantityError::NotPositive(_) => {
            AppError::BadRequest("product quantity should be more than 0".to_string())
        }
        QuantityError::Overflow => AppError::BadRequest(e.to_string()),
    })
}

/// Map a refused line change to a client error.
fn cart_error(error: CartError) -> AppError {
    match error {
        CartError::LineNotFound(_) => AppError::NotFound(error.to_string()),
        CartError::Quantity(_)
        | CartError::SubtotalTooLarge { .. }
        | CartError::TotalTooLarge { .. } => AppError::BadRequest(error.to_string()),
    }
}

fn cart_not_found() -> AppError {
    AppError::NotFound("Shopping cart not found".to_string())
}
