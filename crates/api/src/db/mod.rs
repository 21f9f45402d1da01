//! Database access for the commerce API.
//!
//! # Schema: `shop`
//!
//! ## Tables
//!
//! - `category` - Self-referencing category tree (`parent_category_id`)
//! - `product`, `product_variant`, `feature` - Catalog
//! - `shopping_cart`, `shopping_cart_item` - Carts and their priced lines
//! - `customer` - Registered shoppers, each owning one cart
//! - `customer_order`, `order_item` - Captured orders
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p priceworth-cli -- migrate
//! ```

pub mod carts;
pub mod categories;
pub mod customers;
pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use categories::CategoryRepository;
pub use customers::CustomerRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (e.g., duplicate email or SKU).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Foreign key violation (row is referenced elsewhere, or references a missing row).
    #[error("foreign key violation: {0}")]
    ForeignKey(String),
}

/// Map unique and foreign-key violations to their repository error.
///
/// `what` names the entity in the resulting message, e.g. `"sku"`.
pub(crate) fn map_constraint_error(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(format!("{what} already exists"));
        }
        if db_err.is_foreign_key_violation() {
            let constraint = db_err.constraint().unwrap_or("unknown").to_owned();
            return RepositoryError::ForeignKey(constraint);
        }
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
