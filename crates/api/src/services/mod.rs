//! Business logic services.
//!
//! Each service borrows the pool for one request and follows the same
//! sequence: load, validate, mutate, save, reload with relations.
//!
//! # Services
//!
//! - `auth` - Tokens, password hashing, operator login
//! - `cart` - Cart lines and decimal pricing
//! - `category` - Category tree
//! - `customer` - Registration, login, profile
//! - `order` - Order capture
//! - `product` - Products, variants, features

pub mod auth;
pub mod cart;
pub mod category;
pub mod customer;
pub mod order;
pub mod product;

pub use cart::CartService;
pub use category::CategoryService;
pub use customer::CustomerService;
pub use order::OrderService;
pub use product::ProductService;
