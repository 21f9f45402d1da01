//! Domain models and request/response bodies.
//!
//! Everything crossing the HTTP boundary uses camelCase JSON field names.

pub mod cart;
pub mod category;
pub mod customer;
pub mod order;
pub mod product;

pub use cart::{CartView, LineChange, ShoppingCart};
pub use category::{Category, CategoryDetail, CategoryNode, CategoryTree};
pub use customer::{Customer, CustomerProfile, TokenResponse};
pub use order::Order;
pub use product::{Feature, Product, ProductDetail, ProductVariant};
