//! Priceworth commerce API.
//!
//! JSON REST backend for a small shop: a category tree, products with
//! variants and features, anonymous carts that customers claim on
//! registration, and orders. Operators authenticate with a configured admin
//! account; customers with email and password. Both receive bearer tokens.
//!
//! # Architecture
//!
//! - `routes` - axum handlers, one module per resource
//! - `middleware` - request ids and the role/ownership guard extractor
//! - `services` - business rules, one service per resource
//! - `db` - `PostgreSQL` repositories
//! - `models` - domain types and request/response bodies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{AppError, Result};
pub use routes::router;
pub use state::AppState;
