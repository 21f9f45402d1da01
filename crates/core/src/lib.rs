//! Priceworth Core - Shared domain types.
//!
//! This crate provides the types used by every Priceworth component:
//! - `api` - The REST commerce API
//! - `cli` - Command-line tools for migrations and operator tasks
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Cart pricing lives here so it can be tested in isolation
//! from the request path.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, quantities, roles, statuses, money
//!   arithmetic and the password policy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
