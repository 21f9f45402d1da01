//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod token;
