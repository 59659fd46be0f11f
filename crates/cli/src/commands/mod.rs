//! Command implementations, one module per command group.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod order;
