//! Dishly Client - Food-ordering client library.
//!
//! This crate implements the client side of the Dishly platform: browsing
//! the restaurant catalog, accumulating a shopping cart, authenticating
//! against the backend, and submitting orders.
//!
//! # Architecture
//!
//! - [`api::ApiClient`] - typed `reqwest` wrapper over the backend REST API
//! - [`catalog::CatalogCache`] - read-only mirror of remote menu data (moka)
//! - [`cart::Cart`] - line-item aggregator with recomputed totals
//! - [`session::SessionHolder`] - authenticated identity and bearer token
//! - [`checkout::Checkout`] - submit-once order orchestration
//! - [`store::StateStore`] - cart/session persistence across restarts
//! - [`state::AppState`] - explicit context object composing the above
//!
//! There is no ambient global state: every component lives inside an
//! [`state::AppState`] that callers thread through explicitly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod store;

pub use config::ClientConfig;
pub use error::{AppError, Result};
pub use state::AppState;
