//! Wire types for the backend REST API.
//!
//! Shapes mirror the backend's JSON exactly; domain invariants (validated
//! emails, non-negative prices, typed IDs) are enforced during
//! deserialization by the `dishly-core` types these structs embed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dishly_core::{
    CategoryId, DishId, Email, OrderId, OrderStatus, Price, RestaurantId, UserId, UserRole,
};

// =============================================================================
// Auth
// =============================================================================

/// Request body for `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Serialize)]
pub struct CredentialsRequest {
    /// Account email.
    pub email: Email,
    /// Plaintext password, sent over TLS only.
    pub password: String,
}

/// Response body for `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for subsequent requests.
    pub access_token: String,
    /// Token scheme, always `bearer`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// The authenticated user, as returned by `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A dish category (e.g., "Sushi", "Pizza").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// A single dish on a restaurant menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: DishId,
    /// The restaurant this dish belongs to. The cart uses this to enforce
    /// the one-restaurant-per-order rule.
    pub restaurant_id: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

const fn default_available() -> bool {
    true
}

/// A restaurant listing, as returned by `GET /restaurants` and
/// `GET /restaurants/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub delivery_time: String,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub menu: Vec<Dish>,
}

// =============================================================================
// Orders
// =============================================================================

/// A single line in an order submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub dish_id: DishId,
    pub quantity: u32,
}

/// Request body for `POST /orders`.
///
/// Write-once projection of the cart; never retained client-side after
/// the backend confirms the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmission {
    pub user_id: UserId,
    pub items: Vec<OrderItemInput>,
}

/// A line in a confirmed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub dish_id: DishId,
    pub quantity: u32,
    /// Unit price captured at order time; listing prices may drift later.
    #[serde(default)]
    pub price_at_order: Option<Price>,
}

/// A confirmed order record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub total: Option<Price>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Errors
// =============================================================================

/// Error body returned by the backend (`{"detail": "..."}`).
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
