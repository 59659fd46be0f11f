//! Status enums for orders and users.

use serde::{Deserialize, Serialize};

/// Order lifecycle status as reported by the backend.
///
/// The client only ever reads these; all transitions happen server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Created,
    Paid,
    Cooking,
    Delivering,
    Delivered,
    Canceled,
}

impl OrderStatus {
    /// Whether the order has reached a terminal state.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::Canceled)
    }
}

/// User role with different platform capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Places orders through the client.
    #[default]
    Customer,
    /// Delivers orders (separate courier app).
    Courier,
    /// Manages restaurants and menus.
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Courier => write!(f, "courier"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "courier" => Ok(Self::Courier),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}
