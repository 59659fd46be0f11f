//! Shopping cart aggregator.
//!
//! The cart owns the mapping of selected dishes to quantities and derives
//! its total from the lines on every read. Invariants:
//!
//! - at most one line per dish id
//! - every stored quantity is at least 1; a line that would drop to zero
//!   is removed instead
//! - all lines belong to a single restaurant; the cart pins the restaurant
//!   of its first line and unpins when it empties
//!
//! Mutations are synchronous and atomic from the caller's point of view:
//! each either fully applies or returns an error leaving the cart untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dishly_core::{DishId, Price, RestaurantId};

use crate::api::types::{Dish, OrderItemInput};

/// Errors raised by cart mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Quantities below 1 are never stored.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// The dish is currently marked unavailable by the restaurant.
    #[error("dish {0} is not available")]
    DishUnavailable(DishId),

    /// An order covers exactly one restaurant.
    #[error("cart holds dishes from restaurant {cart}; dish belongs to restaurant {dish}")]
    DifferentRestaurant {
        /// Restaurant the cart is pinned to.
        cart: RestaurantId,
        /// Restaurant of the rejected dish.
        dish: RestaurantId,
    },
}

/// One (dish, quantity) pairing in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Snapshot of the dish at the time it was added.
    pub dish: Dish,
    /// Always `>= 1`.
    pub quantity: u32,
}

impl CartLine {
    /// Price of this line (`unit price x quantity`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.dish.price.times(self.quantity)
    }
}

/// The shopping cart: an insertion-ordered collection of [`CartLine`]s,
/// keyed by dish id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    restaurant: Option<RestaurantId>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            restaurant: None,
        }
    }

    /// Add `quantity` of a dish, merging into an existing line for the
    /// same dish id.
    ///
    /// # Errors
    ///
    /// - [`CartError::ZeroQuantity`] if `quantity < 1`
    /// - [`CartError::DishUnavailable`] if the dish is flagged unavailable
    /// - [`CartError::DifferentRestaurant`] if the cart already holds
    ///   dishes from another restaurant
    pub fn add_item(&mut self, dish: Dish, quantity: u32) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::ZeroQuantity);
        }
        if !dish.is_available {
            return Err(CartError::DishUnavailable(dish.id));
        }
        if let Some(cart_restaurant) = self.restaurant
            && cart_restaurant != dish.restaurant_id
        {
            return Err(CartError::DifferentRestaurant {
                cart: cart_restaurant,
                dish: dish.restaurant_id,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|line| line.dish.id == dish.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.restaurant = Some(dish.restaurant_id);
            self.lines.push(CartLine { dish, quantity });
        }

        Ok(())
    }

    /// Set the line for `dish_id` to an exact quantity.
    ///
    /// A quantity of 0 removes the line (remove-on-zero policy); quantities
    /// are unsigned, so negative values are unrepresentable. No-op when no
    /// line exists for `dish_id`.
    pub fn update_item(&mut self, dish_id: DishId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(dish_id);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|line| line.dish.id == dish_id) {
            line.quantity = quantity;
        }
    }

    /// Delete the line for `dish_id` if present; no-op otherwise.
    pub fn remove_item(&mut self, dish_id: DishId) {
        self.lines.retain(|line| line.dish.id != dish_id);
        if self.lines.is_empty() {
            self.restaurant = None;
        }
    }

    /// Empty the cart unconditionally.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.restaurant = None;
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines (not total item count).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total item count across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |count, line| count.saturating_add(line.quantity))
    }

    /// The lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The restaurant this cart is pinned to, if any line exists.
    #[must_use]
    pub const fn restaurant(&self) -> Option<RestaurantId> {
        self.restaurant
    }

    /// The cart total, recomputed from the lines on every call.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Project the lines into the order-submission wire shape.
    #[must_use]
    pub fn order_items(&self) -> Vec<OrderItemInput> {
        self.lines
            .iter()
            .map(|line| OrderItemInput {
                dish_id: line.dish.id,
                quantity: line.quantity,
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use dishly_core::Price;

    fn dish(id: i64, restaurant: i64, price_minor: i64) -> Dish {
        Dish {
            id: DishId::new(id),
            restaurant_id: RestaurantId::new(restaurant),
            name: format!("dish-{id}"),
            description: String::new(),
            price: Price::from_minor_units(price_minor).unwrap(),
            category: None,
            is_available: true,
        }
    }

    #[test]
    fn test_add_merges_lines_for_same_dish() {
        let mut cart = Cart::new();
        cart.add_item(dish(1, 1, 1000), 2).unwrap();
        cart.add_item(dish(1, 1, 1000), 3).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let mut cart = Cart::new();
        assert_eq!(cart.add_item(dish(1, 1, 1000), 0), Err(CartError::ZeroQuantity));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_rejects_unavailable_dish() {
        let mut cart = Cart::new();
        let mut unavailable = dish(1, 1, 1000);
        unavailable.is_available = false;

        assert_eq!(
            cart.add_item(unavailable, 1),
            Err(CartError::DishUnavailable(DishId::new(1)))
        );
    }

    #[test]
    fn test_add_rejects_second_restaurant() {
        let mut cart = Cart::new();
        cart.add_item(dish(1, 1, 1000), 1).unwrap();

        let err = cart.add_item(dish(2, 9, 500), 1).unwrap_err();
        assert_eq!(
            err,
            CartError::DifferentRestaurant {
                cart: RestaurantId::new(1),
                dish: RestaurantId::new(9),
            }
        );
        // Rejected mutation leaves the cart untouched
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total(), Price::from_minor_units(1000).unwrap());
    }

    #[test]
    fn test_no_duplicate_dish_ids_across_mutations() {
        let mut cart = Cart::new();
        cart.add_item(dish(1, 1, 1000), 1).unwrap();
        cart.add_item(dish(2, 1, 500), 2).unwrap();
        cart.add_item(dish(1, 1, 1000), 1).unwrap();
        cart.update_item(DishId::new(2), 4);
        cart.remove_item(DishId::new(1));
        cart.add_item(dish(1, 1, 1000), 3).unwrap();

        let mut ids: Vec<_> = cart.lines().iter().map(|l| l.dish.id).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn test_total_equals_sum_of_lines() {
        let mut cart = Cart::new();
        cart.add_item(dish(1, 1, 1000), 2).unwrap(); // 20.00
        cart.add_item(dish(2, 1, 500), 1).unwrap(); // 5.00

        assert_eq!(cart.total(), Price::from_minor_units(2500).unwrap());

        cart.update_item(DishId::new(1), 1);
        assert_eq!(cart.total(), Price::from_minor_units(1500).unwrap());

        cart.remove_item(DishId::new(2));
        assert_eq!(cart.total(), Price::from_minor_units(1000).unwrap());
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add_item(dish(1, 1, 1000), 2).unwrap();

        cart.update_item(DishId::new(1), 0);
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_update_missing_line_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(dish(1, 1, 1000), 2).unwrap();

        cart.update_item(DishId::new(42), 7);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_remove_missing_line_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(dish(1, 1, 1000), 2).unwrap();

        cart.remove_item(DishId::new(42));
        assert_eq!(cart.line_count(), 1);
    }

    #[test]
    fn test_restaurant_unpins_when_cart_empties() {
        let mut cart = Cart::new();
        cart.add_item(dish(1, 1, 1000), 1).unwrap();
        assert_eq!(cart.restaurant(), Some(RestaurantId::new(1)));

        cart.remove_item(DishId::new(1));
        assert_eq!(cart.restaurant(), None);

        // A different restaurant is accepted once the cart is empty again
        cart.add_item(dish(2, 9, 500), 1).unwrap();
        assert_eq!(cart.restaurant(), Some(RestaurantId::new(9)));
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_item(dish(1, 1, 1000), 2).unwrap();
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.restaurant(), None);
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_order_items_projection() {
        let mut cart = Cart::new();
        cart.add_item(dish(3, 1, 1000), 2).unwrap();
        cart.add_item(dish(5, 1, 500), 1).unwrap();

        assert_eq!(
            cart.order_items(),
            vec![
                OrderItemInput {
                    dish_id: DishId::new(3),
                    quantity: 2,
                },
                OrderItemInput {
                    dish_id: DishId::new(5),
                    quantity: 1,
                },
            ]
        );
    }

    #[test]
    fn test_item_count() {
        let mut cart = Cart::new();
        cart.add_item(dish(1, 1, 1000), 2).unwrap();
        cart.add_item(dish(2, 1, 500), 3).unwrap();
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_serde_roundtrip_preserves_state() {
        let mut cart = Cart::new();
        cart.add_item(dish(1, 4, 1250), 2).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, cart);
        assert_eq!(restored.restaurant(), Some(RestaurantId::new(4)));
        assert_eq!(restored.total(), Price::from_minor_units(2500).unwrap());
    }
}
