//! Cart manipulation commands.

use dishly_client::{AppError, AppState};
use dishly_core::{DishId, RestaurantId};

pub fn show(state: &AppState) -> Result<(), AppError> {
    let cart = state.cart();
    if cart.is_empty() {
        println!("Cart is empty.");
        return Ok(());
    }

    for line in cart.lines() {
        println!(
            "{:>4}  {:<30} x{:<3} {}",
            line.dish.id,
            line.dish.name,
            line.quantity,
            line.line_total()
        );
    }
    println!("Total: {} ({} items)", cart.total(), cart.item_count());
    Ok(())
}

pub async fn add(
    state: &AppState,
    restaurant_id: i64,
    dish_id: i64,
    quantity: u32,
) -> Result<(), AppError> {
    let restaurant = state
        .catalog()
        .restaurant(RestaurantId::new(restaurant_id))
        .await?;

    let dish_id = DishId::new(dish_id);
    let dish = restaurant
        .menu
        .iter()
        .find(|dish| dish.id == dish_id)
        .cloned()
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "dish {dish_id} is not on the menu of {}",
                restaurant.name
            ))
        })?;

    let name = dish.name.clone();
    state.add_to_cart(dish, quantity)?;
    println!("Added {quantity} x {name}.");
    show(state)
}

pub fn update(state: &AppState, dish_id: i64, quantity: u32) -> Result<(), AppError> {
    state.update_cart_item(DishId::new(dish_id), quantity)?;
    show(state)
}

pub fn remove(state: &AppState, dish_id: i64) -> Result<(), AppError> {
    state.remove_cart_item(DishId::new(dish_id))?;
    show(state)
}

pub fn clear(state: &AppState) -> Result<(), AppError> {
    state.clear_cart()?;
    println!("Cart cleared.");
    Ok(())
}
