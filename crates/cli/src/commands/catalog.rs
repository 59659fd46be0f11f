//! Catalog browsing commands.

use dishly_client::{AppError, AppState};
use dishly_core::RestaurantId;

pub async fn restaurants(state: &AppState) -> Result<(), AppError> {
    let restaurants = state.catalog().restaurants().await?;
    if restaurants.is_empty() {
        println!("No restaurants available.");
        return Ok(());
    }

    for restaurant in restaurants {
        println!(
            "{:>4}  {}  ({:.1}★, {})",
            restaurant.id, restaurant.name, restaurant.rating, restaurant.delivery_time
        );
        if !restaurant.description.is_empty() {
            println!("      {}", restaurant.description);
        }
    }
    Ok(())
}

pub async fn categories(state: &AppState) -> Result<(), AppError> {
    let categories = state.catalog().categories().await?;
    for category in categories {
        match category.icon {
            Some(icon) => println!("{:>4}  {icon} {}", category.id, category.name),
            None => println!("{:>4}  {}", category.id, category.name),
        }
    }
    Ok(())
}

pub async fn menu(state: &AppState, restaurant_id: i64) -> Result<(), AppError> {
    let restaurant = state
        .catalog()
        .restaurant(RestaurantId::new(restaurant_id))
        .await?;

    println!("{} — menu", restaurant.name);
    for dish in &restaurant.menu {
        let marker = if dish.is_available { " " } else { "✗" };
        println!("{marker} {:>4}  {:<30} {}", dish.id, dish.name, dish.price);
        if !dish.description.is_empty() {
            println!("        {}", dish.description);
        }
    }
    Ok(())
}
