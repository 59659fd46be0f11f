//! Checkout and order-history commands.

use dishly_client::{AppError, AppState};

pub async fn checkout(state: &AppState) -> Result<(), AppError> {
    let order = state.checkout().await?;
    println!("Order {} placed (status: {:?}).", order.id, order.status);
    if let Some(total) = order.total {
        println!("Total: {total}");
    }
    Ok(())
}

pub async fn history(state: &AppState) -> Result<(), AppError> {
    let orders = state.order_history().await?;
    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }

    for order in orders {
        let total = order
            .total
            .map_or_else(|| "-".to_string(), |t| t.to_string());
        let placed = order
            .created_at
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "{:>6}  {placed}  {:<12?} {total:>10}  ({} items)",
            order.id,
            order.status,
            order.items.len()
        );
    }
    Ok(())
}
