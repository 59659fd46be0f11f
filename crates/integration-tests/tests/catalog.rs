//! End-to-end catalog reads: listings, menus, and cache behavior.

#![allow(clippy::unwrap_used)]

use dishly_integration_tests::TestContext;

use dishly_client::api::ApiError;
use dishly_core::RestaurantId;

#[tokio::test]
async fn test_restaurant_listing() {
    let ctx = TestContext::new().await;

    let restaurants = ctx.state.catalog().restaurants().await.unwrap();
    assert_eq!(restaurants.len(), 2);
    assert_eq!(restaurants[0].name, "Sakura Sushi");
    assert!((restaurants[0].rating - 4.7).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_menu_fetch_parses_prices_and_availability() {
    let ctx = TestContext::new().await;

    let restaurant = ctx
        .state
        .catalog()
        .restaurant(RestaurantId::new(1))
        .await
        .unwrap();
    assert_eq!(restaurant.menu.len(), 3);

    let nigiri = &restaurant.menu[0];
    assert_eq!(nigiri.price.to_string(), "$6.50");
    assert!(nigiri.is_available);

    let fugu = restaurant.menu.iter().find(|d| i64::from(d.id) == 13).unwrap();
    assert!(!fugu.is_available);
}

#[tokio::test]
async fn test_unknown_restaurant_is_not_found() {
    let ctx = TestContext::new().await;

    let err = ctx
        .state
        .catalog()
        .restaurant(RestaurantId::new(999))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_repeated_reads_are_served_from_cache() {
    let ctx = TestContext::new().await;

    ctx.state.catalog().restaurants().await.unwrap();
    ctx.state.catalog().restaurants().await.unwrap();
    ctx.state.catalog().categories().await.unwrap();
    ctx.state.catalog().categories().await.unwrap();

    assert_eq!(ctx.backend.catalog_requests(), 2);

    // Invalidation forces a refetch
    ctx.state.catalog().invalidate_all().await;
    ctx.state.catalog().restaurants().await.unwrap();
    assert_eq!(ctx.backend.catalog_requests(), 3);
}
