//! Read-only mirror of remote catalog data.
//!
//! Restaurant listings, categories, and per-restaurant menus are fetched
//! through the API client and cached in-memory via `moka` (5-minute TTL).
//! Fetches return explicit `Result`s - failures are surfaced to the
//! caller, never stored in the cache.

use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use dishly_core::RestaurantId;

use crate::api::types::{Category, Restaurant};
use crate::api::{ApiClient, ApiError};

/// Cache TTL for catalog reads.
const CACHE_TTL: Duration = Duration::from_secs(300);
/// Upper bound on cached entries.
const CACHE_CAPACITY: u64 = 1000;

/// Values stored in the catalog cache.
#[derive(Clone)]
enum CacheValue {
    Restaurants(Vec<Restaurant>),
    Restaurant(Box<Restaurant>),
    Categories(Vec<Category>),
}

/// Cached read access to the restaurant catalog.
#[derive(Clone)]
pub struct CatalogCache {
    api: ApiClient,
    cache: Cache<String, CacheValue>,
}

impl CatalogCache {
    /// Create a catalog cache backed by `api`.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self { api, cache }
    }

    /// List all restaurants.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails after bounded retries.
    #[instrument(skip(self))]
    pub async fn restaurants(&self) -> Result<Vec<Restaurant>, ApiError> {
        let cache_key = "restaurants".to_string();

        if let Some(CacheValue::Restaurants(restaurants)) = self.cache.get(&cache_key).await {
            debug!("cache hit for restaurant listing");
            return Ok(restaurants);
        }

        let restaurants = self.api.restaurants().await?;
        self.cache
            .insert(cache_key, CacheValue::Restaurants(restaurants.clone()))
            .await;

        Ok(restaurants)
    }

    /// List all dish categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails after bounded retries.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let cache_key = "categories".to_string();

        if let Some(CacheValue::Categories(categories)) = self.cache.get(&cache_key).await {
            debug!("cache hit for categories");
            return Ok(categories);
        }

        let categories = self.api.categories().await?;
        self.cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// Fetch one restaurant with its full menu.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the restaurant does not exist, or
    /// another error if the request fails.
    #[instrument(skip(self), fields(restaurant_id = %id))]
    pub async fn restaurant(&self, id: RestaurantId) -> Result<Restaurant, ApiError> {
        let cache_key = format!("restaurant:{id}");

        if let Some(CacheValue::Restaurant(restaurant)) = self.cache.get(&cache_key).await {
            debug!("cache hit for restaurant");
            return Ok(*restaurant);
        }

        let restaurant = self.api.restaurant(id).await?;
        self.cache
            .insert(cache_key, CacheValue::Restaurant(Box::new(restaurant.clone())))
            .await;

        Ok(restaurant)
    }

    /// Invalidate all cached catalog data.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}
