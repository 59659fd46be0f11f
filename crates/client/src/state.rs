//! Application state shared across handlers.
//!
//! `AppState` replaces the original design's ambient global stores with an
//! explicit context object: every component (API client, catalog cache,
//! cart, session, checkout) lives inside it, and callers thread it through
//! explicitly. Two `AppState`s never share state except through the
//! persistence layer, which makes isolated testing and multi-instance use
//! straightforward.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dishly_core::{DishId, UserId};

use crate::api::ApiClient;
use crate::api::types::{Dish, Order, User};
use crate::cart::Cart;
use crate::catalog::CatalogCache;
use crate::checkout::{Checkout, CheckoutError, CheckoutPhase};
use crate::config::ClientConfig;
use crate::error::{AppError, Result};
use crate::session::{AuthError, SessionHolder};
use crate::store::StateStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ClientConfig,
    api: ApiClient,
    catalog: CatalogCache,
    session: SessionHolder,
    cart: Mutex<Cart>,
    checkout: Checkout,
    store: StateStore,
}

impl AppState {
    /// Build the application state: open the state store, restore any
    /// persisted cart and session, and wire up the API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or persisted
    /// state cannot be read.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        let store = StateStore::open(&config.state_dir)?;
        let catalog = CatalogCache::new(api.clone());
        let session = SessionHolder::new(api.clone(), store.clone());
        session.restore()?;

        let cart = store.load_cart()?.unwrap_or_default();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                catalog,
                session,
                cart: Mutex::new(cart),
                checkout: Checkout::new(),
                store,
            }),
        })
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the catalog cache.
    #[must_use]
    pub fn catalog(&self) -> &CatalogCache {
        &self.inner.catalog
    }

    /// Get a reference to the session holder.
    #[must_use]
    pub fn session(&self) -> &SessionHolder {
        &self.inner.session
    }

    /// Get a reference to the state store.
    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.inner.store
    }

    // =========================================================================
    // Cart Operations
    // =========================================================================
    //
    // Each mutation applies atomically to the in-memory cart and then
    // persists the new state, so the persisted document always reflects a
    // complete mutation.

    /// Snapshot of the current cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.lock_cart().clone()
    }

    /// Add a dish to the cart.
    ///
    /// # Errors
    ///
    /// Returns the cart's rejection (zero quantity, unavailable dish,
    /// different restaurant) or a persistence error.
    pub fn add_to_cart(&self, dish: Dish, quantity: u32) -> Result<()> {
        let snapshot = {
            let mut cart = self.lock_cart();
            cart.add_item(dish, quantity)?;
            cart.clone()
        };
        self.inner.store.save_cart(&snapshot)?;
        Ok(())
    }

    /// Set a cart line to an exact quantity (0 removes the line).
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the new state cannot be saved.
    pub fn update_cart_item(&self, dish_id: DishId, quantity: u32) -> Result<()> {
        let snapshot = {
            let mut cart = self.lock_cart();
            cart.update_item(dish_id, quantity);
            cart.clone()
        };
        self.inner.store.save_cart(&snapshot)?;
        Ok(())
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the new state cannot be saved.
    pub fn remove_cart_item(&self, dish_id: DishId) -> Result<()> {
        let snapshot = {
            let mut cart = self.lock_cart();
            cart.remove_item(dish_id);
            cart.clone()
        };
        self.inner.store.save_cart(&snapshot)?;
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the new state cannot be saved.
    pub fn clear_cart(&self) -> Result<()> {
        let snapshot = {
            let mut cart = self.lock_cart();
            cart.clear();
            cart.clone()
        };
        self.inner.store.save_cart(&snapshot)?;
        Ok(())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Submit the cart as an order for the logged-in user.
    ///
    /// # Errors
    ///
    /// See [`Checkout::submit`].
    pub async fn checkout(&self) -> std::result::Result<Order, CheckoutError> {
        self.inner
            .checkout
            .submit(
                &self.inner.api,
                &self.inner.session.current(),
                &self.inner.cart,
                &self.inner.store,
            )
            .await
    }

    /// The current checkout phase.
    #[must_use]
    pub fn checkout_phase(&self) -> CheckoutPhase {
        self.inner.checkout.phase()
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Fetch the logged-in user's order history.
    ///
    /// # Errors
    ///
    /// Returns an authorization error when no session is active, or the
    /// underlying API error.
    pub async fn order_history(&self) -> Result<Vec<Order>> {
        let user = self.require_user()?;
        Ok(self.inner.api.order_history(user.id).await?)
    }

    /// Fetch order history for an explicit user id.
    ///
    /// # Errors
    ///
    /// Returns the underlying API error.
    pub async fn order_history_for(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.inner.api.order_history(user_id).await?)
    }

    fn require_user(&self) -> Result<User> {
        self.inner
            .session
            .user()
            .ok_or(AppError::Auth(AuthError::NotAuthenticated))
    }

    fn lock_cart(&self) -> MutexGuard<'_, Cart> {
        self.inner
            .cart
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use dishly_core::{Price, RestaurantId};
    use std::time::Duration;

    fn test_config() -> ClientConfig {
        let dir = std::env::temp_dir().join(format!("dishly-state-{}", uuid::Uuid::new_v4()));
        ClientConfig {
            api_base_url: "http://127.0.0.1:9/".parse().unwrap(),
            state_dir: dir,
            request_timeout: Duration::from_secs(2),
            catalog_retries: 0,
            sentry_dsn: None,
        }
    }

    fn dish(id: i64) -> Dish {
        Dish {
            id: DishId::new(id),
            restaurant_id: RestaurantId::new(1),
            name: format!("dish-{id}"),
            description: String::new(),
            price: Price::from_minor_units(750).unwrap(),
            category: None,
            is_available: true,
        }
    }

    #[test]
    fn test_cart_survives_restart() {
        let config = test_config();

        let state = AppState::new(config.clone()).unwrap();
        state.add_to_cart(dish(1), 2).unwrap();
        let total = state.cart().total();
        drop(state);

        // A fresh AppState over the same state dir sees the same cart
        let state = AppState::new(config).unwrap();
        let cart = state.cart();
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total(), total);
    }

    #[test]
    fn test_rejected_mutation_is_not_persisted() {
        let config = test_config();
        let state = AppState::new(config.clone()).unwrap();

        state.add_to_cart(dish(1), 1).unwrap();
        let mut other_restaurant = dish(2);
        other_restaurant.restaurant_id = RestaurantId::new(99);
        assert!(state.add_to_cart(other_restaurant, 1).is_err());

        let state = AppState::new(config).unwrap();
        assert_eq!(state.cart().line_count(), 1);
    }

    #[test]
    fn test_order_history_requires_session() {
        let state = AppState::new(test_config()).unwrap();
        let err = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(state.order_history())
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Auth(AuthError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_clear_cart_persists_empty_state() {
        let config = test_config();
        let state = AppState::new(config.clone()).unwrap();
        state.add_to_cart(dish(1), 3).unwrap();
        state.clear_cart().unwrap();

        let state = AppState::new(config).unwrap();
        assert!(state.cart().is_empty());
    }
}
