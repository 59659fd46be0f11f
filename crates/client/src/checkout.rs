//! Checkout orchestration.
//!
//! Converts the cart into a submitted order. Modeled as a small phase
//! machine so a submission can never be issued twice concurrently:
//!
//! ```text
//! Idle ----> Submitting ----> Succeeded
//!   ^            |                |
//!   |            v                |
//!   +-------- Failed <------------+ (next submit re-enters Submitting)
//! ```
//!
//! The cart is cleared only after the backend confirms the order; on any
//! failure the cart is left exactly as it was. Order creation is not
//! idempotent, so the submission is never retried here.

use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::types::{Order, OrderSubmission};
use crate::api::{ApiClient, ApiError};
use crate::cart::Cart;
use crate::session::Session;
use crate::store::StateStore;

/// Errors raised by checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout requires an authenticated session.
    #[error("checkout requires an authenticated session")]
    NotAuthenticated,

    /// Checkout with an empty cart is a state invariant violation.
    #[error("cannot check out an empty cart")]
    EmptyCart,

    /// A submission is already in flight.
    #[error("an order submission is already in flight")]
    SubmissionInFlight,

    /// The order-creation call failed; the cart is unchanged.
    #[error("order submission failed: {0}")]
    Api(#[from] ApiError),
}

/// Checkout lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// The checkout orchestrator.
#[derive(Debug, Default)]
pub struct Checkout {
    phase: Mutex<CheckoutPhase>,
}

impl Checkout {
    /// Create an idle checkout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> CheckoutPhase {
        *self.lock()
    }

    /// Submit the cart as an order for the session's user.
    ///
    /// The payload is built from the cart before the network call; the
    /// cart is cleared (and the cleared state persisted) only after the
    /// backend confirms success.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NotAuthenticated`] with no session - no network
    ///   call is made and the cart is untouched
    /// - [`CheckoutError::EmptyCart`] when there is nothing to submit
    /// - [`CheckoutError::SubmissionInFlight`] while a prior submission
    ///   has not completed
    /// - [`CheckoutError::Api`] when the backend rejects or fails the
    ///   call - the cart remains exactly as it was
    #[instrument(skip_all)]
    pub async fn submit(
        &self,
        api: &ApiClient,
        session: &Session,
        cart: &Mutex<Cart>,
        store: &StateStore,
    ) -> Result<Order, CheckoutError> {
        let user = session.user().ok_or(CheckoutError::NotAuthenticated)?;

        let submission = {
            let cart = cart.lock().unwrap_or_else(PoisonError::into_inner);
            if cart.is_empty() {
                return Err(CheckoutError::EmptyCart);
            }
            OrderSubmission {
                user_id: user.id,
                items: cart.order_items(),
            }
        };

        self.begin()?;

        match api.create_order(&submission).await {
            Ok(order) => {
                let cleared = {
                    let mut cart = cart.lock().unwrap_or_else(PoisonError::into_inner);
                    cart.clear();
                    cart.clone()
                };
                // The order already exists server-side; failing checkout
                // over a local write would invite a duplicate submission.
                if let Err(e) = store.save_cart(&cleared) {
                    warn!(error = %e, "order placed but cart state could not be persisted");
                }

                self.finish(true);
                info!(order_id = %order.id, "order placed");
                Ok(order)
            }
            Err(e) => {
                self.finish(false);
                Err(e.into())
            }
        }
    }

    /// Transition into `Submitting`, rejecting concurrent submissions.
    fn begin(&self) -> Result<(), CheckoutError> {
        let mut phase = self.lock();
        if *phase == CheckoutPhase::Submitting {
            return Err(CheckoutError::SubmissionInFlight);
        }
        *phase = CheckoutPhase::Submitting;
        Ok(())
    }

    /// Leave `Submitting` with the outcome.
    fn finish(&self, success: bool) {
        *self.lock() = if success {
            CheckoutPhase::Succeeded
        } else {
            CheckoutPhase::Failed
        };
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CheckoutPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::types::{Dish, User};
    use crate::config::ClientConfig;
    use dishly_core::{DishId, Email, Price, RestaurantId, UserId, UserRole};
    use std::time::Duration;

    fn unroutable_api() -> ApiClient {
        // Port 9 (discard) is essentially never listening locally, so any
        // request fails fast with a connect error.
        ApiClient::new(&ClientConfig {
            api_base_url: "http://127.0.0.1:9/".parse().unwrap(),
            state_dir: std::env::temp_dir(),
            request_timeout: Duration::from_secs(2),
            catalog_retries: 0,
            sentry_dsn: None,
        })
        .unwrap()
    }

    fn temp_store() -> StateStore {
        let dir = std::env::temp_dir().join(format!("dishly-checkout-{}", uuid::Uuid::new_v4()));
        StateStore::open(dir).unwrap()
    }

    fn authed_session() -> Session {
        Session::establish(
            User {
                id: UserId::new(1),
                email: Email::parse("user@example.com").unwrap(),
                role: UserRole::Customer,
                phone: None,
                address: None,
            },
            "tok".to_string(),
        )
    }

    fn filled_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(
            Dish {
                id: DishId::new(1),
                restaurant_id: RestaurantId::new(1),
                name: "Ramen".to_string(),
                description: String::new(),
                price: Price::from_minor_units(1200).unwrap(),
                category: None,
                is_available: true,
            },
            2,
        )
        .unwrap();
        cart
    }

    #[test]
    fn test_phase_machine_transitions() {
        let checkout = Checkout::new();
        assert_eq!(checkout.phase(), CheckoutPhase::Idle);

        checkout.begin().unwrap();
        assert_eq!(checkout.phase(), CheckoutPhase::Submitting);
        assert!(matches!(
            checkout.begin(),
            Err(CheckoutError::SubmissionInFlight)
        ));

        checkout.finish(false);
        assert_eq!(checkout.phase(), CheckoutPhase::Failed);

        // A failed checkout can be attempted again
        checkout.begin().unwrap();
        checkout.finish(true);
        assert_eq!(checkout.phase(), CheckoutPhase::Succeeded);
    }

    #[tokio::test]
    async fn test_submit_without_session_is_rejected_before_any_network_call() {
        let checkout = Checkout::new();
        let cart = Mutex::new(filled_cart());
        let expected = filled_cart();

        let err = checkout
            .submit(&unroutable_api(), &Session::default(), &cart, &temp_store())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::NotAuthenticated));
        let cart = cart.lock().unwrap();
        assert_eq!(*cart, expected);
        assert_eq!(checkout.phase(), CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_submit_with_empty_cart_is_rejected() {
        let checkout = Checkout::new();
        let cart = Mutex::new(Cart::new());

        let err = checkout
            .submit(&unroutable_api(), &authed_session(), &cart, &temp_store())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(checkout.phase(), CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_network_failure_leaves_cart_unchanged() {
        let checkout = Checkout::new();
        let cart = Mutex::new(filled_cart());
        let expected = filled_cart();

        let err = checkout
            .submit(&unroutable_api(), &authed_session(), &cart, &temp_store())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Api(_)));
        assert_eq!(checkout.phase(), CheckoutPhase::Failed);

        let cart = cart.lock().unwrap();
        assert_eq!(*cart, expected);
        assert_eq!(cart.total(), expected.total());
    }
}
