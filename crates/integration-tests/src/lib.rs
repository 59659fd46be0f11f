//! Test harness for end-to-end tests of the Dishly client.
//!
//! Spins up an in-process mock of the backend REST API on an ephemeral
//! port and wires a real [`AppState`] (with an isolated on-disk state
//! directory) against it. Tests drive the client exactly the way the CLI
//! does and assert both on client-visible state and on the requests the
//! backend actually received.
//!
//! ```rust,ignore
//! let ctx = TestContext::new().await;
//! ctx.backend.seed_user("user@example.com", "hunter2!");
//! ctx.state.session().login("user@example.com", "hunter2!").await?;
//! ```

#![allow(clippy::expect_used)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use serde_json::{Value, json};

use dishly_client::{AppState, ClientConfig};

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn detail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": message })))
}

// =============================================================================
// Mock Backend
// =============================================================================

struct MockUser {
    id: i64,
    email: String,
    password: String,
}

/// Shared state behind the mock REST routes.
#[derive(Default)]
struct Backend {
    users: Mutex<Vec<MockUser>>,
    next_user_id: AtomicI64,
    /// Raw `POST /orders` bodies, in arrival order.
    captured_orders: Mutex<Vec<Value>>,
    /// Confirmed order records, as returned to the client.
    orders: Mutex<Vec<Value>>,
    next_order_id: AtomicI64,
    fail_orders: AtomicBool,
    catalog_requests: AtomicU32,
}

impl Backend {
    fn bearer_user(&self, headers: &HeaderMap) -> Option<i64> {
        let token = headers
            .get("authorization")?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?
            .strip_prefix("token-")?
            .parse::<i64>()
            .ok()?;

        let users = self.users.lock().expect("users lock");
        users.iter().any(|u| u.id == token).then_some(token)
    }
}

fn restaurants_seed() -> Value {
    json!([
        {
            "id": 1,
            "name": "Sakura Sushi",
            "description": "Fresh fish daily",
            "rating": 4.7,
            "delivery_time": "25-35 min",
            "categories": [{"id": 1, "name": "Sushi", "icon": "🍣"}],
            "menu": [
                {
                    "id": 11,
                    "restaurant_id": 1,
                    "name": "Salmon Nigiri",
                    "description": "Two pieces",
                    "price": "6.50",
                    "is_available": true
                },
                {
                    "id": 12,
                    "restaurant_id": 1,
                    "name": "Tuna Roll",
                    "price": "9.00",
                    "is_available": true
                },
                {
                    "id": 13,
                    "restaurant_id": 1,
                    "name": "Fugu Sashimi",
                    "price": "42.00",
                    "is_available": false
                }
            ]
        },
        {
            "id": 2,
            "name": "Pizza Palace",
            "description": "",
            "rating": 4.1,
            "delivery_time": "30-45 min",
            "categories": [{"id": 2, "name": "Pizza"}],
            "menu": [
                {
                    "id": 21,
                    "restaurant_id": 2,
                    "name": "Margherita",
                    "price": "11.00",
                    "is_available": true
                }
            ]
        }
    ])
}

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> ApiResult {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let users = backend.users.lock().expect("users lock");
    let user = users
        .iter()
        .find(|u| u.email == email && u.password == password)
        .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;

    Ok(Json(json!({
        "access_token": format!("token-{}", user.id),
        "token_type": "bearer",
    })))
}

async fn register(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> ApiResult {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    let mut users = backend.users.lock().expect("users lock");
    if users.iter().any(|u| u.email == email) {
        return Err(detail(StatusCode::BAD_REQUEST, "Email already registered"));
    }

    let id = backend.next_user_id.fetch_add(1, Ordering::SeqCst);
    users.push(MockUser {
        id,
        email,
        password,
    });

    Ok(Json(json!({
        "access_token": format!("token-{id}"),
        "token_type": "bearer",
    })))
}

async fn current_user(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> ApiResult {
    let user_id = backend
        .bearer_user(&headers)
        .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Not authenticated"))?;

    let users = backend.users.lock().expect("users lock");
    let user = users
        .iter()
        .find(|u| u.id == user_id)
        .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Not authenticated"))?;

    Ok(Json(json!({
        "id": user.id,
        "email": user.email,
        "role": "customer",
    })))
}

async fn list_restaurants(State(backend): State<Arc<Backend>>) -> ApiResult {
    backend.catalog_requests.fetch_add(1, Ordering::SeqCst);
    Ok(Json(restaurants_seed()))
}

async fn list_categories(State(backend): State<Arc<Backend>>) -> ApiResult {
    backend.catalog_requests.fetch_add(1, Ordering::SeqCst);
    Ok(Json(json!([
        {"id": 1, "name": "Sushi", "icon": "🍣"},
        {"id": 2, "name": "Pizza"},
    ])))
}

async fn get_restaurant(
    State(backend): State<Arc<Backend>>,
    Path(id): Path<i64>,
) -> ApiResult {
    backend.catalog_requests.fetch_add(1, Ordering::SeqCst);

    let restaurants = restaurants_seed();
    let restaurant = restaurants
        .as_array()
        .expect("seed is an array")
        .iter()
        .find(|r| r["id"] == json!(id))
        .cloned()
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Restaurant not found"))?;

    Ok(Json(restaurant))
}

async fn create_order(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    backend
        .bearer_user(&headers)
        .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Not authenticated"))?;

    if backend.fail_orders.load(Ordering::SeqCst) {
        return Err(detail(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Order service unavailable",
        ));
    }

    backend
        .captured_orders
        .lock()
        .expect("captured lock")
        .push(body.clone());

    let id = backend.next_order_id.fetch_add(1, Ordering::SeqCst);
    let order = json!({
        "id": id,
        "user_id": body["user_id"],
        "status": "created",
        "items": body["items"],
    });
    backend.orders.lock().expect("orders lock").push(order.clone());

    Ok(Json(order))
}

async fn order_history(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
) -> ApiResult {
    backend
        .bearer_user(&headers)
        .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Not authenticated"))?;

    let orders = backend.orders.lock().expect("orders lock");
    let for_user: Vec<Value> = orders
        .iter()
        .filter(|o| o["user_id"] == json!(user_id))
        .cloned()
        .collect();

    Ok(Json(json!(for_user)))
}

// =============================================================================
// Harness
// =============================================================================

/// Handle to a running mock backend.
pub struct TestBackend {
    addr: SocketAddr,
    state: Arc<Backend>,
}

impl TestBackend {
    /// Start the mock backend on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let state = Arc::new(Backend {
            next_user_id: AtomicI64::new(1),
            next_order_id: AtomicI64::new(1),
            ..Backend::default()
        });

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/users/me", get(current_user))
            .route("/restaurants", get(list_restaurants))
            .route("/restaurants/{id}", get(get_restaurant))
            .route("/categories", get(list_categories))
            .route("/orders", post(create_order))
            .route("/users/{user_id}/orders", get(order_history))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend serve");
        });

        Self { addr, state }
    }

    /// Base URL of the running backend.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Create an account directly, bypassing the API. Returns the user id.
    ///
    /// # Panics
    ///
    /// Panics if the backing lock is poisoned.
    pub fn seed_user(&self, email: &str, password: &str) -> i64 {
        let id = self.state.next_user_id.fetch_add(1, Ordering::SeqCst);
        self.state.users.lock().expect("users lock").push(MockUser {
            id,
            email: email.to_string(),
            password: password.to_string(),
        });
        id
    }

    /// Make `POST /orders` fail with a 500 until switched back off.
    pub fn fail_orders(&self, fail: bool) {
        self.state.fail_orders.store(fail, Ordering::SeqCst);
    }

    /// The raw `POST /orders` bodies received so far.
    ///
    /// # Panics
    ///
    /// Panics if the backing lock is poisoned.
    #[must_use]
    pub fn captured_orders(&self) -> Vec<Value> {
        self.state
            .captured_orders
            .lock()
            .expect("captured lock")
            .clone()
    }

    /// Number of catalog requests (listings, categories, menus) served.
    #[must_use]
    pub fn catalog_requests(&self) -> u32 {
        self.state.catalog_requests.load(Ordering::SeqCst)
    }
}

/// A mock backend plus a real client [`AppState`] wired against it.
pub struct TestContext {
    pub backend: TestBackend,
    pub state: AppState,
    config: ClientConfig,
}

impl TestContext {
    /// Spawn a backend and build a fresh client state over an isolated
    /// state directory.
    ///
    /// # Panics
    ///
    /// Panics if the backend or the client state cannot be constructed.
    pub async fn new() -> Self {
        let backend = TestBackend::spawn().await;
        let config = ClientConfig {
            api_base_url: backend.base_url().parse().expect("mock backend URL"),
            state_dir: temp_state_dir(),
            request_timeout: Duration::from_secs(5),
            catalog_retries: 0,
            sentry_dsn: None,
        };
        let state = AppState::new(config.clone()).expect("client state");

        Self {
            backend,
            state,
            config,
        }
    }

    /// Build a second `AppState` over the same state directory, simulating
    /// an application restart.
    ///
    /// # Panics
    ///
    /// Panics if the client state cannot be constructed.
    #[must_use]
    pub fn restart(&self) -> AppState {
        AppState::new(self.config.clone()).expect("client state")
    }
}

fn temp_state_dir() -> PathBuf {
    std::env::temp_dir().join(format!("dishly-e2e-{}", uuid::Uuid::new_v4()))
}
