//! Integration test harness for the Nightcap storefront.
//!
//! Each [`TestContext`] starts two in-process servers on loopback ports:
//!
//! - a mock ordering backend ([`mock`]) with a fixed catalog and in-memory
//!   addresses, orders and cards
//! - the real storefront router with an in-memory session store
//!
//! and a cookie-enabled `reqwest` client that plays the browser.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p nightcap-integration-tests
//! ```
//!
//! No database or network access is needed.

pub mod mock;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;
use url::Url;

use nightcap_storefront::config::{BackendConfig, SentryConfig, StorefrontConfig};
use nightcap_storefront::state::AppState;

pub use mock::{MockBackend, TEST_CODE, TEST_TOKEN};

/// Knobs for a test run.
#[derive(Debug, Clone, Default)]
pub struct TestOptions {
    pub clear_cart_on_business_change: bool,
    /// Point the storefront at a port nobody listens on.
    pub backend_unreachable: bool,
    /// Catalog cache lifetime; 60 seconds when unset.
    pub catalog_cache_ttl: Option<Duration>,
}

/// A running storefront plus mock backend.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    backend: Arc<Mutex<MockBackend>>,
}

impl TestContext {
    /// Start with default options.
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    /// Start with custom options.
    pub async fn with_options(options: TestOptions) -> Self {
        let backend = Arc::new(Mutex::new(MockBackend::default()));

        let backend_addr = if options.backend_unreachable {
            // Bind then drop to get a port that refuses connections
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind unused port");
            listener.local_addr().expect("Failed to read unused port")
        } else {
            spawn_mock_backend(Arc::clone(&backend)).await
        };

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind storefront port");
        let addr = listener.local_addr().expect("Failed to read storefront port");
        let base_url = format!("http://{addr}");

        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://unused/in-memory-sessions"),
            host: addr.ip(),
            port: addr.port(),
            base_url: base_url.clone(),
            clear_cart_on_business_change: options.clear_cart_on_business_change,
            backend: BackendConfig {
                api_url: Url::parse(&format!("http://{backend_addr}/v1"))
                    .expect("Failed to build backend URL"),
                api_key: None,
                timeout: Duration::from_secs(5),
                catalog_cache_ttl: options
                    .catalog_cache_ttl
                    .unwrap_or(Duration::from_secs(60)),
            },
            sentry: SentryConfig::default(),
        };

        let state = AppState::new(config).expect("Failed to build app state");
        let app = nightcap_storefront::app(state, MemoryStore::default());

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Storefront server failed");
        });

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            backend,
        }
    }

    /// Inspect or seed the mock backend.
    pub fn backend(&self) -> MutexGuard<'_, MockBackend> {
        self.backend.lock().expect("Mock backend lock poisoned")
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request and return the status and JSON body (`null` if the
    /// body is empty or not JSON).
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.expect("Request failed");
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, path, None).await
    }

    /// Run the phone-code flow against the mock backend.
    pub async fn sign_in(&self) {
        let (status, _) = self
            .post("/api/auth/code", json!({ "phone": "+972 50-123-4567" }))
            .await;
        assert_eq!(status, StatusCode::OK, "send code failed");

        let (status, _) = self
            .post(
                "/api/auth/verify",
                json!({ "phone": "+972501234567", "code": TEST_CODE }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "verify code failed");
    }

    /// Select a business by ID.
    pub async fn select_business(&self, business_id: i64) -> Value {
        let (status, body) = self
            .put(
                "/api/businesses/selected",
                json!({ "business_id": business_id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "select business failed: {body}");
        body
    }

    /// Add an item to the cart.
    pub async fn add_to_cart(&self, item_id: i64, quantity: u32) -> Value {
        let (status, body) = self
            .post(
                "/api/cart/items",
                json!({ "item_id": item_id, "quantity": quantity }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "add to cart failed: {body}");
        body
    }
}

async fn spawn_mock_backend(state: Arc<Mutex<MockBackend>>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend port");
    let addr = listener
        .local_addr()
        .expect("Failed to read mock backend port");

    let app = mock::router(state);
    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Mock backend failed");
    });

    addr
}
