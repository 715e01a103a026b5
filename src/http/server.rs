//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every API route
//! - Wire up middleware (tracing, request ID, security, limits, errors)
//! - Bind the server to a listener and drain it on shutdown
//!
//! # Middleware order (outermost first)
//! ```text
//! TraceLayer → SetRequestId → PropagateRequestId → CORS → security headers
//!     → request logging → normalize_errors → rate limit → Content-Length limit
//!     → DefaultBodyLimit → Timeout → CatchPanic → handler
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{ApiConfig, Environment};
use crate::domain::user::sample_users;
use crate::domain::{Product, ProductService, User, UserService};
use crate::http::error::{normalize_errors, panic_response};
use crate::http::middleware::log_requests;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::security::headers;
use crate::security::limits::{enforce_content_length, BodyLimit};
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::store::{InMemoryStore, Store};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub products: Arc<ProductService>,
    pub environment: Environment,
    pub started_at: Instant,
}

impl AppState {
    /// State backed by fresh in-memory stores.
    pub fn new(config: &ApiConfig) -> Self {
        let users: Arc<dyn Store<User>> = if config.server.seed_sample_data {
            Arc::new(InMemoryStore::with_records(sample_users()))
        } else {
            Arc::new(InMemoryStore::new())
        };
        let products: Arc<dyn Store<Product>> = Arc::new(InMemoryStore::new());
        Self::with_stores(users, products, config.server.environment)
    }

    pub fn with_stores(
        users: Arc<dyn Store<User>>,
        products: Arc<dyn Store<Product>>,
        environment: Environment,
    ) -> Self {
        Self {
            users: Arc::new(UserService::new(users)),
            products: Arc::new(ProductService::new(products)),
            environment,
            started_at: Instant::now(),
        }
    }
}

/// HTTP server for the catalog API.
pub struct HttpServer {
    router: Router,
    config: ApiConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ApiConfig) -> Self {
        let state = AppState::new(&config);
        Self::with_state(config, state)
    }

    pub fn with_state(config: ApiConfig, state: AppState) -> Self {
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// A clone of the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.server.environment,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the API router with all middleware layers.
pub fn build_router(config: &ApiConfig, state: AppState) -> Router {
    apply_layers(crate::api::router().with_state(state), config)
}

/// Wrap any stateless router in the full middleware stack.
#[allow(deprecated)]
pub fn apply_layers(router: Router, config: &ApiConfig) -> Router {
    let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

    let router = router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(DefaultBodyLimit::max(config.security.max_body_size))
        .layer(from_fn_with_state(
            BodyLimit(config.security.max_body_size),
            enforce_content_length,
        ))
        .layer(from_fn_with_state(limiter, rate_limit_middleware))
        .layer(from_fn_with_state(config.server.environment, normalize_errors))
        .layer(from_fn(log_requests));

    headers::apply(router, &config.security)
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
        .layer(TraceLayer::new_for_http())
}
