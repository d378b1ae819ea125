//! HTTP API for the restaurant ordering backend.
//!
//! Serves the admin catalog and settings screens, uploads, the storefront
//! menu and orders, and the Iyzico checkout flow. Requests are traced with
//! `tracing` and counted with Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use auth::SessionKeys;
pub use config::Config;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    use routes::{
        auth, categories, checkout, extras, health, menu, orders, payments, products, settings,
        uploads, variations,
    };

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    // Oversized files must reach the per-file checks instead of being cut
    // off by the default 2 MB body limit.
    let upload_router = Router::new()
        .route("/api/admin/upload", post(uploads::branding::<S>))
        .route("/api/upload", post(uploads::media::<S>))
        .layer(DefaultBodyLimit::max(uploads::BODY_LIMIT));

    let admin_router = Router::new()
        .route(
            "/api/admin/categories",
            get(categories::list::<S>).post(categories::create::<S>),
        )
        .route(
            "/api/admin/categories/{id}",
            get(categories::get::<S>)
                .put(categories::update::<S>)
                .delete(categories::delete::<S>),
        )
        .route(
            "/api/admin/products",
            get(products::list::<S>).post(products::create::<S>),
        )
        .route(
            "/api/admin/products/{id}",
            get(products::get::<S>)
                .patch(products::update::<S>)
                .delete(products::delete::<S>),
        )
        .route(
            "/api/admin/extras",
            get(extras::list::<S>).post(extras::create::<S>),
        )
        .route(
            "/api/admin/extras/{id}",
            get(extras::get::<S>)
                .patch(extras::update::<S>)
                .delete(extras::delete::<S>),
        )
        .route(
            "/api/admin/variations",
            get(variations::list::<S>).post(variations::create::<S>),
        )
        .route(
            "/api/admin/variations/{id}",
            get(variations::get::<S>)
                .patch(variations::update::<S>)
                .delete(variations::delete::<S>),
        )
        .route(
            "/api/admin/settings",
            get(settings::get::<S>).put(settings::update::<S>),
        )
        .route(
            "/api/admin/payment/test-iyzico",
            post(payments::test_connection::<S>),
        )
        .route("/api/admin/payments/cancel", post(payments::cancel::<S>))
        .route("/api/admin/payments/refund", post(payments::refund::<S>));

    let public_router = Router::new()
        .route("/health", get(health::check))
        .route("/api/register", post(auth::register::<S>))
        .route("/api/create-admin", post(auth::create_admin::<S>))
        .route("/api/login", post(auth::login::<S>))
        .route("/api/menu", get(menu::get::<S>))
        .route("/api/orders", post(orders::create::<S>))
        .route("/api/orders/{id}", get(orders::get::<S>))
        .route("/api/checkout/iyzico", post(checkout::initiate::<S>))
        .route(
            "/api/checkout/iyzico/callback",
            post(checkout::callback::<S>),
        );

    Router::new()
        .merge(public_router)
        .merge(admin_router)
        .merge(upload_router)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
