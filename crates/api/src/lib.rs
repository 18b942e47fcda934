//! HTTP API server with observability for the train ticketing core.
//!
//! Provides REST endpoints for run scheduling, availability queries and
//! order lifecycle management, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/runs", post(routes::runs::schedule::<S>))
        .route("/tickets/left", get(routes::tickets::left::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", post(routes::orders::advance::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
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

/// Creates the default application state over a pair of partition stores,
/// with in-memory directory and notifier collaborators.
pub fn create_default_state<S: OrderStore + 'static>(
    primary: S,
    secondary: S,
    upstream_timeout: Duration,
) -> Arc<AppState<S>> {
    use booking::{
        DirectoryClient, InMemoryNotifier, InMemoryRouteDirectory, LifecycleCoordinator,
        SeatAllocator,
    };
    use ledger::SeatLedger;
    use order_store::PartitionRouter;

    let ledger = SeatLedger::new();
    let directory = InMemoryRouteDirectory::new();

    let router = PartitionRouter::new(primary, secondary, upstream_timeout);
    let allocator = SeatAllocator::new(
        DirectoryClient::new(directory.clone(), upstream_timeout),
        ledger.clone(),
    );
    let coordinator = LifecycleCoordinator::new(router, allocator, InMemoryNotifier::new());

    Arc::new(AppState {
        coordinator,
        ledger,
        directory,
    })
}
