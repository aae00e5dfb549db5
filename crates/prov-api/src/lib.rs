//! # prov-api — Axum API for the Provenance Stack
//!
//! The HTTP surface over the reconciliation core: product and order
//! lifecycle, chain verification and tracing, inventory, user profiles,
//! and company listings.
//!
//! ## API Surface
//!
//! | Prefix            | Module                  | Identity |
//! |-------------------|-------------------------|----------|
//! | `/products*`      | [`routes::products`]    | required |
//! | `/orders*`        | [`routes::orders`]      | required |
//! | `/verify`,`/trace`| [`routes::verify`]      | required |
//! | `/public/*`       | [`routes::verify`]      | none     |
//! | `/users/*`        | [`routes::users`]       | required |
//! | `/manufacturers`, `/retailers` | [`routes::companies`] | required |
//! | `/inventory`      | [`routes::inventory`]   | required |
//! | `/health*`, `/metrics`, `/openapi.json` | — | none |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! Identity is an extractor, not a middleware: authentication happens
//! at the gateway and handlers consume the injected subject claim.

pub mod error;
pub mod identity;
pub mod middleware;
pub mod openapi;
pub mod orchestration;
pub mod routes;
pub mod state;
pub mod verification;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

pub use error::AppError;

/// Check if metrics are enabled via the `PROV_METRICS_ENABLED` env var.
/// Defaults to `true` when the variable is absent or set to anything
/// other than `"false"`.
fn metrics_enabled() -> bool {
    std::env::var("PROV_METRICS_ENABLED")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true)
}

/// Assemble the full application router with all routes and middleware.
///
/// Health probes, the public verification pair, `/metrics`, and the
/// OpenAPI spec are mounted outside the identity-consuming routes so
/// they remain reachable without a subject claim.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();
    let metrics_on = metrics_enabled();

    // Identity-consuming API routes.
    //
    // Body size limit: 2 MiB, preventing OOM from oversized request
    // bodies.
    let api = Router::new()
        .merge(routes::products::router())
        .merge(routes::orders::router())
        .merge(routes::users::router())
        .merge(routes::companies::router())
        .merge(routes::inventory::router())
        .merge(routes::verify::router())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    let mut api = api;
    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics.clone()));
    }

    let api = api
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Unauthenticated surface.
    let mut public = Router::new()
        .merge(routes::health::router())
        .merge(routes::verify::public_router())
        .merge(openapi::router())
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    if metrics_on {
        public = public
            .route("/metrics", get(prometheus_metrics))
            .layer(Extension(metrics));
    }

    let public = public.with_state(state);

    Router::new().merge(public).merge(api)
}

/// GET /metrics — Prometheus scrape endpoint.
///
/// Updates domain gauges from current state on each scrape (pull
/// model), then encodes the registry in text exposition format.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    metrics
        .chain_ready()
        .set(if state.chain.is_ready() { 1.0 } else { 0.0 });

    match state.store.list_products().await {
        Ok(products) => {
            metrics.products_total().reset();
            for product in &products {
                metrics
                    .products_total()
                    .with_label_values(&[product.blockchain_status.as_str()])
                    .inc();
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "skipping product gauges, store listing failed");
        }
    }

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode Prometheus metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the store backend is reachable. A
/// degraded chain does not fail readiness: the service is designed to
/// serve store-backed traffic through chain outages.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Err(e) = state.store.healthcheck().await {
        tracing::warn!(error = %e, "store health check failed");
        return (StatusCode::SERVICE_UNAVAILABLE, "store unreachable").into_response();
    }
    (StatusCode::OK, "ready").into_response()
}
