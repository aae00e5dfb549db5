//! # OpenAPI Generation
//!
//! OpenAPI spec assembled from the `#[utoipa::path]` annotations on the
//! route handlers, served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Provenance Stack API",
        description = "Product traceability backend with a blockchain-backed registry."
    ),
    paths(
        crate::routes::health::health,
        crate::routes::products::list_products,
        crate::routes::products::create_product,
        crate::routes::products::get_product,
        crate::routes::products::update_product,
        crate::routes::products::delete_product,
        crate::routes::orders::list_orders,
        crate::routes::orders::create_order,
        crate::routes::orders::update_order,
        crate::routes::verify::public_verify,
        crate::routes::verify::public_trace,
        crate::routes::users::me,
        crate::routes::users::update_role,
        crate::routes::companies::list_manufacturers,
        crate::routes::companies::list_retailers,
        crate::routes::inventory::get_inventory,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::orchestration::ProductCreated,
        crate::orchestration::StatusUpdated,
        crate::orchestration::OrderCompleted,
        crate::routes::products::CreateProductRequest,
        crate::routes::products::UpdateProductRequest,
        crate::routes::products::ProductView,
        crate::routes::products::ProductListResponse,
        crate::routes::products::ProductDetailResponse,
        crate::routes::products::MessageResponse,
        crate::routes::orders::CreateOrderRequest,
        crate::routes::orders::UpdateOrderRequest,
        crate::routes::orders::OrderCreatedResponse,
        crate::routes::orders::OrderListResponse,
        crate::routes::users::UpdateRoleRequest,
        crate::routes::users::RoleUpdatedResponse,
        crate::routes::companies::ManufacturerView,
        crate::routes::companies::ManufacturerListResponse,
        crate::routes::companies::RetailerView,
        crate::routes::companies::RetailerListResponse,
        crate::routes::inventory::InventoryItemView,
        crate::routes::inventory::InventoryResponse,
        crate::routes::health::HealthResponse,
        crate::routes::health::BlockchainHealth,
        crate::routes::health::DatabaseHealth,
        crate::verification::VerificationView,
        crate::verification::TraceEntry,
        crate::verification::TraceView,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "products", description = "Product lifecycle"),
        (name = "orders", description = "Export/import/sale orders"),
        (name = "verification", description = "Chain verification and tracing"),
        (name = "users", description = "Profiles and roles"),
        (name = "companies", description = "Manufacturer and retailer listings"),
        (name = "inventory", description = "Per-user holdings"),
    )
)]
pub struct ApiDoc;

/// Serve the generated spec.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_generates_and_contains_core_paths() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("/products"));
        assert!(json.contains("/public/verify"));
        assert!(json.contains("/orders"));
    }
}
