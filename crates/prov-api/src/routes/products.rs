// SPDX-License-Identifier: BUSL-1.1
//! # Product API Endpoints
//!
//! | Method   | Path             | Handler          |
//! |----------|------------------|------------------|
//! | `GET`    | `/products`      | `list_products`  |
//! | `POST`   | `/products`      | `create_product` |
//! | `GET`    | `/products/:id`  | `get_product`    |
//! | `PUT`    | `/products/:id`  | `update_product` |
//! | `DELETE` | `/products/:id`  | `delete_product` |
//!
//! Creation and mutation are manufacturer-only. Retailers listing
//! products see their own inventory quantity for products they did not
//! manufacture.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use prov_chain::ProductState;
use prov_core::{BlockchainStatus, ProductId, ProductRecord, UserRole};

use crate::error::AppError;
use crate::identity::UserIdentity;
use crate::orchestration::{self, NewProduct};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request to create a product.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub batch: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub price: i64,
}

/// Request to update a product. Only the on-chain status is mutable
/// through this endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub scope: Option<String>,
}

/// One product as rendered in listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub batch: String,
    /// Quantity from the caller's perspective (retailers see their own
    /// inventory for foreign products).
    pub quantity: i64,
    /// The manufacturer's original quantity.
    pub original_quantity: i64,
    pub price: i64,
    pub manufacturer: String,
    pub manufacturer_id: String,
    pub blockchain_tx_hash: Option<String>,
    #[schema(value_type = String)]
    pub blockchain_status: BlockchainStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub products: Vec<ProductView>,
}

/// Detail response: the store record merged with a live chain read.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductView,
    #[schema(value_type = Object)]
    pub blockchain_data: Option<ProductState>,
    pub blockchain_verified: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn view_for(
    state: &AppState,
    identity: &UserIdentity,
    record: ProductRecord,
) -> Result<ProductView, AppError> {
    // Retailers see their own inventory for products they did not make.
    let quantity = if identity.profile.role == UserRole::Retailer
        && record.manufacturer_id != identity.user_id()
    {
        state
            .store
            .inventory_quantity(identity.user_id(), record.product_id)
            .await?
    } else {
        record.quantity
    };

    Ok(ProductView {
        id: record.product_id.to_string(),
        name: record.name,
        category: record.category,
        description: record.description,
        batch: record.batch,
        quantity,
        original_quantity: record.quantity,
        price: record.price,
        manufacturer: record.manufacturer,
        manufacturer_id: record.manufacturer_id,
        blockchain_tx_hash: record.blockchain_tx_hash,
        blockchain_status: record.blockchain_status,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

/// GET /products — list products (`scope=personal` restricts
/// manufacturers to their own).
#[utoipa::path(
    get,
    path = "/products",
    responses((status = 200, description = "Product list", body = ProductListResponse)),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    identity: UserIdentity,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductListResponse>, AppError> {
    let personal = params.scope.as_deref() == Some("personal")
        && identity.profile.role == UserRole::Manufacturer;

    let records = if personal {
        state
            .store
            .list_products_by_manufacturer(identity.user_id())
            .await?
    } else {
        state.store.list_products().await?
    };

    let mut products = Vec::with_capacity(records.len());
    for record in records {
        products.push(view_for(&state, &identity, record).await?);
    }

    Ok(Json(ProductListResponse { products }))
}

/// POST /products — create a product (manufacturer only). The chain
/// registration is attempted once; its failure degrades the record
/// rather than the request.
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = orchestration::ProductCreated),
        (status = 403, description = "Not a manufacturer", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require_role(&[UserRole::Manufacturer])?;

    let created = orchestration::create_product(
        &state,
        &identity.profile,
        NewProduct {
            name: req.name,
            category: req.category,
            description: req.description,
            batch: req.batch,
            quantity: req.quantity,
            price: req.price,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /products/:id — store record merged with a live chain read.
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product detail", body = ProductDetailResponse),
        (status = 404, description = "Unknown product", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(id): Path<String>,
) -> Result<Json<ProductDetailResponse>, AppError> {
    let product_id: ProductId = id
        .parse()
        .map_err(|_| AppError::Validation("invalid product id".to_string()))?;

    let record = state
        .store
        .product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let blockchain_data = match state.chain.context() {
        Some(context) => match context.client.product_state(&id).await {
            Ok(chain_state) => chain_state,
            Err(e) => {
                tracing::warn!(product_id = %id, error = %e, "chain read failed, returning store data only");
                None
            }
        },
        None => None,
    };
    let blockchain_verified = blockchain_data.is_some();

    Ok(Json(ProductDetailResponse {
        product: view_for(&state, &identity, record).await?,
        blockchain_data,
        blockchain_verified,
    }))
}

/// PUT /products/:id — update the on-chain status (manufacturer only).
/// This path surfaces chain failures and leaves the store untouched on
/// failure.
#[utoipa::path(
    put,
    path = "/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Status updated", body = orchestration::StatusUpdated),
        (status = 502, description = "Chain transaction failed", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require_role(&[UserRole::Manufacturer])?;

    let product_id: ProductId = id
        .parse()
        .map_err(|_| AppError::Validation("invalid product id".to_string()))?;

    match req.status {
        Some(status) => {
            let updated = orchestration::update_product_status(&state, product_id, &status).await?;
            Ok(Json(serde_json::json!({
                "message": updated.message,
                "blockchain_tx_hash": updated.blockchain_tx_hash,
            })))
        }
        None => Ok(Json(serde_json::json!({
            "message": "product updated",
        }))),
    }
}

/// DELETE /products/:id — conditional delete scoped to the owning
/// manufacturer.
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 404, description = "Unknown product or not the owner", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    identity.require_role(&[UserRole::Manufacturer])?;

    let product_id: ProductId = id
        .parse()
        .map_err(|_| AppError::Validation("invalid product id".to_string()))?;

    state
        .store
        .delete_product(identity.user_id(), product_id)
        .await?;

    Ok(Json(MessageResponse {
        message: "product deleted".to_string(),
    }))
}
