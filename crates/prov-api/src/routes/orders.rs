// SPDX-License-Identifier: BUSL-1.1
//! # Order API Endpoints
//!
//! | Method | Path          | Handler        |
//! |--------|---------------|----------------|
//! | `GET`  | `/orders`     | `list_orders`  |
//! | `POST` | `/orders`     | `create_order` |
//! | `PUT`  | `/orders/:id` | `update_order` |
//!
//! Orders are manufacturer/retailer territory. Setting the status to
//! `completed` runs the completion pipeline (inventory movement, trace
//! append with at most one chain attempt, order update); any other
//! status is a plain conditional update.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use prov_core::{OrderId, OrderRecord, OrderStatus, OrderType, ProductId, UserRole};

use crate::error::AppError;
use crate::identity::UserIdentity;
use crate::orchestration;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request to create an order.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    /// "export", "import", or "sale".
    #[serde(rename = "type")]
    #[schema(value_type = String)]
    pub order_type: OrderType,
    #[schema(value_type = String)]
    pub product_id: ProductId,
    pub quantity: i64,
    /// Counterparty id: recipient for exports, supplier for imports.
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub customer_info: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request to move an order to a new status.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub status: String,
}

/// Creation response.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCreatedResponse {
    pub message: String,
    #[schema(value_type = Object)]
    pub order: OrderRecord,
}

/// Listing response.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    #[schema(value_type = Vec<Object>)]
    pub orders: Vec<OrderRecord>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", axum::routing::put(update_order))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /orders — all orders created by the caller.
#[utoipa::path(
    get,
    path = "/orders",
    responses((status = 200, description = "Order list", body = OrderListResponse)),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<Json<OrderListResponse>, AppError> {
    let orders = state.store.list_orders(identity.user_id()).await?;
    Ok(Json(OrderListResponse { orders }))
}

/// POST /orders — create an order (manufacturer or retailer). Sales are
/// pre-checked against the seller's inventory.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderCreatedResponse),
        (status = 422, description = "Validation failure", body = crate::error::ErrorBody),
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require_role(&[UserRole::Manufacturer, UserRole::Retailer])?;

    if req.quantity <= 0 {
        return Err(AppError::Validation(
            "a positive quantity is required".to_string(),
        ));
    }

    let product = state
        .store
        .product(req.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", req.product_id)))?;

    if req.order_type == OrderType::Sale {
        let available = state
            .store
            .inventory_quantity(identity.user_id(), req.product_id)
            .await?;
        if available < req.quantity {
            return Err(AppError::Validation(format!(
                "insufficient inventory: available {available}, requested {}",
                req.quantity
            )));
        }
    }

    let now = Utc::now();
    let mut order = OrderRecord {
        order_id: OrderId::new(),
        order_type: req.order_type,
        product_id: req.product_id,
        product_name: product.name,
        quantity: req.quantity,
        status: OrderStatus::Pending,
        created_by: identity.user_id().to_string(),
        created_by_name: identity.profile.display_name().to_string(),
        recipient_id: None,
        recipient_name: None,
        supplier_id: None,
        supplier_name: None,
        customer_info: None,
        notes: req.notes.unwrap_or_default(),
        created_at: now,
        updated_at: now,
        completed_at: None,
    };

    match req.order_type {
        OrderType::Export => {
            order.recipient_name = req
                .recipient_name
                .clone()
                .or_else(|| req.recipient_id.clone());
            order.recipient_id = req.recipient_id;
        }
        OrderType::Import => {
            // The counterparty id names the supplier on imports.
            order.supplier_name = req
                .supplier_name
                .clone()
                .or_else(|| req.recipient_id.clone());
            order.supplier_id = req.recipient_id;
        }
        OrderType::Sale => {
            order.customer_info = req.customer_info.or(req.recipient_id);
        }
    }

    state.store.put_order(&order).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            message: "order created".to_string(),
            order,
        }),
    ))
}

/// PUT /orders/:id — status transition; `completed` runs the
/// completion pipeline.
#[utoipa::path(
    put,
    path = "/orders/{id}",
    params(("id" = String, Path, description = "Order id")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = orchestration::OrderCompleted),
        (status = 404, description = "Unknown order", body = crate::error::ErrorBody),
    ),
    tag = "orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require_role(&[UserRole::Manufacturer, UserRole::Retailer])?;

    let order_id: OrderId = id
        .parse()
        .map_err(|_| AppError::Validation("invalid order id".to_string()))?;
    let status: OrderStatus = req
        .status
        .parse()
        .map_err(|e: prov_core::ParseEnumError| AppError::Validation(e.to_string()))?;

    if status != OrderStatus::Completed {
        state
            .store
            .update_order_status(identity.user_id(), order_id, status, None)
            .await?;
        return Ok(Json(serde_json::json!({
            "message": "order status updated",
        })));
    }

    let order = state
        .store
        .order(identity.user_id(), order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let completed = orchestration::complete_order(&state, &identity.profile, &order).await?;
    Ok(Json(serde_json::json!({
        "message": completed.message,
        "trace_record_added": completed.trace_record_added,
        "blockchain_tx_hash": completed.blockchain_tx_hash,
    })))
}
