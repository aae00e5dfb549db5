// SPDX-License-Identifier: BUSL-1.1
//! # Inventory Endpoint
//!
//! `GET /inventory` — the caller's holdings joined with product
//! descriptive fields, plus totals.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::identity::UserIdentity;
use crate::state::AppState;

/// One inventory line joined with product details.
#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryItemView {
    pub product_id: String,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
    pub product_name: String,
    pub category: String,
    pub manufacturer: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryResponse {
    pub inventory: Vec<InventoryItemView>,
    pub total_items: usize,
    pub total_quantity: i64,
}

/// Build the inventory router.
pub fn router() -> Router<AppState> {
    Router::new().route("/inventory", get(get_inventory))
}

/// GET /inventory — the caller's holdings with product details.
#[utoipa::path(
    get,
    path = "/inventory",
    responses((status = 200, description = "Caller inventory", body = InventoryResponse)),
    tag = "inventory"
)]
pub async fn get_inventory(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<Json<InventoryResponse>, AppError> {
    let records = state.store.list_inventory(identity.user_id()).await?;

    let mut inventory = Vec::with_capacity(records.len());
    for record in records {
        // Product details are best-effort; a deleted product leaves the
        // line with placeholders rather than failing the listing.
        let product = state.store.product(record.product_id).await?;
        let (product_name, category, manufacturer) = match product {
            Some(p) => (p.name, p.category, p.manufacturer),
            None => (
                "Unknown Product".to_string(),
                "Unknown".to_string(),
                "Unknown".to_string(),
            ),
        };
        inventory.push(InventoryItemView {
            product_id: record.product_id.to_string(),
            quantity: record.quantity,
            updated_at: record.updated_at,
            product_name,
            category,
            manufacturer,
        });
    }

    let total_quantity = inventory.iter().map(|item| item.quantity).sum();
    Ok(Json(InventoryResponse {
        total_items: inventory.len(),
        total_quantity,
        inventory,
    }))
}
