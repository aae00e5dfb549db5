// SPDX-License-Identifier: BUSL-1.1
//! # Company Listings
//!
//! Dashboard listings of registered manufacturers and retailers. The
//! per-manufacturer product count is best-effort: a failed count
//! degrades to zero rather than failing the listing.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use prov_core::UserRole;

use crate::error::AppError;
use crate::identity::UserIdentity;
use crate::state::AppState;

/// Default location shown for companies without one on file.
const DEFAULT_LOCATION: &str = "Vietnam";

/// A manufacturer as rendered in listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct ManufacturerView {
    pub id: String,
    pub name: String,
    pub location: String,
    /// Number of products this manufacturer has registered.
    pub products: u64,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ManufacturerListResponse {
    pub manufacturers: Vec<ManufacturerView>,
}

/// A retailer as rendered in listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct RetailerView {
    pub id: String,
    pub name: String,
    pub location: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RetailerListResponse {
    pub retailers: Vec<RetailerView>,
}

/// Build the company-listing router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/manufacturers", get(list_manufacturers))
        .route("/retailers", get(list_retailers))
}

/// GET /manufacturers — all manufacturer profiles with product counts.
#[utoipa::path(
    get,
    path = "/manufacturers",
    responses((status = 200, description = "Manufacturer list", body = ManufacturerListResponse)),
    tag = "companies"
)]
pub async fn list_manufacturers(
    State(state): State<AppState>,
    _identity: UserIdentity,
) -> Result<Json<ManufacturerListResponse>, AppError> {
    let profiles = state.store.list_users_by_role(UserRole::Manufacturer).await?;

    let mut manufacturers = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let products = match state
            .store
            .count_products_by_manufacturer(&profile.user_id)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(user_id = %profile.user_id, error = %e, "product count failed");
                0
            }
        };
        manufacturers.push(ManufacturerView {
            id: profile.user_id.clone(),
            name: profile.display_name().to_string(),
            location: profile
                .location
                .clone()
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            products,
            email: profile.email,
        });
    }

    Ok(Json(ManufacturerListResponse { manufacturers }))
}

/// GET /retailers — all retailer profiles.
#[utoipa::path(
    get,
    path = "/retailers",
    responses((status = 200, description = "Retailer list", body = RetailerListResponse)),
    tag = "companies"
)]
pub async fn list_retailers(
    State(state): State<AppState>,
    _identity: UserIdentity,
) -> Result<Json<RetailerListResponse>, AppError> {
    let profiles = state.store.list_users_by_role(UserRole::Retailer).await?;

    let retailers = profiles
        .into_iter()
        .map(|profile| RetailerView {
            id: profile.user_id.clone(),
            name: profile.display_name().to_string(),
            location: profile
                .location
                .clone()
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            email: profile.email,
        })
        .collect();

    Ok(Json(RetailerListResponse { retailers }))
}
