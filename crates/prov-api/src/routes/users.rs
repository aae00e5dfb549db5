// SPDX-License-Identifier: BUSL-1.1
//! # User Endpoints
//!
//! | Method | Path                 | Handler       |
//! |--------|----------------------|---------------|
//! | `GET`  | `/users/me`          | `me`          |
//! | `POST` | `/users/update-role` | `update_role` |

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use prov_core::{UserProfile, UserRole};

use crate::error::AppError;
use crate::identity::UserIdentity;
use crate::state::AppState;

/// Request to change the caller's role.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleUpdatedResponse {
    pub message: String,
    #[schema(value_type = String)]
    pub role: UserRole,
    pub updated_at: DateTime<Utc>,
}

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(me))
        .route("/users/update-role", post(update_role))
}

/// GET /users/me — the caller's stored profile.
#[utoipa::path(
    get,
    path = "/users/me",
    responses((status = 200, description = "Caller profile", body = Object)),
    tag = "users"
)]
pub async fn me(identity: UserIdentity) -> Json<UserProfile> {
    Json(identity.profile)
}

/// POST /users/update-role — switch the caller's role within the closed
/// role set.
#[utoipa::path(
    post,
    path = "/users/update-role",
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = RoleUpdatedResponse),
        (status = 422, description = "Unknown role", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub async fn update_role(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<RoleUpdatedResponse>, AppError> {
    let role: UserRole = req.role.parse().map_err(|_| {
        let valid: Vec<&str> = UserRole::ALL.iter().map(UserRole::as_str).collect();
        AppError::Validation(format!(
            "invalid role `{}`; valid roles: {}",
            req.role,
            valid.join(", ")
        ))
    })?;

    state
        .store
        .update_user_role(identity.user_id(), role)
        .await?;

    Ok(Json(RoleUpdatedResponse {
        message: "user role updated".to_string(),
        role,
        updated_at: Utc::now(),
    }))
}
