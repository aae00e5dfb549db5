// SPDX-License-Identifier: BUSL-1.1
//! # Verification Endpoints
//!
//! | Method | Path             | Identity |
//! |--------|------------------|----------|
//! | `GET`  | `/public/verify` | none     |
//! | `GET`  | `/public/trace`  | none     |
//! | `GET`  | `/verify`        | required |
//! | `GET`  | `/trace`         | required |
//!
//! The public pair serves QR-code scans by consumers without accounts;
//! the authenticated pair is the same read for dashboard users.

use axum::extract::{Query, State};
use axum::{Json, Router};
use axum::routing::get;
use serde::Deserialize;

use crate::error::AppError;
use crate::identity::UserIdentity;
use crate::state::AppState;
use crate::verification::{self, TraceView, VerificationView};

#[derive(Debug, Deserialize)]
pub struct CodeParams {
    pub code: Option<String>,
}

fn required_code(params: CodeParams) -> Result<String, AppError> {
    params
        .code
        .filter(|code| !code.trim().is_empty())
        .ok_or_else(|| AppError::Validation("product code is required".to_string()))
}

/// Routes mounted without identity extraction.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/public/verify", get(public_verify))
        .route("/public/trace", get(public_trace))
}

/// Routes requiring a gateway-authenticated caller.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/verify", get(authed_verify))
        .route("/trace", get(authed_trace))
}

/// GET /public/verify?code= — verify a product against the chain.
#[utoipa::path(
    get,
    path = "/public/verify",
    params(("code" = String, Query, description = "Product code")),
    responses((status = 200, description = "Verification result", body = VerificationView)),
    tag = "verification"
)]
pub async fn public_verify(
    State(state): State<AppState>,
    Query(params): Query<CodeParams>,
) -> Result<Json<VerificationView>, AppError> {
    let code = required_code(params)?;
    Ok(Json(verification::verify(&state, &code).await?))
}

/// GET /public/trace?code= — merged chain/store history.
#[utoipa::path(
    get,
    path = "/public/trace",
    params(("code" = String, Query, description = "Product code")),
    responses(
        (status = 200, description = "Merged trace", body = TraceView),
        (status = 404, description = "Not verified on chain", body = crate::error::ErrorBody),
    ),
    tag = "verification"
)]
pub async fn public_trace(
    State(state): State<AppState>,
    Query(params): Query<CodeParams>,
) -> Result<Json<TraceView>, AppError> {
    let code = required_code(params)?;
    Ok(Json(verification::trace(&state, &code).await?))
}

async fn authed_verify(
    State(state): State<AppState>,
    _identity: UserIdentity,
    Query(params): Query<CodeParams>,
) -> Result<Json<VerificationView>, AppError> {
    let code = required_code(params)?;
    Ok(Json(verification::verify(&state, &code).await?))
}

async fn authed_trace(
    State(state): State<AppState>,
    _identity: UserIdentity,
    Query(params): Query<CodeParams>,
) -> Result<Json<TraceView>, AppError> {
    let code = required_code(params)?;
    Ok(Json(verification::trace(&state, &code).await?))
}
