// SPDX-License-Identifier: BUSL-1.1
//! # Health Endpoint
//!
//! `GET /health` — rich, unauthenticated status report covering the
//! chain integration and the store backend. Kubernetes-style liveness
//! and readiness probes live in `lib.rs`.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct BlockchainHealth {
    /// Whether bootstrap reached `Ready`.
    pub connected: bool,
    pub network: String,
    /// Deployed contract address, or "not-configured".
    pub contract: String,
    /// Signing account address, or "not-configured".
    pub account: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub backend: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub blockchain: BlockchainHealth,
    pub database: DatabaseHealth,
}

/// Build the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// GET /health — status of the chain integration and store backend.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service health", body = HealthResponse)),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (contract, account) = match state.chain.context() {
        Some(context) => (
            context.contract_address.clone(),
            context.client.sender_address(),
        ),
        None => ("not-configured".to_string(), "not-configured".to_string()),
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        blockchain: BlockchainHealth {
            connected: state.chain.is_ready(),
            network: state.config.network.clone(),
            contract,
            account,
        },
        database: DatabaseHealth {
            connected: true,
            backend: state.store_backend.to_string(),
        },
    })
}
