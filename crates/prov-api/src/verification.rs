// SPDX-License-Identifier: BUSL-1.1
//! # Verification / Trace Reader
//!
//! Answers "is this product real and what happened to it" by merging
//! two sources of truth that can disagree. The chain is authoritative
//! for existence and current status; the store is authoritative for
//! history and descriptive metadata.
//!
//! A product present on-chain but absent from the store (migrated or
//! manually inserted data) is not an error: `verify` returns partial
//! data with an explanatory note. The trace view re-sorts store records
//! by timestamp defensively — the backend's ordering guarantee is not
//! trusted blindly.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use prov_chain::ProductState;
use prov_core::{ProductId, ProductRecord, TraceRecord};

use crate::error::AppError;
use crate::state::AppState;

/// Rendered in place of a transaction hash for stages whose chain leg
/// did not succeed.
const NO_HASH: &str = "N/A";

/// Result of verifying a product against the on-chain registry.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerificationView {
    pub verified: bool,
    pub product_id: String,
    /// Current on-chain state, when the product exists there.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub blockchain_data: Option<ProductState>,
    /// Store record, when present. `null` with a note when the product
    /// is verified on-chain but unknown to the store.
    #[schema(value_type = Object)]
    pub database_data: Option<ProductRecord>,
    pub verification_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Populated when `verified` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One merged trace entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct TraceEntry {
    pub stage: String,
    pub company: String,
    /// Calendar date of the transition (`YYYY-MM-DD`).
    pub date: String,
    pub location: String,
    pub details: String,
    /// Transaction hash of the on-chain append, or `"N/A"`.
    pub blockchain_tx_hash: String,
}

/// Merged product history: top-level fields from the chain, the trace
/// array from the store.
#[derive(Debug, Serialize, ToSchema)]
pub struct TraceView {
    pub product_id: String,
    pub product_name: String,
    pub manufacturer: String,
    pub batch: String,
    pub current_status: String,
    pub blockchain_verified: bool,
    /// Unix timestamp of on-chain registration.
    pub blockchain_timestamp: u64,
    pub trace: Vec<TraceEntry>,
}

fn unverified(product_code: &str, message: impl Into<String>) -> VerificationView {
    VerificationView {
        verified: false,
        product_id: product_code.to_string(),
        blockchain_data: None,
        database_data: None,
        verification_time: Utc::now(),
        note: None,
        message: Some(message.into()),
    }
}

/// Verify a product code against the chain, cross-referencing the
/// store. Never fails for chain-side reasons — unavailability and
/// absence both yield `verified: false`.
pub async fn verify(state: &AppState, product_code: &str) -> Result<VerificationView, AppError> {
    let product_code = product_code.trim();
    if product_code.is_empty() {
        return Err(AppError::Validation("product code is required".to_string()));
    }

    let context = match state.chain.context() {
        Some(context) => context,
        None => return Ok(unverified(product_code, "blockchain integration unavailable")),
    };

    let chain_state = match context.client.product_state(product_code).await {
        Ok(chain_state) => chain_state,
        Err(e) => {
            tracing::warn!(product_code, error = %e, "chain read failed during verification");
            return Ok(unverified(product_code, e.to_string()));
        }
    };

    let Some(chain_state) = chain_state else {
        return Ok(unverified(product_code, "product not found on blockchain"));
    };

    // The chain is the authority for existence; the store is
    // supplementary and may legitimately miss the product.
    let database_data = match product_code.parse::<ProductId>() {
        Ok(product_id) => state.store.product(product_id).await?,
        Err(_) => None,
    };

    let note = if database_data.is_none() {
        Some("product verified on blockchain but not found in database".to_string())
    } else {
        None
    };

    Ok(VerificationView {
        verified: true,
        product_id: product_code.to_string(),
        blockchain_data: Some(chain_state),
        database_data,
        verification_time: Utc::now(),
        note,
        message: None,
    })
}

fn trace_entry(record: &TraceRecord) -> TraceEntry {
    TraceEntry {
        stage: record.stage.to_string(),
        company: record.company_name.clone(),
        date: record.timestamp.date_naive().to_string(),
        location: record.location.clone(),
        details: format!("{} - Quantity: {}", record.stage, record.quantity),
        blockchain_tx_hash: record
            .blockchain_tx_hash
            .clone()
            .unwrap_or_else(|| NO_HASH.to_string()),
    }
}

/// Produce the merged history view for a verified product. Fails with
/// `NotFound` when the product cannot be verified on-chain.
pub async fn trace(state: &AppState, product_code: &str) -> Result<TraceView, AppError> {
    let verification = verify(state, product_code).await?;
    // `verified` implies chain state is present; both gates fail the
    // same way.
    let Some(chain_state) = verification.blockchain_data.filter(|_| verification.verified) else {
        return Err(AppError::NotFound("product not found or invalid".to_string()));
    };

    let mut records = match product_code.trim().parse::<ProductId>() {
        Ok(product_id) => state.store.traces_for_product(product_id).await?,
        Err(_) => Vec::new(),
    };
    // Store-side ordering is a fallback; re-sort by timestamp.
    records.sort_by_key(|r| r.timestamp);

    Ok(TraceView {
        product_id: product_code.trim().to_string(),
        product_name: chain_state.name.clone(),
        manufacturer: chain_state.manufacturer.clone(),
        batch: chain_state.batch.clone(),
        current_status: chain_state.status.clone(),
        blockchain_verified: true,
        blockchain_timestamp: chain_state.timestamp,
        trace: records.iter().map(trace_entry).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;
    use prov_chain::{BootstrapState, MockChainClient};
    use prov_core::{BlockchainStatus, OrderId, TraceId, TraceStage};
    use prov_store::{MemoryStore, Store};

    use crate::state::{AppConfig, AppState};

    fn chain_widget() -> ProductState {
        ProductState {
            name: "Widget".into(),
            batch: "B1".into(),
            manufacturer: "Acme".into(),
            status: "Created".into(),
            timestamp: 1_700_000_000,
        }
    }

    fn state_with_mock(mock: MockChainClient) -> AppState {
        AppState::with_parts(
            Arc::new(MemoryStore::new()),
            "memory",
            BootstrapState::ready_with(Arc::new(mock), "0xcontract"),
            AppConfig::default(),
        )
    }

    fn stored_product(product_id: ProductId) -> prov_core::ProductRecord {
        let now = Utc::now();
        prov_core::ProductRecord {
            product_id,
            name: "Widget".into(),
            category: "tools".into(),
            description: String::new(),
            batch: "B1".into(),
            quantity: 10,
            price: 100,
            manufacturer: "Acme".into(),
            manufacturer_id: "m1".into(),
            blockchain_tx_hash: Some("0xreg".into()),
            blockchain_status: BlockchainStatus::Registered,
            last_blockchain_tx_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn trace_record(
        product_id: ProductId,
        timestamp: DateTime<Utc>,
        hash: Option<&str>,
    ) -> TraceRecord {
        TraceRecord {
            trace_id: TraceId::new(),
            product_id,
            stage: TraceStage::Exported,
            company_name: "Acme".into(),
            location: "Vietnam".into(),
            blockchain_tx_hash: hash.map(str::to_string),
            quantity: 2,
            order_id: OrderId::new(),
            timestamp,
        }
    }

    #[tokio::test]
    async fn on_chain_only_product_verifies_with_null_database_data() {
        let state = state_with_mock(MockChainClient::new().with_product(chain_widget()));
        let product_id = ProductId::new();

        let view = verify(&state, &product_id.to_string()).await.unwrap();
        assert!(view.verified);
        assert!(view.blockchain_data.is_some());
        assert!(view.database_data.is_none());
        assert!(view.note.as_deref().unwrap().contains("not found in database"));
    }

    #[tokio::test]
    async fn absent_on_chain_is_unverified_regardless_of_store() {
        let state = state_with_mock(MockChainClient::new()); // product_state → None
        let product_id = ProductId::new();
        state
            .store
            .put_product(&stored_product(product_id))
            .await
            .unwrap();

        let view = verify(&state, &product_id.to_string()).await.unwrap();
        assert!(!view.verified);
        assert!(view.message.as_deref().unwrap().contains("not found on blockchain"));
    }

    #[tokio::test]
    async fn verified_product_includes_store_record() {
        let product_id = ProductId::new();
        let state = state_with_mock(MockChainClient::new().with_product(chain_widget()));
        state
            .store
            .put_product(&stored_product(product_id))
            .await
            .unwrap();

        let view = verify(&state, &product_id.to_string()).await.unwrap();
        assert!(view.verified);
        assert!(view.database_data.is_some());
        assert!(view.note.is_none());
    }

    #[tokio::test]
    async fn degraded_chain_is_unverified_not_an_error() {
        let state = AppState::new();
        let view = verify(&state, "anything").await.unwrap();
        assert!(!view.verified);
        assert!(view.message.as_deref().unwrap().contains("unavailable"));
    }

    #[tokio::test]
    async fn chain_read_failure_is_unverified_not_an_error() {
        let state = state_with_mock(MockChainClient::new().fail_product_state("connection reset"));
        let view = verify(&state, "p1").await.unwrap();
        assert!(!view.verified);
    }

    #[tokio::test]
    async fn empty_code_is_a_validation_error() {
        let state = AppState::new();
        let err = verify(&state, "  ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn trace_fails_not_found_when_unverified() {
        let state = state_with_mock(MockChainClient::new());
        let err = trace(&state, &ProductId::new().to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn trace_merges_chain_header_with_store_records() {
        let product_id = ProductId::new();
        let state = state_with_mock(MockChainClient::new().with_product(chain_widget()));

        let base = Utc::now();
        state
            .store
            .append_trace(&trace_record(product_id, base, Some("0xaaa")))
            .await
            .unwrap();
        state
            .store
            .append_trace(&trace_record(product_id, base + Duration::days(1), None))
            .await
            .unwrap();

        let view = trace(&state, &product_id.to_string()).await.unwrap();
        assert_eq!(view.product_name, "Widget");
        assert_eq!(view.manufacturer, "Acme");
        assert_eq!(view.current_status, "Created");
        assert_eq!(view.blockchain_timestamp, 1_700_000_000);
        assert_eq!(view.trace.len(), 2);
        // Partial chain coverage renders per entry.
        assert_eq!(view.trace[0].blockchain_tx_hash, "0xaaa");
        assert_eq!(view.trace[1].blockchain_tx_hash, "N/A");
        assert!(view.trace[0].details.contains("Quantity: 2"));
    }

    #[tokio::test]
    async fn trace_entries_are_sorted_by_parsed_date() {
        let product_id = ProductId::new();
        let state = state_with_mock(MockChainClient::new().with_product(chain_widget()));

        // Insert out of order.
        let base = Utc::now();
        for offset in [3i64, 1, 2] {
            state
                .store
                .append_trace(&trace_record(product_id, base + Duration::days(offset), None))
                .await
                .unwrap();
        }

        let view = trace(&state, &product_id.to_string()).await.unwrap();
        let dates: Vec<_> = view.trace.iter().map(|e| e.date.clone()).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted, "trace must be ascending by date");
    }
}
