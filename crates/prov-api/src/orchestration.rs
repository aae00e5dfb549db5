// SPDX-License-Identifier: BUSL-1.1
//! # Reconciliation Layer
//!
//! "Write to chain, then write to store" for each business operation,
//! with the store-side blockchain status decided solely by the
//! [`TransactionOutcome`]. The store is the system of record for
//! queries; the chain leg must never make a business operation hang on
//! chain availability except where the operation's contract demands it:
//!
//! - **Creation** never fails because of the chain. A degraded
//!   bootstrap skips the chain entirely (`not_registered`); a failed
//!   submission still creates the record (`failed`).
//! - **Status updates** are the deliberate asymmetry: the store field
//!   mirrors only chain-confirmed transitions on this path, so a chain
//!   failure aborts the store write and surfaces the classified error.
//! - **Order completion** swallows chain failures on the trace-append
//!   leg; the store trace record is appended with a null hash and the
//!   order completes regardless.
//!
//! Each operation writes its store record exactly once and attempts the
//! chain call at most once — there is no retry loop anywhere in this
//! module, so duplicate submissions are prevented by construction.

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use prov_chain::{TransactionOutcome, TransactionRequest};
use prov_core::{
    BlockchainStatus, OrderRecord, OrderStatus, OrderType, ProductId, ProductRecord, TraceId,
    TraceRecord, TraceStage, UserProfile,
};

use crate::error::AppError;
use crate::state::AppState;

/// Trace location recorded when the acting user has none on file.
const DEFAULT_TRACE_LOCATION: &str = "Vietnam";

/// Validated input for product creation.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub description: String,
    pub batch: String,
    pub quantity: i64,
    pub price: i64,
}

/// Result of product creation: the business operation succeeded even if
/// the chain leg did not, and the message names the degraded state.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductCreated {
    pub message: String,
    #[schema(value_type = Object)]
    pub product: ProductRecord,
}

/// Result of a chain-confirmed status update.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusUpdated {
    pub message: String,
    pub blockchain_tx_hash: String,
}

/// Result of order completion.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCompleted {
    pub message: String,
    /// Whether a store-side trace record was appended (export/import).
    pub trace_record_added: bool,
    /// Hash of the on-chain trace append, when that leg succeeded.
    pub blockchain_tx_hash: Option<String>,
}

/// Create a product: chain registration first (when available), then
/// the store write, then the manufacturer's opening inventory.
pub async fn create_product(
    state: &AppState,
    actor: &UserProfile,
    input: NewProduct,
) -> Result<ProductCreated, AppError> {
    if input.name.trim().is_empty() || input.category.trim().is_empty() || input.batch.trim().is_empty() {
        return Err(AppError::Validation(
            "product name, category, and batch are required".to_string(),
        ));
    }
    if input.quantity < 0 || input.price < 0 {
        return Err(AppError::Validation(
            "quantity and price must not be negative".to_string(),
        ));
    }

    let product_id = ProductId::new();
    let now = Utc::now();

    let (tx_hash, blockchain_status) = match state.chain.context() {
        Some(context) => {
            let request = TransactionRequest::register_product(
                product_id.to_string(),
                input.name.clone(),
                input.batch.clone(),
                actor.display_name().to_string(),
            );
            match context.submitter.submit(&request).await {
                TransactionOutcome::Success { tx_hash } => {
                    (Some(tx_hash), BlockchainStatus::Registered)
                }
                TransactionOutcome::Failure { kind, message } => {
                    tracing::warn!(
                        product_id = %product_id,
                        kind = ?kind,
                        error = %message,
                        "chain registration failed, continuing with store-only creation"
                    );
                    (None, BlockchainStatus::Failed)
                }
            }
        }
        None => {
            tracing::warn!(
                product_id = %product_id,
                "chain integration unavailable, creating product without registration"
            );
            (None, BlockchainStatus::NotRegistered)
        }
    };

    let product = ProductRecord {
        product_id,
        name: input.name,
        category: input.category,
        description: input.description,
        batch: input.batch,
        quantity: input.quantity,
        price: input.price,
        manufacturer: actor.display_name().to_string(),
        manufacturer_id: actor.user_id.clone(),
        blockchain_tx_hash: tx_hash.clone(),
        blockchain_status,
        last_blockchain_tx_hash: None,
        created_at: now,
        updated_at: now,
    };

    state.store.put_product(&product).await?;
    state
        .store
        .adjust_inventory(&actor.user_id, product_id, input.quantity)
        .await?;

    let message = if tx_hash.is_some() {
        "product created and registered on blockchain".to_string()
    } else {
        format!("product created (blockchain status: {blockchain_status})")
    };

    Ok(ProductCreated { message, product })
}

/// Update a product's on-chain status. A chain failure aborts the store
/// update and surfaces the classified error — this path mirrors only
/// chain-confirmed transitions.
pub async fn update_product_status(
    state: &AppState,
    product_id: ProductId,
    new_status: &str,
) -> Result<StatusUpdated, AppError> {
    let new_status = new_status.trim();
    if new_status.is_empty() {
        return Err(AppError::Validation("status must not be empty".to_string()));
    }

    let context = state.chain.context().ok_or_else(|| {
        AppError::ServiceUnavailable("blockchain integration unavailable".to_string())
    })?;

    let request = TransactionRequest::update_status(product_id.to_string(), new_status);
    match context.submitter.submit(&request).await {
        TransactionOutcome::Success { tx_hash } => {
            state
                .store
                .update_product_chain_state(product_id, BlockchainStatus::Registered, Some(&tx_hash))
                .await?;
            Ok(StatusUpdated {
                message: "product status updated on blockchain".to_string(),
                blockchain_tx_hash: tx_hash,
            })
        }
        TransactionOutcome::Failure { kind, message } => {
            Err(AppError::ChainTransaction { kind, message })
        }
    }
}

/// Complete an order: move inventory, append the trace record (with the
/// chain leg attempted at most once and its failure swallowed), and
/// mark the order completed. Completing an order never fails because of
/// chain unavailability.
pub async fn complete_order(
    state: &AppState,
    actor: &UserProfile,
    order: &OrderRecord,
) -> Result<OrderCompleted, AppError> {
    if order.status == OrderStatus::Completed {
        return Err(AppError::Conflict("order is already completed".to_string()));
    }

    let now = Utc::now();
    let mut chain_tx_hash: Option<String> = None;
    let mut trace_record_added = false;

    match order.order_type {
        OrderType::Export | OrderType::Import => {
            let (delta, stage) = match order.order_type {
                OrderType::Export => (-order.quantity, TraceStage::Exported),
                _ => (order.quantity, TraceStage::Imported),
            };
            state
                .store
                .adjust_inventory(&actor.user_id, order.product_id, delta)
                .await?;

            let location = actor
                .location
                .clone()
                .unwrap_or_else(|| DEFAULT_TRACE_LOCATION.to_string());

            if let Some(context) = state.chain.context() {
                let request = TransactionRequest::add_trace_record(
                    order.product_id.to_string(),
                    stage.as_str(),
                    order.created_by_name.clone(),
                    location.clone(),
                );
                match context.submitter.submit(&request).await {
                    TransactionOutcome::Success { tx_hash } => chain_tx_hash = Some(tx_hash),
                    TransactionOutcome::Failure { kind, message } => {
                        // Swallowed by policy: completing the order must
                        // never fail because of chain unavailability.
                        tracing::warn!(
                            order_id = %order.order_id,
                            product_id = %order.product_id,
                            kind = ?kind,
                            error = %message,
                            "trace append failed on chain, recording store-side only"
                        );
                    }
                }
            }

            let record = TraceRecord {
                trace_id: TraceId::new(),
                product_id: order.product_id,
                stage,
                company_name: order.created_by_name.clone(),
                location,
                blockchain_tx_hash: chain_tx_hash.clone(),
                quantity: order.quantity,
                order_id: order.order_id,
                timestamp: now,
            };
            state.store.append_trace(&record).await?;
            trace_record_added = true;
        }
        OrderType::Sale => {
            state
                .store
                .adjust_inventory(&actor.user_id, order.product_id, -order.quantity)
                .await?;
        }
    }

    state
        .store
        .update_order_status(&actor.user_id, order.order_id, OrderStatus::Completed, Some(now))
        .await?;

    Ok(OrderCompleted {
        message: "order completed successfully".to_string(),
        trace_record_added,
        blockchain_tx_hash: chain_tx_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use prov_chain::{BootstrapState, MockChainClient};
    use prov_core::{OrderId, UserRole};
    use prov_store::{MemoryStore, Store};

    use crate::state::{AppConfig, AppState};

    fn manufacturer() -> UserProfile {
        let mut profile = UserProfile::default_for("maker-1");
        profile.role = UserRole::Manufacturer;
        profile.name = Some("Acme Manufacturing".into());
        profile
    }

    fn state_with(chain: BootstrapState) -> AppState {
        AppState::with_parts(
            Arc::new(MemoryStore::new()),
            "memory",
            chain,
            AppConfig::default(),
        )
    }

    fn ready_state(mock: Arc<MockChainClient>) -> AppState {
        state_with(BootstrapState::ready_with(mock, "0xcontract"))
    }

    fn widget() -> NewProduct {
        NewProduct {
            name: "Widget".into(),
            category: "tools".into(),
            description: String::new(),
            batch: "B1".into(),
            quantity: 10,
            price: 100,
        }
    }

    // -- creation ---------------------------------------------------------

    #[tokio::test]
    async fn creation_success_mirrors_outcome_into_store() {
        let mock = Arc::new(MockChainClient::new().with_tx_hash("0xabc"));
        let state = ready_state(mock.clone());

        let created = create_product(&state, &manufacturer(), widget()).await.unwrap();

        assert!(created.message.contains("blockchain"));
        assert_eq!(created.product.blockchain_status, BlockchainStatus::Registered);
        assert_eq!(created.product.blockchain_tx_hash.as_deref(), Some("0xabc"));

        let stored = state
            .store
            .product(created.product.product_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.blockchain_status, BlockchainStatus::Registered);
        assert_eq!(stored.blockchain_tx_hash.as_deref(), Some("0xabc"));
        assert!(stored.chain_state_consistent());

        // Registration arguments: productId, name, batch, manufacturer.
        let submissions = mock.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].request.args[1], "Widget");
        assert_eq!(submissions[0].request.args[3], "Acme Manufacturing");
    }

    #[tokio::test]
    async fn creation_failure_still_creates_record_as_failed() {
        let mock = Arc::new(MockChainClient::new().fail_submit("insufficient funds for gas"));
        let state = ready_state(mock.clone());

        let created = create_product(&state, &manufacturer(), widget()).await.unwrap();

        assert_eq!(created.product.blockchain_status, BlockchainStatus::Failed);
        assert_eq!(created.product.blockchain_tx_hash, None);
        assert!(created.message.contains("blockchain status: failed"));

        let stored = state
            .store
            .product(created.product.product_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.blockchain_status, BlockchainStatus::Failed);
        // Exactly one submission, no retry.
        assert_eq!(mock.submit_count(), 1);
    }

    #[tokio::test]
    async fn degraded_mode_never_blocks_creation() {
        let state = state_with(BootstrapState::Degraded {
            reason: "secrets unavailable".into(),
        });

        let created = create_product(&state, &manufacturer(), widget()).await.unwrap();

        assert_eq!(
            created.product.blockchain_status,
            BlockchainStatus::NotRegistered
        );
        assert_eq!(created.product.blockchain_tx_hash, None);

        // Opening inventory is still initialized.
        let quantity = state
            .store
            .inventory_quantity("maker-1", created.product.product_id)
            .await
            .unwrap();
        assert_eq!(quantity, 10);
    }

    #[tokio::test]
    async fn creation_validates_required_fields() {
        let state = state_with(BootstrapState::Uninitialized);
        let mut input = widget();
        input.batch = "   ".into();
        let err = create_product(&state, &manufacturer(), input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    // -- status update ----------------------------------------------------

    #[tokio::test]
    async fn status_update_failure_aborts_store_write() {
        let mock = Arc::new(MockChainClient::new().with_tx_hash("0xreg"));
        let state = ready_state(mock.clone());
        let created = create_product(&state, &manufacturer(), widget()).await.unwrap();
        let product_id = created.product.product_id;
        let before = state.store.product(product_id).await.unwrap().unwrap();

        // Re-script the chain to fail the next submission.
        let failing = Arc::new(
            MockChainClient::new().fail_submit("insufficient funds for gas * price + value"),
        );
        let state = AppState {
            chain: BootstrapState::ready_with(failing, "0xcontract"),
            ..state
        };

        let err = update_product_status(&state, product_id, "Shipped").await.unwrap_err();
        match &err {
            AppError::ChainTransaction { message, .. } => {
                assert!(message.contains("insufficient funds"), "got: {message}")
            }
            other => panic!("expected chain error, got {other:?}"),
        }

        // The store record is untouched.
        let after = state.store.product(product_id).await.unwrap().unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn status_update_success_records_last_hash() {
        let mock = Arc::new(MockChainClient::new().with_tx_hash("0xupd"));
        let state = ready_state(mock);
        let created = create_product(&state, &manufacturer(), widget()).await.unwrap();

        let updated = update_product_status(&state, created.product.product_id, "Shipped")
            .await
            .unwrap();
        assert_eq!(updated.blockchain_tx_hash, "0xupd");

        let stored = state
            .store
            .product(created.product.product_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.last_blockchain_tx_hash.as_deref(), Some("0xupd"));
        assert_eq!(stored.blockchain_status, BlockchainStatus::Registered);
    }

    #[tokio::test]
    async fn status_update_requires_chain() {
        let state = state_with(BootstrapState::Degraded {
            reason: "down".into(),
        });
        let err = update_product_status(&state, ProductId::new(), "Shipped")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    // -- order completion -------------------------------------------------

    fn export_order(actor: &UserProfile, product_id: ProductId, quantity: i64) -> OrderRecord {
        let now = Utc::now();
        OrderRecord {
            order_id: OrderId::new(),
            order_type: OrderType::Export,
            product_id,
            product_name: "Widget".into(),
            quantity,
            status: OrderStatus::Pending,
            created_by: actor.user_id.clone(),
            created_by_name: actor.display_name().to_string(),
            recipient_id: Some("retailer-1".into()),
            recipient_name: Some("Shop".into()),
            supplier_id: None,
            supplier_name: None,
            customer_info: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn export_completion_with_chain_timeout_still_completes() {
        // Transport timeout on the trace append: swallowed, store trace
        // appended with a null hash, order reaches completed.
        let actor = manufacturer();
        let mock = Arc::new(MockChainClient::new().with_tx_hash("0xreg"));
        let state = ready_state(mock);
        let created = create_product(&state, &actor, widget()).await.unwrap();
        let product_id = created.product.product_id;

        let order = export_order(&actor, product_id, 4);
        state.store.put_order(&order).await.unwrap();

        let timing_out =
            Arc::new(MockChainClient::new().fail_submit("request timed out after 30000ms"));
        let state = AppState {
            chain: BootstrapState::ready_with(timing_out.clone(), "0xcontract"),
            ..state
        };

        let completed = complete_order(&state, &actor, &order).await.unwrap();
        assert!(completed.trace_record_added);
        assert_eq!(completed.blockchain_tx_hash, None);
        assert_eq!(timing_out.submit_count(), 1);

        let stored_order = state
            .store
            .order(&actor.user_id, order.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_order.status, OrderStatus::Completed);
        assert!(stored_order.completed_at.is_some());

        let traces = state.store.traces_for_product(product_id).await.unwrap();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].blockchain_tx_hash, None);
        assert_eq!(traces[0].stage, TraceStage::Exported);

        // Export subtracted from the manufacturer's inventory.
        let quantity = state
            .store
            .inventory_quantity(&actor.user_id, product_id)
            .await
            .unwrap();
        assert_eq!(quantity, 6);
    }

    #[tokio::test]
    async fn export_completion_records_chain_hash_when_available() {
        let actor = manufacturer();
        let mock = Arc::new(MockChainClient::new().with_tx_hash("0xtrace"));
        let state = ready_state(mock);
        let created = create_product(&state, &actor, widget()).await.unwrap();

        let order = export_order(&actor, created.product.product_id, 2);
        state.store.put_order(&order).await.unwrap();

        let completed = complete_order(&state, &actor, &order).await.unwrap();
        assert_eq!(completed.blockchain_tx_hash.as_deref(), Some("0xtrace"));

        let traces = state
            .store
            .traces_for_product(created.product.product_id)
            .await
            .unwrap();
        assert_eq!(traces[0].blockchain_tx_hash.as_deref(), Some("0xtrace"));
    }

    #[tokio::test]
    async fn import_completion_adds_inventory() {
        let mut actor = UserProfile::default_for("retailer-1");
        actor.role = UserRole::Retailer;

        let state = state_with(BootstrapState::Degraded {
            reason: "down".into(),
        });
        let product_id = ProductId::new();
        let mut order = export_order(&actor, product_id, 3);
        order.order_type = OrderType::Import;
        state.store.put_order(&order).await.unwrap();

        complete_order(&state, &actor, &order).await.unwrap();

        let quantity = state
            .store
            .inventory_quantity("retailer-1", product_id)
            .await
            .unwrap();
        assert_eq!(quantity, 3);
    }

    #[tokio::test]
    async fn sale_completion_requires_inventory() {
        let mut actor = UserProfile::default_for("retailer-1");
        actor.role = UserRole::Retailer;

        let state = state_with(BootstrapState::Degraded {
            reason: "down".into(),
        });
        let product_id = ProductId::new();
        let mut order = export_order(&actor, product_id, 3);
        order.order_type = OrderType::Sale;
        state.store.put_order(&order).await.unwrap();

        let err = complete_order(&state, &actor, &order).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // No trace records for sales either way.
        let traces = state.store.traces_for_product(product_id).await.unwrap();
        assert!(traces.is_empty());
    }

    #[tokio::test]
    async fn completing_twice_conflicts() {
        let actor = manufacturer();
        let state = state_with(BootstrapState::Degraded {
            reason: "down".into(),
        });
        let product_id = ProductId::new();
        state
            .store
            .adjust_inventory(&actor.user_id, product_id, 10)
            .await
            .unwrap();
        let order = export_order(&actor, product_id, 1);
        state.store.put_order(&order).await.unwrap();

        complete_order(&state, &actor, &order).await.unwrap();
        let reloaded = state
            .store
            .order(&actor.user_id, order.order_id)
            .await
            .unwrap()
            .unwrap();
        let err = complete_order(&state, &actor, &reloaded).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
