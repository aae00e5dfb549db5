//! # Transaction Submitter
//!
//! Turns one business intent into a [`TransactionOutcome`], applying
//! the policy that makes public-testnet submission reliable enough for
//! a request/response API:
//!
//! - arguments are trimmed and validated before any network call;
//! - the gas price is overpaid by a fixed 1.2× to avoid "replacement
//!   transaction underpriced" rejections on congested testnets;
//! - estimation failure falls back to the per-operation default limit
//!   instead of aborting, and the limit (estimated or default) is
//!   buffered by the same 1.2× against state-dependent cost drift
//!   between estimation and inclusion;
//! - the nonce is fetched at the pending block immediately before
//!   submission, as close to signing as possible.
//!
//! The submitter never retries internally. Retrying a chain write
//! without nonce awareness risks double submission, so retry policy is
//! a caller decision.

use std::sync::Arc;

use ethers::types::U256;

use crate::client::ChainClient;
use crate::error::{classify_failure, ChainError, TransactionOutcome};
use crate::op::TransactionRequest;

/// Fixed inflation applied to both the gas price and the gas limit,
/// floored to an integer: value × 12 / 10.
const INFLATION_NUM: u64 = 12;
const INFLATION_DEN: u64 = 10;

fn inflate(value: U256) -> U256 {
    value * U256::from(INFLATION_NUM) / U256::from(INFLATION_DEN)
}

/// Wraps a [`ChainClient`] with the submission policy. Cheap to clone;
/// shared across request handlers.
#[derive(Clone)]
pub struct TransactionSubmitter {
    client: Arc<dyn ChainClient>,
}

impl TransactionSubmitter {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    /// The wrapped client, for callers that need read-only access.
    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    /// Submit one request, at most one `submit` call, never an `Err`:
    /// every failure is classified into the closed taxonomy.
    pub async fn submit(&self, request: &TransactionRequest) -> TransactionOutcome {
        let request = match self.validate(request) {
            Ok(trimmed) => trimmed,
            Err(outcome) => return outcome,
        };

        match self.try_submit(&request).await {
            Ok(tx_hash) => {
                tracing::info!(
                    operation = %request.operation,
                    tx_hash = %tx_hash,
                    "chain transaction mined"
                );
                TransactionOutcome::Success { tx_hash }
            }
            Err(e) => {
                let raw = e.to_string();
                let kind = classify_failure(&raw);
                tracing::warn!(
                    operation = %request.operation,
                    kind = ?kind,
                    error = %raw,
                    "chain transaction failed"
                );
                TransactionOutcome::Failure {
                    kind,
                    message: kind.caller_message(&raw),
                }
            }
        }
    }

    /// Trim all arguments and fail fast — no network call — when a
    /// required argument is empty or the arity is wrong.
    fn validate(&self, request: &TransactionRequest) -> Result<TransactionRequest, TransactionOutcome> {
        let names = request.operation.arg_names();
        if request.args.len() != names.len() {
            let raw = format!(
                "{} expects {} arguments, got {}",
                request.operation.function_name(),
                names.len(),
                request.args.len()
            );
            return Err(TransactionOutcome::Failure {
                kind: classify_failure(&raw),
                message: raw,
            });
        }

        let mut trimmed = Vec::with_capacity(request.args.len());
        for (name, value) in names.iter().zip(&request.args) {
            let value = value.trim();
            if value.is_empty() {
                let raw = format!(
                    "required argument `{name}` of {} is empty",
                    request.operation.function_name()
                );
                return Err(TransactionOutcome::Failure {
                    kind: classify_failure(&raw),
                    message: raw,
                });
            }
            trimmed.push(value.to_string());
        }

        Ok(TransactionRequest::new(request.operation, trimmed))
    }

    async fn try_submit(&self, request: &TransactionRequest) -> Result<String, ChainError> {
        let base_price = self.client.gas_price().await?;
        let gas_price = inflate(base_price);

        let gas_limit = match self.client.estimate_gas(request).await {
            Ok(estimate) => inflate(estimate),
            Err(e) => {
                let fallback = request.operation.default_gas_limit();
                tracing::warn!(
                    operation = %request.operation,
                    fallback_gas = fallback,
                    error = %e,
                    "gas estimation failed, using default limit"
                );
                inflate(U256::from(fallback))
            }
        };

        // Fetched fresh, immediately before signing: concurrent
        // instances share this account and the pending count is the
        // only coordination between them.
        let nonce = self.client.pending_nonce().await?;

        tracing::debug!(
            operation = %request.operation,
            gas_limit = %gas_limit,
            gas_price = %gas_price,
            nonce = %nonce,
            "submitting chain transaction"
        );

        self.client.submit(request, gas_limit, gas_price, nonce).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::mock::MockChainClient;
    use crate::op::ChainOperation;

    fn submitter(mock: MockChainClient) -> (TransactionSubmitter, Arc<MockChainClient>) {
        let mock = Arc::new(mock);
        (TransactionSubmitter::new(mock.clone()), mock)
    }

    #[tokio::test]
    async fn successful_submission_returns_hash() {
        let (submitter, mock) = submitter(MockChainClient::new().with_tx_hash("0xabc"));
        let outcome = submitter
            .submit(&TransactionRequest::register_product("p1", "Widget", "B1", "Acme"))
            .await;
        assert_eq!(
            outcome,
            TransactionOutcome::Success {
                tx_hash: "0xabc".into()
            }
        );
        assert_eq!(mock.submit_count(), 1);
    }

    #[tokio::test]
    async fn submit_is_invoked_at_most_once_even_on_failure() {
        // No automatic retry: a slow or failing network must still see
        // exactly one submission per business operation.
        let (submitter, mock) = submitter(
            MockChainClient::new().fail_submit("connection timed out waiting for receipt"),
        );
        let outcome = submitter
            .submit(&TransactionRequest::update_status("p1", "Shipped"))
            .await;
        assert!(!outcome.is_success());
        assert_eq!(mock.submit_count(), 1);
    }

    #[tokio::test]
    async fn gas_price_is_inflated_and_floored() {
        let (submitter, mock) = submitter(MockChainClient::new().with_gas_price(1_000_000_001));
        submitter
            .submit(&TransactionRequest::update_status("p1", "Shipped"))
            .await;
        let recorded = mock.submissions();
        // floor(1_000_000_001 * 1.2) = 1_200_000_001
        assert_eq!(recorded[0].gas_price, U256::from(1_200_000_001u64));
    }

    #[tokio::test]
    async fn gas_estimate_is_inflated() {
        let (submitter, mock) = submitter(MockChainClient::new().with_estimate(100_000));
        submitter
            .submit(&TransactionRequest::update_status("p1", "Shipped"))
            .await;
        assert_eq!(mock.submissions()[0].gas_limit, U256::from(120_000u64));
    }

    #[tokio::test]
    async fn estimation_failure_falls_back_to_operation_default() {
        // The submission still happens, using the per-operation default
        // limit inflated by 1.2 and floored.
        for (operation, default) in [
            (ChainOperation::RegisterProduct, 300_000u64),
            (ChainOperation::UpdateProductStatus, 200_000),
            (ChainOperation::AddTraceRecord, 250_000),
        ] {
            let (submitter, mock) =
                submitter(MockChainClient::new().fail_estimation("cannot simulate call"));
            let args = operation
                .arg_names()
                .iter()
                .map(|n| n.to_string())
                .collect();
            let outcome = submitter
                .submit(&TransactionRequest::new(operation, args))
                .await;

            assert!(outcome.is_success());
            let recorded = mock.submissions();
            assert_eq!(recorded.len(), 1);
            assert_eq!(recorded[0].gas_limit, U256::from(default * 12 / 10));
        }
    }

    #[tokio::test]
    async fn nonce_comes_from_pending_count() {
        let (submitter, mock) = submitter(MockChainClient::new().with_nonce(42));
        submitter
            .submit(&TransactionRequest::update_status("p1", "Shipped"))
            .await;
        assert_eq!(mock.submissions()[0].nonce, U256::from(42u64));
    }

    #[tokio::test]
    async fn arguments_are_trimmed_before_submission() {
        let (submitter, mock) = submitter(MockChainClient::new());
        submitter
            .submit(&TransactionRequest::register_product(
                " p1 ", " Widget", "B1 ", " Acme ",
            ))
            .await;
        assert_eq!(
            mock.submissions()[0].request.args,
            vec!["p1", "Widget", "B1", "Acme"]
        );
    }

    #[tokio::test]
    async fn empty_argument_fails_fast_without_network_call() {
        let (submitter, mock) = submitter(MockChainClient::new());
        let outcome = submitter
            .submit(&TransactionRequest::register_product("p1", "   ", "B1", "Acme"))
            .await;

        match outcome {
            TransactionOutcome::Failure { message, .. } => {
                assert!(message.contains("`name`"), "got: {message}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        let counts = mock.counts();
        assert_eq!(counts.gas_price, 0);
        assert_eq!(counts.estimate_gas, 0);
        assert_eq!(counts.submit, 0);
    }

    #[tokio::test]
    async fn submission_errors_are_classified() {
        let cases = [
            ("replacement transaction underpriced", FailureKind::Underpriced),
            ("insufficient funds for gas * price + value", FailureKind::InsufficientFunds),
            ("nonce too low", FailureKind::NonceConflict),
            ("execution reverted: already registered", FailureKind::ContractRejected),
            ("intrinsic gas too low", FailureKind::Congested),
            ("connection reset by peer", FailureKind::Unknown),
        ];

        for (raw, expected) in cases {
            let (submitter, _mock) = submitter(MockChainClient::new().fail_submit(raw));
            let outcome = submitter
                .submit(&TransactionRequest::update_status("p1", "Shipped"))
                .await;
            match outcome {
                TransactionOutcome::Failure { kind, .. } => {
                    assert_eq!(kind, expected, "message: {raw}")
                }
                other => panic!("expected failure for {raw}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn transport_failure_on_gas_price_never_reaches_submit() {
        let (submitter, mock) =
            submitter(MockChainClient::new().fail_gas_price("connection refused"));
        let outcome = submitter
            .submit(&TransactionRequest::update_status("p1", "Shipped"))
            .await;
        assert!(!outcome.is_success());
        assert_eq!(mock.submit_count(), 0);
    }
}
