//! # Scriptable Mock Chain Client
//!
//! Deterministic [`ChainClient`] for tests: every operation returns a
//! scripted result and records what it was asked to do. Published as a
//! regular module (not `#[cfg(test)]`) so downstream crates can drive
//! the submitter and the reconciliation layer without a network.

use parking_lot::Mutex;

use async_trait::async_trait;
use ethers::types::U256;

use crate::client::{ChainClient, ProductState};
use crate::error::ChainError;
use crate::op::TransactionRequest;

/// Default transaction hash returned by unscripted submissions.
pub const DEFAULT_TX_HASH: &str =
    "0xabcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789";

/// One recorded `submit` invocation.
#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    pub request: TransactionRequest,
    pub gas_limit: U256,
    pub gas_price: U256,
    pub nonce: U256,
}

/// Per-operation call counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallCounts {
    pub gas_price: usize,
    pub estimate_gas: usize,
    pub pending_nonce: usize,
    pub submit: usize,
    pub product_state: usize,
}

#[derive(Debug)]
struct MockState {
    gas_price: Result<U256, String>,
    estimate: Result<U256, String>,
    nonce: u64,
    submit: Result<String, String>,
    product: Result<Option<ProductState>, String>,
    balance: U256,
    chain_id: u64,
    submissions: Vec<RecordedSubmission>,
    counts: CallCounts,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            gas_price: Ok(U256::from(10_000_000_000u64)), // 10 gwei
            estimate: Ok(U256::from(100_000u64)),
            nonce: 7,
            submit: Ok(DEFAULT_TX_HASH.to_string()),
            product: Ok(None),
            balance: U256::exp10(18), // 1 ETH
            chain_id: 11_155_111,
            submissions: Vec::new(),
            counts: CallCounts::default(),
        }
    }
}

/// Scriptable, recording chain client.
#[derive(Debug, Default)]
pub struct MockChainClient {
    state: Mutex<MockState>,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the gas price returned by [`ChainClient::gas_price`].
    pub fn with_gas_price(self, wei: u64) -> Self {
        self.state.lock().gas_price = Ok(U256::from(wei));
        self
    }

    /// Script the gas estimate.
    pub fn with_estimate(self, gas: u64) -> Self {
        self.state.lock().estimate = Ok(U256::from(gas));
        self
    }

    /// Make estimation fail with the given node message.
    pub fn fail_estimation(self, message: &str) -> Self {
        self.state.lock().estimate = Err(message.to_string());
        self
    }

    /// Script the nonce.
    pub fn with_nonce(self, nonce: u64) -> Self {
        self.state.lock().nonce = nonce;
        self
    }

    /// Script a successful submission returning the given hash.
    pub fn with_tx_hash(self, hash: &str) -> Self {
        self.state.lock().submit = Ok(hash.to_string());
        self
    }

    /// Make submission fail with the given node message.
    pub fn fail_submit(self, message: &str) -> Self {
        self.state.lock().submit = Err(message.to_string());
        self
    }

    /// Make the gas-price lookup fail (transport error).
    pub fn fail_gas_price(self, message: &str) -> Self {
        self.state.lock().gas_price = Err(message.to_string());
        self
    }

    /// Script the on-chain product state.
    pub fn with_product(self, state: ProductState) -> Self {
        self.state.lock().product = Ok(Some(state));
        self
    }

    /// Make the read-only product call fail (transport error).
    pub fn fail_product_state(self, message: &str) -> Self {
        self.state.lock().product = Err(message.to_string());
        self
    }

    /// Script the account balance in wei.
    pub fn with_balance(self, wei: U256) -> Self {
        self.state.lock().balance = wei;
        self
    }

    /// Everything `submit` has been asked to broadcast.
    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.state.lock().submissions.clone()
    }

    /// How many times each operation has been invoked.
    pub fn counts(&self) -> CallCounts {
        self.state.lock().counts
    }

    /// Shorthand for the number of `submit` invocations.
    pub fn submit_count(&self) -> usize {
        self.state.lock().counts.submit
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn gas_price(&self) -> Result<U256, ChainError> {
        let mut state = self.state.lock();
        state.counts.gas_price += 1;
        state.gas_price.clone().map_err(ChainError::Rpc)
    }

    async fn estimate_gas(&self, _request: &TransactionRequest) -> Result<U256, ChainError> {
        let mut state = self.state.lock();
        state.counts.estimate_gas += 1;
        state.estimate.clone().map_err(ChainError::EstimationFailed)
    }

    async fn pending_nonce(&self) -> Result<U256, ChainError> {
        let mut state = self.state.lock();
        state.counts.pending_nonce += 1;
        Ok(U256::from(state.nonce))
    }

    async fn submit(
        &self,
        request: &TransactionRequest,
        gas_limit: U256,
        gas_price: U256,
        nonce: U256,
    ) -> Result<String, ChainError> {
        let mut state = self.state.lock();
        state.counts.submit += 1;
        state.submissions.push(RecordedSubmission {
            request: request.clone(),
            gas_limit,
            gas_price,
            nonce,
        });
        state.submit.clone().map_err(ChainError::Submission)
    }

    async fn product_state(&self, _product_id: &str) -> Result<Option<ProductState>, ChainError> {
        let mut state = self.state.lock();
        state.counts.product_state += 1;
        state.product.clone().map_err(ChainError::Call)
    }

    async fn chain_id(&self) -> Result<U256, ChainError> {
        Ok(U256::from(self.state.lock().chain_id))
    }

    async fn balance(&self) -> Result<U256, ChainError> {
        Ok(self.state.lock().balance)
    }

    fn sender_address(&self) -> String {
        "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::TransactionRequest;

    #[tokio::test]
    async fn records_submissions() {
        let mock = MockChainClient::new().with_tx_hash("0x1234");
        let request = TransactionRequest::update_status("p1", "Shipped");

        let hash = mock
            .submit(&request, U256::from(1u64), U256::from(2u64), U256::from(3u64))
            .await
            .unwrap();

        assert_eq!(hash, "0x1234");
        let recorded = mock.submissions();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].request, request);
        assert_eq!(recorded[0].nonce, U256::from(3u64));
    }

    #[tokio::test]
    async fn scripted_failures_surface_as_chain_errors() {
        let mock = MockChainClient::new().fail_estimation("execution reverted");
        let request = TransactionRequest::update_status("p1", "Shipped");
        let err = mock.estimate_gas(&request).await.unwrap_err();
        assert!(matches!(err, ChainError::EstimationFailed(_)));
    }
}
