//! # Chain Client Interface
//!
//! The [`ChainClient`] trait is the single point of contact with the
//! remote network. It hides the RPC endpoint, the signing key, and ABI
//! encoding behind a small set of operations, each of which is exactly
//! one network round trip (plus whatever RPC calls the node performs
//! internally for estimation and inclusion).
//!
//! Nothing is cached across calls — gas price and nonce in particular
//! are fetched fresh per submission so that concurrent instances of
//! this service, which share a signing account but no memory, race on
//! the smallest possible window.

use async_trait::async_trait;
use ethers::types::U256;
use serde::{Deserialize, Serialize};

use crate::error::ChainError;
use crate::op::TransactionRequest;

/// Current on-chain state of a product, as returned by the contract's
/// `getProduct` view. The contract signals "not found" with an empty
/// name field; clients translate that to `None` before it gets here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductState {
    pub name: String,
    pub batch: String,
    pub manufacturer: String,
    pub status: String,
    /// Unix timestamp of on-chain registration.
    pub timestamp: u64,
}

/// Connection to the registry contract and the network behind it.
///
/// Implementations must be cheap to share (`Arc`) across request
/// handlers; the signing key inside is read-only after construction.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetch the network's current gas price in wei. No retry — the
    /// caller decides.
    async fn gas_price(&self) -> Result<U256, ChainError>;

    /// Simulate the call and return its gas cost. Fails with
    /// [`ChainError::EstimationFailed`] when the call would revert or
    /// the node cannot simulate it.
    async fn estimate_gas(&self, request: &TransactionRequest) -> Result<U256, ChainError>;

    /// The signing account's transaction count at the pending block.
    /// Fetched immediately before each submission, never cached.
    async fn pending_nonce(&self) -> Result<U256, ChainError>;

    /// Sign and broadcast, blocking until the network reports inclusion
    /// or a terminal submission error. Returns the transaction hash. A
    /// mined-but-reverted transaction is a submission error.
    async fn submit(
        &self,
        request: &TransactionRequest,
        gas_limit: U256,
        gas_price: U256,
        nonce: U256,
    ) -> Result<String, ChainError>;

    /// Read-only `getProduct` call; no signing, no gas. `None` when the
    /// product is absent (empty name field).
    async fn product_state(&self, product_id: &str) -> Result<Option<ProductState>, ChainError>;

    /// The connected network's chain id, used as a bootstrap probe.
    async fn chain_id(&self) -> Result<U256, ChainError>;

    /// The signing account's balance in wei. Health/warning signal
    /// only; never blocks business logic.
    async fn balance(&self) -> Result<U256, ChainError>;

    /// Hex address of the signing account.
    fn sender_address(&self) -> String;
}
