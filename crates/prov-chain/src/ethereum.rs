//! # Ethers-Backed Chain Client
//!
//! Production implementation of [`ChainClient`] over an HTTPS JSON-RPC
//! provider with local signing. Transactions are sent as legacy
//! (gas-price) transactions because the submitter's overpay policy is
//! expressed against a single gas price, matching what the registry
//! deployment expects on Sepolia.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::parse_abi;
use ethers::contract::builders::ContractCall;
use ethers::contract::Contract;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, BlockNumber, U256, U64};

use crate::client::{ChainClient, ProductState};
use crate::error::ChainError;
use crate::op::{ChainOperation, TransactionRequest};
use crate::secrets::ChainSecrets;

/// Sepolia, the network the registry contract is deployed to.
const CHAIN_ID: u64 = 11_155_111;

/// Human-readable ABI of the registry contract. The events are part of
/// the deployed interface but nothing here subscribes to them — the
/// store is the sole history ledger.
const REGISTRY_ABI: &[&str] = &[
    "function registerProduct(string productId, string name, string batch, string manufacturer)",
    "function updateProductStatus(string productId, string newStatus)",
    "function addTraceRecord(string productId, string stage, string company, string location)",
    "function getProduct(string productId) view returns (string, string, string, string, uint256)",
    "event ProductRegistered(string productId, string name, string manufacturer)",
    "event ProductStatusUpdated(string productId, string newStatus)",
    "event TraceRecordAdded(string productId, string stage, string company)",
];

type EthMiddleware = SignerMiddleware<Provider<Http>, LocalWallet>;

/// [`ChainClient`] over ethers: Infura HTTPS provider, local wallet,
/// and a dynamic contract binding for the registry ABI.
#[derive(Debug)]
pub struct EthereumClient {
    inner: Arc<EthMiddleware>,
    contract: Contract<EthMiddleware>,
    address: Address,
}

impl EthereumClient {
    /// Construct the provider, wallet, and contract handle from the
    /// secret blob. Performs no network I/O — the bootstrap probe does
    /// that separately.
    pub fn connect(secrets: &ChainSecrets) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(secrets.provider_url())
            .map_err(|e| ChainError::Configuration(format!("invalid provider url: {e}")))?;

        let wallet: LocalWallet = secrets
            .raw_private_key()
            .parse()
            .map_err(|e| ChainError::Configuration(format!("invalid signing key: {e}")))?;
        let wallet = wallet.with_chain_id(CHAIN_ID);
        let address = wallet.address();

        let contract_address: Address = secrets
            .contract_address
            .parse()
            .map_err(|e| ChainError::Configuration(format!("invalid contract address: {e}")))?;

        let abi = parse_abi(REGISTRY_ABI)
            .map_err(|e| ChainError::Configuration(format!("invalid registry abi: {e}")))?;

        let inner = Arc::new(SignerMiddleware::new(provider, wallet));
        let contract = Contract::new(contract_address, abi, inner.clone());

        Ok(Self {
            inner,
            contract,
            address,
        })
    }

    /// Build the contract call for a request, checking arity against
    /// the target function's signature.
    fn call_for(&self, request: &TransactionRequest) -> Result<ContractCall<EthMiddleware, ()>, ChainError> {
        let expected = request.operation.arg_names().len();
        if request.args.len() != expected {
            return Err(ChainError::InvalidArguments {
                function: request.operation.function_name(),
                reason: format!("expected {expected} arguments, got {}", request.args.len()),
            });
        }

        let args = &request.args;
        let call = match request.operation {
            ChainOperation::RegisterProduct => self.contract.method(
                "registerProduct",
                (args[0].clone(), args[1].clone(), args[2].clone(), args[3].clone()),
            ),
            ChainOperation::UpdateProductStatus => self
                .contract
                .method("updateProductStatus", (args[0].clone(), args[1].clone())),
            ChainOperation::AddTraceRecord => self.contract.method(
                "addTraceRecord",
                (args[0].clone(), args[1].clone(), args[2].clone(), args[3].clone()),
            ),
        }
        .map_err(|e| ChainError::InvalidArguments {
            function: request.operation.function_name(),
            reason: e.to_string(),
        })?;

        Ok(call.from(self.address).legacy())
    }
}

#[async_trait]
impl ChainClient for EthereumClient {
    async fn gas_price(&self) -> Result<U256, ChainError> {
        self.inner
            .get_gas_price()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn estimate_gas(&self, request: &TransactionRequest) -> Result<U256, ChainError> {
        self.call_for(request)?
            .estimate_gas()
            .await
            .map_err(|e| ChainError::EstimationFailed(e.to_string()))
    }

    async fn pending_nonce(&self) -> Result<U256, ChainError> {
        self.inner
            .get_transaction_count(self.address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn submit(
        &self,
        request: &TransactionRequest,
        gas_limit: U256,
        gas_price: U256,
        nonce: U256,
    ) -> Result<String, ChainError> {
        let call = self
            .call_for(request)?
            .gas(gas_limit)
            .gas_price(gas_price)
            .nonce(nonce);

        let pending = call
            .send()
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?;

        // Block until the network reports inclusion.
        let receipt = pending
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?
            .ok_or_else(|| {
                ChainError::Submission("transaction dropped before inclusion".to_string())
            })?;

        if receipt.status == Some(U64::zero()) {
            return Err(ChainError::Submission(format!(
                "transaction {:#x} reverted on-chain",
                receipt.transaction_hash
            )));
        }

        Ok(format!("{:#x}", receipt.transaction_hash))
    }

    async fn product_state(&self, product_id: &str) -> Result<Option<ProductState>, ChainError> {
        let call = self
            .contract
            .method::<_, (String, String, String, String, U256)>(
                "getProduct",
                (product_id.trim().to_string(),),
            )
            .map_err(|e| ChainError::Call(e.to_string()))?;

        let (name, batch, manufacturer, status, timestamp) = match call.call().await {
            Ok(tuple) => tuple,
            Err(e) => {
                let message = e.to_string();
                // Registry deployments differ in whether a missing key
                // reverts or returns the zero tuple; treat a revert as
                // absence rather than an error.
                if message.to_ascii_lowercase().contains("revert") {
                    return Ok(None);
                }
                return Err(ChainError::Call(message));
            }
        };

        if name.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(ProductState {
            name,
            batch,
            manufacturer,
            status: if status.is_empty() {
                "Created".to_string()
            } else {
                status
            },
            timestamp: timestamp.as_u64(),
        }))
    }

    async fn chain_id(&self) -> Result<U256, ChainError> {
        self.inner
            .get_chainid()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn balance(&self) -> Result<U256, ChainError> {
        self.inner
            .get_balance(self.address, None)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    fn sender_address(&self) -> String {
        format!("{:#x}", self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets() -> ChainSecrets {
        ChainSecrets::from_json(
            r#"{
                "INFURA_API_KEY": "test-project-id",
                "PRIVATE_KEY": "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
                "CONTRACT_ADDRESS": "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn connect_builds_client_from_secrets() {
        let client = EthereumClient::connect(&secrets()).unwrap();
        // Address derived from the fixture key.
        assert!(client.sender_address().starts_with("0x"));
        assert_eq!(client.sender_address().len(), 42);
    }

    #[test]
    fn connect_rejects_bad_contract_address() {
        let mut s = secrets();
        s.contract_address = "not-an-address".into();
        let err = EthereumClient::connect(&s).unwrap_err();
        assert!(matches!(err, ChainError::Configuration(_)));
    }

    #[test]
    fn connect_rejects_bad_private_key() {
        let blob = r#"{
            "INFURA_API_KEY": "k",
            "PRIVATE_KEY": "zznothex",
            "CONTRACT_ADDRESS": "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        }"#;
        let s = ChainSecrets::from_json(blob).unwrap();
        let err = EthereumClient::connect(&s).unwrap_err();
        assert!(matches!(err, ChainError::Configuration(_)));
    }

    #[test]
    fn call_for_rejects_wrong_arity() {
        let client = EthereumClient::connect(&secrets()).unwrap();
        let request = TransactionRequest::new(
            ChainOperation::RegisterProduct,
            vec!["only-one-arg".into()],
        );
        let err = client.call_for(&request).unwrap_err();
        assert!(matches!(err, ChainError::InvalidArguments { .. }));
    }

    #[test]
    fn call_for_accepts_full_arity() {
        let client = EthereumClient::connect(&secrets()).unwrap();
        let request = TransactionRequest::register_product("p1", "Widget", "B1", "Acme");
        assert!(client.call_for(&request).is_ok());
    }
}
