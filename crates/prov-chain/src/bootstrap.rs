//! # Configuration Bootstrap
//!
//! Once-per-process initialization of the chain integration, tolerant
//! of total chain unavailability. The state machine is
//! `Uninitialized → { Ready, Degraded }`; `Degraded` is permanent for
//! the process lifetime — secrets or network conditions changing
//! requires a restart, and re-probing on every request during an outage
//! would add latency to every single call.
//!
//! The state is an explicit value held in application state and passed
//! to request handlers, so the Ready/Degraded split is testable without
//! process restarts.

use std::sync::Arc;

use ethers::types::U256;

use crate::client::ChainClient;
use crate::error::ChainError;
use crate::ethereum::EthereumClient;
use crate::secrets::ChainSecrets;
use crate::submitter::TransactionSubmitter;

/// Balance below which bootstrap warns that transactions may fail:
/// 0.001 ETH in wei.
const LOW_BALANCE_WEI: u64 = 1_000_000_000_000_000;

/// Live handles produced by a successful bootstrap. The signing key
/// inside the client is read-only shared state for the process
/// lifetime.
pub struct ChainContext {
    pub client: Arc<dyn ChainClient>,
    pub submitter: TransactionSubmitter,
    /// Deployed registry address, surfaced on the health endpoint.
    pub contract_address: String,
}

impl ChainContext {
    fn new(client: Arc<dyn ChainClient>, contract_address: String) -> Self {
        Self {
            submitter: TransactionSubmitter::new(client.clone()),
            client,
            contract_address,
        }
    }
}

/// Bootstrap outcome, held in application state.
#[derive(Clone)]
pub enum BootstrapState {
    /// Bootstrap has not run (only seen in tests and before startup).
    Uninitialized,
    /// Chain integration is live.
    Ready(Arc<ChainContext>),
    /// Chain integration is unavailable; the store-backed business
    /// logic continues with reduced guarantees.
    Degraded {
        reason: String,
    },
}

impl BootstrapState {
    /// Load secrets from the environment and initialize. Never fails:
    /// every error becomes `Degraded` with the cause logged.
    pub async fn initialize() -> Self {
        match ChainSecrets::from_env() {
            Ok(secrets) => Self::initialize_with(secrets).await,
            Err(e) => {
                tracing::warn!(error = %e, "chain secrets unavailable, running degraded");
                Self::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Initialize from an already-loaded secret blob: construct the
    /// signing account and contract handle, then probe the network id
    /// and account balance. A low balance is a warning, not a failure.
    pub async fn initialize_with(secrets: ChainSecrets) -> Self {
        match Self::try_initialize(secrets).await {
            Ok(context) => {
                tracing::info!(
                    account = %context.client.sender_address(),
                    contract = %context.contract_address,
                    "chain integration ready"
                );
                Self::Ready(Arc::new(context))
            }
            Err(e) => {
                tracing::warn!(error = %e, "chain bootstrap failed, running degraded");
                Self::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_initialize(secrets: ChainSecrets) -> Result<ChainContext, ChainError> {
        let client = EthereumClient::connect(&secrets)?;

        let network = client.chain_id().await?;
        tracing::info!(chain_id = %network, "connected to network");

        let balance = client.balance().await?;
        if balance < U256::from(LOW_BALANCE_WEI) {
            tracing::warn!(balance_wei = %balance, "low account balance, transactions may fail");
        }

        let client: Arc<dyn ChainClient> = Arc::new(client);
        Ok(ChainContext::new(client, secrets.contract_address.clone()))
    }

    /// Wrap an existing client as a `Ready` state. Used by tests and by
    /// deployments that construct their own client.
    pub fn ready_with(client: Arc<dyn ChainClient>, contract_address: impl Into<String>) -> Self {
        Self::Ready(Arc::new(ChainContext::new(client, contract_address.into())))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The live handles, when ready.
    pub fn context(&self) -> Option<&Arc<ChainContext>> {
        match self {
            Self::Ready(context) => Some(context),
            _ => None,
        }
    }

    /// Human-readable label for health reporting.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready(_) => "connected",
            Self::Degraded { .. } => "disconnected",
        }
    }
}

impl std::fmt::Debug for BootstrapState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("Uninitialized"),
            Self::Ready(context) => f
                .debug_struct("Ready")
                .field("contract", &context.contract_address)
                .finish(),
            Self::Degraded { reason } => {
                f.debug_struct("Degraded").field("reason", reason).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChainClient;

    #[tokio::test]
    async fn missing_secrets_degrade_without_panicking() {
        let blob = r#"{"INFURA_API_KEY":"k"}"#;
        let err = ChainSecrets::from_json(blob).unwrap_err();
        // from_env would surface the same error; drive the state
        // machine directly with the parse failure.
        let state = BootstrapState::Degraded {
            reason: err.to_string(),
        };
        assert!(!state.is_ready());
        assert!(state.context().is_none());
        assert_eq!(state.label(), "disconnected");
    }

    #[tokio::test]
    async fn invalid_key_material_degrades() {
        let secrets = ChainSecrets::from_json(
            r#"{"INFURA_API_KEY":"k","PRIVATE_KEY":"zznothex","CONTRACT_ADDRESS":"0x5FbDB2315678afecb367f032d93F642f64180aa3"}"#,
        )
        .unwrap();
        let state = BootstrapState::initialize_with(secrets).await;
        match state {
            BootstrapState::Degraded { reason } => {
                assert!(reason.contains("signing key"), "got: {reason}")
            }
            other => panic!("expected degraded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ready_with_exposes_context() {
        let client = Arc::new(MockChainClient::new());
        let state = BootstrapState::ready_with(client, "0xcontract");
        assert!(state.is_ready());
        assert_eq!(state.label(), "connected");
        let context = state.context().unwrap();
        assert_eq!(context.contract_address, "0xcontract");
    }

    #[test]
    fn uninitialized_label() {
        assert_eq!(BootstrapState::Uninitialized.label(), "uninitialized");
    }
}
