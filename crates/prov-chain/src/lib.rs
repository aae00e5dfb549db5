//! # prov-chain — Ethereum Registry Client
//!
//! Everything that talks to the product-registry contract lives here:
//! the [`ChainClient`] trait and its ethers-backed implementation, the
//! [`TransactionSubmitter`] that turns one business intent into a
//! classified [`TransactionOutcome`], the secret-blob loader, and the
//! once-per-process [`BootstrapState`] machine.
//!
//! ## Architecture
//!
//! The [`client::ChainClient`] trait abstracts over the registry
//! backend. Production wires [`ethereum::EthereumClient`] (Infura
//! Sepolia over HTTPS, local signing key); tests wire
//! [`mock::MockChainClient`]. The submitter and the reconciliation
//! layer above it never know which one they hold.
//!
//! ## Submission Policy
//!
//! Public testnets reject naive submissions constantly, so the
//! submitter applies a fixed policy per call: 1.2× gas-price overpay,
//! estimation with per-operation hardcoded fallback limits, a 1.2×
//! limit buffer, and a nonce fetched at the pending block immediately
//! before signing. It never retries — a retry without nonce awareness
//! risks double submission, so retry policy belongs to callers.
//!
//! ## Error Handling
//!
//! The submitter never returns `Err`. Every failure is folded into the
//! closed [`FailureKind`] taxonomy by a prioritized substring table,
//! with `Unknown` passing the raw transport message through.

pub mod bootstrap;
pub mod client;
pub mod error;
pub mod ethereum;
pub mod mock;
pub mod op;
pub mod secrets;
pub mod submitter;

pub use bootstrap::{BootstrapState, ChainContext};
pub use client::{ChainClient, ProductState};
pub use error::{ChainError, FailureKind, TransactionOutcome};
pub use ethereum::EthereumClient;
pub use mock::MockChainClient;
pub use op::{ChainOperation, TransactionRequest};
pub use secrets::{ChainSecrets, SecretsError};
pub use submitter::TransactionSubmitter;
