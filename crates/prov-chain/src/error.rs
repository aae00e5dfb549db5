//! # Chain Errors and the Failure Taxonomy
//!
//! Two layers of error live here. [`ChainError`] is what the client and
//! submitter internals propagate with `?`. [`FailureKind`] is the
//! closed taxonomy the rest of the system sees: the submitter folds
//! every `ChainError` into a [`TransactionOutcome`] and nothing above
//! it ever handles a raw transport error.
//!
//! ## Classification
//!
//! Node error wording is not under our control, so classification is a
//! prioritized list of substring predicates evaluated in order, with an
//! explicit `Unknown` fallback. The table is unit-tested against the
//! error strings Sepolia nodes actually emit so that upstream wording
//! drift degrades safely to `Unknown` instead of misclassifying.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from chain client operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The node could not simulate the call, or simulation reverted.
    #[error("gas estimation failed: {0}")]
    EstimationFailed(String),

    /// Transport-level RPC failure (connection, timeout, non-JSON body).
    #[error("rpc error: {0}")]
    Rpc(String),

    /// The signed transaction was rejected, dropped, or reverted.
    #[error("transaction submission failed: {0}")]
    Submission(String),

    /// A read-only contract call failed.
    #[error("contract call failed: {0}")]
    Call(String),

    /// The request does not match the target function's signature.
    #[error("invalid arguments for {function}: {reason}")]
    InvalidArguments {
        /// Contract function the request targeted.
        function: &'static str,
        /// What was wrong with the arguments.
        reason: String,
    },

    /// Client construction failed (bad key, bad address, bad URL).
    #[error("chain client configuration error: {0}")]
    Configuration(String),
}

/// Closed taxonomy of submission failures, ordered by classification
/// priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The network rejected the gas price as too low to replace or
    /// compete ("replacement transaction underpriced").
    Underpriced,
    /// The signing account cannot cover gas × price.
    InsufficientFunds,
    /// The nonce was already consumed, usually by a concurrent
    /// submission from another instance of this service.
    NonceConflict,
    /// The contract reverted the call.
    ContractRejected,
    /// Gas-related failure not matched above; the network may be
    /// congested or estimation may be unreliable.
    Congested,
    /// Nothing matched; the raw message is passed through.
    Unknown,
}

/// Prioritized substring predicates. First match wins; matching is
/// case-insensitive against the lowercased transport message.
const CLASSIFIERS: &[(&str, FailureKind)] = &[
    ("replacement transaction underpriced", FailureKind::Underpriced),
    ("insufficient funds", FailureKind::InsufficientFunds),
    ("nonce", FailureKind::NonceConflict),
    ("revert", FailureKind::ContractRejected),
    ("gas", FailureKind::Congested),
];

/// Map a heterogeneous transport error message to the closed taxonomy.
pub fn classify_failure(message: &str) -> FailureKind {
    let lowered = message.to_ascii_lowercase();
    CLASSIFIERS
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, kind)| *kind)
        .unwrap_or(FailureKind::Unknown)
}

impl FailureKind {
    /// The caller-visible message for this failure class. `Unknown`
    /// passes the raw transport message through unchanged.
    pub fn caller_message(&self, raw: &str) -> String {
        match self {
            Self::Underpriced => "transaction gas price too low, retry with a higher gas price".to_string(),
            Self::InsufficientFunds => "insufficient funds for blockchain transaction".to_string(),
            Self::NonceConflict => "transaction nonce error, please try again".to_string(),
            Self::ContractRejected => "transaction rejected by contract, product may already exist".to_string(),
            Self::Congested => "gas estimation failed, network may be congested".to_string(),
            Self::Unknown => raw.to_string(),
        }
    }
}

/// Result of one attempted submission: the contract between the
/// submitter and the reconciliation layer, and the sole signal used to
/// decide the store-side blockchain status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// The transaction was mined; carries its hash.
    Success {
        tx_hash: String,
    },
    /// The submission failed; carries the classified kind and the
    /// caller-visible message.
    Failure {
        kind: FailureKind,
        message: String,
    },
}

impl TransactionOutcome {
    /// The transaction hash when the outcome is a success.
    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            Self::Success { tx_hash } => Some(tx_hash),
            Self::Failure { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Error strings as emitted by geth/Infura, observed on Sepolia.
    #[test]
    fn classifies_underpriced() {
        assert_eq!(
            classify_failure("replacement transaction underpriced"),
            FailureKind::Underpriced
        );
    }

    #[test]
    fn classifies_insufficient_funds() {
        assert_eq!(
            classify_failure("insufficient funds for gas * price + value"),
            FailureKind::InsufficientFunds
        );
    }

    #[test]
    fn classifies_nonce_conflict() {
        assert_eq!(classify_failure("nonce too low"), FailureKind::NonceConflict);
        assert_eq!(
            classify_failure("invalid nonce: expected 14, got 12"),
            FailureKind::NonceConflict
        );
    }

    #[test]
    fn classifies_revert() {
        assert_eq!(
            classify_failure("execution reverted: product exists"),
            FailureKind::ContractRejected
        );
    }

    #[test]
    fn classifies_gas_as_congested() {
        assert_eq!(
            classify_failure("out of gas during execution simulation"),
            FailureKind::Congested
        );
    }

    #[test]
    fn priority_order_underpriced_before_gas() {
        // "replacement transaction underpriced" messages also mention gas
        // price; the earlier predicate must win.
        assert_eq!(
            classify_failure("replacement transaction underpriced: new gas price too low"),
            FailureKind::Underpriced
        );
    }

    #[test]
    fn priority_order_funds_before_gas() {
        assert_eq!(
            classify_failure("insufficient funds for gas"),
            FailureKind::InsufficientFunds
        );
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(
            classify_failure("Insufficient Funds For Transfer"),
            FailureKind::InsufficientFunds
        );
    }

    #[test]
    fn unmatched_message_is_unknown() {
        assert_eq!(
            classify_failure("connection reset by peer"),
            FailureKind::Unknown
        );
    }

    #[test]
    fn unknown_passes_raw_message_through() {
        let raw = "connection reset by peer";
        assert_eq!(FailureKind::Unknown.caller_message(raw), raw);
    }

    #[test]
    fn known_kinds_use_policy_messages() {
        let raw = "replacement transaction underpriced";
        let msg = FailureKind::Underpriced.caller_message(raw);
        assert!(msg.contains("gas price too low"));
        assert!(FailureKind::InsufficientFunds
            .caller_message(raw)
            .contains("insufficient funds"));
        assert!(FailureKind::NonceConflict.caller_message(raw).contains("nonce"));
    }

    #[test]
    fn outcome_hash_accessor() {
        let ok = TransactionOutcome::Success {
            tx_hash: "0xabc".into(),
        };
        assert_eq!(ok.tx_hash(), Some("0xabc"));
        assert!(ok.is_success());

        let failed = TransactionOutcome::Failure {
            kind: FailureKind::Congested,
            message: "congested".into(),
        };
        assert_eq!(failed.tx_hash(), None);
        assert!(!failed.is_success());
    }
}
