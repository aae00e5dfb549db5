//! # Product Records
//!
//! The store-side product record and its blockchain reconciliation tag.
//!
//! The document store is the system of record for descriptive fields and
//! history; the chain is authoritative for existence and current status.
//! [`BlockchainStatus`] is how the two are stitched together: it records
//! the outcome of the one chain submission attempted for each logical
//! write, and is the only product field (together with the transaction
//! hashes) the reconciliation layer mutates after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseEnumError;
use crate::ids::ProductId;

/// Store-side tag describing how the product relates to the on-chain
/// registry.
///
/// Invariant: `Registered` implies the record carries a transaction hash
/// returned by a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockchainStatus {
    /// A chain submission is in flight (transient, pre-reconciliation).
    Pending,
    /// The registry transaction was mined; the record carries its hash.
    Registered,
    /// Chain integration was unavailable (degraded mode); no submission
    /// was attempted.
    NotRegistered,
    /// A submission was attempted and failed; the business record exists
    /// without chain backing.
    Failed,
}

impl BlockchainStatus {
    /// The wire/store representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Registered => "registered",
            Self::NotRegistered => "not_registered",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for BlockchainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockchainStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "registered" => Ok(Self::Registered),
            "not_registered" => Ok(Self::NotRegistered),
            "failed" => Ok(Self::Failed),
            other => Err(ParseEnumError::new("blockchain status", other)),
        }
    }
}

/// A product as held in the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Primary key; immutable; also the contract-side key.
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub batch: String,
    /// Quantity held by the manufacturer at creation time.
    pub quantity: i64,
    pub price: i64,
    /// Display name of the manufacturer, as sent to the contract.
    pub manufacturer: String,
    /// Subject id of the manufacturer who created the record.
    pub manufacturer_id: String,
    /// Hash of the registration transaction, when one succeeded.
    pub blockchain_tx_hash: Option<String>,
    pub blockchain_status: BlockchainStatus,
    /// Hash of the most recent status-update transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_blockchain_tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Whether the record satisfies the registered-implies-hash invariant.
    pub fn chain_state_consistent(&self) -> bool {
        self.blockchain_status != BlockchainStatus::Registered || self.blockchain_tx_hash.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: BlockchainStatus, hash: Option<&str>) -> ProductRecord {
        let now = Utc::now();
        ProductRecord {
            product_id: ProductId::new(),
            name: "Widget".into(),
            category: "tools".into(),
            description: String::new(),
            batch: "B1".into(),
            quantity: 10,
            price: 100,
            manufacturer: "Acme".into(),
            manufacturer_id: "user-1".into(),
            blockchain_tx_hash: hash.map(str::to_string),
            blockchain_status: status,
            last_blockchain_tx_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn status_roundtrip() {
        for status in [
            BlockchainStatus::Pending,
            BlockchainStatus::Registered,
            BlockchainStatus::NotRegistered,
            BlockchainStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<BlockchainStatus>().unwrap(), status);
        }
    }

    #[test]
    fn not_registered_serializes_snake_case() {
        let json = serde_json::to_string(&BlockchainStatus::NotRegistered).unwrap();
        assert_eq!(json, "\"not_registered\"");
    }

    #[test]
    fn registered_without_hash_is_inconsistent() {
        assert!(!record(BlockchainStatus::Registered, None).chain_state_consistent());
        assert!(record(BlockchainStatus::Registered, Some("0xabc")).chain_state_consistent());
        assert!(record(BlockchainStatus::Failed, None).chain_state_consistent());
    }
}
