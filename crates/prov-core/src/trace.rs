//! # Trace Records
//!
//! Append-only history of a product's movement through the supply chain.
//! One record is appended per completed export/import order. Records are
//! never mutated or deleted; their timestamp ordering is the
//! authoritative history shown to verifiers — the chain holds only the
//! product's current state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseEnumError;
use crate::ids::{OrderId, ProductId, TraceId};

/// Supply-chain stage recorded on a trace entry and sent to the contract
/// as the `stage` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraceStage {
    Exported,
    Imported,
}

impl TraceStage {
    /// The wire/store/contract representation of this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exported => "Exported",
            Self::Imported => "Imported",
        }
    }
}

impl fmt::Display for TraceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraceStage {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Exported" => Ok(Self::Exported),
            "Imported" => Ok(Self::Imported),
            other => Err(ParseEnumError::new("trace stage", other)),
        }
    }
}

/// One append-only trace entry for a product.
///
/// `blockchain_tx_hash` is set only when the on-chain trace-append for
/// this stage succeeded; partial chain coverage of a product's history
/// is expected and must render correctly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub trace_id: TraceId,
    pub product_id: ProductId,
    pub stage: TraceStage,
    /// Display name of the company that performed the transition.
    pub company_name: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain_tx_hash: Option<String>,
    pub quantity: i64,
    pub order_id: OrderId,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_roundtrip() {
        assert_eq!("Exported".parse::<TraceStage>().unwrap(), TraceStage::Exported);
        assert_eq!("Imported".parse::<TraceStage>().unwrap(), TraceStage::Imported);
        assert!("Sold".parse::<TraceStage>().is_err());
    }

    #[test]
    fn missing_hash_is_omitted_from_json() {
        let record = TraceRecord {
            trace_id: TraceId::new(),
            product_id: ProductId::new(),
            stage: TraceStage::Exported,
            company_name: "Acme".into(),
            location: "Vietnam".into(),
            blockchain_tx_hash: None,
            quantity: 5,
            order_id: OrderId::new(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("blockchain_tx_hash"));
    }
}
