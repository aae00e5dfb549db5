//! # Registry Operations
//!
//! The closed set of write operations the registry contract exposes,
//! and the in-flight request type the submitter consumes. The
//! per-operation default gas limits live here as one table rather than
//! as literals scattered across call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A write operation on the product-registry contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainOperation {
    /// `registerProduct(productId, name, batch, manufacturer)`
    RegisterProduct,
    /// `updateProductStatus(productId, newStatus)`
    UpdateProductStatus,
    /// `addTraceRecord(productId, stage, company, location)`
    AddTraceRecord,
}

impl ChainOperation {
    /// The contract function name for this operation.
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::RegisterProduct => "registerProduct",
            Self::UpdateProductStatus => "updateProductStatus",
            Self::AddTraceRecord => "addTraceRecord",
        }
    }

    /// Ordered argument names, used for arity checks and for naming the
    /// offending argument in validation failures.
    pub fn arg_names(&self) -> &'static [&'static str] {
        match self {
            Self::RegisterProduct => &["productId", "name", "batch", "manufacturer"],
            Self::UpdateProductStatus => &["productId", "newStatus"],
            Self::AddTraceRecord => &["productId", "stage", "company", "location"],
        }
    }

    /// Gas limit used when estimation fails. Estimation failure is
    /// routine on public testnets and must not block a transaction that
    /// would otherwise succeed.
    pub fn default_gas_limit(&self) -> u64 {
        match self {
            Self::RegisterProduct => 300_000,
            Self::UpdateProductStatus => 200_000,
            Self::AddTraceRecord => 250_000,
        }
    }
}

impl fmt::Display for ChainOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

/// One in-flight intent to call a contract function. Created per
/// business call, never persisted, consumed by the submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub operation: ChainOperation,
    /// Ordered, string-coerced arguments matching
    /// [`ChainOperation::arg_names`].
    pub args: Vec<String>,
}

impl TransactionRequest {
    pub fn new(operation: ChainOperation, args: Vec<String>) -> Self {
        Self { operation, args }
    }

    /// Convenience constructor for product registration.
    pub fn register_product(
        product_id: impl Into<String>,
        name: impl Into<String>,
        batch: impl Into<String>,
        manufacturer: impl Into<String>,
    ) -> Self {
        Self::new(
            ChainOperation::RegisterProduct,
            vec![product_id.into(), name.into(), batch.into(), manufacturer.into()],
        )
    }

    /// Convenience constructor for a status update.
    pub fn update_status(product_id: impl Into<String>, new_status: impl Into<String>) -> Self {
        Self::new(
            ChainOperation::UpdateProductStatus,
            vec![product_id.into(), new_status.into()],
        )
    }

    /// Convenience constructor for a trace-record append.
    pub fn add_trace_record(
        product_id: impl Into<String>,
        stage: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self::new(
            ChainOperation::AddTraceRecord,
            vec![product_id.into(), stage.into(), company.into(), location.into()],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gas_limits_match_operation_table() {
        assert_eq!(ChainOperation::RegisterProduct.default_gas_limit(), 300_000);
        assert_eq!(ChainOperation::UpdateProductStatus.default_gas_limit(), 200_000);
        assert_eq!(ChainOperation::AddTraceRecord.default_gas_limit(), 250_000);
    }

    #[test]
    fn arg_names_match_contract_arity() {
        assert_eq!(ChainOperation::RegisterProduct.arg_names().len(), 4);
        assert_eq!(ChainOperation::UpdateProductStatus.arg_names().len(), 2);
        assert_eq!(ChainOperation::AddTraceRecord.arg_names().len(), 4);
    }

    #[test]
    fn constructors_fill_args_in_order() {
        let req = TransactionRequest::register_product("p1", "Widget", "B1", "Acme");
        assert_eq!(req.operation, ChainOperation::RegisterProduct);
        assert_eq!(req.args, vec!["p1", "Widget", "B1", "Acme"]);

        let req = TransactionRequest::update_status("p1", "Shipped");
        assert_eq!(req.args, vec!["p1", "Shipped"]);
    }
}
