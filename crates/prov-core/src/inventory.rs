//! Per-user, per-product inventory quantities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ProductId;

/// Quantity of one product held by one user.
///
/// Manufacturers accumulate stock at product creation; completed export
/// orders subtract from the exporter, completed imports add to the
/// importer, completed sales subtract from the seller. Quantities never
/// go negative — the store rejects adjustments that would.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub user_id: String,
    pub product_id: ProductId,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}
