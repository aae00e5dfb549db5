//! # prov-store — Document Store Boundary
//!
//! The core treats the document store as an abstract capability:
//! idempotent upsert, point lookup, and secondary-index/prefix query,
//! with writes durable and immediately visible to subsequent reads.
//! [`Store`] is that capability as a trait.
//!
//! Two backends implement it:
//!
//! - [`memory::MemoryStore`] — dashmap-backed, used by tests and by
//!   deployments without a database.
//! - [`postgres::PgStore`] — SQLx/PostgreSQL, selected when
//!   `DATABASE_URL` is set, with embedded migrations.
//!
//! Conditional writes (status updates, deletes) fail with
//! [`StoreError::NotFound`] when the target record is absent; that is
//! always a client error upstream, never silently retried.

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use prov_core::{
    BlockchainStatus, InventoryRecord, OrderId, OrderRecord, OrderStatus, ProductId,
    ProductRecord, TraceRecord, UserProfile, UserRole,
};

/// The document-store capability consumed by the reconciliation layer
/// and the read paths.
#[async_trait]
pub trait Store: Send + Sync {
    // -- products ---------------------------------------------------------

    /// Idempotent upsert of a product record.
    async fn put_product(&self, product: &ProductRecord) -> Result<(), StoreError>;

    /// Point lookup by primary key.
    async fn product(&self, product_id: ProductId) -> Result<Option<ProductRecord>, StoreError>;

    /// All products (secondary-index scan), newest first.
    async fn list_products(&self) -> Result<Vec<ProductRecord>, StoreError>;

    /// Products created by one manufacturer.
    async fn list_products_by_manufacturer(
        &self,
        manufacturer_id: &str,
    ) -> Result<Vec<ProductRecord>, StoreError>;

    /// Record the outcome of a chain-confirmed transition: the
    /// reconciliation layer's only post-creation product mutation.
    /// Conditional — fails with `NotFound` when the product is absent.
    async fn update_product_chain_state(
        &self,
        product_id: ProductId,
        status: BlockchainStatus,
        last_tx_hash: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Conditional delete, scoped to the owning manufacturer.
    async fn delete_product(
        &self,
        manufacturer_id: &str,
        product_id: ProductId,
    ) -> Result<(), StoreError>;

    /// Number of products created by one manufacturer.
    async fn count_products_by_manufacturer(
        &self,
        manufacturer_id: &str,
    ) -> Result<u64, StoreError>;

    // -- orders -----------------------------------------------------------

    /// Idempotent upsert of an order record.
    async fn put_order(&self, order: &OrderRecord) -> Result<(), StoreError>;

    /// Point lookup scoped to the creating user.
    async fn order(
        &self,
        owner_id: &str,
        order_id: OrderId,
    ) -> Result<Option<OrderRecord>, StoreError>;

    /// All orders created by one user (prefix query), newest first.
    async fn list_orders(&self, owner_id: &str) -> Result<Vec<OrderRecord>, StoreError>;

    /// Conditional status update — fails with `NotFound` when the order
    /// is absent.
    async fn update_order_status(
        &self,
        owner_id: &str,
        order_id: OrderId,
        status: OrderStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    // -- trace records ----------------------------------------------------

    /// Append one trace record. Trace records are never mutated or
    /// deleted.
    async fn append_trace(&self, record: &TraceRecord) -> Result<(), StoreError>;

    /// All trace records in a product's partition, ordered by timestamp
    /// ascending.
    async fn traces_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<TraceRecord>, StoreError>;

    // -- inventory --------------------------------------------------------

    /// Current quantity of a product held by a user (0 when absent).
    async fn inventory_quantity(
        &self,
        user_id: &str,
        product_id: ProductId,
    ) -> Result<i64, StoreError>;

    /// Apply a signed delta to a user's inventory, rejecting results
    /// below zero. Returns the new quantity.
    async fn adjust_inventory(
        &self,
        user_id: &str,
        product_id: ProductId,
        delta: i64,
    ) -> Result<i64, StoreError>;

    /// All inventory records for a user.
    async fn list_inventory(&self, user_id: &str) -> Result<Vec<InventoryRecord>, StoreError>;

    // -- users ------------------------------------------------------------

    /// Point lookup of a user profile.
    async fn user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Idempotent upsert of a user profile.
    async fn put_user(&self, profile: &UserProfile) -> Result<(), StoreError>;

    /// Conditional role update — fails with `NotFound` when the profile
    /// is absent.
    async fn update_user_role(&self, user_id: &str, role: UserRole) -> Result<(), StoreError>;

    /// All users holding a role (secondary-index query).
    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<UserProfile>, StoreError>;

    // -- health -----------------------------------------------------------

    /// Cheap backend reachability check for the readiness probe.
    async fn healthcheck(&self) -> Result<(), StoreError>;
}
