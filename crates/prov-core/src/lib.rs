//! # prov-core — Core Domain Types
//!
//! Domain primitives shared by every crate in the Provenance Stack:
//! identifier newtypes, the product/order/trace/inventory records held in
//! the document store, and the closed lifecycle enums that gate what the
//! reconciliation layer is allowed to persist.
//!
//! ## Crate Policy
//!
//! - No I/O, no async, no HTTP types. Pure data.
//! - Every record is `serde`-serializable; enums serialize to the
//!   snake_case wire strings the store and API use.
//! - Identifier newtypes are distinct types — a [`ProductId`] cannot be
//!   passed where an [`OrderId`] is expected.

pub mod error;
pub mod ids;
pub mod inventory;
pub mod order;
pub mod product;
pub mod role;
pub mod trace;
pub mod user;

pub use error::ParseEnumError;
pub use ids::{OrderId, ProductId, TraceId};
pub use inventory::InventoryRecord;
pub use order::{OrderRecord, OrderStatus, OrderType};
pub use product::{BlockchainStatus, ProductRecord};
pub use role::UserRole;
pub use trace::{TraceRecord, TraceStage};
pub use user::UserProfile;
