//! # In-Memory Store
//!
//! Dashmap-backed [`Store`] implementation. State does not survive
//! restarts; suitable for tests and for development deployments without
//! a database, mirroring the API's in-memory-only mode.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use prov_core::{
    BlockchainStatus, InventoryRecord, OrderId, OrderRecord, OrderStatus, ProductId,
    ProductRecord, TraceRecord, UserProfile, UserRole,
};

use crate::error::StoreError;
use crate::Store;

/// In-memory document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: DashMap<ProductId, ProductRecord>,
    orders: DashMap<(String, OrderId), OrderRecord>,
    traces: DashMap<ProductId, Vec<TraceRecord>>,
    inventory: DashMap<(String, ProductId), InventoryRecord>,
    users: DashMap<String, UserProfile>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put_product(&self, product: &ProductRecord) -> Result<(), StoreError> {
        self.products.insert(product.product_id, product.clone());
        Ok(())
    }

    async fn product(&self, product_id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
        Ok(self.products.get(&product_id).map(|p| p.value().clone()))
    }

    async fn list_products(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let mut products: Vec<ProductRecord> =
            self.products.iter().map(|p| p.value().clone()).collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn list_products_by_manufacturer(
        &self,
        manufacturer_id: &str,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        let mut products: Vec<ProductRecord> = self
            .products
            .iter()
            .filter(|p| p.manufacturer_id == manufacturer_id)
            .map(|p| p.value().clone())
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn update_product_chain_state(
        &self,
        product_id: ProductId,
        status: BlockchainStatus,
        last_tx_hash: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut product = self
            .products
            .get_mut(&product_id)
            .ok_or_else(|| StoreError::not_found("product", product_id))?;
        product.blockchain_status = status;
        if let Some(hash) = last_tx_hash {
            product.last_blockchain_tx_hash = Some(hash.to_string());
        }
        product.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_product(
        &self,
        manufacturer_id: &str,
        product_id: ProductId,
    ) -> Result<(), StoreError> {
        let owned = self
            .products
            .get(&product_id)
            .map(|p| p.manufacturer_id == manufacturer_id)
            .unwrap_or(false);
        if !owned {
            return Err(StoreError::not_found("product", product_id));
        }
        self.products.remove(&product_id);
        Ok(())
    }

    async fn count_products_by_manufacturer(
        &self,
        manufacturer_id: &str,
    ) -> Result<u64, StoreError> {
        Ok(self
            .products
            .iter()
            .filter(|p| p.manufacturer_id == manufacturer_id)
            .count() as u64)
    }

    async fn put_order(&self, order: &OrderRecord) -> Result<(), StoreError> {
        self.orders
            .insert((order.created_by.clone(), order.order_id), order.clone());
        Ok(())
    }

    async fn order(
        &self,
        owner_id: &str,
        order_id: OrderId,
    ) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self
            .orders
            .get(&(owner_id.to_string(), order_id))
            .map(|o| o.value().clone()))
    }

    async fn list_orders(&self, owner_id: &str) -> Result<Vec<OrderRecord>, StoreError> {
        let mut orders: Vec<OrderRecord> = self
            .orders
            .iter()
            .filter(|entry| entry.key().0 == owner_id)
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        owner_id: &str,
        order_id: OrderId,
        status: OrderStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut order = self
            .orders
            .get_mut(&(owner_id.to_string(), order_id))
            .ok_or_else(|| StoreError::not_found("order", order_id))?;
        order.status = status;
        order.updated_at = Utc::now();
        if completed_at.is_some() {
            order.completed_at = completed_at;
        }
        Ok(())
    }

    async fn append_trace(&self, record: &TraceRecord) -> Result<(), StoreError> {
        self.traces
            .entry(record.product_id)
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn traces_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<TraceRecord>, StoreError> {
        let mut records = self
            .traces
            .get(&product_id)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }

    async fn inventory_quantity(
        &self,
        user_id: &str,
        product_id: ProductId,
    ) -> Result<i64, StoreError> {
        Ok(self
            .inventory
            .get(&(user_id.to_string(), product_id))
            .map(|i| i.quantity)
            .unwrap_or(0))
    }

    async fn adjust_inventory(
        &self,
        user_id: &str,
        product_id: ProductId,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let key = (user_id.to_string(), product_id);
        let mut entry = self.inventory.entry(key).or_insert_with(|| InventoryRecord {
            user_id: user_id.to_string(),
            product_id,
            quantity: 0,
            updated_at: Utc::now(),
        });

        let updated = entry.quantity + delta;
        if updated < 0 {
            return Err(StoreError::InsufficientInventory {
                available: entry.quantity,
                requested: -delta,
            });
        }
        entry.quantity = updated;
        entry.updated_at = Utc::now();
        Ok(updated)
    }

    async fn list_inventory(&self, user_id: &str) -> Result<Vec<InventoryRecord>, StoreError> {
        let mut records: Vec<InventoryRecord> = self
            .inventory
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.product_id.to_string().cmp(&b.product_id.to_string()));
        Ok(records)
    }

    async fn user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.get(user_id).map(|u| u.value().clone()))
    }

    async fn put_user(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.users.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn update_user_role(&self, user_id: &str, role: UserRole) -> Result<(), StoreError> {
        let mut profile = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::not_found("user", user_id))?;
        profile.role = role;
        profile.updated_at = Utc::now();
        Ok(())
    }

    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<UserProfile>, StoreError> {
        let mut users: Vec<UserProfile> = self
            .users
            .iter()
            .filter(|u| u.role == role)
            .map(|u| u.value().clone())
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn healthcheck(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
