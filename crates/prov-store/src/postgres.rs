//! # PostgreSQL Store
//!
//! SQLx-backed [`Store`] implementation. The database is optional:
//! [`init_pool`] returns `None` when `DATABASE_URL` is not set and the
//! API runs on the in-memory backend instead. Migrations are embedded
//! and applied at pool construction.
//!
//! Queries are runtime-bound (`sqlx::query` with `bind`), enums travel
//! as their wire strings, and upserts use `ON CONFLICT` so every write
//! is idempotent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use uuid::Uuid;

use prov_core::{
    BlockchainStatus, InventoryRecord, OrderId, OrderRecord, OrderStatus, ProductId,
    ProductRecord, TraceRecord, TraceStage, UserProfile, UserRole,
};

use crate::error::StoreError;
use crate::Store;

/// Initialize the connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration
/// fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set — running in-memory only mode. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// PostgreSQL document store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse<T: std::str::FromStr>(raw: &str, what: &'static str) -> Result<T, StoreError>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| StoreError::Corrupt(format!("{what}: {e}")))
}

fn product_from_row(row: &sqlx::postgres::PgRow) -> Result<ProductRecord, StoreError> {
    let status: String = row.get("blockchain_status");
    Ok(ProductRecord {
        product_id: ProductId::from_uuid(row.get::<Uuid, _>("product_id")),
        name: row.get("name"),
        category: row.get("category"),
        description: row.get("description"),
        batch: row.get("batch"),
        quantity: row.get("quantity"),
        price: row.get("price"),
        manufacturer: row.get("manufacturer"),
        manufacturer_id: row.get("manufacturer_id"),
        blockchain_tx_hash: row.get("blockchain_tx_hash"),
        blockchain_status: parse::<BlockchainStatus>(&status, "blockchain_status")?,
        last_blockchain_tx_hash: row.get("last_blockchain_tx_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn order_from_row(row: &sqlx::postgres::PgRow) -> Result<OrderRecord, StoreError> {
    let order_type: String = row.get("order_type");
    let status: String = row.get("status");
    Ok(OrderRecord {
        order_id: OrderId::from_uuid(row.get::<Uuid, _>("order_id")),
        order_type: parse(&order_type, "order_type")?,
        product_id: ProductId::from_uuid(row.get::<Uuid, _>("product_id")),
        product_name: row.get("product_name"),
        quantity: row.get("quantity"),
        status: parse::<OrderStatus>(&status, "order_status")?,
        created_by: row.get("created_by"),
        created_by_name: row.get("created_by_name"),
        recipient_id: row.get("recipient_id"),
        recipient_name: row.get("recipient_name"),
        supplier_id: row.get("supplier_id"),
        supplier_name: row.get("supplier_name"),
        customer_info: row.get("customer_info"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        completed_at: row.get("completed_at"),
    })
}

fn trace_from_row(row: &sqlx::postgres::PgRow) -> Result<TraceRecord, StoreError> {
    let stage: String = row.get("stage");
    Ok(TraceRecord {
        trace_id: prov_core::TraceId::from_uuid(row.get::<Uuid, _>("trace_id")),
        product_id: ProductId::from_uuid(row.get::<Uuid, _>("product_id")),
        stage: parse::<TraceStage>(&stage, "trace_stage")?,
        company_name: row.get("company_name"),
        location: row.get("location"),
        blockchain_tx_hash: row.get("blockchain_tx_hash"),
        quantity: row.get("quantity"),
        order_id: OrderId::from_uuid(row.get::<Uuid, _>("order_id")),
        timestamp: row.get("timestamp"),
    })
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<UserProfile, StoreError> {
    let role: String = row.get("role");
    Ok(UserProfile {
        user_id: row.get("user_id"),
        username: row.get("username"),
        email: row.get("email"),
        name: row.get("name"),
        role: parse::<UserRole>(&role, "user_role")?,
        location: row.get("location"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl Store for PgStore {
    async fn put_product(&self, product: &ProductRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO products (product_id, name, category, description, batch, quantity, price,
                                   manufacturer, manufacturer_id, blockchain_tx_hash,
                                   blockchain_status, last_blockchain_tx_hash, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             ON CONFLICT (product_id) DO UPDATE SET
                name = EXCLUDED.name,
                category = EXCLUDED.category,
                description = EXCLUDED.description,
                batch = EXCLUDED.batch,
                quantity = EXCLUDED.quantity,
                price = EXCLUDED.price,
                blockchain_tx_hash = EXCLUDED.blockchain_tx_hash,
                blockchain_status = EXCLUDED.blockchain_status,
                last_blockchain_tx_hash = EXCLUDED.last_blockchain_tx_hash,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(product.product_id.as_uuid())
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(&product.batch)
        .bind(product.quantity)
        .bind(product.price)
        .bind(&product.manufacturer)
        .bind(&product.manufacturer_id)
        .bind(&product.blockchain_tx_hash)
        .bind(product.blockchain_status.as_str())
        .bind(&product.last_blockchain_tx_hash)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn product(&self, product_id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM products WHERE product_id = $1")
            .bind(product_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn list_products(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let rows = sqlx::query("SELECT * FROM products ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn list_products_by_manufacturer(
        &self,
        manufacturer_id: &str,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM products WHERE manufacturer_id = $1 ORDER BY created_at DESC",
        )
        .bind(manufacturer_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn update_product_chain_state(
        &self,
        product_id: ProductId,
        status: BlockchainStatus,
        last_tx_hash: Option<&str>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE products
             SET blockchain_status = $2,
                 last_blockchain_tx_hash = COALESCE($3, last_blockchain_tx_hash),
                 updated_at = $4
             WHERE product_id = $1",
        )
        .bind(product_id.as_uuid())
        .bind(status.as_str())
        .bind(last_tx_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", product_id));
        }
        Ok(())
    }

    async fn delete_product(
        &self,
        manufacturer_id: &str,
        product_id: ProductId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "DELETE FROM products WHERE product_id = $1 AND manufacturer_id = $2",
        )
        .bind(product_id.as_uuid())
        .bind(manufacturer_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", product_id));
        }
        Ok(())
    }

    async fn count_products_by_manufacturer(
        &self,
        manufacturer_id: &str,
    ) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM products WHERE manufacturer_id = $1")
            .bind(manufacturer_id)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.get("count");
        Ok(count as u64)
    }

    async fn put_order(&self, order: &OrderRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO orders (order_id, order_type, product_id, product_name, quantity, status,
                                 created_by, created_by_name, recipient_id, recipient_name,
                                 supplier_id, supplier_name, customer_info, notes,
                                 created_at, updated_at, completed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
             ON CONFLICT (order_id) DO UPDATE SET
                status = EXCLUDED.status,
                notes = EXCLUDED.notes,
                updated_at = EXCLUDED.updated_at,
                completed_at = EXCLUDED.completed_at",
        )
        .bind(order.order_id.as_uuid())
        .bind(order.order_type.as_str())
        .bind(order.product_id.as_uuid())
        .bind(&order.product_name)
        .bind(order.quantity)
        .bind(order.status.as_str())
        .bind(&order.created_by)
        .bind(&order.created_by_name)
        .bind(&order.recipient_id)
        .bind(&order.recipient_name)
        .bind(&order.supplier_id)
        .bind(&order.supplier_name)
        .bind(&order.customer_info)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn order(
        &self,
        owner_id: &str,
        order_id: OrderId,
    ) -> Result<Option<OrderRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM orders WHERE order_id = $1 AND created_by = $2")
            .bind(order_id.as_uuid())
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    async fn list_orders(&self, owner_id: &str) -> Result<Vec<OrderRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM orders WHERE created_by = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(order_from_row).collect()
    }

    async fn update_order_status(
        &self,
        owner_id: &str,
        order_id: OrderId,
        status: OrderStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE orders
             SET status = $3,
                 updated_at = $4,
                 completed_at = COALESCE($5, completed_at)
             WHERE order_id = $1 AND created_by = $2",
        )
        .bind(order_id.as_uuid())
        .bind(owner_id)
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(completed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("order", order_id));
        }
        Ok(())
    }

    async fn append_trace(&self, record: &TraceRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO trace_records (trace_id, product_id, stage, company_name, location,
                                        blockchain_tx_hash, quantity, order_id, timestamp)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (trace_id) DO NOTHING",
        )
        .bind(record.trace_id.as_uuid())
        .bind(record.product_id.as_uuid())
        .bind(record.stage.as_str())
        .bind(&record.company_name)
        .bind(&record.location)
        .bind(&record.blockchain_tx_hash)
        .bind(record.quantity)
        .bind(record.order_id.as_uuid())
        .bind(record.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn traces_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<TraceRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM trace_records WHERE product_id = $1 ORDER BY timestamp",
        )
        .bind(product_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(trace_from_row).collect()
    }

    async fn inventory_quantity(
        &self,
        user_id: &str,
        product_id: ProductId,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "SELECT quantity FROM inventory WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get::<i64, _>("quantity")).unwrap_or(0))
    }

    async fn adjust_inventory(
        &self,
        user_id: &str,
        product_id: ProductId,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let current = self.inventory_quantity(user_id, product_id).await?;
        let updated = current + delta;
        if updated < 0 {
            return Err(StoreError::InsufficientInventory {
                available: current,
                requested: -delta,
            });
        }

        sqlx::query(
            "INSERT INTO inventory (user_id, product_id, quantity, updated_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, product_id) DO UPDATE SET
                quantity = EXCLUDED.quantity,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(user_id)
        .bind(product_id.as_uuid())
        .bind(updated)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn list_inventory(&self, user_id: &str) -> Result<Vec<InventoryRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM inventory WHERE user_id = $1 ORDER BY product_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| {
                Ok(InventoryRecord {
                    user_id: row.get("user_id"),
                    product_id: ProductId::from_uuid(row.get::<Uuid, _>("product_id")),
                    quantity: row.get("quantity"),
                    updated_at: row.get("updated_at"),
                })
            })
            .collect()
    }

    async fn user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn put_user(&self, profile: &UserProfile) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (user_id, username, email, name, role, location, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (user_id) DO UPDATE SET
                username = EXCLUDED.username,
                email = EXCLUDED.email,
                name = EXCLUDED.name,
                role = EXCLUDED.role,
                location = EXCLUDED.location,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(&profile.user_id)
        .bind(&profile.username)
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(profile.role.as_str())
        .bind(&profile.location)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_user_role(&self, user_id: &str, role: UserRole) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET role = $2, updated_at = $3 WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(role.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", user_id));
        }
        Ok(())
    }

    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<UserProfile>, StoreError> {
        let rows = sqlx::query("SELECT * FROM users WHERE role = $1 ORDER BY username")
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn healthcheck(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
