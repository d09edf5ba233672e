// ============================================================================
// Relational Store - SQLite via sqlx
// ============================================================================
//
// One pool, created once at startup and handed to every component that
// needs it (ProductStore, OrderStore, InventoryLedger).
//
// Tables:
// - suppliers
// - products     (stock CHECK >= 0)
// - orders       (append-only)
// - order_items  (frozen unit prices)
//
// ============================================================================

pub mod orders;
pub mod products;
mod seed;

use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::utils::{retry_with_backoff, RetryConfig, RetryResult};

pub use orders::OrderStore;
pub use products::ProductStore;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS suppliers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        contact TEXT
    )",
    "CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        category TEXT,
        price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
        stock INTEGER NOT NULL CHECK (stock >= 0),
        supplier_id INTEGER REFERENCES suppliers(id),
        image_url TEXT
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER,
        total_cents INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS order_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id INTEGER NOT NULL REFERENCES orders(id),
        product_id INTEGER NOT NULL REFERENCES products(id),
        qty INTEGER NOT NULL CHECK (qty > 0),
        unit_price_cents INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id)",
    "CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id)",
];

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the pool, retrying with backoff while the database is unavailable
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let result = retry_with_backoff(RetryConfig::default(), |attempt| {
            let options = options.clone();
            async move {
                tracing::debug!(attempt, "Opening database pool");
                SqlitePoolOptions::new()
                    .max_connections(max_connections)
                    .connect_with(options)
                    .await
            }
        })
        .await;

        match result {
            RetryResult::Success(pool) => {
                tracing::info!(url = %url, max_connections, "Database pool ready");
                Ok(Self { pool })
            }
            RetryResult::Failed(e) => Err(anyhow!("Failed to open database {}: {}", url, e)),
        }
    }

    /// Single-connection in-memory database with the schema applied
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .unwrap();

        let db = Self { pool };
        db.migrate().await.unwrap();
        db
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Database schema up to date");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Insert the demo catalog if no products exist yet.
    /// Returns true when rows were inserted.
    pub async fn seed_demo(&self) -> Result<bool, sqlx::Error> {
        seed::seed_demo(self).await
    }
}
