use sqlx::sqlite::SqlitePool;

use crate::models::{NewProduct, Product, Supplier};

// ============================================================================
// Product Store - catalog lookups
// ============================================================================
//
// Read side of the catalog. Stock is only ever written by the inventory
// ledger; this store never updates it.
//
// ============================================================================

const SELECT_PRODUCT: &str = "
    SELECT p.id, p.name, p.category, p.price_cents, p.stock, p.supplier_id,
           s.name AS supplier_name, p.image_url
    FROM products p
    LEFT JOIN suppliers s ON p.supplier_id = s.id";

#[derive(Clone)]
pub struct ProductStore {
    pool: SqlitePool,
}

impl ProductStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: i64) -> Result<Option<Product>, sqlx::Error> {
        let sql = format!("{SELECT_PRODUCT} WHERE p.id = ?");
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list(&self) -> Result<Vec<Product>, sqlx::Error> {
        let sql = format!("{SELECT_PRODUCT} ORDER BY p.name ASC");
        sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await
    }

    pub async fn create(&self, product: NewProduct) -> Result<Product, sqlx::Error> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO products (name, category, price_cents, stock, supplier_id, image_url)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.supplier_id)
        .bind(&product.image_url)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(product_id = id, name = %product.name, "Product created");

        self.find(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn create_supplier(
        &self,
        name: &str,
        contact: Option<&str>,
    ) -> Result<Supplier, sqlx::Error> {
        sqlx::query_as::<_, Supplier>(
            "INSERT INTO suppliers (name, contact) VALUES (?, ?) RETURNING id, name, contact",
        )
        .bind(name)
        .bind(contact)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
