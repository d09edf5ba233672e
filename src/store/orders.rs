use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqlitePool};

use crate::models::{NewOrder, Order, OrderLine, OrderSummary};

// ============================================================================
// Order Store - committed orders and their lines
// ============================================================================
//
// Append-only. Inserts happen only on a connection that already holds the
// checkout commit transaction, so an order is never visible without its
// lines and stock decrements.
//
// ============================================================================

#[derive(Clone)]
pub struct OrderStore {
    pool: SqlitePool,
}

impl OrderStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an order and its lines on the caller's transaction
    pub async fn insert(conn: &mut SqliteConnection, order: &NewOrder) -> Result<i64, sqlx::Error> {
        let (order_id,): (i64,) = sqlx::query_as(
            "INSERT INTO orders (user_id, total_cents, created_at) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(order.user_id)
        .bind(order.total_cents)
        .bind(order.created_at)
        .fetch_one(&mut *conn)
        .await?;

        for line in &order.lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, qty, unit_price_cents) VALUES (?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.qty)
            .bind(line.unit_price_cents)
            .execute(&mut *conn)
            .await?;
        }

        Ok(order_id)
    }

    pub async fn find(&self, id: i64) -> Result<Option<Order>, sqlx::Error> {
        let row: Option<(i64, Option<i64>, i64, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, user_id, total_cents, created_at FROM orders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, user_id, total_cents, created_at)) = row else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, OrderLine>(
            "SELECT product_id, qty, unit_price_cents FROM order_items WHERE order_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Order {
            id,
            user_id,
            total_cents,
            created_at,
            lines,
        }))
    }

    /// Newest first; all orders when `user_id` is None
    pub async fn list(&self, user_id: Option<i64>) -> Result<Vec<OrderSummary>, sqlx::Error> {
        sqlx::query_as::<_, OrderSummary>(
            "SELECT o.id, o.user_id, o.total_cents, o.created_at,
                    GROUP_CONCAT(p.name || ' (x' || oi.qty || ')', ', ') AS items_summary
             FROM orders o
             LEFT JOIN order_items oi ON o.id = oi.order_id
             LEFT JOIN products p ON oi.product_id = p.id
             WHERE ? IS NULL OR o.user_id = ?
             GROUP BY o.id
             ORDER BY o.created_at DESC, o.id DESC",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    #[cfg(test)]
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProduct;
    use crate::store::{Database, ProductStore};

    async fn insert_order(db: &Database, order: &NewOrder) -> i64 {
        let mut tx = db.pool().begin().await.unwrap();
        let id = OrderStore::insert(&mut *tx, order).await.unwrap();
        tx.commit().await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_insert_and_find_round_trip_keeps_line_order() {
        let db = Database::in_memory().await;
        let products = ProductStore::new(db.pool().clone());
        let lettuce = products.create(NewProduct::new("Lechuga romana", 120, 50)).await.unwrap();
        let tomato = products.create(NewProduct::new("Tomate rama", 200, 40)).await.unwrap();

        let order = NewOrder {
            user_id: Some(2),
            total_cents: 440,
            created_at: Utc::now(),
            lines: vec![
                OrderLine { product_id: tomato.id, qty: 1, unit_price_cents: 200 },
                OrderLine { product_id: lettuce.id, qty: 2, unit_price_cents: 120 },
            ],
        };
        let id = insert_order(&db, &order).await;

        let store = OrderStore::new(db.pool().clone());
        let found = store.find(id).await.unwrap().unwrap();
        assert_eq!(found.user_id, Some(2));
        assert_eq!(found.total_cents, 440);
        assert_eq!(found.lines, order.lines);
    }

    #[tokio::test]
    async fn test_rolled_back_insert_leaves_nothing() {
        let db = Database::in_memory().await;
        let products = ProductStore::new(db.pool().clone());
        let chicken = products.create(NewProduct::new("Pollo entero", 650, 20)).await.unwrap();

        let order = NewOrder {
            user_id: None,
            total_cents: 650,
            created_at: Utc::now(),
            lines: vec![OrderLine { product_id: chicken.id, qty: 1, unit_price_cents: 650 }],
        };

        {
            let mut tx = db.pool().begin().await.unwrap();
            OrderStore::insert(&mut *tx, &order).await.unwrap();
            tx.rollback().await.unwrap();
        }

        let store = OrderStore::new(db.pool().clone());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_filters_by_user_and_summarizes_items() {
        let db = Database::in_memory().await;
        let products = ProductStore::new(db.pool().clone());
        let chicken = products.create(NewProduct::new("Pollo entero", 650, 20)).await.unwrap();

        let line = OrderLine { product_id: chicken.id, qty: 2, unit_price_cents: 650 };
        insert_order(&db, &NewOrder {
            user_id: Some(2),
            total_cents: 1300,
            created_at: Utc::now(),
            lines: vec![line.clone()],
        })
        .await;
        insert_order(&db, &NewOrder {
            user_id: None,
            total_cents: 1300,
            created_at: Utc::now(),
            lines: vec![line],
        })
        .await;

        let store = OrderStore::new(db.pool().clone());
        let mine = store.list(Some(2)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].items_summary.as_deref(), Some("Pollo entero (x2)"));

        assert_eq!(store.list(None).await.unwrap().len(), 2);
        assert!(store.list(Some(99)).await.unwrap().is_empty());
    }
}
