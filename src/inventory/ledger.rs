use chrono::Utc;
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::domain::checkout::{order_total, CheckoutError, CommittedOrder, LineItem, PricedLine, Quote};
use crate::models::{NewOrder, OrderLine};
use crate::store::OrderStore;

#[derive(Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Advisory only: a true answer does not hold stock for the caller
    pub async fn check_available(&self, product_id: i64, qty: i64) -> Result<bool, CheckoutError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT stock FROM products WHERE id = ?")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((stock,)) => Ok(stock >= qty),
            None => Err(CheckoutError::ProductNotFound(product_id)),
        }
    }

    /// Check every line against current stock and price it, reading one
    /// consistent snapshot. Never writes.
    pub async fn quote(&self, items: &[LineItem]) -> Result<Quote, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let mut lines = Vec::with_capacity(items.len());

        for item in items {
            let row: Option<(String, i64, i64)> =
                sqlx::query_as("SELECT name, price_cents, stock FROM products WHERE id = ?")
                    .bind(item.product_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            let Some((name, unit_price_cents, stock)) = row else {
                return Err(CheckoutError::ProductNotFound(item.product_id));
            };

            if stock < item.qty {
                return Err(CheckoutError::InsufficientStock {
                    product_id: item.product_id,
                    name,
                    available: stock,
                    requested: item.qty,
                });
            }

            lines.push(PricedLine {
                product_id: item.product_id,
                name,
                qty: item.qty,
                unit_price_cents,
            });
        }

        tx.rollback().await?;

        let quote = Quote::new(lines)?;
        debug!(lines = quote.lines.len(), total_cents = quote.total_cents, "Quote computed");
        Ok(quote)
    }

    /// Decrement stock for every quoted line and insert the order, all or
    /// nothing. Fails with `InventoryConflict` when a line no longer has
    /// enough stock and `PriceChanged` when a price moved since the quote.
    pub async fn reserve_and_commit(
        &self,
        user_id: Option<i64>,
        quote: &Quote,
    ) -> Result<CommittedOrder, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        match apply(&mut *tx, user_id, quote).await {
            Ok(order) => {
                tx.commit().await?;
                Ok(order)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Rollback after failed commit did not complete");
                }
                Err(e)
            }
        }
    }
}

async fn apply(
    conn: &mut SqliteConnection,
    user_id: Option<i64>,
    quote: &Quote,
) -> Result<CommittedOrder, CheckoutError> {
    let mut lines = Vec::with_capacity(quote.lines.len());

    for line in &quote.lines {
        let decremented: Option<(i64,)> = sqlx::query_as(
            "UPDATE products SET stock = stock - ?
             WHERE id = ? AND stock >= ?
             RETURNING price_cents",
        )
        .bind(line.qty)
        .bind(line.product_id)
        .bind(line.qty)
        .fetch_optional(&mut *conn)
        .await?;

        let Some((current_price,)) = decremented else {
            let remaining: Option<(i64,)> = sqlx::query_as("SELECT stock FROM products WHERE id = ?")
                .bind(line.product_id)
                .fetch_optional(&mut *conn)
                .await?;

            return Err(match remaining {
                Some((available,)) => CheckoutError::InventoryConflict {
                    product_id: line.product_id,
                    available,
                    requested: line.qty,
                },
                None => CheckoutError::ProductNotFound(line.product_id),
            });
        };

        if current_price != line.unit_price_cents {
            return Err(CheckoutError::PriceChanged {
                product_id: line.product_id,
                quoted_cents: line.unit_price_cents,
                current_cents: current_price,
            });
        }

        lines.push(OrderLine {
            product_id: line.product_id,
            qty: line.qty,
            unit_price_cents: current_price,
        });
    }

    let total_cents = order_total(lines.iter().map(OrderLine::subtotal_cents))?;
    let order = NewOrder {
        user_id,
        total_cents,
        created_at: Utc::now(),
        lines,
    };
    let order_id = OrderStore::insert(conn, &order).await?;

    Ok(CommittedOrder {
        order_id,
        user_id: order.user_id,
        total_cents: order.total_cents,
        created_at: order.created_at,
        lines: order.lines,
    })
}
