use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Persisted Models
// ============================================================================
//
// Rows as they live in the relational store. Money is always integer cents.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub supplier_id: Option<i64>,
    pub supplier_name: Option<String>,
    pub image_url: Option<String>,
}

/// Payload for inserting a catalog product (seeding and tests)
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub supplier_id: Option<i64>,
    pub image_url: Option<String>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price_cents: i64, stock: i64) -> Self {
        Self {
            name: name.into(),
            category: None,
            price_cents,
            stock,
            supplier_id: None,
            image_url: None,
        }
    }
}

/// A committed order. Lines carry the unit price frozen at commit time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Order {
    pub id: i64,
    pub user_id: Option<i64>,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct OrderLine {
    pub product_id: i64,
    pub qty: i64,
    pub unit_price_cents: i64,
}

impl OrderLine {
    pub fn subtotal_cents(&self) -> Option<i64> {
        self.qty.checked_mul(self.unit_price_cents)
    }
}

/// Order listing row, one per order with a human readable item summary
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: i64,
    pub user_id: Option<i64>,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub items_summary: Option<String>,
}

/// Insert payload for the order store; only built by the commit step
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<i64>,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}
