use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::OrderLine;
use crate::payment::PaymentIntent;

use super::errors::ValidationError;

// ============================================================================
// Checkout Value Objects
// ============================================================================

/// Upper bound for a single line's quantity
pub const MAX_LINE_QTY: i64 = 999;

/// A validated request line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: i64,
    pub qty: i64,
}

/// The payment backend chosen for a checkout, with its method-specific data
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentMethod {
    /// Synchronous wallet debit
    Wallet { payer_email: String },
    /// Redirect-and-confirm flow; missing URLs fall back to the configured default
    Redirect {
        return_url: Option<String>,
        cancel_url: Option<String>,
    },
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Wallet { .. } => "wallet",
            PaymentMethod::Redirect { .. } => "paypal",
        }
    }
}

/// A line priced from the catalog during the stock check
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: i64,
    pub name: String,
    pub qty: i64,
    pub unit_price_cents: i64,
}

impl PricedLine {
    /// `None` when the line amount does not fit in an `i64`
    pub fn subtotal_cents(&self) -> Option<i64> {
        self.unit_price_cents.checked_mul(self.qty)
    }
}

/// Sum line amounts, failing instead of wrapping
pub fn order_total(subtotals: impl IntoIterator<Item = Option<i64>>) -> Result<i64, ValidationError> {
    subtotals
        .into_iter()
        .try_fold(0i64, |total, subtotal| total.checked_add(subtotal?))
        .ok_or(ValidationError::AmountOverflow)
}

/// Result of the read-only stock check: every line is currently available
/// and the total is computed from current catalog prices.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub lines: Vec<PricedLine>,
    pub total_cents: i64,
}

impl Quote {
    pub fn new(lines: Vec<PricedLine>) -> Result<Self, ValidationError> {
        let total_cents = order_total(lines.iter().map(PricedLine::subtotal_cents))?;
        Ok(Self { lines, total_cents })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommittedOrder {
    pub order_id: i64,
    pub user_id: Option<i64>,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

/// Redirect checkout awaiting user approval at the provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingPayment {
    pub payment: PaymentIntent,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    Committed(CommittedOrder),
    Pending(PendingPayment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedPayment {
    pub order: CommittedOrder,
    pub transaction_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: i64, qty: i64, unit_price_cents: i64) -> PricedLine {
        PricedLine {
            product_id,
            name: format!("product {product_id}"),
            qty,
            unit_price_cents,
        }
    }

    #[test]
    fn test_quote_total_is_sum_of_lines() {
        let quote = Quote::new(vec![line(1, 2, 120), line(7, 1, 650)]).unwrap();
        assert_eq!(quote.total_cents, 890);
    }

    #[test]
    fn test_quote_total_rejects_overflow() {
        let err = Quote::new(vec![line(1, 2, i64::MAX / 2 + 1)]).unwrap_err();
        assert_eq!(err, ValidationError::AmountOverflow);

        let err = Quote::new(vec![line(1, 1, i64::MAX), line(2, 1, 1)]).unwrap_err();
        assert_eq!(err, ValidationError::AmountOverflow);

        let quote = Quote::new(vec![line(1, 1, i64::MAX - 1), line(2, 1, 1)]).unwrap();
        assert_eq!(quote.total_cents, i64::MAX);
    }

    #[test]
    fn test_payment_method_labels() {
        let wallet = PaymentMethod::Wallet { payer_email: "a@b.io".to_string() };
        let redirect = PaymentMethod::Redirect { return_url: None, cancel_url: None };
        assert_eq!(wallet.label(), "wallet");
        assert_eq!(redirect.label(), "paypal");
    }
}
