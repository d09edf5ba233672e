use crate::payment::PaymentError;

use super::value_objects::MAX_LINE_QTY;

// ============================================================================
// Checkout Errors
// ============================================================================

/// Malformed or missing request fields. Raised before any stock read or
/// payment call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("at least one item is required")]
    EmptyItems,

    #[error("invalid product id: {0}")]
    InvalidProductId(i64),

    #[error("invalid quantity {qty} for product {product_id}: must be between 1 and {max}", max = MAX_LINE_QTY)]
    InvalidQuantity { product_id: i64, qty: i64 },

    #[error("invalid user id: {0}")]
    InvalidUserId(i64),

    #[error("payment_method is required")]
    MissingPaymentMethod,

    #[error("payment_method must be wallet or paypal, got {0:?}")]
    UnsupportedPaymentMethod(String),

    #[error("wallet_email is required for wallet payments")]
    MissingWalletEmail,

    #[error("invalid wallet email: {0:?}")]
    InvalidWalletEmail(String),

    #[error("paymentId is required")]
    MissingPaymentId,

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("invalid query string: {0}")]
    MalformedQuery(String),

    #[error("order total exceeds the supported amount")]
    AmountOverflow,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentFailure {
    #[error("wallet has insufficient funds")]
    InsufficientFunds,

    #[error("no wallet registered for {0}")]
    WalletNotFound(String),

    #[error(transparent)]
    Provider(#[from] PaymentError),
}

impl PaymentFailure {
    /// Machine-readable reason for clients deciding whether to retry
    pub fn reason(&self) -> &'static str {
        match self {
            PaymentFailure::InsufficientFunds => "insufficient_funds",
            PaymentFailure::WalletNotFound(_) => "wallet_not_found",
            PaymentFailure::Provider(PaymentError::Rejected { .. }) => "provider_rejected",
            PaymentFailure::Provider(PaymentError::Transport(_)) => "provider_unreachable",
            PaymentFailure::Provider(PaymentError::Unavailable) => "provider_unavailable",
            PaymentFailure::Provider(PaymentError::InvalidResponse(_)) => "invalid_provider_response",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("product {0} not found")]
    ProductNotFound(i64),

    #[error("order {0} not found")]
    OrderNotFound(i64),

    #[error("insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    #[error("payment failed: {0}")]
    PaymentFailed(PaymentFailure),

    #[error("payment {payment_id} not completed (provider status {status})")]
    PaymentNotCompleted { payment_id: String, status: String },

    #[error("stock for product {product_id} changed during checkout: available {available}, requested {requested}")]
    InventoryConflict {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    #[error("price of product {product_id} changed during checkout: quoted {quoted_cents}, now {current_cents}")]
    PriceChanged {
        product_id: i64,
        quoted_cents: i64,
        current_cents: i64,
    },

    #[error("order could not be persisted: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl From<PaymentError> for CheckoutError {
    fn from(e: PaymentError) -> Self {
        CheckoutError::PaymentFailed(PaymentFailure::Provider(e))
    }
}

impl CheckoutError {
    pub fn kind(&self) -> &'static str {
        match self {
            CheckoutError::Validation(_) => "validation",
            CheckoutError::ProductNotFound(_) | CheckoutError::OrderNotFound(_) => "not_found",
            CheckoutError::InsufficientStock { .. } => "insufficient_stock",
            CheckoutError::PaymentFailed(_) => "payment_failed",
            CheckoutError::PaymentNotCompleted { .. } => "payment_not_completed",
            CheckoutError::InventoryConflict { .. } => "inventory_conflict",
            CheckoutError::PriceChanged { .. } => "price_changed",
            CheckoutError::Persistence(_) => "persistence",
        }
    }

    /// Stock available for the failing product, for inventory errors
    pub fn available(&self) -> Option<i64> {
        match self {
            CheckoutError::InsufficientStock { available, .. }
            | CheckoutError::InventoryConflict { available, .. } => Some(*available),
            _ => None,
        }
    }
}
