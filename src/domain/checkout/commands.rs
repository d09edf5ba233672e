use serde::Deserialize;

use super::errors::ValidationError;
use super::value_objects::{LineItem, PaymentMethod, MAX_LINE_QTY};

// ============================================================================
// Checkout Commands - Request bodies and their validated form
// ============================================================================
//
// Request types mirror the JSON accepted over HTTP. `validate()` turns them
// into commands the orchestrator can act on without re-checking fields.
//
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LineItemRequest {
    #[serde(rename = "productId")]
    pub product_id: i64,
    pub qty: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedirectOptions {
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    #[serde(rename = "userId", default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub items: Vec<LineItemRequest>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub wallet_email: Option<String>,
    #[serde(default)]
    pub paypal: Option<RedirectOptions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutePaymentRequest {
    #[serde(rename = "paymentId", default)]
    pub payment_id: String,
    #[serde(rename = "payerId", default)]
    pub payer_id: Option<String>,
    #[serde(rename = "userId", default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub items: Vec<LineItemRequest>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutCommand {
    pub user_id: Option<i64>,
    pub items: Vec<LineItem>,
    pub payment: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutePaymentCommand {
    pub payment_id: String,
    pub payer_id: Option<String>,
    pub user_id: Option<i64>,
    pub items: Vec<LineItem>,
}

impl CheckoutRequest {
    pub fn validate(self) -> Result<CheckoutCommand, ValidationError> {
        let user_id = validate_user(self.user_id)?;
        let items = validate_items(&self.items)?;

        let method = self
            .payment_method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or(ValidationError::MissingPaymentMethod)?;

        let payment = match method.to_ascii_lowercase().as_str() {
            "wallet" => {
                let email = self
                    .wallet_email
                    .as_deref()
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .ok_or(ValidationError::MissingWalletEmail)?;
                if !looks_like_email(email) {
                    return Err(ValidationError::InvalidWalletEmail(email.to_string()));
                }
                PaymentMethod::Wallet {
                    payer_email: email.to_lowercase(),
                }
            }
            "paypal" => {
                let options = self.paypal.unwrap_or_default();
                PaymentMethod::Redirect {
                    return_url: non_blank(options.return_url),
                    cancel_url: non_blank(options.cancel_url),
                }
            }
            other => return Err(ValidationError::UnsupportedPaymentMethod(other.to_string())),
        };

        Ok(CheckoutCommand {
            user_id,
            items,
            payment,
        })
    }
}

impl ExecutePaymentRequest {
    pub fn validate(self) -> Result<ExecutePaymentCommand, ValidationError> {
        let payment_id = self.payment_id.trim();
        if payment_id.is_empty() {
            return Err(ValidationError::MissingPaymentId);
        }

        Ok(ExecutePaymentCommand {
            payment_id: payment_id.to_string(),
            payer_id: non_blank(self.payer_id),
            user_id: validate_user(self.user_id)?,
            items: validate_items(&self.items)?,
        })
    }
}

fn validate_user(user_id: Option<i64>) -> Result<Option<i64>, ValidationError> {
    match user_id {
        Some(id) if id < 1 => Err(ValidationError::InvalidUserId(id)),
        other => Ok(other),
    }
}

/// Checks every line and merges repeated products into one line, keeping
/// first-seen order.
fn validate_items(items: &[LineItemRequest]) -> Result<Vec<LineItem>, ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::EmptyItems);
    }

    let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.product_id < 1 {
            return Err(ValidationError::InvalidProductId(item.product_id));
        }
        if !(1..=MAX_LINE_QTY).contains(&item.qty) {
            return Err(ValidationError::InvalidQuantity {
                product_id: item.product_id,
                qty: item.qty,
            });
        }

        match merged.iter_mut().find(|l| l.product_id == item.product_id) {
            Some(line) => {
                line.qty += item.qty;
                if line.qty > MAX_LINE_QTY {
                    return Err(ValidationError::InvalidQuantity {
                        product_id: line.product_id,
                        qty: line.qty,
                    });
                }
            }
            None => merged.push(LineItem {
                product_id: item.product_id,
                qty: item.qty,
            }),
        }
    }
    Ok(merged)
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
