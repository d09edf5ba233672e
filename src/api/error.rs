use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::domain::checkout::{CheckoutError, PaymentFailure};
use crate::payment::PaymentError;

/// Error envelope shared by every route
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub kind: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(rename = "productId", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn new(kind: &'static str, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            kind,
            error: error.into(),
            reason: None,
            product_id: None,
            available: None,
            requested: None,
            detail: None,
        }
    }
}

impl From<&CheckoutError> for ErrorBody {
    fn from(e: &CheckoutError) -> Self {
        let mut body = ErrorBody::new(e.kind(), e.to_string());

        match e {
            CheckoutError::ProductNotFound(product_id) => {
                body.product_id = Some(*product_id);
            }
            CheckoutError::InsufficientStock {
                product_id,
                available,
                requested,
                ..
            }
            | CheckoutError::InventoryConflict {
                product_id,
                available,
                requested,
            } => {
                body.product_id = Some(*product_id);
                body.available = Some(*available);
                body.requested = Some(*requested);
            }
            CheckoutError::PriceChanged {
                product_id,
                quoted_cents,
                current_cents,
            } => {
                body.product_id = Some(*product_id);
                body.detail = Some(serde_json::json!({
                    "quoted_cents": quoted_cents,
                    "current_cents": current_cents,
                }));
            }
            CheckoutError::PaymentFailed(failure) => {
                body.reason = Some(failure.reason());
                if let PaymentFailure::Provider(PaymentError::Rejected { detail, .. }) = failure {
                    body.detail = Some(detail.clone());
                }
            }
            CheckoutError::PaymentNotCompleted { status, .. } => {
                body.detail = Some(serde_json::json!({ "status": status }));
            }
            CheckoutError::Persistence(_) => {
                body.error = "order could not be stored, nothing was committed".to_string();
            }
            CheckoutError::Validation(_) | CheckoutError::OrderNotFound(_) => {}
        }

        body
    }
}

impl ResponseError for CheckoutError {
    fn status_code(&self) -> StatusCode {
        match self {
            CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
            CheckoutError::ProductNotFound(_) | CheckoutError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            CheckoutError::InsufficientStock { .. }
            | CheckoutError::InventoryConflict { .. }
            | CheckoutError::PriceChanged { .. } => StatusCode::CONFLICT,
            CheckoutError::PaymentFailed(PaymentFailure::Provider(e)) if !matches!(e, PaymentError::Rejected { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            CheckoutError::PaymentFailed(_) | CheckoutError::PaymentNotCompleted { .. } => {
                StatusCode::PAYMENT_REQUIRED
            }
            CheckoutError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let CheckoutError::Persistence(e) = self {
            tracing::error!(error = %e, "Persistence failure");
        }
        HttpResponse::build(self.status_code()).json(ErrorBody::from(self))
    }
}
