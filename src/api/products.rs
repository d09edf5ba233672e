use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::domain::checkout::{CheckoutError, ValidationError, MAX_LINE_QTY};

use super::AppState;

pub async fn list(state: web::Data<AppState>) -> Result<HttpResponse, CheckoutError> {
    Ok(HttpResponse::Ok().json(state.products.list().await?))
}

pub async fn get(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, CheckoutError> {
    let id = path.into_inner();
    let product = state
        .products
        .find(id)
        .await?
        .ok_or(CheckoutError::ProductNotFound(id))?;
    Ok(HttpResponse::Ok().json(product))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    #[serde(default = "one")]
    pub qty: i64,
}

fn one() -> i64 {
    1
}

/// Advisory stock check; the answer can be stale by the time a checkout commits
pub async fn availability(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, CheckoutError> {
    let product_id = path.into_inner();
    if !(1..=MAX_LINE_QTY).contains(&query.qty) {
        return Err(ValidationError::InvalidQuantity {
            product_id,
            qty: query.qty,
        }
        .into());
    }

    let available = state.ledger.check_available(product_id, query.qty).await?;
    Ok(HttpResponse::Ok().json(json!({
        "productId": product_id,
        "qty": query.qty,
        "available": available,
    })))
}
