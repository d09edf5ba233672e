use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::domain::checkout::CheckoutError;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
}

pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, CheckoutError> {
    let orders = state.orders.list(query.user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn get(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, CheckoutError> {
    let id = path.into_inner();
    let order = state
        .orders
        .find(id)
        .await?
        .ok_or(CheckoutError::OrderNotFound(id))?;
    Ok(HttpResponse::Ok().json(order))
}
