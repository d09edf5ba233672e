// ============================================================================
// HTTP API - actix-web routes
// ============================================================================
//
// | path                            | method | handler                  |
// |---------------------------------|--------|--------------------------|
// | /api/orders/checkout            | POST   | checkout::checkout       |
// | /api/orders/execute-paypal      | POST   | checkout::execute_paypal |
// | /api/orders                     | GET    | orders::list             |
// | /api/orders/{id}                | GET    | orders::get              |
// | /api/products                   | GET    | products::list           |
// | /api/products/{id}              | GET    | products::get            |
// | /api/products/{id}/availability | GET    | products::availability   |
// | /api/health                     | GET    | health::health           |
// | /metrics                        | GET    | health::metrics          |
//
// ============================================================================

mod checkout;
pub mod error;
mod health;
mod orders;
mod products;

use std::sync::Arc;

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};

use crate::domain::checkout::{CheckoutError, CheckoutOrchestrator, ValidationError};
use crate::inventory::InventoryLedger;
use crate::metrics::Metrics;
use crate::store::{Database, OrderStore, ProductStore};

use self::error::ErrorBody;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub products: ProductStore,
    pub orders: OrderStore,
    pub ledger: InventoryLedger,
    pub orchestrator: Arc<CheckoutOrchestrator>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(db: Database, orchestrator: Arc<CheckoutOrchestrator>, metrics: Arc<Metrics>) -> Self {
        Self {
            products: ProductStore::new(db.pool().clone()),
            orders: OrderStore::new(db.pool().clone()),
            ledger: InventoryLedger::new(db.pool().clone()),
            db,
            orchestrator,
            metrics,
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(
            web::scope("/api")
                .route("/orders/checkout", web::post().to(checkout::checkout))
                .route("/orders/execute-paypal", web::post().to(checkout::execute_paypal))
                .route("/orders", web::get().to(orders::list))
                .route("/orders/{id}", web::get().to(orders::get))
                .route("/products", web::get().to(products::list))
                .route("/products/{id}", web::get().to(products::get))
                .route("/products/{id}/availability", web::get().to(products::availability))
                .route("/health", web::get().to(health::health)),
        )
        .route("/metrics", web::get().to(health::metrics));
}

/// Extractor failures answer with the same envelope as handler errors
fn rejected<C>(cause: C, error: ValidationError) -> actix_web::Error
where
    C: std::fmt::Debug + std::fmt::Display + 'static,
{
    let error = CheckoutError::from(error);
    let response = HttpResponse::build(error.status_code()).json(ErrorBody::from(&error));
    actix_web::error::InternalError::from_response(cause, response).into()
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let validation = ValidationError::MalformedBody(err.to_string());
    rejected(err, validation)
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let validation = ValidationError::MalformedQuery(err.to_string());
    rejected(err, validation)
}
