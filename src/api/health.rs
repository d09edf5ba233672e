use actix_web::{web, HttpResponse};

use crate::health::{ComponentHealth, HealthStatus, SystemHealth};

use super::AppState;

/// Database ping plus each payment provider's circuit state
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let payments = state.orchestrator.payments();

    let (database, wallet, paypal) = futures_util::join!(
        database_health(&state),
        payments.wallet.health(),
        payments.redirect.health()
    );

    let system = SystemHealth::from_components(vec![database, wallet, paypal]);
    if system.status.is_unhealthy() {
        HttpResponse::ServiceUnavailable().json(system)
    } else {
        HttpResponse::Ok().json(system)
    }
}

async fn database_health(state: &AppState) -> ComponentHealth {
    match state.db.ping().await {
        Ok(()) => ComponentHealth::new("database", HealthStatus::Healthy),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            ComponentHealth::new("database", HealthStatus::Unhealthy(e.to_string()))
        }
    }
}

pub async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    match state.metrics.encode() {
        Ok(buffer) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(buffer),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}
