use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod health;
mod inventory;
mod metrics;
mod models;
mod payment;
mod store;
mod utils;

use config::Config;
use domain::checkout::CheckoutOrchestrator;
use inventory::InventoryLedger;
use payment::{HttpRedirectClient, HttpWalletClient, PaymentGateways};
use store::Database;
use utils::CircuitBreakerConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set the environment directly
    dotenvy::dotenv().ok();

    // Default to INFO level, overridable with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,marketplace_checkout=debug")),
        )
        .init();

    tracing::info!("🚀 Starting marketplace checkout service");

    let config = Config::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    // === 1. Storage ===
    let db = Database::connect(&config.database_url, config.db_max_connections).await?;
    db.migrate().await?;
    if config.seed_demo_data && db.seed_demo().await? {
        tracing::info!("Demo catalog inserted");
    }

    // === 2. Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 3. Payment providers (each behind its own circuit breaker) ===
    let breaker = CircuitBreakerConfig {
        failure_threshold: config.circuit_failure_threshold,
        open_timeout: config.circuit_open_timeout,
        ..CircuitBreakerConfig::default()
    };
    let wallet = HttpWalletClient::new(&config.wallet_url, config.payment_timeout, breaker.clone())?
        .with_metrics(metrics.clone());
    let redirect = HttpRedirectClient::new(&config.payment_url, config.payment_timeout, breaker)?
        .with_metrics(metrics.clone());
    tracing::info!(wallet = %config.wallet_url, payment = %config.payment_url, "Payment providers configured");

    // === 4. Checkout orchestrator ===
    let orchestrator = Arc::new(CheckoutOrchestrator::new(
        InventoryLedger::new(db.pool().clone()),
        PaymentGateways::new(Arc::new(wallet), Arc::new(redirect)),
        metrics.clone(),
        config.paypal_default_return_url.clone(),
    ));

    let state = api::AppState::new(db.clone(), orchestrator, metrics);

    // === 5. HTTP server ===
    let (host, port) = config.bind_addr();
    tracing::info!("🌐 Listening on http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .configure(api::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    db.pool().close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}
