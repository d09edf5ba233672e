use std::time::Duration;

use anyhow::{Context, Result};

// ============================================================================
// Service Configuration
// ============================================================================
//
// Everything comes from the environment (optionally via a .env file loaded
// in main). Defaults match the docker-compose layout of the marketplace:
// wallet on :4100, payment simulator on :4001, storefront on :5173.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL
    pub database_url: String,
    pub db_max_connections: u32,

    pub http_host: String,
    pub http_port: u16,

    /// Base URL of the wallet ledger service
    pub wallet_url: String,
    /// Base URL of the redirect-payment (PayPal-style) service
    pub payment_url: String,
    /// Used when a redirect checkout omits return/cancel URLs
    pub paypal_default_return_url: String,

    pub payment_timeout: Duration,
    pub circuit_failure_threshold: u32,
    pub circuit_open_timeout: Duration,

    /// Insert the demo catalog when the products table is empty
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/marketplace.db".to_string(),
            db_max_connections: 5,
            http_host: "0.0.0.0".to_string(),
            http_port: 5000,
            wallet_url: "http://wallet:4100".to_string(),
            payment_url: "http://payment:4001".to_string(),
            paypal_default_return_url: "http://localhost:5173".to_string(),
            payment_timeout: Duration::from_secs(10),
            circuit_failure_threshold: 5,
            circuit_open_timeout: Duration::from_secs(30),
            seed_demo_data: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: parse_or(&var, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            http_host: var("HTTP_HOST").unwrap_or(defaults.http_host),
            http_port: parse_or(&var, "HTTP_PORT", defaults.http_port)?,
            wallet_url: var("WALLET_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.wallet_url),
            payment_url: var("PAYMENT_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.payment_url),
            paypal_default_return_url: var("PAYPAL_DEFAULT_RETURN_URL")
                .unwrap_or(defaults.paypal_default_return_url),
            payment_timeout: Duration::from_secs(parse_or(
                &var,
                "PAYMENT_TIMEOUT_SECS",
                defaults.payment_timeout.as_secs(),
            )?),
            circuit_failure_threshold: parse_or(
                &var,
                "CIRCUIT_FAILURE_THRESHOLD",
                defaults.circuit_failure_threshold,
            )?,
            circuit_open_timeout: Duration::from_secs(parse_or(
                &var,
                "CIRCUIT_OPEN_SECS",
                defaults.circuit_open_timeout.as_secs(),
            )?),
            seed_demo_data: parse_or(&var, "SEED_DEMO_DATA", defaults.seed_demo_data)?,
        })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.http_host.clone(), self.http_port)
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}
