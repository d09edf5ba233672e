// ============================================================================
// Payment Gateway Adapters
// ============================================================================
//
// Two capabilities, consumed as opaque remote services:
// - WalletGateway:   synchronous balance debit (charge)
// - RedirectGateway: create an intent, user approves out-of-band, execute
//
// Transport failures and provider rejections both come back as PaymentError;
// business outcomes (insufficient funds, not completed, a refused execute)
// come back as Ok values so they don't trip the circuit breaker.
//
// ============================================================================

pub mod redirect;
pub mod wallet;

#[cfg(test)]
pub mod fakes;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

use crate::health::{ComponentHealth, HealthStatus};
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerError};

pub use redirect::HttpRedirectClient;
pub use wallet::HttpWalletClient;

#[derive(Debug, Clone, thiserror::Error)]
pub enum PaymentError {
    #[error("payment provider rejected the request (HTTP {status})")]
    Rejected { status: u16, detail: serde_json::Value },

    #[error("payment provider unreachable: {0}")]
    Transport(String),

    #[error("payment provider unavailable: circuit breaker open")]
    Unavailable,

    #[error("unexpected payment provider response: {0}")]
    InvalidResponse(String),
}

impl PaymentError {
    /// True when the provider never gave a business answer
    pub fn is_transport(&self) -> bool {
        matches!(self, PaymentError::Transport(_) | PaymentError::Unavailable)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChargeOutcome {
    Completed,
    InsufficientFunds,
    NotFound,
}

/// Provider-side pending payment; the provider is the source of truth
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentIntent {
    #[serde(rename = "paymentId")]
    pub payment_id: String,
    pub approval_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOutcome {
    Completed { transaction_id: Option<String> },
    NotCompleted { status: String },
}

#[async_trait]
pub trait WalletGateway: Send + Sync {
    async fn charge(&self, payer_email: &str, amount_cents: i64) -> Result<ChargeOutcome, PaymentError>;

    async fn health(&self) -> ComponentHealth {
        ComponentHealth::new("wallet", HealthStatus::Healthy)
    }
}

#[async_trait]
pub trait RedirectGateway: Send + Sync {
    async fn create(
        &self,
        amount_cents: i64,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<PaymentIntent, PaymentError>;

    async fn execute(&self, payment_id: &str, payer_id: Option<&str>) -> Result<ExecuteOutcome, PaymentError>;

    async fn health(&self) -> ComponentHealth {
        ComponentHealth::new("paypal", HealthStatus::Healthy)
    }
}

/// The two payment backends the checkout orchestrator can dispatch to
#[derive(Clone)]
pub struct PaymentGateways {
    pub wallet: Arc<dyn WalletGateway>,
    pub redirect: Arc<dyn RedirectGateway>,
}

impl PaymentGateways {
    pub fn new(wallet: Arc<dyn WalletGateway>, redirect: Arc<dyn RedirectGateway>) -> Self {
        Self { wallet, redirect }
    }
}

/// POST a JSON body through the breaker. Transport errors and 5xx answers
/// count as breaker failures; any other status is handed back to the caller.
pub(crate) async fn post_json<B: Serialize + ?Sized>(
    client: &reqwest::Client,
    breaker: &CircuitBreaker,
    metrics: Option<&Arc<Metrics>>,
    url: &str,
    body: &B,
) -> Result<(StatusCode, serde_json::Value), PaymentError> {
    let result = breaker
        .call(async {
            let response = client
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(|e| PaymentError::Transport(e.to_string()))?;

            let status = response.status();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| PaymentError::Transport(e.to_string()))?;
            let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

            if status.is_server_error() {
                return Err(PaymentError::Rejected {
                    status: status.as_u16(),
                    detail: body,
                });
            }

            Ok((status, body))
        })
        .await;

    if let Some(metrics) = metrics {
        metrics.update_circuit_state(breaker.name(), breaker.get_state().await);
    }

    match result {
        Ok(answer) => Ok(answer),
        Err(CircuitBreakerError::CircuitOpen) => {
            tracing::warn!(provider = breaker.name(), url = %url, "Circuit open, payment call rejected");
            Err(PaymentError::Unavailable)
        }
        Err(CircuitBreakerError::OperationFailed(e)) => {
            tracing::error!(provider = breaker.name(), url = %url, error = %e, "Payment provider call failed");
            Err(e)
        }
    }
}

pub(crate) async fn breaker_health(breaker: &CircuitBreaker) -> ComponentHealth {
    let state = breaker.get_state().await;
    ComponentHealth::new(breaker.name(), state.into()).with_details(format!("circuit {:?}", state))
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::net::SocketAddr;

    use actix_web::{App, HttpServer};

    /// Start an in-process provider on an ephemeral port
    pub async fn spawn<F>(configure: F) -> SocketAddr
    where
        F: Fn(&mut actix_web::web::ServiceConfig) + Send + Clone + 'static,
    {
        let server = HttpServer::new(move || App::new().configure(configure.clone()))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        addr
    }
}
