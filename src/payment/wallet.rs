use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::health::ComponentHealth;
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig};

use super::{breaker_health, post_json, ChargeOutcome, PaymentError, WalletGateway};

/// HTTP client for the wallet ledger service (`POST /api/wallet/charge`)
pub struct HttpWalletClient {
    client: reqwest::Client,
    charge_url: String,
    breaker: CircuitBreaker,
    metrics: Option<Arc<Metrics>>,
}

#[derive(Serialize)]
struct ChargeRequest<'a> {
    email: &'a str,
    amount_cents: i64,
}

impl HttpWalletClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        breaker: CircuitBreakerConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            charge_url: format!("{}/api/wallet/charge", base_url.trim_end_matches('/')),
            breaker: CircuitBreaker::new("wallet", breaker),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

#[async_trait]
impl WalletGateway for HttpWalletClient {
    async fn charge(&self, payer_email: &str, amount_cents: i64) -> Result<ChargeOutcome, PaymentError> {
        let request = ChargeRequest {
            email: payer_email,
            amount_cents,
        };

        let (status, body) = post_json(
            &self.client,
            &self.breaker,
            self.metrics.as_ref(),
            &self.charge_url,
            &request,
        )
        .await?;

        let outcome = match status.as_u16() {
            200..=299 => ChargeOutcome::Completed,
            404 => ChargeOutcome::NotFound,
            400 if reports_insufficient_funds(&body) => ChargeOutcome::InsufficientFunds,
            other => {
                return Err(PaymentError::Rejected {
                    status: other,
                    detail: body,
                })
            }
        };

        tracing::debug!(amount_cents, outcome = ?outcome, "Wallet charge answered");
        Ok(outcome)
    }

    async fn health(&self) -> ComponentHealth {
        breaker_health(&self.breaker).await
    }
}

fn reports_insufficient_funds(body: &serde_json::Value) -> bool {
    body.get("error")
        .and_then(|e| e.as_str())
        .map(|e| e.to_ascii_lowercase().contains("insufficient"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::test_server;
    use actix_web::{web, HttpResponse};

    #[derive(serde::Deserialize)]
    struct Charge {
        email: String,
        amount_cents: i64,
    }

    // Mirrors the wallet service: one funded wallet with 1000 cents
    async fn charge(body: web::Json<Charge>) -> HttpResponse {
        match body.email.as_str() {
            "ana@example.com" if body.amount_cents <= 1000 => {
                HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
            }
            "ana@example.com" => {
                HttpResponse::BadRequest().json(serde_json::json!({ "error": "insufficient funds" }))
            }
            "broken@example.com" => {
                HttpResponse::InternalServerError().json(serde_json::json!({ "error": "db locked" }))
            }
            "odd@example.com" => HttpResponse::Conflict().finish(),
            _ => HttpResponse::NotFound().json(serde_json::json!({ "error": "wallet not found" })),
        }
    }

    async fn client() -> HttpWalletClient {
        let addr = test_server::spawn(|cfg| {
            cfg.route("/api/wallet/charge", web::post().to(charge));
        })
        .await;

        HttpWalletClient::new(
            &format!("http://{addr}"),
            Duration::from_secs(5),
            CircuitBreakerConfig::default(),
        )
        .unwrap()
    }

    #[actix_web::test]
    async fn test_charge_outcomes_follow_wallet_status_codes() {
        let wallet = client().await;

        assert_eq!(wallet.charge("ana@example.com", 500).await.unwrap(), ChargeOutcome::Completed);
        assert_eq!(
            wallet.charge("ana@example.com", 5000).await.unwrap(),
            ChargeOutcome::InsufficientFunds
        );
        assert_eq!(wallet.charge("nobody@example.com", 1).await.unwrap(), ChargeOutcome::NotFound);
    }

    #[actix_web::test]
    async fn test_unexpected_status_is_a_rejection() {
        let wallet = client().await;

        let err = wallet.charge("odd@example.com", 1).await.unwrap_err();
        assert!(matches!(err, PaymentError::Rejected { status: 409, .. }));

        let err = wallet.charge("broken@example.com", 1).await.unwrap_err();
        match err {
            PaymentError::Rejected { status, detail } => {
                assert_eq!(status, 500);
                assert_eq!(detail["error"], "db locked");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn test_unreachable_wallet_is_transport_error_and_opens_circuit() {
        // Grab a free port, then release it so nothing listens there
        let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();

        let wallet = HttpWalletClient::new(
            &format!("http://127.0.0.1:{port}"),
            Duration::from_secs(2),
            CircuitBreakerConfig {
                failure_threshold: 2,
                open_timeout: Duration::from_secs(60),
                success_threshold: 1,
            },
        )
        .unwrap();

        for _ in 0..2 {
            let err = wallet.charge("ana@example.com", 100).await.unwrap_err();
            assert!(matches!(err, PaymentError::Transport(_)));
        }

        let err = wallet.charge("ana@example.com", 100).await.unwrap_err();
        assert!(matches!(err, PaymentError::Unavailable));
        assert!(wallet.health().await.status.is_unhealthy());
    }
}
