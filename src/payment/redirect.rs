use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::health::ComponentHealth;
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig};

use super::{breaker_health, post_json, ExecuteOutcome, PaymentError, PaymentIntent, RedirectGateway};

/// HTTP client for the PayPal-style payment service
/// (`POST /api/payments/create`, `POST /api/payments/execute`)
pub struct HttpRedirectClient {
    client: reqwest::Client,
    base_url: String,
    breaker: CircuitBreaker,
    metrics: Option<Arc<Metrics>>,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    amount_cents: i64,
    return_url: &'a str,
    cancel_url: &'a str,
}

#[derive(Deserialize)]
struct CreateResponse {
    #[serde(rename = "paymentId")]
    payment_id: Option<String>,
    approval_url: Option<String>,
}

#[derive(Serialize)]
struct ExecuteRequest<'a> {
    #[serde(rename = "paymentId")]
    payment_id: &'a str,
    #[serde(rename = "payerId")]
    payer_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct ExecuteResponse {
    status: Option<String>,
    #[serde(rename = "transactionId")]
    transaction_id: Option<String>,
}

impl HttpRedirectClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        breaker: CircuitBreakerConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            breaker: CircuitBreaker::new("paypal", breaker),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<serde_json::Value, PaymentError> {
        let url = format!("{}{}", self.base_url, path);
        let (status, body) = post_json(&self.client, &self.breaker, self.metrics.as_ref(), &url, body).await?;

        if !status.is_success() {
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                detail: body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl RedirectGateway for HttpRedirectClient {
    async fn create(
        &self,
        amount_cents: i64,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let body = self
            .post(
                "/api/payments/create",
                &CreateRequest {
                    amount_cents,
                    return_url,
                    cancel_url,
                },
            )
            .await?;

        let created: CreateResponse = serde_json::from_value(body.clone())
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

        match (created.payment_id, created.approval_url) {
            (Some(payment_id), Some(approval_url)) if !approval_url.is_empty() => {
                tracing::info!(payment_id = %payment_id, amount_cents, "Payment intent created");
                Ok(PaymentIntent { payment_id, approval_url })
            }
            _ => Err(PaymentError::InvalidResponse(format!(
                "create response without paymentId/approval_url: {body}"
            ))),
        }
    }

    async fn execute(&self, payment_id: &str, payer_id: Option<&str>) -> Result<ExecuteOutcome, PaymentError> {
        let url = format!("{}/api/payments/execute", self.base_url);
        let request = ExecuteRequest { payment_id, payer_id };
        let (status, body) = post_json(&self.client, &self.breaker, self.metrics.as_ref(), &url, &request).await?;

        // A 4xx is the provider refusing this payment, not an outage
        if status.is_client_error() {
            let outcome = ExecuteOutcome::NotCompleted {
                status: refusal_status(status, &body),
            };
            tracing::info!(payment_id = %payment_id, http_status = status.as_u16(), outcome = ?outcome, "Payment execute refused");
            return Ok(outcome);
        }
        if !status.is_success() {
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                detail: body,
            });
        }

        let executed: ExecuteResponse = serde_json::from_value(body)
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

        let outcome = match executed.status.as_deref() {
            Some("COMPLETED") => ExecuteOutcome::Completed {
                transaction_id: executed.transaction_id,
            },
            other => ExecuteOutcome::NotCompleted {
                status: other.unwrap_or("UNKNOWN").to_string(),
            },
        };

        tracing::debug!(payment_id = %payment_id, outcome = ?outcome, "Payment execute answered");
        Ok(outcome)
    }

    async fn health(&self) -> ComponentHealth {
        breaker_health(&self.breaker).await
    }
}

fn refusal_status(status: reqwest::StatusCode, body: &serde_json::Value) -> String {
    ["status", "error"]
        .iter()
        .find_map(|field| body[*field].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
