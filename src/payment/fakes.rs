//! In-process payment providers for orchestrator and API tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Barrier;

use super::{ChargeOutcome, ExecuteOutcome, PaymentError, PaymentIntent, RedirectGateway, WalletGateway};

pub struct FakeWallet {
    response: Result<ChargeOutcome, PaymentError>,
    charges: Mutex<Vec<(String, i64)>>,
    barrier: Option<Arc<Barrier>>,
}

impl FakeWallet {
    pub fn answering(response: Result<ChargeOutcome, PaymentError>) -> Self {
        Self {
            response,
            charges: Mutex::new(Vec::new()),
            barrier: None,
        }
    }

    pub fn completing() -> Self {
        Self::answering(Ok(ChargeOutcome::Completed))
    }

    /// Every charge waits on `barrier` before answering, so concurrent
    /// checkouts all pass their stock check before any of them commits.
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub fn charges(&self) -> Vec<(String, i64)> {
        self.charges.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletGateway for FakeWallet {
    async fn charge(&self, payer_email: &str, amount_cents: i64) -> Result<ChargeOutcome, PaymentError> {
        self.charges.lock().unwrap().push((payer_email.to_string(), amount_cents));
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        self.response.clone()
    }
}

pub struct FakeRedirect {
    create_response: Result<PaymentIntent, PaymentError>,
    execute_response: Result<ExecuteOutcome, PaymentError>,
    created: Mutex<Vec<(i64, String, String)>>,
    executed: Mutex<Vec<String>>,
}

impl FakeRedirect {
    pub fn new(
        create_response: Result<PaymentIntent, PaymentError>,
        execute_response: Result<ExecuteOutcome, PaymentError>,
    ) -> Self {
        Self {
            create_response,
            execute_response,
            created: Mutex::new(Vec::new()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn approving() -> Self {
        Self::new(
            Ok(PaymentIntent {
                payment_id: "PAY-test".to_string(),
                approval_url: "http://payment.test/pay/PAY-test".to_string(),
            }),
            Ok(ExecuteOutcome::Completed {
                transaction_id: Some("TX-test".to_string()),
            }),
        )
    }

    pub fn created(&self) -> Vec<(i64, String, String)> {
        self.created.lock().unwrap().clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl RedirectGateway for FakeRedirect {
    async fn create(
        &self,
        amount_cents: i64,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        self.created
            .lock()
            .unwrap()
            .push((amount_cents, return_url.to_string(), cancel_url.to_string()));
        self.create_response.clone()
    }

    async fn execute(&self, payment_id: &str, _payer_id: Option<&str>) -> Result<ExecuteOutcome, PaymentError> {
        self.executed.lock().unwrap().push(payment_id.to_string());
        self.execute_response.clone()
    }
}
