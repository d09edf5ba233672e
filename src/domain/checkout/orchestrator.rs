use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::inventory::InventoryLedger;
use crate::metrics::Metrics;
use crate::payment::{ChargeOutcome, ExecuteOutcome, PaymentError, PaymentGateways, PaymentIntent};

use super::commands::{CheckoutCommand, CheckoutRequest, ExecutePaymentCommand, ExecutePaymentRequest};
use super::errors::{CheckoutError, PaymentFailure};
use super::value_objects::{
    CheckoutOutcome, CommittedOrder, ExecutedPayment, PaymentMethod, PendingPayment, Quote,
};

// ============================================================================
// Checkout Orchestrator
// ============================================================================
//
// Wallet:   validate → quote → charge → reserve_and_commit
// Redirect: validate → quote → create intent (no writes)
// Execute:  validate → execute at provider → quote → reserve_and_commit
//
// Stock is never written before payment succeeds, and nothing is written at
// all unless every line commits.
//
// ============================================================================

pub struct CheckoutOrchestrator {
    ledger: InventoryLedger,
    payments: PaymentGateways,
    metrics: Arc<Metrics>,
    default_return_url: String,
}

impl CheckoutOrchestrator {
    pub fn new(
        ledger: InventoryLedger,
        payments: PaymentGateways,
        metrics: Arc<Metrics>,
        default_return_url: impl Into<String>,
    ) -> Self {
        Self {
            ledger,
            payments,
            metrics,
            default_return_url: default_return_url.into(),
        }
    }

    pub fn payments(&self) -> &PaymentGateways {
        &self.payments
    }

    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutOutcome, CheckoutError> {
        let started = Instant::now();

        let command = match request.validate() {
            Ok(command) => command,
            Err(e) => {
                self.metrics
                    .record_checkout("invalid", "validation", started.elapsed().as_secs_f64());
                return Err(e.into());
            }
        };

        let method = command.payment.label();
        let span = info_span!(
            "checkout",
            checkout_id = %Uuid::new_v4(),
            method,
            user_id = ?command.user_id
        );

        let result = self.run_checkout(command).instrument(span).await;

        let outcome = match &result {
            Ok(CheckoutOutcome::Committed(_)) => "committed",
            Ok(CheckoutOutcome::Pending(_)) => "pending",
            Err(e) => e.kind(),
        };
        self.metrics
            .record_checkout(method, outcome, started.elapsed().as_secs_f64());

        result
    }

    pub async fn execute_payment(
        &self,
        request: ExecutePaymentRequest,
    ) -> Result<ExecutedPayment, CheckoutError> {
        let started = Instant::now();

        let command = match request.validate() {
            Ok(command) => command,
            Err(e) => {
                self.metrics
                    .record_checkout("invalid", "validation", started.elapsed().as_secs_f64());
                return Err(e.into());
            }
        };

        let span = info_span!(
            "execute_payment",
            checkout_id = %Uuid::new_v4(),
            payment_id = %command.payment_id,
            user_id = ?command.user_id
        );

        let result = self.run_execute(command).instrument(span).await;

        let outcome = match &result {
            Ok(_) => "committed",
            Err(e) => e.kind(),
        };
        self.metrics
            .record_checkout("paypal", outcome, started.elapsed().as_secs_f64());

        result
    }

    async fn run_checkout(&self, command: CheckoutCommand) -> Result<CheckoutOutcome, CheckoutError> {
        let quote = self.ledger.quote(&command.items).await?;
        info!(
            lines = quote.lines.len(),
            total_cents = quote.total_cents,
            "Stock verified and prices frozen"
        );

        match command.payment {
            PaymentMethod::Wallet { payer_email } => {
                self.charge_wallet(&payer_email, quote.total_cents).await?;

                let order = self.commit(command.user_id, &quote).await.inspect_err(|e| {
                    error!(
                        error = %e,
                        payer_email = %payer_email,
                        amount_cents = quote.total_cents,
                        "Wallet charged but order not committed; refund required"
                    );
                })?;
                Ok(CheckoutOutcome::Committed(order))
            }
            PaymentMethod::Redirect {
                return_url,
                cancel_url,
            } => {
                let return_url = return_url.unwrap_or_else(|| self.default_return_url.clone());
                let cancel_url = cancel_url.unwrap_or_else(|| self.default_return_url.clone());

                let payment = self
                    .create_intent(quote.total_cents, &return_url, &cancel_url)
                    .await?;
                info!(payment_id = %payment.payment_id, "Awaiting payer approval");

                Ok(CheckoutOutcome::Pending(PendingPayment {
                    payment,
                    total_cents: quote.total_cents,
                }))
            }
        }
    }

    async fn run_execute(&self, command: ExecutePaymentCommand) -> Result<ExecutedPayment, CheckoutError> {
        let result = self
            .payments
            .redirect
            .execute(&command.payment_id, command.payer_id.as_deref())
            .await;
        self.metrics
            .record_payment_call("paypal", "execute", call_outcome(&result, |o| match o {
                ExecuteOutcome::Completed { .. } => "completed",
                ExecuteOutcome::NotCompleted { .. } => "not_completed",
            }));

        let transaction_id = match result? {
            ExecuteOutcome::Completed { transaction_id } => transaction_id,
            ExecuteOutcome::NotCompleted { status } => {
                warn!(status = %status, "Payment not completed by provider");
                return Err(CheckoutError::PaymentNotCompleted {
                    payment_id: command.payment_id,
                    status,
                });
            }
        };
        info!(transaction_id = ?transaction_id, "Payment executed");

        let committed = match self.ledger.quote(&command.items).await {
            Ok(quote) => self.commit(command.user_id, &quote).await,
            Err(e) => Err(e),
        };

        let order = committed.inspect_err(|e| {
            error!(
                error = %e,
                transaction_id = ?transaction_id,
                "Payment executed but order not committed; refund required"
            );
        })?;

        Ok(ExecutedPayment {
            order,
            transaction_id,
        })
    }

    async fn charge_wallet(&self, payer_email: &str, amount_cents: i64) -> Result<(), CheckoutError> {
        let result = self.payments.wallet.charge(payer_email, amount_cents).await;
        self.metrics
            .record_payment_call("wallet", "charge", call_outcome(&result, |o| match o {
                ChargeOutcome::Completed => "completed",
                ChargeOutcome::InsufficientFunds => "insufficient_funds",
                ChargeOutcome::NotFound => "not_found",
            }));

        match result {
            Ok(ChargeOutcome::Completed) => {
                info!(amount_cents, "Wallet charged");
                Ok(())
            }
            Ok(ChargeOutcome::InsufficientFunds) => {
                warn!(amount_cents, "Wallet has insufficient funds");
                Err(CheckoutError::PaymentFailed(PaymentFailure::InsufficientFunds))
            }
            Ok(ChargeOutcome::NotFound) => {
                warn!(payer_email = %payer_email, "No wallet for payer");
                Err(CheckoutError::PaymentFailed(PaymentFailure::WalletNotFound(
                    payer_email.to_string(),
                )))
            }
            Err(e) => {
                warn!(error = %e, "Wallet charge failed");
                Err(e.into())
            }
        }
    }

    async fn create_intent(
        &self,
        amount_cents: i64,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<PaymentIntent, CheckoutError> {
        let result = self
            .payments
            .redirect
            .create(amount_cents, return_url, cancel_url)
            .await;
        self.metrics
            .record_payment_call("paypal", "create", call_outcome(&result, |_| "created"));

        result.map_err(|e| {
            warn!(error = %e, "Payment intent creation failed");
            e.into()
        })
    }

    async fn commit(&self, user_id: Option<i64>, quote: &Quote) -> Result<CommittedOrder, CheckoutError> {
        match self.ledger.reserve_and_commit(user_id, quote).await {
            Ok(order) => {
                self.metrics.record_commit();
                info!(
                    order_id = order.order_id,
                    total_cents = order.total_cents,
                    "Order committed"
                );
                Ok(order)
            }
            Err(e) => {
                if matches!(e, CheckoutError::InventoryConflict { .. }) {
                    self.metrics.record_inventory_conflict();
                }
                warn!(error = %e, kind = e.kind(), "Commit aborted, nothing written");
                Err(e)
            }
        }
    }
}

fn call_outcome<T>(result: &Result<T, PaymentError>, label: impl Fn(&T) -> &'static str) -> &'static str {
    match result {
        Ok(value) => label(value),
        Err(e) if e.is_transport() => "unreachable",
        Err(_) => "error",
    }
}
