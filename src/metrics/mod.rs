use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};

use crate::utils::CircuitState;

// ============================================================================
// Metrics Module - Prometheus metrics for the checkout service
// ============================================================================
//
// - Checkout throughput and latency, by payment method and outcome
// - Payment provider calls, by provider/operation/outcome
// - Inventory conflicts lost at commit time
// - Circuit breaker state per provider
//
// Scraped via GET /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub checkouts_total: IntCounterVec,
    pub checkout_duration: HistogramVec,

    pub payment_calls_total: IntCounterVec,

    pub orders_committed_total: IntCounter,
    pub inventory_conflicts_total: IntCounter,

    pub circuit_breaker_state: IntGaugeVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let checkouts_total = IntCounterVec::new(
            Opts::new("checkouts_total", "Checkout attempts by payment method and outcome"),
            &["method", "outcome"],
        )?;
        registry.register(Box::new(checkouts_total.clone()))?;

        let checkout_duration = HistogramVec::new(
            HistogramOpts::new("checkout_duration_seconds", "End-to-end checkout duration")
                .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["method"],
        )?;
        registry.register(Box::new(checkout_duration.clone()))?;

        let payment_calls_total = IntCounterVec::new(
            Opts::new("payment_calls_total", "Calls to payment providers"),
            &["provider", "operation", "outcome"],
        )?;
        registry.register(Box::new(payment_calls_total.clone()))?;

        let orders_committed_total = IntCounter::new(
            "orders_committed_total",
            "Orders committed together with their stock decrements",
        )?;
        registry.register(Box::new(orders_committed_total.clone()))?;

        let inventory_conflicts_total = IntCounter::new(
            "inventory_conflicts_total",
            "Commits aborted because stock changed after the availability check",
        )?;
        registry.register(Box::new(inventory_conflicts_total.clone()))?;

        let circuit_breaker_state = IntGaugeVec::new(
            Opts::new(
                "circuit_breaker_state",
                "Circuit breaker state per provider (0=Closed, 1=Open, 2=HalfOpen)",
            ),
            &["provider"],
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        Ok(Self {
            registry,
            checkouts_total,
            checkout_duration,
            payment_calls_total,
            orders_committed_total,
            inventory_conflicts_total,
            circuit_breaker_state,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_checkout(&self, method: &str, outcome: &str, duration_secs: f64) {
        self.checkouts_total.with_label_values(&[method, outcome]).inc();
        self.checkout_duration.with_label_values(&[method]).observe(duration_secs);
    }

    pub fn record_payment_call(&self, provider: &str, operation: &str, outcome: &str) {
        self.payment_calls_total
            .with_label_values(&[provider, operation, outcome])
            .inc();
    }

    pub fn record_commit(&self) {
        self.orders_committed_total.inc();
    }

    pub fn record_inventory_conflict(&self) {
        self.inventory_conflicts_total.inc();
    }

    pub fn update_circuit_state(&self, provider: &str, state: CircuitState) {
        self.circuit_breaker_state
            .with_label_values(&[provider])
            .set(state.as_gauge());
    }

    /// Prometheus text exposition of everything registered
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}
