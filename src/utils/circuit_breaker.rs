use std::sync::Arc;
use tokio::sync::Mutex;
use std::time::{Duration, Instant};

// ============================================================================
// Circuit Breaker for outbound payment providers
// ============================================================================
//
// Tracks transport failures against one provider and fails fast while the
// provider looks down, so checkouts don't pile up behind network timeouts.
//
// States:
// - Closed: calls pass through
// - Open: calls rejected immediately until the open timeout elapses
// - HalfOpen: one trial call at a time; enough successes close the circuit
//
// The breaker never repeats an operation. Whether a failed payment call is
// tried again is always the caller's decision.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Gauge encoding used by the metrics registry
    pub fn as_gauge(&self) -> i64 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Clone)]
pub struct CircuitBreaker {
    name: Arc<str>,
    phase: Arc<Mutex<Phase>>,
    config: CircuitBreakerConfig,
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening
    pub failure_threshold: u32,
    /// How long the circuit stays open before a trial call is let through
    pub open_timeout: Duration,
    /// Successful trial calls needed to close from half-open
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed { consecutive_failures: u32 },
    Open { until: Instant },
    /// At most one trial call runs at a time. A trial older than the open
    /// timeout is treated as abandoned (its future was dropped).
    HalfOpen { trial_started: Option<Instant>, successes: u32 },
}

impl Phase {
    fn state(&self) -> CircuitState {
        match self {
            Phase::Closed { .. } => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }
}

impl CircuitBreaker {
    pub fn new(name: &str, config: CircuitBreakerConfig) -> Self {
        Self {
            name: Arc::from(name),
            phase: Arc::new(Mutex::new(Phase::Closed { consecutive_failures: 0 })),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `operation` unless the circuit is open
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        if !self.admit().await {
            return Err(CircuitBreakerError::CircuitOpen);
        }

        let result = operation.await;
        self.settle(result.is_ok()).await;
        result.map_err(CircuitBreakerError::OperationFailed)
    }

    /// Whether a call may go out now; moves Open to HalfOpen once the window ends
    async fn admit(&self) -> bool {
        let mut phase = self.phase.lock().await;
        let now = Instant::now();

        match *phase {
            Phase::Closed { .. } => true,
            Phase::Open { until } if now < until => false,
            Phase::Open { .. } => {
                tracing::info!(provider = %self.name, "Circuit breaker half-open, sending trial call");
                *phase = Phase::HalfOpen {
                    trial_started: Some(now),
                    successes: 0,
                };
                true
            }
            Phase::HalfOpen { trial_started: Some(started), .. }
                if now.duration_since(started) < self.config.open_timeout =>
            {
                false
            }
            Phase::HalfOpen { successes, .. } => {
                *phase = Phase::HalfOpen {
                    trial_started: Some(now),
                    successes,
                };
                true
            }
        }
    }

    async fn settle(&self, succeeded: bool) {
        let mut phase = self.phase.lock().await;

        *phase = match (*phase, succeeded) {
            (Phase::Closed { .. }, true) => Phase::Closed { consecutive_failures: 0 },
            (Phase::Closed { consecutive_failures }, false) => {
                let failures = consecutive_failures + 1;
                if failures >= self.config.failure_threshold {
                    tracing::warn!(provider = %self.name, failures, "Circuit breaker opened");
                    self.open_from_now()
                } else {
                    Phase::Closed { consecutive_failures: failures }
                }
            }
            (Phase::HalfOpen { successes, .. }, true) => {
                let successes = successes + 1;
                if successes >= self.config.success_threshold {
                    tracing::info!(provider = %self.name, "Circuit breaker closed, provider recovered");
                    Phase::Closed { consecutive_failures: 0 }
                } else {
                    Phase::HalfOpen { trial_started: None, successes }
                }
            }
            (Phase::HalfOpen { .. }, false) => {
                tracing::warn!(provider = %self.name, "Trial call failed, circuit breaker re-opened");
                self.open_from_now()
            }
            // Answer to a call admitted before the circuit tripped; the open
            // window is not moved by it.
            (open @ Phase::Open { .. }, _) => {
                tracing::debug!(provider = %self.name, succeeded, "Late answer while circuit is open");
                open
            }
        };
    }

    fn open_from_now(&self) -> Phase {
        Phase::Open {
            until: Instant::now() + self.config.open_timeout,
        }
    }

    pub async fn get_state(&self) -> CircuitState {
        self.phase.lock().await.state()
    }
}

#[derive(Debug)]
pub enum CircuitBreakerError<E> {
    CircuitOpen,
    OperationFailed(E),
}

impl<E: std::fmt::Display> std::fmt::Display for CircuitBreakerError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitBreakerError::CircuitOpen => write!(f, "Circuit breaker is open"),
            CircuitBreakerError::OperationFailed(e) => write!(f, "Operation failed: {}", e),
        }
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for CircuitBreakerError<E> {}
