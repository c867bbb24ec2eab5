//! Circuit breaker guarding the distributed cache backend.
//!
//! The circuit has three states:
//!
//! - **Closed**: the backend is healthy and receives every operation.
//! - **Open**: the backend failed repeatedly; operations go straight to the
//!   local fallback until the cooldown elapses.
//! - **HalfOpen**: the cooldown elapsed; the next operation probes the backend.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    failure_count: u32,
    opened_at: Option<Instant>,
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a probe is allowed.
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(30),
        }
    }
}

/// Single-backend circuit breaker. State is in-memory only.
pub struct CircuitBreaker {
    name: &'static str,
    circuit: Mutex<Circuit>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            name,
            circuit: Mutex::new(Circuit {
                state: CircuitState::Closed,
                failure_count: 0,
                opened_at: None,
            }),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Circuit> {
        // A poisoned lock only risks a slightly wrong circuit state.
        self.circuit.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex for '{}' was poisoned, recovering", self.name);
            poisoned.into_inner()
        })
    }

    /// Whether the backend should receive the next operation. Moves an open
    /// circuit to HalfOpen once the cooldown has elapsed.
    pub fn is_allowed(&self) -> bool {
        let mut circuit = self.lock();
        match circuit.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled_down = circuit
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.cooldown)
                    .unwrap_or(true);
                if cooled_down {
                    info!("Cache backend '{}' circuit: Open -> HalfOpen", self.name);
                    circuit.state = CircuitState::HalfOpen;
                }
                cooled_down
            }
        }
    }

    pub fn record_success(&self) {
        let mut circuit = self.lock();
        if circuit.state != CircuitState::Closed {
            info!(
                "Cache backend '{}' circuit: {} -> Closed",
                self.name, circuit.state
            );
        }
        circuit.state = CircuitState::Closed;
        circuit.failure_count = 0;
        circuit.opened_at = None;
    }

    pub fn record_failure(&self) {
        let mut circuit = self.lock();
        circuit.failure_count += 1;
        match circuit.state {
            CircuitState::HalfOpen => {
                warn!(
                    "Cache backend '{}' probe failed, reopening circuit",
                    self.name
                );
                circuit.state = CircuitState::Open;
                circuit.opened_at = Some(Instant::now());
            }
            CircuitState::Closed if circuit.failure_count >= self.config.failure_threshold => {
                warn!(
                    "Cache backend '{}' failed {} times in a row, opening circuit for {:?}",
                    self.name, circuit.failure_count, self.config.cooldown
                );
                circuit.state = CircuitState::Open;
                circuit.opened_at = Some(Instant::now());
            }
            _ => {
                debug!(
                    "Cache backend '{}' failure {}/{}",
                    self.name, circuit.failure_count, self.config.failure_threshold
                );
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }
}
