//! Per-provider circuit breaker.
//!
//! A provider that keeps failing is taken out of the fallback chain for a
//! while so scans don't spend their latency budget on it. States:
//!
//! - **Closed**: calls go through.
//! - **Open**: calls are skipped until the recovery timeout passes.
//! - **HalfOpen**: trial calls go through; enough successes close the circuit.
//! - **Disabled**: the provider rejected our credentials. Nothing re-enables
//!   it short of a restart or an explicit [`CircuitBreaker::reset`].
//!
//! State is in-memory only.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::models::ProviderId;

const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(300);

const HALF_OPEN_SUCCESS_THRESHOLD: u32 = 1;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
    Disabled,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "Closed",
            Self::Open => "Open",
            Self::HalfOpen => "HalfOpen",
            Self::Disabled => "Disabled",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    failure_count: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
}

impl Circuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            half_open_successes: 0,
            opened_at: None,
        }
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.failure_count = 0;
        self.half_open_successes = 0;
        self.opened_at = None;
    }
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long an open circuit stays open.
    pub recovery_timeout: Duration,
    /// Trial successes needed to close from HalfOpen.
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
            half_open_success_threshold: HALF_OPEN_SUCCESS_THRESHOLD,
        }
    }
}

/// Outcome of asking whether a provider may be called.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Admission {
    Allowed,
    Open,
    Disabled,
}

pub struct CircuitBreaker {
    circuits: Mutex<HashMap<String, Circuit>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    fn lock_circuits(&self) -> MutexGuard<'_, HashMap<String, Circuit>> {
        self.circuits.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Check whether a provider may be called right now.
    ///
    /// Moves an open circuit to HalfOpen once the recovery timeout has elapsed.
    pub fn admit(&self, provider: &ProviderId) -> Admission {
        let mut circuits = self.lock_circuits();
        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::new);

        match circuit.state {
            CircuitState::Closed | CircuitState::HalfOpen => Admission::Allowed,
            CircuitState::Disabled => Admission::Disabled,
            CircuitState::Open => {
                let recovered = circuit
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.recovery_timeout)
                    .unwrap_or(true);
                if recovered {
                    info!("Circuit breaker: '{}' Open -> HalfOpen", provider);
                    circuit.state = CircuitState::HalfOpen;
                    circuit.half_open_successes = 0;
                    Admission::Allowed
                } else {
                    Admission::Open
                }
            }
        }
    }

    pub fn is_allowed(&self, provider: &ProviderId) -> bool {
        self.admit(provider) == Admission::Allowed
    }

    pub fn record_success(&self, provider: &ProviderId) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::new);

        match circuit.state {
            CircuitState::Closed => circuit.failure_count = 0,
            CircuitState::HalfOpen => {
                circuit.half_open_successes += 1;
                if circuit.half_open_successes >= self.config.half_open_success_threshold {
                    info!("Circuit breaker: closing circuit for '{}'", provider);
                    circuit.close();
                }
            }
            CircuitState::Open | CircuitState::Disabled => {
                debug!(
                    "Circuit breaker: ignoring success for '{}' in {} state",
                    provider, circuit.state
                );
            }
        }
    }

    pub fn record_failure(&self, provider: &ProviderId) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::new);

        match circuit.state {
            CircuitState::Closed => {
                circuit.failure_count += 1;
                if circuit.failure_count >= self.config.failure_threshold {
                    info!(
                        "Circuit breaker: opening circuit for '{}' after {} failures",
                        provider, circuit.failure_count
                    );
                    circuit.state = CircuitState::Open;
                    circuit.opened_at = Some(Instant::now());
                } else {
                    debug!(
                        "Circuit breaker: failure for '{}' ({}/{})",
                        provider, circuit.failure_count, self.config.failure_threshold
                    );
                }
            }
            CircuitState::HalfOpen => {
                info!(
                    "Circuit breaker: trial call failed for '{}', reopening",
                    provider
                );
                circuit.failure_count += 1;
                circuit.state = CircuitState::Open;
                circuit.half_open_successes = 0;
                circuit.opened_at = Some(Instant::now());
            }
            CircuitState::Open => {
                circuit.failure_count += 1;
                circuit.opened_at = Some(Instant::now());
            }
            CircuitState::Disabled => {}
        }
    }

    /// Take a provider out of rotation for the rest of the process.
    pub fn disable(&self, provider: &ProviderId) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::new);
        if circuit.state != CircuitState::Disabled {
            warn!("Circuit breaker: disabling '{}'", provider);
            circuit.state = CircuitState::Disabled;
        }
    }

    pub fn state(&self, provider: &ProviderId) -> CircuitState {
        self.lock_circuits()
            .get(provider.as_ref())
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    pub fn failure_count(&self, provider: &ProviderId) -> u32 {
        self.lock_circuits()
            .get(provider.as_ref())
            .map(|c| c.failure_count)
            .unwrap_or(0)
    }

    /// Return a provider to Closed, including a disabled one.
    pub fn reset(&self, provider: &ProviderId) {
        if let Some(circuit) = self.lock_circuits().get_mut(provider.as_ref()) {
            info!("Circuit breaker: resetting '{}'", provider);
            circuit.close();
        }
    }

    pub fn metrics(&self) -> Vec<CircuitMetrics> {
        let mut metrics: Vec<_> = self
            .lock_circuits()
            .iter()
            .map(|(provider, circuit)| CircuitMetrics {
                provider: provider.clone(),
                state: circuit.state,
                failure_count: circuit.failure_count,
            })
            .collect();
        metrics.sort_by(|a, b| a.provider.cmp(&b.provider));
        metrics
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CircuitMetrics {
    pub provider: String,
    pub state: CircuitState,
    pub failure_count: u32,
}
