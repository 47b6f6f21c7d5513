//! Per-provider attempt tracking for fetch diagnostics.

use crate::models::ProviderId;

/// Why a provider was passed over without being called.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Circuit breaker is open for this provider.
    CircuitBreakerOpen,

    /// Provider was disabled after rejecting our credentials.
    Disabled,

    /// Daily call budget is spent.
    BudgetExhausted,

    /// Per-minute window is full and the fetch policy does not wait.
    RateLimited,

    /// Provider can't serve this interval.
    IntervalNotSupported,
}

/// Record of a single provider attempt during a fetch.
#[derive(Clone, Debug)]
pub struct ProviderAttempt {
    pub provider_id: ProviderId,
    pub skipped: Option<SkipReason>,
    pub error: Option<String>,
    pub success: bool,
}

impl ProviderAttempt {
    fn describe(&self) -> String {
        if self.success {
            format!("{}: SUCCESS", self.provider_id)
        } else if let Some(skip) = &self.skipped {
            format!("{}: SKIPPED ({:?})", self.provider_id, skip)
        } else if let Some(err) = &self.error {
            format!("{}: ERROR ({})", self.provider_id, err)
        } else {
            format!("{}: UNKNOWN", self.provider_id)
        }
    }
}

/// What happened at each provider while serving one request.
#[derive(Clone, Debug, Default)]
pub struct FetchDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn record_skip(&mut self, provider_id: ProviderId, reason: SkipReason) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            skipped: Some(reason),
            error: None,
            success: false,
        });
    }

    pub fn record_error(&mut self, provider_id: ProviderId, error: String) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            skipped: None,
            error: Some(error),
            success: false,
        });
    }

    pub fn record_success(&mut self, provider_id: ProviderId) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            skipped: None,
            error: None,
            success: true,
        });
    }

    /// One-line summary for logs, providers in the order they were tried.
    pub fn summary(&self) -> String {
        Self::summarize(&self.attempts)
    }

    pub fn summarize(attempts: &[ProviderAttempt]) -> String {
        attempts
            .iter()
            .map(ProviderAttempt::describe)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn has_success(&self) -> bool {
        self.attempts.iter().any(|a| a.success)
    }

    pub fn skip_reasons(&self) -> Vec<(&ProviderId, &SkipReason)> {
        self.attempts
            .iter()
            .filter_map(|a| a.skipped.as_ref().map(|s| (&a.provider_id, s)))
            .collect()
    }

    pub fn errors(&self) -> Vec<(&ProviderId, &str)> {
        self.attempts
            .iter()
            .filter_map(|a| a.error.as_ref().map(|e| (&a.provider_id, e.as_str())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    #[test]
    fn test_diagnostics_summary_keeps_order() {
        let mut diag = FetchDiagnostics::new();
        diag.record_skip(Cow::Borrowed("FMP"), SkipReason::BudgetExhausted);
        diag.record_error(Cow::Borrowed("TWELVE_DATA"), "Timeout".to_string());
        diag.record_success(Cow::Borrowed("YAHOO"));

        assert_eq!(
            diag.summary(),
            "FMP: SKIPPED (BudgetExhausted) -> TWELVE_DATA: ERROR (Timeout) -> YAHOO: SUCCESS"
        );
        assert!(diag.has_success());
    }

    #[test]
    fn test_skip_reasons_and_errors_are_separated() {
        let mut diag = FetchDiagnostics::new();
        diag.record_skip(Cow::Borrowed("A"), SkipReason::CircuitBreakerOpen);
        diag.record_skip(Cow::Borrowed("B"), SkipReason::IntervalNotSupported);
        diag.record_error(Cow::Borrowed("C"), "HTTP 500".to_string());

        assert_eq!(diag.skip_reasons().len(), 2);
        assert_eq!(diag.errors(), vec![(&Cow::Borrowed("C"), "HTTP 500")]);
        assert!(!diag.has_success());
    }
}
