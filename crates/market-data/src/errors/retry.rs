/// Classification for retry policy.
///
/// Used by the cascading fetcher to decide what to do after a provider
/// call fails.
///
/// # Behavior Summary
///
/// | Class | Retry same provider? | Try next provider? | Circuit breaker |
/// |-------|----------------------|--------------------|-----------------|
/// | `Never` | No | No | - |
/// | `RetryThenFailover` | Yes, bounded by policy | Yes | Failure recorded |
/// | `FailoverWithPenalty` | No | Yes | Failure recorded |
/// | `NextProvider` | No | Yes | - |
/// | `DisableProvider` | No | Yes | Disabled for the process lifetime |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Local failure (persisted state, configuration). The fetch stops and
    /// returns this error; no other provider is tried.
    Never,

    /// Network hiccup or timeout. The same provider gets a bounded number
    /// of retries before the fetcher moves on.
    RetryThenFailover,

    /// Provider-side throttling. Move on immediately and count it against
    /// the provider's circuit breaker.
    FailoverWithPenalty,

    /// This provider can't serve the request (unknown symbol, bad payload,
    /// local budget spent) but another one might.
    NextProvider,

    /// Credentials were rejected. The provider is skipped for the rest of
    /// the process.
    DisableProvider,
}
