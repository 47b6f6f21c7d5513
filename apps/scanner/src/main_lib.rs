use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use breakout_core::notify::{notifier_from_credentials, Notifier};
use breakout_core::scanner::TierScanner;
use breakout_core::signals::WyckoffBreakoutDetector;
use breakout_core::universe::Tier;
use breakout_market_data::{
    AlphaVantageProvider, BudgetPolicy, CacheStore, CascadingFetcher, Clock, FmpProvider,
    JsonFileBackend, MarketDataProvider, SymbolPrioritizer, SystemClock, TwelveDataProvider,
    UsageTracker, YahooProvider,
};

use crate::config::Config;

pub struct AppState {
    pub tiers: Vec<Tier>,
    pub fetcher: Arc<CascadingFetcher>,
    pub scanner: Arc<TierScanner>,
}

/// Install the global subscriber. `log` records from the library crates
/// are forwarded into it.
pub fn init_tracing() {
    let log_format = std::env::var("BS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Providers in registration order. The fetcher re-sorts them by rank.
fn build_providers(config: &Config) -> Vec<Arc<dyn MarketDataProvider>> {
    let mut providers: Vec<Arc<dyn MarketDataProvider>> = Vec::new();
    if let Some(key) = &config.fmp_api_key {
        providers.push(Arc::new(FmpProvider::new(key.clone())));
    }
    if let Some(key) = &config.twelve_data_api_key {
        providers.push(Arc::new(TwelveDataProvider::new(key.clone())));
    }
    if let Some(key) = &config.alpha_vantage_api_key {
        providers.push(Arc::new(AlphaVantageProvider::new(key.clone())));
    }
    match YahooProvider::new() {
        Ok(yahoo) => providers.push(Arc::new(yahoo)),
        Err(e) => warn!("Yahoo fallback unavailable: {}", e),
    }
    providers
}

fn build_notifier(config: &Config) -> anyhow::Result<Arc<dyn Notifier>> {
    Ok(notifier_from_credentials(
        config.telegram_bot_token.as_deref(),
        config.telegram_chat_id.as_deref(),
    )?)
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    std::fs::create_dir_all(&config.data_dir)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let cache = Arc::new(CacheStore::open(
        Arc::new(JsonFileBackend::new(config.cache_path())),
        clock.clone(),
    ));
    let usage = Arc::new(UsageTracker::open(
        Arc::new(JsonFileBackend::new(config.usage_path())),
        clock,
        config.reset_tz,
        config.usage_recovery,
    ));

    let fetcher = Arc::new(CascadingFetcher::new(
        build_providers(config),
        cache,
        usage,
        config.fetch_policy(),
    ));
    info!("Provider fallback order: {:?}", fetcher.provider_order());

    let mut prioritizer = SymbolPrioritizer::default();
    prioritizer.extend(config.rankings.clone());
    let budget = BudgetPolicy::new(config.budget_scope.clone(), config.tiers.len() as u32);

    let scanner = Arc::new(TierScanner::new(
        fetcher.clone(),
        Arc::new(WyckoffBreakoutDetector::new()),
        build_notifier(config)?,
        prioritizer,
        budget,
    ));

    Ok(Arc::new(AppState {
        tiers: config.tiers.clone(),
        fetcher,
        scanner,
    }))
}

/// Log today's usage per provider.
pub fn log_usage(state: &AppState) {
    for record in state.fetcher.usage().snapshot() {
        match record.limit {
            Some(limit) => info!(
                "Usage {}: {}/{} calls ({:.1}%), {} remaining",
                record.provider,
                record.count,
                limit,
                record.usage_pct(),
                record.remaining()
            ),
            None => info!("Usage {}: {} calls (unmetered)", record.provider, record.count),
        }
    }

    let mut quotas: Vec<_> = state.fetcher.quotas().into_iter().collect();
    quotas.sort_by_key(|(_, quota)| quota.priority_rank);
    for (provider, quota) in quotas {
        info!(
            "Quota {}: rank {}, daily {:?}, per minute {:?}",
            provider, quota.priority_rank, quota.daily_limit, quota.per_minute_limit
        );
    }

    for metrics in state.fetcher.circuit_metrics() {
        info!(
            "Circuit {}: {} ({} consecutive failures)",
            metrics.provider, metrics.state, metrics.failure_count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(dir: &std::path::Path, vars: &[(&str, &str)]) -> Config {
        let mut vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        vars.insert("BS_DATA_DIR".to_string(), dir.to_string_lossy().to_string());
        Config::from_lookup(move |name| vars.get(name).cloned()).unwrap()
    }

    #[test]
    fn test_build_state_registers_keyed_providers_by_rank() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(
            dir.path(),
            &[("TWELVE_DATA_API_KEY", "t"), ("FMP_API_KEY", "f")],
        );

        let state = build_state(&config).unwrap();
        let order = state.fetcher.provider_order();

        assert_eq!(&order[..2], &["FMP", "TWELVE_DATA"]);
        assert!(!order.contains(&"ALPHA_VANTAGE"));
        assert_eq!(state.tiers.len(), 3);
        assert_eq!(state.scanner.budget_policy().active_tiers, 3);

        let quotas = state.fetcher.quotas();
        assert_eq!(quotas["FMP"].daily_limit, Some(250));
        assert_eq!(quotas["TWELVE_DATA"].per_minute_limit, Some(5));
        assert!(state.fetcher.circuit_metrics().is_empty());
        log_usage(&state);
    }

    #[test]
    fn test_half_configured_telegram_falls_back_to_log() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(
            dir.path(),
            &[("FMP_API_KEY", "f"), ("TELEGRAM_BOT_TOKEN", "token")],
        );

        let notifier = build_notifier(&config).unwrap();
        assert_eq!(notifier.name(), "log");
    }
}
