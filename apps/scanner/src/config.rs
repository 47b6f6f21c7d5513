//! Process configuration from the environment and an optional tiers file.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use chrono_tz::Tz;
use serde::Deserialize;

use breakout_core::universe::{default_tiers, validate_tiers, Tier};
use breakout_market_data::{
    BudgetScope, FetchPolicy, Interval, ProviderQuota, UsageRecovery,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub fmp_api_key: Option<String>,
    pub twelve_data_api_key: Option<String>,
    pub alpha_vantage_api_key: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    /// Holds `cache.json` and `usage.json`.
    pub data_dir: PathBuf,
    pub budget_scope: BudgetScope,
    pub usage_recovery: UsageRecovery,
    /// Time zone whose midnight resets the daily counters.
    pub reset_tz: Tz,
    pub tiers: Vec<Tier>,
    pub ttl_overrides: HashMap<Interval, Duration>,
    pub quota_overrides: HashMap<String, ProviderQuota>,
    pub rankings: HashMap<String, u8>,
}

/// Shape of `BS_TIERS_FILE`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TiersFile {
    #[serde(default)]
    tiers: Vec<Tier>,
    /// Interval name ("1min", "5min", ...) to seconds.
    #[serde(default)]
    ttl_overrides: HashMap<String, u64>,
    /// Provider id to quota.
    #[serde(default)]
    quota_overrides: HashMap<String, ProviderQuota>,
    #[serde(default)]
    rankings: HashMap<String, u8>,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let fmp_api_key = var("FMP_API_KEY");
        let twelve_data_api_key = var("TWELVE_DATA_API_KEY");
        if fmp_api_key.is_none() && twelve_data_api_key.is_none() {
            bail!("FMP_API_KEY or TWELVE_DATA_API_KEY must be set");
        }

        let budget_scope = match var("BS_BUDGET_SCOPE") {
            None => BudgetScope::Shared,
            Some(scope) if scope.eq_ignore_ascii_case("shared") => BudgetScope::Shared,
            Some(provider) => BudgetScope::Provider(provider.to_ascii_uppercase().into()),
        };

        let usage_recovery = match var("BS_USAGE_RECOVERY").as_deref() {
            None | Some("fail-open") => UsageRecovery::FailOpen,
            Some("fail-closed") => UsageRecovery::FailClosed,
            Some(other) => bail!(
                "BS_USAGE_RECOVERY must be 'fail-open' or 'fail-closed', got '{}'",
                other
            ),
        };

        let reset_tz = match var("BS_RESET_TZ") {
            None => Tz::UTC,
            Some(name) => Tz::from_str(&name)
                .map_err(|e| anyhow!("BS_RESET_TZ '{}' is not a time zone: {}", name, e))?,
        };

        let file = match var("BS_TIERS_FILE") {
            Some(path) => read_tiers_file(Path::new(&path))?,
            None => TiersFile::default(),
        };

        let tiers = if file.tiers.is_empty() {
            default_tiers()
        } else {
            file.tiers
        };
        validate_tiers(&tiers)?;

        let ttl_overrides = file
            .ttl_overrides
            .into_iter()
            .map(|(name, secs)| {
                let interval = Interval::from_str(&name)
                    .with_context(|| format!("ttlOverrides key '{}'", name))?;
                Ok((interval, Duration::from_secs(secs)))
            })
            .collect::<anyhow::Result<HashMap<_, _>>>()?;

        let quota_overrides = file
            .quota_overrides
            .into_iter()
            .map(|(provider, quota)| (provider.to_ascii_uppercase(), quota))
            .collect();

        Ok(Self {
            fmp_api_key,
            twelve_data_api_key,
            alpha_vantage_api_key: var("ALPHA_VANTAGE_API_KEY"),
            telegram_bot_token: var("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: var("TELEGRAM_CHAT_ID"),
            data_dir: PathBuf::from(var("BS_DATA_DIR").unwrap_or_else(|| "./data".to_string())),
            budget_scope,
            usage_recovery,
            reset_tz,
            tiers,
            ttl_overrides,
            quota_overrides,
            rankings: file.rankings,
        })
    }

    /// Fetch policy with this configuration's overrides applied.
    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            ttl_overrides: self.ttl_overrides.clone(),
            quota_overrides: self.quota_overrides.clone(),
            ..FetchPolicy::default()
        }
    }

    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join("cache.json")
    }

    pub fn usage_path(&self) -> PathBuf {
        self.data_dir.join("usage.json")
    }
}

fn read_tiers_file(path: &Path) -> anyhow::Result<TiersFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading tiers file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing tiers file {}", path.display()))
}
