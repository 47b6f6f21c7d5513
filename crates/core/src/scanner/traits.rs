use async_trait::async_trait;

use breakout_market_data::{BudgetPolicy, Candle, CascadingFetcher, Interval, MarketDataError};

/// Where a scan gets its candles and budget from.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn candles(&self, symbol: &str, interval: Interval)
        -> Result<Vec<Candle>, MarketDataError>;

    /// Calls left today under `policy`.
    fn remaining_budget(&self, policy: &BudgetPolicy) -> u32;
}

#[async_trait]
impl CandleSource for CascadingFetcher {
    async fn candles(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<Vec<Candle>, MarketDataError> {
        self.fetch(symbol, interval).await
    }

    fn remaining_budget(&self, policy: &BudgetPolicy) -> u32 {
        policy.remaining_budget(self.usage())
    }
}
