//! Symbol selection under a daily call budget.
//!
//! A scan cycle may only spend its share of the remaining budget, so each
//! tier scans a prefix of its symbols ordered by liquidity. Every selected
//! symbol is assumed to cost one provider call (a full cache miss).

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::ProviderId;
use crate::usage::UsageTracker;

/// Score given to symbols without an explicit ranking.
pub const DEFAULT_SCORE: u8 = 50;

const DEFAULT_RANKINGS: &[(&str, u8)] = &[
    // Mega caps
    ("AAPL", 100),
    ("MSFT", 100),
    ("GOOGL", 100),
    ("AMZN", 100),
    ("NVDA", 100),
    ("META", 100),
    ("TSLA", 100),
    // Index ETFs
    ("SPY", 95),
    ("QQQ", 95),
    ("IWM", 90),
    ("DIA", 90),
    // High volume tech
    ("AMD", 85),
    ("INTC", 80),
    ("AVGO", 80),
    ("ORCL", 75),
    // Popular names
    ("NFLX", 80),
    ("COIN", 75),
    ("PLTR", 75),
    ("CRWD", 70),
];

/// Which usage counters feed the budget.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetScope {
    /// Sum of the remaining calls of every metered provider.
    #[default]
    Shared,
    /// Remaining calls of a single provider.
    Provider(ProviderId),
}

/// How the remaining daily budget is split between scan cycles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetPolicy {
    pub scope: BudgetScope,
    /// Number of tiers drawing on the same budget. Treated as at least 1.
    pub active_tiers: u32,
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self {
            scope: BudgetScope::Shared,
            active_tiers: 3,
        }
    }
}

impl BudgetPolicy {
    pub fn new(scope: BudgetScope, active_tiers: u32) -> Self {
        Self {
            scope,
            active_tiers,
        }
    }

    /// Calls left today for this policy's scope.
    ///
    /// `Shared` counts every metered provider, so a keyed Alpha Vantage adds
    /// its calls too. With no metered provider registered the budget is
    /// unbounded.
    pub fn remaining_budget(&self, usage: &UsageTracker) -> u32 {
        match &self.scope {
            BudgetScope::Shared => {
                let metered = usage.metered_providers();
                if metered.is_empty() {
                    return u32::MAX;
                }
                metered
                    .into_iter()
                    .map(|provider| usage.remaining(&ProviderId::Owned(provider)))
                    .fold(0u32, u32::saturating_add)
            }
            BudgetScope::Provider(id) => usage.remaining(id),
        }
    }
}

/// Static liquidity ranking of symbols.
#[derive(Clone, Debug)]
pub struct SymbolPrioritizer {
    rankings: HashMap<String, u8>,
}

impl Default for SymbolPrioritizer {
    fn default() -> Self {
        Self::with_rankings(
            DEFAULT_RANKINGS
                .iter()
                .map(|(symbol, score)| (symbol.to_string(), *score)),
        )
    }
}

impl SymbolPrioritizer {
    pub fn with_rankings(rankings: impl IntoIterator<Item = (String, u8)>) -> Self {
        Self {
            rankings: rankings
                .into_iter()
                .map(|(symbol, score)| (symbol.to_ascii_uppercase(), score))
                .collect(),
        }
    }

    /// Add or replace rankings, e.g. from configuration.
    pub fn extend(&mut self, rankings: impl IntoIterator<Item = (String, u8)>) {
        self.rankings.extend(
            rankings
                .into_iter()
                .map(|(symbol, score)| (symbol.to_ascii_uppercase(), score)),
        );
    }

    pub fn score(&self, symbol: &str) -> u8 {
        self.rankings
            .get(&symbol.to_ascii_uppercase())
            .copied()
            .unwrap_or(DEFAULT_SCORE)
    }

    /// All symbols, highest score first. Equal scores keep their input order.
    pub fn order(&self, symbols: &[String]) -> Vec<String> {
        let mut ordered = symbols.to_vec();
        ordered.sort_by_key(|symbol| std::cmp::Reverse(self.score(symbol)));
        ordered
    }

    /// The prefix of the ordered tier list this cycle can afford.
    ///
    /// A cycle may spend at most `remaining_budget / active_tiers` calls;
    /// a zero budget selects nothing.
    pub fn select_symbols(
        &self,
        symbols: &[String],
        remaining_budget: u32,
        active_tiers: u32,
    ) -> Vec<String> {
        let per_cycle = (remaining_budget / active_tiers.max(1)) as usize;
        let mut ordered = self.order(symbols);
        ordered.truncate(per_cycle);
        debug!(
            "Prioritizer: selected {}/{} symbols (budget {}, {} tiers)",
            ordered.len(),
            symbols.len(),
            remaining_budget,
            active_tiers
        );
        ordered
    }

    /// [`select_symbols`](Self::select_symbols) with the budget read from
    /// `usage` according to `policy`.
    pub fn select_with_policy(
        &self,
        symbols: &[String],
        policy: &BudgetPolicy,
        usage: &UsageTracker,
    ) -> Vec<String> {
        let budget = policy.remaining_budget(usage);
        self.select_symbols(symbols, budget, policy.active_tiers)
    }
}
