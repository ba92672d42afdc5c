use crate::config::{StrategyConfig, StrategyMode};
use crate::error::DataError;
use crate::indicators::compute;
use crate::models::{PriceSeries, Signal};
use crate::strategy::tracker::trend_signal;
use crate::strategy::Strategy;

/// Short/long SMA trend filter
///
/// Buy when short SMA > long SMA and price is above the short SMA.
/// Sell when short SMA < long SMA and price is below the short SMA.
/// Stateless like the mean reversion check.
#[derive(Debug, Clone)]
pub struct SmaCrossoverStrategy {
    config: StrategyConfig,
}

impl SmaCrossoverStrategy {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            config: StrategyConfig {
                mode: StrategyMode::SmaCrossover,
                ..config
            },
        }
    }
}

impl Default for SmaCrossoverStrategy {
    fn default() -> Self {
        Self::new(StrategyConfig::default())
    }
}

impl Strategy for SmaCrossoverStrategy {
    fn generate_signal(&self, series: &PriceSeries, live_price: f64) -> Result<Signal, DataError> {
        let rows = compute(series, &self.config);
        let last = rows
            .last()
            .ok_or(DataError::InsufficientData { needed: 1, got: 0 })?;

        let signal = trend_signal(last, live_price);

        tracing::debug!(
            "SMA Crossover Check: price={:.4} short={:?} long={:?} -> {:?}",
            live_price,
            last.short_ma,
            last.long_ma,
            signal
        );

        Ok(signal)
    }

    fn name(&self) -> &str {
        "SMA Crossover"
    }

    fn min_bars_required(&self) -> usize {
        self.config.long_window
    }
}
