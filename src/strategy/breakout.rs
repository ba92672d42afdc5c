use crate::config::{StrategyConfig, StrategyMode};
use crate::error::DataError;
use crate::indicators::compute;
use crate::models::{PriceSeries, Signal};
use crate::strategy::tracker::track;
use crate::strategy::Strategy;

/// All-time-high breakout with an ATR profit target
///
/// Entry: the bar after a new running high, filled at the open.
/// Exit: the bar's high reaches entry + atr_multiple x ATR. There is no
/// stop loss and no time exit.
///
/// Live, the whole history is replayed through the tracker and only the
/// last two positions matter: 0 -> 1 is a buy, 1 -> 0 is a sell.
#[derive(Debug, Clone)]
pub struct BreakoutStrategy {
    config: StrategyConfig,
}

impl BreakoutStrategy {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            config: StrategyConfig {
                mode: StrategyMode::Breakout,
                ..config
            },
        }
    }
}

impl Default for BreakoutStrategy {
    fn default() -> Self {
        Self::new(StrategyConfig::default())
    }
}

impl Strategy for BreakoutStrategy {
    fn generate_signal(&self, series: &PriceSeries, _live_price: f64) -> Result<Signal, DataError> {
        if series.is_empty() {
            return Err(DataError::InsufficientData { needed: 1, got: 0 });
        }

        let positions = track(&compute(series, &self.config), &self.config);
        let signal = match positions.as_slice() {
            [.., previous, current] => match (previous.position(), current.position()) {
                (0, 1) => Signal::Buy,
                (1, 0) => Signal::Sell,
                _ => Signal::Hold,
            },
            _ => Signal::Hold,
        };

        if let Some(last) = positions.last() {
            tracing::debug!(
                "Breakout check: position={} entry={:?} target={:?} -> {:?}",
                last.position(),
                last.state.entry_price(),
                last.state.profit_target(),
                signal
            );
        }

        Ok(signal)
    }

    fn name(&self) -> &str {
        "Breakout"
    }

    fn min_bars_required(&self) -> usize {
        self.config.atr_period + 1
    }
}
