// Trading strategy module
pub mod breakout;
pub mod crossover;
pub mod mean_reversion;
pub mod tracker;

pub use breakout::BreakoutStrategy;
pub use crossover::SmaCrossoverStrategy;
pub use mean_reversion::MeanReversionStrategy;
pub use tracker::{band_signal, step, track, trend_signal, PositionRow, PositionState};

use crate::config::{StrategyConfig, StrategyMode};
use crate::error::DataError;
use crate::models::{PriceSeries, Signal};

/// Base trait for all trading strategies
pub trait Strategy: Send + Sync {
    /// Generate a trading signal for the latest bar of `series`
    ///
    /// `live_price` is the freshest known price; callers without a
    /// separate quote pass the last close.
    fn generate_signal(&self, series: &PriceSeries, live_price: f64) -> Result<Signal, DataError>;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Bars needed before the strategy's indicators are defined
    fn min_bars_required(&self) -> usize;
}

/// Build the strategy selected by `config.mode`
pub fn build_strategy(config: &StrategyConfig) -> Box<dyn Strategy> {
    match config.mode {
        StrategyMode::Breakout => Box::new(BreakoutStrategy::new(config.clone())),
        StrategyMode::MeanReversion => Box::new(MeanReversionStrategy::new(config.clone())),
        StrategyMode::SmaCrossover => Box::new(SmaCrossoverStrategy::new(config.clone())),
    }
}
