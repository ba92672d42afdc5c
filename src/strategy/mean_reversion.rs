use crate::config::{StrategyConfig, StrategyMode};
use crate::error::DataError;
use crate::indicators::compute;
use crate::models::{PriceSeries, Signal};
use crate::strategy::tracker::band_signal;
use crate::strategy::Strategy;

/// Mean reversion trading strategy
///
/// Compares the live price with Bollinger-style bands of the last
/// `band_window` closes:
/// - price above the upper band: sell
/// - price below the lower band: buy
///
/// The live check is stateless. It has no memory of earlier orders, so
/// while price stays outside a band every cycle repeats the same signal.
#[derive(Debug, Clone)]
pub struct MeanReversionStrategy {
    config: StrategyConfig,
}

impl MeanReversionStrategy {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            config: StrategyConfig {
                mode: StrategyMode::MeanReversion,
                ..config
            },
        }
    }
}

impl Default for MeanReversionStrategy {
    fn default() -> Self {
        Self::new(StrategyConfig::default())
    }
}

impl Strategy for MeanReversionStrategy {
    fn generate_signal(&self, series: &PriceSeries, live_price: f64) -> Result<Signal, DataError> {
        let rows = compute(series, &self.config);
        let last = rows
            .last()
            .ok_or(DataError::InsufficientData { needed: 1, got: 0 })?;

        let signal = band_signal(last, live_price);

        tracing::debug!(
            "Mean Reversion Check: price={:.4} lower={:?} upper={:?} -> {:?}",
            live_price,
            last.band.lower,
            last.band.upper,
            signal
        );

        Ok(signal)
    }

    fn name(&self) -> &str {
        "Mean Reversion"
    }

    fn min_bars_required(&self) -> usize {
        self.config.band_window
    }
}
