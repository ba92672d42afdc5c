// Technical indicators module
// Implements SMA/EMA, Bollinger bands, ATR and all-time-high breakout flags

pub mod atr;
pub mod bands;
pub mod breakout;
pub mod moving_average;

pub use atr::{average_true_range, calculate_atr, true_range};
pub use bands::{bollinger_bands, Band};
pub use breakout::{lagged_entry_signals, new_highs, running_max};
pub use moving_average::{calculate_ema, calculate_sma, rolling_mean, rolling_std};

use crate::config::{StrategyConfig, StrategyMode};
use crate::models::{Bar, PriceSeries};

/// A bar annotated with the indicators of the active mode
///
/// Fields that belong to another mode stay `None`/`false`. `None` means the
/// value is undefined (not enough history) and never satisfies a condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorRow {
    pub bar: Bar,
    pub band: Band,
    pub average_true_range: Option<f64>,
    pub running_max: Option<f64>,
    pub is_new_high: bool,
    pub entry_signal: bool,
    pub short_ma: Option<f64>,
    pub long_ma: Option<f64>,
}

impl IndicatorRow {
    fn bare(bar: Bar) -> Self {
        Self {
            bar,
            band: Band::default(),
            average_true_range: None,
            running_max: None,
            is_new_high: false,
            entry_signal: false,
            short_ma: None,
            long_ma: None,
        }
    }
}

/// Annotate every bar of `series`; the output is aligned index-for-index
pub fn compute(series: &PriceSeries, config: &StrategyConfig) -> Vec<IndicatorRow> {
    let bars = series.bars();
    let mut rows: Vec<IndicatorRow> = bars.iter().copied().map(IndicatorRow::bare).collect();

    match config.mode {
        StrategyMode::Breakout => {
            let atr = average_true_range(bars, config.atr_period);
            let max = running_max(bars);
            let highs = new_highs(&max);
            let entries = lagged_entry_signals(&highs);

            for (i, row) in rows.iter_mut().enumerate() {
                row.average_true_range = atr[i];
                row.running_max = Some(max[i]);
                row.is_new_high = highs[i];
                row.entry_signal = entries[i];
            }
        }
        StrategyMode::MeanReversion => {
            let bands = bollinger_bands(&series.closes(), config.band_window, config.band_width);
            for (row, band) in rows.iter_mut().zip(bands) {
                row.band = band;
            }
        }
        StrategyMode::SmaCrossover => {
            let closes = series.closes();
            let short = rolling_mean(&closes, config.short_window);
            let long = rolling_mean(&closes, config.long_window);
            for (i, row) in rows.iter_mut().enumerate() {
                row.short_ma = short[i];
                row.long_ma = long[i];
            }
        }
    }

    tracing::debug!(
        "Computed {:?} indicators for {} bars of {}",
        config.mode,
        rows.len(),
        series.symbol()
    );

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: DateTime::<Utc>::UNIX_EPOCH + Duration::hours(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn test_compute_is_aligned() {
        let series = series_from_closes(&[100.0, 101.0, 102.0, 103.0]);
        for mode in [
            StrategyMode::Breakout,
            StrategyMode::MeanReversion,
            StrategyMode::SmaCrossover,
        ] {
            let config = StrategyConfig {
                mode,
                ..StrategyConfig::default()
            };
            let rows = compute(&series, &config);
            assert_eq!(rows.len(), series.len());
            assert_eq!(rows[3].bar, series.bars()[3]);
        }
    }

    #[test]
    fn test_mean_reversion_only_fills_bands() {
        let series = series_from_closes(&[100.0; 25]);
        let config = StrategyConfig {
            mode: StrategyMode::MeanReversion,
            band_window: 20,
            ..StrategyConfig::default()
        };
        let rows = compute(&series, &config);

        assert_eq!(rows[18].band.lower, None);
        assert_eq!(rows[19].band.lower, Some(100.0));
        assert!(rows.iter().all(|r| r.average_true_range.is_none() && !r.entry_signal));
    }

    #[test]
    fn test_breakout_fields() {
        let series = series_from_closes(&[100.0, 101.0, 102.0]);
        let config = StrategyConfig {
            mode: StrategyMode::Breakout,
            atr_period: 2,
            ..StrategyConfig::default()
        };
        let rows = compute(&series, &config);

        assert_eq!(rows[0].average_true_range, None);
        assert_eq!(rows[1].average_true_range, Some(2.0));
        assert_eq!(rows[2].running_max, Some(103.0));
        assert!(rows[2].entry_signal);
    }

    #[test]
    fn test_short_series_leaves_indicators_undefined() {
        let series = series_from_closes(&[100.0; 5]);
        let rows = compute(&series, &StrategyConfig::default());
        assert!(rows.iter().all(|r| r.average_true_range.is_none()));
    }
}
