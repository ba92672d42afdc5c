/// Average True Range (ATR) indicator
///
/// Measures market volatility by averaging true ranges over a trailing window.
/// True Range is the greatest of:
/// - Current High - Current Low
/// - Abs(Current High - Previous Close)
/// - Abs(Current Low - Previous Close)
///
/// The first bar has no previous close, so its true range is just High - Low.
/// The average is a simple trailing mean (not Wilder's smoothing).

use crate::indicators::moving_average::rolling_mean;
use crate::models::Bar;

/// True range for every bar, aligned with the input
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let range = bar.high - bar.low;
            match i.checked_sub(1).map(|prev| bars[prev].close) {
                Some(prev_close) => range
                    .max((bar.high - prev_close).abs())
                    .max((bar.low - prev_close).abs()),
                None => range,
            }
        })
        .collect()
}

/// ATR series aligned with the input
///
/// Entries before index `period - 1` are `None`.
pub fn average_true_range(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    rolling_mean(&true_range(bars), period)
}

/// Latest ATR value, or None if insufficient data
pub fn calculate_atr(bars: &[Bar], period: usize) -> Option<f64> {
    average_true_range(bars, period).last().copied().flatten()
}
