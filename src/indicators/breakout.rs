// All-time-high breakout indicators: expanding max of highs and the lagged entry flag

use crate::models::Bar;

/// Expanding maximum of `high` up to and including each bar
pub fn running_max(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .scan(f64::NEG_INFINITY, |max, bar| {
            *max = max.max(bar.high);
            Some(*max)
        })
        .collect()
}

/// Whether the running max changed versus the previous bar
///
/// The first bar has nothing to compare against and counts as a new high.
pub fn new_highs(running_max: &[f64]) -> Vec<bool> {
    running_max
        .iter()
        .enumerate()
        .map(|(i, &max)| i == 0 || max != running_max[i - 1])
        .collect()
}

/// Entry flag lagged by one bar: a new high on bar t-1 signals an entry on bar t
pub fn lagged_entry_signals(new_highs: &[bool]) -> Vec<bool> {
    (0..new_highs.len())
        .map(|i| i > 0 && new_highs[i - 1])
        .collect()
}
