use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::PriceSeries;
use crate::strategy::PositionRow;

/// Per-bar realized return
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnRow {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    /// close[t] / close[t-1] - 1 when the previous bar was Long, else 0
    pub period_return: f64,
    /// Running product of (1 + period_return)
    pub cumulative_return: f64,
}

/// Close-to-close returns earned by holding the previous bar's position
///
/// `positions` must be aligned with the series bars.
pub fn compute_returns(series: &PriceSeries, positions: &[PositionRow]) -> Vec<ReturnRow> {
    let bars = series.bars();
    let mut cumulative = 1.0;

    bars.iter()
        .zip(positions)
        .enumerate()
        .map(|(i, (bar, _))| {
            let period_return = if i > 0 && positions[i - 1].state.is_long() {
                bar.close / bars[i - 1].close - 1.0
            } else {
                0.0
            };
            cumulative *= 1.0 + period_return;

            ReturnRow {
                index: i,
                timestamp: bar.timestamp,
                period_return,
                cumulative_return: cumulative,
            }
        })
        .collect()
}
