// Single-slot position tracker
//
// The state is a plain value folded forward bar by bar. Bar 0 is always
// Flat. Entry and exit are evaluated in one if/else: a bar that opens a
// position never closes it, even when its high already reaches the target.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{StrategyConfig, StrategyMode};
use crate::indicators::IndicatorRow;
use crate::models::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PositionState {
    Flat,
    Long {
        entry_price: f64,
        /// Only set in breakout mode
        profit_target: Option<f64>,
    },
}

impl PositionState {
    pub fn is_long(&self) -> bool {
        matches!(self, PositionState::Long { .. })
    }

    /// 1 when Long, 0 when Flat
    pub fn position(&self) -> u8 {
        u8::from(self.is_long())
    }

    pub fn entry_price(&self) -> Option<f64> {
        match self {
            PositionState::Long { entry_price, .. } => Some(*entry_price),
            PositionState::Flat => None,
        }
    }

    pub fn profit_target(&self) -> Option<f64> {
        match self {
            PositionState::Long { profit_target, .. } => *profit_target,
            PositionState::Flat => None,
        }
    }
}

/// Position as of the close of one bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionRow {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub state: PositionState,
}

impl PositionRow {
    pub fn position(&self) -> u8 {
        self.state.position()
    }
}

/// Band rule shared by the backtest and the live check
///
/// Undefined bands never trigger.
pub fn band_signal(row: &IndicatorRow, price: f64) -> Signal {
    match (row.band.upper, row.band.lower) {
        (Some(upper), _) if price > upper => Signal::Sell,
        (_, Some(lower)) if price < lower => Signal::Buy,
        _ => Signal::Hold,
    }
}

/// Trend rule shared by the backtest and the live check
pub fn trend_signal(row: &IndicatorRow, price: f64) -> Signal {
    match (row.short_ma, row.long_ma) {
        (Some(short), Some(long)) if short > long && price > short => Signal::Buy,
        (Some(short), Some(long)) if short < long && price < short => Signal::Sell,
        _ => Signal::Hold,
    }
}

/// Transition function for one bar
pub fn step(state: PositionState, row: &IndicatorRow, config: &StrategyConfig) -> PositionState {
    match state {
        PositionState::Flat => enter(row, config).unwrap_or(PositionState::Flat),
        PositionState::Long { profit_target, .. } => {
            if should_exit(row, profit_target, config) {
                PositionState::Flat
            } else {
                state
            }
        }
    }
}

fn enter(row: &IndicatorRow, config: &StrategyConfig) -> Option<PositionState> {
    let bar = &row.bar;
    match config.mode {
        StrategyMode::Breakout => {
            if !row.entry_signal {
                return None;
            }
            // No ATR yet means no target: don't trade on an undefined value
            let atr = row.average_true_range?;
            Some(PositionState::Long {
                entry_price: bar.open,
                profit_target: Some(bar.open + config.atr_multiple * atr),
            })
        }
        StrategyMode::MeanReversion => (band_signal(row, bar.close) == Signal::Buy).then_some(
            PositionState::Long {
                entry_price: bar.close,
                profit_target: None,
            },
        ),
        StrategyMode::SmaCrossover => (trend_signal(row, bar.close) == Signal::Buy).then_some(
            PositionState::Long {
                entry_price: bar.close,
                profit_target: None,
            },
        ),
    }
}

fn should_exit(row: &IndicatorRow, profit_target: Option<f64>, config: &StrategyConfig) -> bool {
    match config.mode {
        StrategyMode::Breakout => profit_target.is_some_and(|target| row.bar.high >= target),
        StrategyMode::MeanReversion => band_signal(row, row.bar.close) == Signal::Sell,
        StrategyMode::SmaCrossover => trend_signal(row, row.bar.close) == Signal::Sell,
    }
}

/// Walk the indicator rows in order and record the position after every bar
pub fn track(rows: &[IndicatorRow], config: &StrategyConfig) -> Vec<PositionRow> {
    rows.iter()
        .enumerate()
        .scan(PositionState::Flat, |state, (index, row)| {
            if index > 0 {
                let next = step(*state, row, config);
                if next.is_long() != state.is_long() {
                    tracing::debug!(
                        "Bar {} ({}): {:?} -> {:?}",
                        index,
                        row.bar.timestamp,
                        state,
                        next
                    );
                }
                *state = next;
            }
            Some(PositionRow {
                index,
                timestamp: row.bar.timestamp,
                state: *state,
            })
        })
        .collect()
}
