use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backtest::returns::ReturnRow;
use crate::models::PriceSeries;
use crate::strategy::PositionRow;

/// Bars per year used for annualization
pub const BARS_PER_YEAR: f64 = 252.0;

/// One completed round trip
#[derive(Debug, Clone, Serialize)]
pub struct TradeRecord {
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    /// Fill recorded by the tracker (open in breakout mode, close otherwise)
    pub entry_price: f64,
    pub exit_price: f64,
    /// Compounded bar returns from entry to exit
    pub trade_return: f64,
    pub holding_bars: usize,
}

/// Complete backtest performance summary
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub annualized_return: f64,
    /// Worst decline from a running peak, as a non-positive fraction
    pub max_drawdown: f64,
    /// Completed round trips whose compounded return is positive, over `total_trades`
    ///
    /// A trade is judged by its whole holding period, not by the bar it exits on.
    pub win_rate: f64,
    /// Position changes halved; a series ending Long reports a half trade
    pub total_trades: f64,
    pub transitions: usize,
    pub winning_trades: usize,
    pub bars: usize,
    pub trades: Vec<TradeRecord>,
}

impl PerformanceSummary {
    /// Aggregate aligned positions and returns
    pub fn from_returns(
        series: &PriceSeries,
        positions: &[PositionRow],
        returns: &[ReturnRow],
    ) -> Self {
        let bars = returns.len();
        let total_return = returns.last().map_or(0.0, |r| r.cumulative_return - 1.0);

        let annualized_return = if bars > 0 {
            (1.0 + total_return).powf(BARS_PER_YEAR / bars as f64) - 1.0
        } else {
            0.0
        };

        let max_drawdown = Self::calculate_drawdown(returns);

        let transitions = positions
            .windows(2)
            .filter(|w| w[0].position() != w[1].position())
            .count();
        let total_trades = transitions as f64 / 2.0;

        let trades = Self::extract_trades(series, positions, returns);
        let winning_trades = trades.iter().filter(|t| t.trade_return > 0.0).count();

        let win_rate = if total_trades > 0.0 {
            winning_trades as f64 / total_trades
        } else {
            0.0
        };

        Self {
            total_return,
            annualized_return,
            max_drawdown,
            win_rate,
            total_trades,
            transitions,
            winning_trades,
            bars,
            trades,
        }
    }

    /// Maximum drawdown of the cumulative return curve
    fn calculate_drawdown(returns: &[ReturnRow]) -> f64 {
        let mut peak = f64::NEG_INFINITY;
        let mut max_dd = 0.0;

        for row in returns {
            peak = peak.max(row.cumulative_return);
            let drawdown = row.cumulative_return / peak - 1.0;
            if drawdown < max_dd {
                max_dd = drawdown;
            }
        }

        max_dd
    }

    /// Pair each entry with the next exit; an open position at the end is not a trade
    fn extract_trades(
        series: &PriceSeries,
        positions: &[PositionRow],
        returns: &[ReturnRow],
    ) -> Vec<TradeRecord> {
        let bars = series.bars();
        let mut trades = Vec::new();
        let mut open: Option<(usize, f64)> = None;

        for window in positions.windows(2) {
            let (prev, curr) = (&window[0], &window[1]);
            match (prev.position(), curr.position(), open) {
                (0, 1, _) => {
                    open = curr.state.entry_price().map(|price| (curr.index, price));
                }
                (1, 0, Some((entry_index, entry_price))) => {
                    let exit_index = curr.index;
                    trades.push(TradeRecord {
                        entry_index,
                        exit_index,
                        entry_time: bars[entry_index].timestamp,
                        exit_time: bars[exit_index].timestamp,
                        entry_price,
                        exit_price: bars[exit_index].close,
                        trade_return: returns[exit_index].cumulative_return
                            / returns[entry_index].cumulative_return
                            - 1.0,
                        holding_bars: exit_index - entry_index,
                    });
                    open = None;
                }
                _ => {}
            }
        }

        trades
    }

    /// Print a formatted report to stdout
    pub fn print_report(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              BACKTEST PERFORMANCE REPORT              ║");
        println!("╚═══════════════════════════════════════════════════════╝\n");

        println!("📊 RETURNS");
        println!("  Bars:                  {}", self.bars);
        println!("  Total Return:          {:+.2}%", self.total_return * 100.0);
        println!(
            "  Annualized Return:     {:+.2}%",
            self.annualized_return * 100.0
        );
        println!("  Maximum Drawdown:      {:.2}%", self.max_drawdown * 100.0);

        println!("\n📈 TRADE STATISTICS");
        println!("  Total Trades:          {:.1}", self.total_trades);
        println!(
            "  Winning Trades:        {} ({:.1}%)",
            self.winning_trades,
            self.win_rate * 100.0
        );

        if !self.trades.is_empty() {
            println!("\n💰 ROUND TRIPS");
            for trade in &self.trades {
                println!(
                    "  {} -> {}  {:>10.4} -> {:>10.4}  {:+.2}% ({} bars)",
                    trade.entry_time.format("%Y-%m-%d %H:%M"),
                    trade.exit_time.format("%Y-%m-%d %H:%M"),
                    trade.entry_price,
                    trade.exit_price,
                    trade.trade_return * 100.0,
                    trade.holding_bars
                );
            }
        }

        println!("\n═══════════════════════════════════════════════════════\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::returns::compute_returns;
    use crate::models::Bar;
    use crate::strategy::PositionState;
    use chrono::Duration;

    fn fixture(closes: &[f64], longs: &[u8]) -> (PriceSeries, Vec<PositionRow>) {
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: DateTime::<Utc>::UNIX_EPOCH + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
            })
            .collect();
        let positions = bars
            .iter()
            .zip(longs)
            .enumerate()
            .map(|(index, (bar, &long))| PositionRow {
                index,
                timestamp: bar.timestamp,
                state: if long == 1 {
                    PositionState::Long {
                        entry_price: bar.open,
                        profit_target: None,
                    }
                } else {
                    PositionState::Flat
                },
            })
            .collect();
        (PriceSeries::new("TEST", bars).unwrap(), positions)
    }

    fn summarize(closes: &[f64], longs: &[u8]) -> PerformanceSummary {
        let (series, positions) = fixture(closes, longs);
        let returns = compute_returns(&series, &positions);
        PerformanceSummary::from_returns(&series, &positions, &returns)
    }

    #[test]
    fn test_zero_trades() {
        let summary = summarize(&[100.0, 105.0, 95.0, 100.0], &[0, 0, 0, 0]);

        assert_eq!(summary.total_trades, 0.0);
        assert_eq!(summary.win_rate, 0.0);
        assert_eq!(summary.total_return, 0.0);
        assert_eq!(summary.max_drawdown, 0.0);
        assert!(summary.trades.is_empty());
    }

    #[test]
    fn test_empty_series() {
        let summary = summarize(&[], &[]);

        assert_eq!(summary.bars, 0);
        assert_eq!(summary.total_return, 0.0);
        assert_eq!(summary.annualized_return, 0.0);
        assert_eq!(summary.win_rate, 0.0);
    }

    #[test]
    fn test_winning_and_losing_trades() {
        // Win: entered at bar 1 (close 100), exited at bar 3 (close 120)
        // Loss: entered at bar 4 (close 120), exited at bar 6 (close 90)
        let summary = summarize(
            &[100.0, 100.0, 110.0, 120.0, 120.0, 100.0, 90.0],
            &[0, 1, 1, 0, 1, 1, 0],
        );

        assert_eq!(summary.transitions, 4);
        assert_eq!(summary.total_trades, 2.0);
        assert_eq!(summary.trades.len(), 2);
        assert_eq!(summary.winning_trades, 1);
        assert!((summary.win_rate - 0.5).abs() < 1e-12);

        assert!((summary.trades[0].trade_return - 0.2).abs() < 1e-12);
        assert!((summary.trades[1].trade_return - (-0.25)).abs() < 1e-12);
        assert!((summary.total_return - (1.2 * 0.75 - 1.0)).abs() < 1e-12);
        // Peak 1.2 after the first trade, trough 0.9
        assert!((summary.max_drawdown - (0.9 / 1.2 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_open_position_counts_half_trade() {
        let summary = summarize(&[100.0, 100.0, 110.0], &[0, 1, 1]);

        assert_eq!(summary.transitions, 1);
        assert_eq!(summary.total_trades, 0.5);
        assert!(summary.trades.is_empty());
        assert_eq!(summary.win_rate, 0.0);
        assert!((summary.total_return - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_annualized_return() {
        let closes: Vec<f64> = (0..126).map(|i| if i < 125 { 100.0 } else { 110.0 }).collect();
        let mut longs = vec![1u8; 126];
        longs[0] = 0;
        let summary = summarize(&closes, &longs);

        // 10% over half a year compounds to 21% annualized
        assert!((summary.total_return - 0.1).abs() < 1e-12);
        assert!((summary.annualized_return - 0.21).abs() < 1e-9);
    }

    #[test]
    fn test_win_rate_bounded() {
        let summary = summarize(&[100.0, 100.0, 101.0, 101.0, 102.0], &[0, 1, 0, 1, 0]);
        assert!(summary.win_rate >= 0.0 && summary.win_rate <= 1.0);
        assert_eq!(summary.win_rate, 1.0);
    }

    #[test]
    fn test_win_judged_on_round_trip_not_exit_bar() {
        // Up 20% while held, then gives back some of it on the exit bar
        let (series, positions) = fixture(&[100.0, 100.0, 120.0, 110.0], &[0, 1, 1, 0]);
        let returns = compute_returns(&series, &positions);
        let summary = PerformanceSummary::from_returns(&series, &positions, &returns);

        assert!(returns[3].period_return < 0.0);
        assert_eq!(summary.total_trades, 1.0);
        assert!((summary.trades[0].trade_return - 0.1).abs() < 1e-12);
        assert_eq!(summary.winning_trades, 1);
        assert_eq!(summary.win_rate, 1.0);
    }
}
