use crate::backtest::metrics::PerformanceSummary;
use crate::backtest::returns::{compute_returns, ReturnRow};
use crate::config::StrategyConfig;
use crate::indicators::{compute, IndicatorRow};
use crate::models::PriceSeries;
use crate::strategy::{build_strategy, track, PositionRow};

/// Everything a backtest produces, aligned bar for bar
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub indicators: Vec<IndicatorRow>,
    pub positions: Vec<PositionRow>,
    pub returns: Vec<ReturnRow>,
    pub summary: PerformanceSummary,
}

/// Backtest runner: indicators -> position tracker -> returns -> summary
pub struct BacktestRunner {
    config: StrategyConfig,
}

impl BacktestRunner {
    pub fn new(config: StrategyConfig) -> Self {
        Self { config }
    }

    /// Run a backtest over `series`
    ///
    /// Short histories are not an error: indicators stay undefined and no
    /// trades are taken.
    pub fn run(&self, series: &PriceSeries) -> BacktestResult {
        let needed = build_strategy(&self.config).min_bars_required();
        if series.len() < needed {
            tracing::warn!(
                "Only {} bars for {} ({} mode needs {}), indicators will stay undefined",
                series.len(),
                series.symbol(),
                self.config.mode,
                needed
            );
        }

        tracing::info!(
            "Starting backtest: {} bars of {}, mode {}",
            series.len(),
            series.symbol(),
            self.config.mode
        );

        let indicators = compute(series, &self.config);
        let positions = track(&indicators, &self.config);
        let returns = compute_returns(series, &positions);
        let summary = PerformanceSummary::from_returns(series, &positions, &returns);

        tracing::info!(
            "Backtest complete: {:.1} trades, return {:.2}%, max drawdown {:.2}%",
            summary.total_trades,
            summary.total_return * 100.0,
            summary.max_drawdown * 100.0
        );

        BacktestResult {
            indicators,
            positions,
            returns,
            summary,
        }
    }

    /// Run backtest and print report
    pub fn run_and_report(&self, series: &PriceSeries, scenario_name: &str) -> BacktestResult {
        println!("\n🔬 Running backtest: {}", scenario_name);
        println!("   Mode: {}", self.config.mode);
        println!("   Bars: {}", series.len());

        let result = self.run(series);
        result.summary.print_report();

        result
    }
}
