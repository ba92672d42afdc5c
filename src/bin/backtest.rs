use trendbot::backtest::{BacktestRunner, MarketScenario, PerformanceSummary, SyntheticDataGenerator};
use trendbot::config::{StrategyConfig, StrategyMode};
use trendbot::Result;

const MODES: [StrategyMode; 3] = [
    StrategyMode::Breakout,
    StrategyMode::MeanReversion,
    StrategyMode::SmaCrossover,
];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trendbot=info".into()),
        )
        .init();

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║          TRENDBOT BACKTESTING SUITE                   ║");
    println!("╚═══════════════════════════════════════════════════════╝");

    let mut all_results = Vec::new();

    for mode in MODES {
        let runner = BacktestRunner::new(StrategyConfig {
            mode,
            ..StrategyConfig::default()
        });

        for scenario in MarketScenario::ALL {
            // Same seed per scenario so every mode sees identical prices
            let mut generator = SyntheticDataGenerator::new(42);
            let series = generator.generate_series("SYNTH", scenario, 500, 60 * 24)?;

            let name = format!("{} / {}", mode, scenario.label());
            let result = runner.run_and_report(&series, &name);
            all_results.push((name, result.summary));
        }
    }

    print_summary_comparison(&all_results);

    Ok(())
}

fn print_summary_comparison(results: &[(String, PerformanceSummary)]) {
    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║              SCENARIO COMPARISON                      ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    println!(
        "{:<36} {:>10} {:>10} {:>10} {:>8} {:>8}",
        "Mode / Scenario", "Return%", "Annual%", "MaxDD%", "Trades", "Win%"
    );
    println!("{}", "─".repeat(86));

    for (name, summary) in results {
        println!(
            "{:<36} {:>10.2} {:>10.2} {:>10.2} {:>8.1} {:>8.1}",
            name,
            summary.total_return * 100.0,
            summary.annualized_return * 100.0,
            summary.max_drawdown * 100.0,
            summary.total_trades,
            summary.win_rate * 100.0
        );
    }

    println!("\n");

    if let Some((best_name, best)) = results
        .iter()
        .max_by(|a, b| a.1.total_return.total_cmp(&b.1.total_return))
    {
        println!("🏆 Best: {} ({:+.2}%)", best_name, best.total_return * 100.0);
    }

    if let Some((worst_name, worst)) = results
        .iter()
        .min_by(|a, b| a.1.total_return.total_cmp(&b.1.total_return))
    {
        println!("⚠️  Worst: {} ({:+.2}%)", worst_name, worst.total_return * 100.0);
    }

    let total_trades: f64 = results.iter().map(|(_, s)| s.total_trades).sum();
    println!("\n📊 Overall Statistics:");
    println!("   Total Trades Across All Runs: {:.1}", total_trades);

    println!("\n═══════════════════════════════════════════════════════\n");
}
