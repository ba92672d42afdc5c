use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use trendbot::api::{BrokerGateway, MarketDataProvider, PaperBroker, RestBridgeClient, YahooChartClient};
use trendbot::backtest::BacktestRunner;
use trendbot::config::AppConfig;
use trendbot::execution::{run_loop, Executor};

#[derive(Parser)]
#[command(name = "trendbot", version, about = "Single-symbol trend and mean reversion trading bot")]
struct Cli {
    /// Extra TOML file layered over trendbot.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate and trade on a fixed interval until Ctrl+C
    Live {
        /// Fill orders in-process instead of sending them to the bridge
        #[arg(long)]
        paper: bool,
    },
    /// Run a single evaluation cycle and exit
    Check {
        #[arg(long)]
        paper: bool,
    },
    /// Fetch history and evaluate the configured strategy on it
    Backtest {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        range: Option<String>,
        #[arg(long)]
        interval: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    tracing::info!("🚀 trendbot starting");
    tracing::info!(
        "  Symbol: {} | Mode: {} | Lot: {} | Interval: {}s",
        config.trading.symbol,
        config.strategy.mode,
        config.trading.lot_size,
        config.scheduler.interval_secs
    );

    let provider = YahooChartClient::new(&config.data, config.scheduler.request_timeout())?;

    match cli.command {
        Command::Live { paper } => trade(&config, provider, paper, false).await,
        Command::Check { paper } => trade(&config, provider, paper, true).await,
        Command::Backtest {
            symbol,
            range,
            interval,
        } => {
            let symbol = symbol.unwrap_or_else(|| config.trading.symbol.clone());
            let range = range.unwrap_or_else(|| config.data.range.clone());
            let interval = interval.unwrap_or_else(|| config.data.interval.clone());

            let series = provider
                .fetch_series(&symbol, &range, &interval)
                .await
                .with_context(|| format!("Failed to fetch history for {}", symbol))?;

            BacktestRunner::new(config.strategy.clone())
                .run_and_report(&series, &format!("{} {} / {}", symbol, range, interval));
            Ok(())
        }
    }
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trendbot=info".into()),
        )
        .init();
}

async fn trade<P>(config: &AppConfig, provider: P, paper: bool, once: bool) -> Result<()>
where
    P: MarketDataProvider,
{
    if paper {
        tracing::info!("📝 Paper trading, no orders leave this process");
        return drive(config, provider, PaperBroker::new(), once).await;
    }

    let broker = RestBridgeClient::new(&config.broker.bridge_url, config.scheduler.request_timeout())?;
    drive(config, provider, broker, once).await
}

async fn drive<P, B>(config: &AppConfig, provider: P, broker: B, once: bool) -> Result<()>
where
    P: MarketDataProvider,
    B: BrokerGateway,
{
    let mut executor = Executor::new(config, provider, broker);

    if once {
        let outcome = executor.run_cycle().await?;
        println!(
            "{} @ {:.4}: {:?} -> {}",
            config.trading.symbol, outcome.price, outcome.signal, outcome.decision.reason
        );
        return Ok(());
    }

    tracing::info!("Press Ctrl+C to stop...");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("⚠️  Received Ctrl+C, shutting down...");
    };

    let cycles = run_loop(&mut executor, config.scheduler.interval(), shutdown).await?;
    tracing::info!("👋 trendbot stopped after {} cycles", cycles);
    Ok(())
}
