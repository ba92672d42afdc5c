use uuid::Uuid;

use crate::api::{BrokerGateway, Credentials, MarketDataProvider, OrderRequest, OrderResult, Session};
use crate::config::{AppConfig, DataConfig, TradingConfig};
use crate::error::{BrokerError, DataError, Error};
use crate::models::{Signal, TradeSide};
use crate::strategy::{build_strategy, Strategy};

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionAction {
    Submit { side: TradeSide },
    Skip,
}

#[derive(Debug, Clone)]
pub struct ExecutionDecision {
    pub action: ExecutionAction,
    pub reason: String,
}

/// What one evaluation cycle did
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub signal: Signal,
    pub price: f64,
    pub decision: ExecutionDecision,
    pub order: Option<OrderResult>,
}

/// Live loop body: data in, signal out, order to the broker
///
/// The only state kept between cycles is the broker session and the side
/// of the last confirmed fill. That side changes only on a `Filled`
/// result, so a rejected or failed order leaves it untouched.
pub struct Executor<P, B> {
    trading: TradingConfig,
    data: DataConfig,
    credentials: Credentials,
    strategy: Box<dyn Strategy>,
    provider: P,
    broker: B,
    session: Option<Session>,
    last_filled: Option<TradeSide>,
}

impl<P, B> Executor<P, B>
where
    P: MarketDataProvider,
    B: BrokerGateway,
{
    pub fn new(config: &AppConfig, provider: P, broker: B) -> Self {
        Self {
            trading: config.trading.clone(),
            data: config.data.clone(),
            credentials: Credentials::from(&config.broker),
            strategy: build_strategy(&config.strategy),
            provider,
            broker,
            session: None,
            last_filled: None,
        }
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn last_filled(&self) -> Option<TradeSide> {
        self.last_filled
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    /// Log in to the broker and keep the session
    pub async fn connect(&mut self) -> Result<&Session, BrokerError> {
        let session = self.broker.login(&self.credentials).await?;
        Ok(self.session.insert(session))
    }

    /// Decide what to do with a signal
    pub fn decide(&self, signal: Signal) -> ExecutionDecision {
        let Some(side) = signal.side() else {
            return ExecutionDecision {
                action: ExecutionAction::Skip,
                reason: "Hold signal".to_string(),
            };
        };

        if self.trading.suppress_repeat_orders && self.last_filled == Some(side) {
            return ExecutionDecision {
                action: ExecutionAction::Skip,
                reason: format!("Last filled order was already {}", side),
            };
        }

        ExecutionDecision {
            action: ExecutionAction::Submit { side },
            reason: format!("{} signal from {}", side, self.strategy.name()),
        }
    }

    /// Run one full evaluation
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, Error> {
        if self.session.is_none() {
            self.connect().await?;
        }

        let symbol = self.trading.symbol.as_str();
        let series = self
            .provider
            .fetch_series(symbol, &self.data.range, &self.data.interval)
            .await?;

        let needed = self.strategy.min_bars_required();
        if series.len() < needed {
            tracing::debug!(
                "{}: {} bars, indicators need {} (signal will hold)",
                symbol,
                series.len(),
                needed
            );
        }

        let price = if self.data.use_live_quote {
            self.provider.latest_price(symbol).await?
        } else {
            series
                .last()
                .map(|bar| bar.close)
                .ok_or(DataError::InsufficientData { needed, got: 0 })?
        };

        let signal = self.strategy.generate_signal(&series, price)?;
        let decision = self.decide(signal);

        let ExecutionAction::Submit { side } = decision.action else {
            tracing::info!("{} @ {:.4}: {:?} ({})", symbol, price, signal, decision.reason);
            return Ok(CycleOutcome {
                signal,
                price,
                decision,
                order: None,
            });
        };

        let order = OrderRequest {
            client_order_id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            side,
            volume: self.trading.lot_size,
            price,
            max_slippage: self.trading.max_slippage,
            magic: self.trading.magic,
            comment: format!("{} {}", self.strategy.name(), side),
        };

        let Some(session) = self.session.as_ref() else {
            return Err(BrokerError::Transport("no broker session".to_string()).into());
        };

        tracing::info!(
            "Submitting {} {} x{} @ {:.4} ({})",
            side,
            symbol,
            order.volume,
            price,
            decision.reason
        );
        let result = self.broker.submit_market_order(session, &order).await?;

        if !result.is_filled() {
            return Err(BrokerError::OrderRejected {
                code: result.error_code.unwrap_or_default(),
                message: format!("{} {} x{}", side, symbol, order.volume),
            }
            .into());
        }

        self.last_filled = Some(side);
        tracing::info!(
            "✅ {} {} filled @ {:.4}",
            side,
            symbol,
            result.fill_price.unwrap_or(price)
        );

        Ok(CycleOutcome {
            signal,
            price,
            decision,
            order: Some(result),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PaperBroker;
    use crate::config::{StrategyConfig, StrategyMode};
    use crate::models::{Bar, PriceSeries};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};

    /// Provider serving a fixed history and a fixed quote
    struct StaticProvider {
        closes: Vec<f64>,
        quote: f64,
    }

    #[async_trait]
    impl MarketDataProvider for StaticProvider {
        async fn fetch_series(
            &self,
            symbol: &str,
            _range: &str,
            _interval: &str,
        ) -> Result<PriceSeries, DataError> {
            if self.closes.is_empty() {
                return Err(DataError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: "offline".to_string(),
                });
            }
            let bars = self
                .closes
                .iter()
                .enumerate()
                .map(|(i, &close)| Bar {
                    timestamp: DateTime::<Utc>::UNIX_EPOCH + Duration::hours(i as i64),
                    open: close,
                    high: close,
                    low: close,
                    close,
                })
                .collect();
            PriceSeries::new(symbol, bars)
        }

        async fn latest_price(&self, _symbol: &str) -> Result<f64, DataError> {
            Ok(self.quote)
        }
    }

    fn provider(quote: f64) -> StaticProvider {
        StaticProvider {
            closes: (0..30).map(|i| if i % 2 == 0 { 99.0 } else { 101.0 }).collect(),
            quote,
        }
    }

    fn config(suppress_repeat_orders: bool) -> AppConfig {
        let mut config = AppConfig::default();
        config.strategy = StrategyConfig {
            mode: StrategyMode::MeanReversion,
            band_window: 20,
            ..StrategyConfig::default()
        };
        config.data.use_live_quote = true;
        config.trading.suppress_repeat_orders = suppress_repeat_orders;
        config
    }

    #[tokio::test]
    async fn test_fill_commits_side() {
        let mut executor = Executor::new(&config(false), provider(90.0), PaperBroker::new());

        let outcome = executor.run_cycle().await.unwrap();

        assert_eq!(outcome.signal, Signal::Buy);
        assert_eq!(outcome.decision.action, ExecutionAction::Submit { side: TradeSide::Buy });
        assert_eq!(executor.last_filled(), Some(TradeSide::Buy));
        assert!(executor.session().is_some());

        let orders = executor.broker().orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].volume, 0.1);
        assert_eq!(orders[0].max_slippage, 5);
        assert_eq!(orders[0].magic, 123456);
        assert_eq!(orders[0].price, 90.0);
    }

    #[tokio::test]
    async fn test_rejection_leaves_state_untouched() {
        let mut executor = Executor::new(&config(false), provider(90.0), PaperBroker::rejecting(10019));

        let err = executor.run_cycle().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Broker(BrokerError::OrderRejected { code: 10019, .. })
        ));
        assert!(!err.is_fatal());
        assert_eq!(executor.last_filled(), None);
        assert_eq!(executor.broker().orders().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_signal_repeats_order_by_default() {
        let mut executor = Executor::new(&config(false), provider(90.0), PaperBroker::new());

        executor.run_cycle().await.unwrap();
        executor.run_cycle().await.unwrap();

        assert_eq!(executor.broker().orders().len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_signal_suppressed_when_enabled() {
        let mut executor = Executor::new(&config(true), provider(90.0), PaperBroker::new());

        executor.run_cycle().await.unwrap();
        let second = executor.run_cycle().await.unwrap();

        assert_eq!(second.decision.action, ExecutionAction::Skip);
        assert!(second.order.is_none());
        assert_eq!(executor.broker().orders().len(), 1);
    }

    #[tokio::test]
    async fn test_hold_submits_nothing() {
        let mut executor = Executor::new(&config(false), provider(100.0), PaperBroker::new());

        let outcome = executor.run_cycle().await.unwrap();

        assert_eq!(outcome.signal, Signal::Hold);
        assert!(outcome.order.is_none());
        assert!(executor.broker().orders().is_empty());
    }

    #[tokio::test]
    async fn test_data_failure_is_not_fatal() {
        let offline = StaticProvider {
            closes: vec![],
            quote: 0.0,
        };
        let mut executor = Executor::new(&config(false), offline, PaperBroker::new());

        let err = executor.run_cycle().await.unwrap_err();

        assert!(matches!(err, Error::Data(DataError::DataUnavailable { .. })));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_decide_hold_skips() {
        let executor = Executor::new(&config(false), provider(0.0), PaperBroker::new());
        assert_eq!(executor.decide(Signal::Hold).action, ExecutionAction::Skip);
        assert_eq!(
            executor.decide(Signal::Sell).action,
            ExecutionAction::Submit { side: TradeSide::Sell }
        );
    }
}
