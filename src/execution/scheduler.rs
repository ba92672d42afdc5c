use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::api::{BrokerGateway, MarketDataProvider};
use crate::error::Error;
use crate::execution::Executor;

/// Fixed-interval driver for the executor
///
/// Cycles run strictly one after another. A cycle that overruns the
/// interval delays the next tick instead of bunching ticks up.
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    max_cycles: Option<usize>,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_cycles: None,
        }
    }

    /// Stop after `cycles` evaluations
    pub fn with_max_cycles(mut self, cycles: usize) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    /// Run until shutdown, the cycle limit, or a fatal error
    ///
    /// Returns the number of cycles run.
    pub async fn run<P, B, F>(&self, executor: &mut Executor<P, B>, shutdown: F) -> Result<usize, Error>
    where
        P: MarketDataProvider,
        B: BrokerGateway,
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut cycles = 0usize;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested after {} cycles", cycles);
                    break;
                }
                _ = ticker.tick() => {}
            }

            cycles += 1;
            tracing::debug!("Cycle {} ({})", cycles, executor.strategy_name());

            match executor.run_cycle().await {
                Ok(outcome) => tracing::debug!("Cycle {} done: {}", cycles, outcome.decision.reason),
                Err(e) if e.is_fatal() => {
                    tracing::error!("Stopping live loop: {}", e);
                    return Err(e);
                }
                Err(Error::Broker(e)) => tracing::warn!("{}", e),
                Err(e) => tracing::error!("Cycle {} failed: {}", cycles, e),
            }

            if self.max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }
        }

        Ok(cycles)
    }
}

/// Drive `executor` every `interval` until `shutdown` resolves
pub async fn run_loop<P, B, F>(
    executor: &mut Executor<P, B>,
    interval: Duration,
    shutdown: F,
) -> Result<usize, Error>
where
    P: MarketDataProvider,
    B: BrokerGateway,
    F: Future<Output = ()>,
{
    Scheduler::new(interval).run(executor, shutdown).await
}
