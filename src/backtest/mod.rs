pub mod metrics;
pub mod returns;
pub mod runner;
pub mod synthetic;

pub use metrics::{PerformanceSummary, TradeRecord};
pub use returns::{compute_returns, ReturnRow};
pub use runner::{BacktestResult, BacktestRunner};
pub use synthetic::{MarketScenario, SyntheticDataGenerator};
