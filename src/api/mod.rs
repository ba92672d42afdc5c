pub mod broker;
pub mod paper;
pub mod rest_bridge;
pub mod yahoo;

use async_trait::async_trait;

use crate::error::DataError;
use crate::models::PriceSeries;

pub use broker::{
    AccountInfo, BrokerGateway, Credentials, OrderRequest, OrderResult, OrderStatus, Session,
    TRADE_RETCODE_DONE,
};
pub use paper::PaperBroker;
pub use rest_bridge::RestBridgeClient;
pub use yahoo::YahooChartClient;

/// Source of historical bars and live quotes
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Bars for `symbol` over `range` (e.g. "1mo", "5y") at `interval` (e.g. "1h", "1d")
    async fn fetch_series(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<PriceSeries, DataError>;

    /// Most recent traded price
    async fn latest_price(&self, symbol: &str) -> Result<f64, DataError>;
}
