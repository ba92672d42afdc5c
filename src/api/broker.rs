use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::models::TradeSide;

/// Retcode the terminal reports for a completed deal
pub const TRADE_RETCODE_DONE: i64 = 10009;

/// Login credentials for the broker terminal
#[derive(Clone)]
pub struct Credentials {
    pub login: u64,
    pub password: String,
    pub server: String,
}

impl From<&BrokerConfig> for Credentials {
    fn from(config: &BrokerConfig) -> Self {
        Self {
            login: config.login,
            password: config.password.clone(),
            server: config.server.clone(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

/// Account snapshot returned on login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountInfo {
    pub login: u64,
    pub balance: f64,
    pub equity: f64,
}

/// Authenticated broker session
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub account: Option<AccountInfo>,
}

/// Market order as sent to the broker
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderRequest {
    pub client_order_id: Uuid,
    pub symbol: String,
    pub side: TradeSide,
    pub volume: f64,
    /// Reference price (latest quote) the deal is requested at
    pub price: f64,
    /// Maximum slippage in points
    pub max_slippage: u32,
    pub magic: u64,
    pub comment: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Filled,
    Rejected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderResult {
    pub status: OrderStatus,
    pub fill_price: Option<f64>,
    pub error_code: Option<i64>,
}

impl OrderResult {
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }
}

/// Broker execution gateway
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    /// Open a session; fails with `AuthenticationFailed` on bad credentials
    async fn login(&self, credentials: &Credentials) -> Result<Session, BrokerError>;

    async fn submit_market_order(
        &self,
        session: &Session,
        order: &OrderRequest,
    ) -> Result<OrderResult, BrokerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials {
            login: 123456,
            password: "yourpassword".to_string(),
            server: "yourbroker-server".to_string(),
        };
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("123456"));
        assert!(!debug.contains("yourpassword"));
    }

    #[test]
    fn test_order_serializes_side_lowercase() {
        let order = OrderRequest {
            client_order_id: Uuid::nil(),
            symbol: "AAPL".to_string(),
            side: TradeSide::Sell,
            volume: 0.1,
            price: 190.0,
            max_slippage: 5,
            magic: 123456,
            comment: "test".to_string(),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["side"], "sell");
        assert_eq!(json["volume"], 0.1);
    }
}
