use async_trait::async_trait;
use std::sync::Mutex;

use crate::api::broker::{
    AccountInfo, BrokerGateway, Credentials, OrderRequest, OrderResult, OrderStatus, Session,
};
use crate::error::BrokerError;

/// In-process broker that fills every order at its reference price
///
/// Used for dry runs and tests. Can be told to reject every order with a
/// given retcode.
#[derive(Default)]
pub struct PaperBroker {
    reject_with: Option<i64>,
    orders: Mutex<Vec<OrderRequest>>,
}

impl PaperBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Broker that rejects every order with `retcode`
    pub fn rejecting(retcode: i64) -> Self {
        Self {
            reject_with: Some(retcode),
            orders: Mutex::new(Vec::new()),
        }
    }

    /// Orders received so far
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders
            .lock()
            .map(|orders| orders.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BrokerGateway for PaperBroker {
    async fn login(&self, credentials: &Credentials) -> Result<Session, BrokerError> {
        tracing::info!("Paper session opened for login {}", credentials.login);
        Ok(Session {
            token: format!("paper-{}", credentials.login),
            account: Some(AccountInfo {
                login: credentials.login,
                balance: 0.0,
                equity: 0.0,
            }),
        })
    }

    async fn submit_market_order(
        &self,
        _session: &Session,
        order: &OrderRequest,
    ) -> Result<OrderResult, BrokerError> {
        self.orders
            .lock()
            .map_err(|_| BrokerError::Transport("paper order book poisoned".to_string()))?
            .push(order.clone());

        let result = match self.reject_with {
            Some(code) => OrderResult {
                status: OrderStatus::Rejected,
                fill_price: None,
                error_code: Some(code),
            },
            None => OrderResult {
                status: OrderStatus::Filled,
                fill_price: Some(order.price),
                error_code: None,
            },
        };

        tracing::debug!(
            "Paper {} {} x{} @ {:.4}: {:?}",
            order.side,
            order.symbol,
            order.volume,
            order.price,
            result.status
        );

        Ok(result)
    }
}
