use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::api::broker::{
    AccountInfo, BrokerGateway, Credentials, OrderRequest, OrderResult, OrderStatus, Session,
    TRADE_RETCODE_DONE,
};
use crate::error::BrokerError;
use crate::models::TradeSide;

/// Client for a local HTTP bridge in front of the broker terminal
///
/// Orders are never retried here. A timed out submission may still have
/// been executed, so the caller decides what to do on the next cycle.
#[derive(Clone)]
pub struct RestBridgeClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    login: u64,
    password: &'a str,
    server: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    account: Option<AccountInfo>,
}

/// Market deal, immediate-or-cancel, good till cancelled
#[derive(Debug, Serialize)]
struct BridgeOrder<'a> {
    action: &'static str,
    client_order_id: String,
    symbol: &'a str,
    volume: f64,
    #[serde(rename = "type")]
    order_type: &'static str,
    price: f64,
    deviation: u32,
    magic: u64,
    comment: &'a str,
    type_time: &'static str,
    type_filling: &'static str,
}

impl<'a> From<&'a OrderRequest> for BridgeOrder<'a> {
    fn from(order: &'a OrderRequest) -> Self {
        Self {
            action: "deal",
            client_order_id: order.client_order_id.to_string(),
            symbol: &order.symbol,
            volume: order.volume,
            order_type: match order.side {
                TradeSide::Buy => "buy",
                TradeSide::Sell => "sell",
            },
            price: order.price,
            deviation: order.max_slippage,
            magic: order.magic,
            comment: &order.comment,
            type_time: "gtc",
            type_filling: "ioc",
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    retcode: i64,
    price: Option<f64>,
    comment: Option<String>,
}

impl RestBridgeClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

fn transport(e: reqwest::Error) -> BrokerError {
    BrokerError::Transport(e.to_string())
}

#[async_trait]
impl BrokerGateway for RestBridgeClient {
    async fn login(&self, credentials: &Credentials) -> Result<Session, BrokerError> {
        let body = LoginBody {
            login: credentials.login,
            password: &credentials.password,
            server: &credentials.server,
        };

        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            let text = response.text().await.unwrap_or_default();
            return Err(BrokerError::AuthenticationFailed(format!(
                "login {} on {} rejected ({}): {}",
                credentials.login, credentials.server, status, text
            )));
        }
        if !status.is_success() {
            return Err(BrokerError::Transport(format!("login returned {}", status)));
        }

        let login: LoginResponse = response.json().await.map_err(transport)?;

        match &login.account {
            Some(account) => tracing::info!(
                "Logged in to {} as {} (balance {:.2}, equity {:.2})",
                credentials.server,
                account.login,
                account.balance,
                account.equity
            ),
            None => tracing::info!("Logged in to {} as {}", credentials.server, credentials.login),
        }

        Ok(Session {
            token: login.token,
            account: login.account,
        })
    }

    async fn submit_market_order(
        &self,
        session: &Session,
        order: &OrderRequest,
    ) -> Result<OrderResult, BrokerError> {
        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .bearer_auth(&session.token)
            .json(&BridgeOrder::from(order))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(BrokerError::AuthenticationFailed(format!(
                "session rejected ({})",
                status
            )));
        }
        if !status.is_success() {
            return Err(BrokerError::Transport(format!("orders returned {}", status)));
        }

        let body: OrderResponse = response.json().await.map_err(transport)?;

        if body.retcode == TRADE_RETCODE_DONE {
            Ok(OrderResult {
                status: OrderStatus::Filled,
                fill_price: body.price.or(Some(order.price)),
                error_code: None,
            })
        } else {
            tracing::debug!(
                "Bridge rejected {}: retcode {} {}",
                order.client_order_id,
                body.retcode,
                body.comment.as_deref().unwrap_or("")
            );
            Ok(OrderResult {
                status: OrderStatus::Rejected,
                fill_price: None,
                error_code: Some(body.retcode),
            })
        }
    }
}
