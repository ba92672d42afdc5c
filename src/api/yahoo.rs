use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::api::MarketDataProvider;
use crate::config::DataConfig;
use crate::error::DataError;
use crate::models::{Bar, PriceSeries};

const RATE_LIMIT_RPM: u32 = 60;
const MAX_RETRIES: u32 = 3;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; trendbot)";

type YahooRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Yahoo Finance chart API client
///
/// Cloneable; clones share the rate limiter.
#[derive(Clone)]
pub struct YahooChartClient {
    client: Client,
    base_url: String,
    rate_limiter: Arc<YahooRateLimiter>,
}

/// Response from /v8/finance/chart/{symbol}
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: Option<String>,
    pub regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

/// Columnar OHLC; Yahoo reports missing values as null
#[derive(Debug, Default, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

impl YahooChartClient {
    pub fn new(config: &DataConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        let quota = Quota::per_minute(NonZeroU32::new(RATE_LIMIT_RPM).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Make a rate-limited API request with retry logic
    async fn make_request(&self, url: &str) -> Result<reqwest::Response> {
        for attempt in 1..=MAX_RETRIES {
            self.rate_limiter.until_ready().await;

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let Some(backoff) = retry_backoff(attempt) else {
                            anyhow::bail!("Yahoo returned {} after {} attempts", status, MAX_RETRIES);
                        };
                        tracing::warn!(
                            "Yahoo returned {}, retrying in {}s (attempt {}/{})",
                            status,
                            backoff.as_secs(),
                            attempt,
                            MAX_RETRIES
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    anyhow::bail!("Yahoo API error ({}): {}", status, error_text);
                }
                Err(e) => {
                    let Some(backoff) = retry_backoff(attempt) else {
                        anyhow::bail!("Network error after {} retries: {}", MAX_RETRIES, e);
                    };
                    tracing::warn!(
                        "Network error: {}, retrying in {}s (attempt {}/{})",
                        e,
                        backoff.as_secs(),
                        attempt,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        anyhow::bail!("Failed after {} retries", MAX_RETRIES)
    }

    async fn fetch_chart(&self, symbol: &str, range: &str, interval: &str) -> Result<ChartResponse> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url, symbol, range, interval
        );
        tracing::debug!("Fetching {}", url);

        let response = self.make_request(&url).await?;
        response
            .json()
            .await
            .context("Failed to parse chart response")
    }
}

/// Delay before retrying after `attempt`; the last attempt is never followed by a wait
fn retry_backoff(attempt: u32) -> Option<Duration> {
    (attempt < MAX_RETRIES).then(|| Duration::from_secs(2u64.pow(attempt)))
}

fn unavailable(symbol: &str, reason: impl std::fmt::Display) -> DataError {
    DataError::DataUnavailable {
        symbol: symbol.to_string(),
        reason: reason.to_string(),
    }
}

fn first_result(symbol: &str, response: ChartResponse) -> Result<ChartResult, DataError> {
    if let Some(error) = response.chart.error {
        return Err(unavailable(
            symbol,
            format!("{}: {}", error.code, error.description),
        ));
    }

    response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| unavailable(symbol, "empty chart result"))
}

/// Convert a chart payload into a validated series
///
/// Rows with any null OHLC value are dropped. An empty result is an error.
/// Bars carry the unadjusted quote columns; `adjclose` is not read.
pub fn parse_chart(symbol: &str, response: ChartResponse) -> Result<PriceSeries, DataError> {
    let result = first_result(symbol, response)?;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut skipped = 0usize;
    let bars: Vec<Bar> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let field = |column: &[Option<f64>]| column.get(i).copied().flatten();
            let bar = match (
                DateTime::from_timestamp(ts, 0),
                field(&quote.open),
                field(&quote.high),
                field(&quote.low),
                field(&quote.close),
            ) {
                (Some(timestamp), Some(open), Some(high), Some(low), Some(close)) => Some(Bar {
                    timestamp,
                    open,
                    high,
                    low,
                    close,
                }),
                _ => None,
            };
            if bar.is_none() {
                skipped += 1;
            }
            bar
        })
        .collect();

    if skipped > 0 {
        tracing::debug!("Skipped {} incomplete rows for {}", skipped, symbol);
    }

    if bars.is_empty() {
        return Err(unavailable(symbol, "no complete bars returned"));
    }

    PriceSeries::new(symbol, bars)
}

/// Latest traded price from a chart payload
///
/// Prefers `regularMarketPrice`, falls back to the last non-null close.
pub fn parse_latest_price(symbol: &str, response: ChartResponse) -> Result<f64, DataError> {
    let result = first_result(symbol, response)?;

    result
        .meta
        .regular_market_price
        .or_else(|| {
            result
                .indicators
                .quote
                .first()
                .and_then(|q| q.close.iter().rev().find_map(|c| *c))
        })
        .ok_or_else(|| unavailable(symbol, "no price in quote"))
}

#[async_trait]
impl MarketDataProvider for YahooChartClient {
    async fn fetch_series(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<PriceSeries, DataError> {
        let response = self
            .fetch_chart(symbol, range, interval)
            .await
            .map_err(|e| unavailable(symbol, format!("{:#}", e)))?;

        let series = parse_chart(symbol, response)?;
        tracing::info!(
            "Fetched {} bars for {} ({} / {})",
            series.len(),
            symbol,
            range,
            interval
        );
        Ok(series)
    }

    async fn latest_price(&self, symbol: &str) -> Result<f64, DataError> {
        let response = self
            .fetch_chart(symbol, "1d", "1m")
            .await
            .map_err(|e| unavailable(symbol, format!("{:#}", e)))?;

        parse_latest_price(symbol, response)
    }
}
