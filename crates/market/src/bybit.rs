use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Candle, Error, MarketData, Result};

use crate::RateLimiter;

const BASE_URL: &str = "https://api.bybit.com";

/// Minimum spacing between requests, matching the exchange's public
/// rate guidance for unauthenticated market-data calls.
const REQUEST_SPACING_MS: u64 = 1200;

/// REST client for Bybit's public v5 market-data endpoints.
/// No API key required — only kline and ticker queries are used.
pub struct BybitClient {
    http: Client,
    limiter: RateLimiter,
}

impl BybitClient {
    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
            limiter: RateLimiter::new(Duration::from_millis(REQUEST_SPACING_MS)),
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        self.limiter.acquire().await;

        let url = format!("{BASE_URL}{path}");
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Provider(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Provider(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Provider(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }
}

impl Default for BybitClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketData for BybitClient {
    async fn ohlcv(&self, pair: &str, timeframe: &str, limit: usize) -> Result<Vec<Candle>> {
        let symbol = to_symbol(pair);
        let interval = to_interval(timeframe)?;
        let limit_param = limit.to_string();

        debug!(pair = %pair, timeframe = %timeframe, limit, "Fetching klines");
        let body = self
            .get(
                "/v5/market/kline",
                &[
                    ("category", "spot"),
                    ("symbol", &symbol),
                    ("interval", interval),
                    ("limit", &limit_param),
                ],
            )
            .await?;

        parse_kline_response(pair, limit, &body)
    }

    async fn last_price(&self, pair: &str) -> Result<f64> {
        let symbol = to_symbol(pair);
        let body = self
            .get(
                "/v5/market/tickers",
                &[("category", "spot"), ("symbol", &symbol)],
            )
            .await?;

        let resp: ApiResponse<TickerResult> =
            serde_json::from_str(&body).map_err(|e| Error::Provider(e.to_string()))?;
        resp.check()?;

        let ticker = resp
            .result
            .list
            .first()
            .ok_or_else(|| Error::Provider(format!("Empty ticker response for {pair}")))?;

        ticker
            .last_price
            .parse::<f64>()
            .map_err(|_| Error::Provider(format!("Malformed last price: '{}'", ticker.last_price)))
    }
}

/// ccxt-style pair ("BTC/USDT") → exchange symbol ("BTCUSDT").
fn to_symbol(pair: &str) -> String {
    pair.replace('/', "")
}

/// Timeframe string → Bybit v5 interval code.
fn to_interval(timeframe: &str) -> Result<&'static str> {
    Ok(match timeframe {
        "1m" => "1",
        "3m" => "3",
        "5m" => "5",
        "15m" => "15",
        "30m" => "30",
        "1h" => "60",
        "2h" => "120",
        "4h" => "240",
        "6h" => "360",
        "12h" => "720",
        "1d" => "D",
        "1w" => "W",
        "1M" => "M",
        other => {
            return Err(Error::Config(format!("Unsupported timeframe '{other}'")));
        }
    })
}

/// Parse a kline response body into oldest-first candles, enforcing the
/// at-least-`limit` contract.
fn parse_kline_response(pair: &str, limit: usize, body: &str) -> Result<Vec<Candle>> {
    let resp: ApiResponse<KlineResult> =
        serde_json::from_str(body).map_err(|e| Error::Provider(e.to_string()))?;
    resp.check()?;

    let mut candles = resp
        .result
        .list
        .iter()
        .map(|row| parse_kline_row(row))
        .collect::<Result<Vec<_>>>()?;
    candles.reverse(); // Bybit lists newest first

    if candles.len() < limit {
        return Err(Error::InsufficientData {
            pair: pair.to_string(),
            got: candles.len(),
            need: limit,
        });
    }
    Ok(candles)
}

/// Kline row format: [startTime, open, high, low, close, volume, turnover],
/// all strings.
fn parse_kline_row(row: &[String]) -> Result<Candle> {
    if row.len() < 6 {
        return Err(Error::Provider(format!(
            "Kline row has {} fields, expected at least 6",
            row.len()
        )));
    }

    let ts_ms = row[0]
        .parse::<i64>()
        .map_err(|_| Error::Provider(format!("Malformed kline timestamp: '{}'", row[0])))?;
    let timestamp: DateTime<Utc> = Utc
        .timestamp_millis_opt(ts_ms)
        .single()
        .ok_or_else(|| Error::Provider(format!("Out-of-range kline timestamp: {ts_ms}")))?;

    Ok(Candle {
        timestamp,
        open: parse_price("open", &row[1])?,
        high: parse_price("high", &row[2])?,
        low: parse_price("low", &row[3])?,
        close: parse_price("close", &row[4])?,
        volume: parse_price("volume", &row[5])?,
    })
}

fn parse_price(field: &str, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|_| Error::Provider(format!("Malformed kline {field}: '{value}'")))
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse<T> {
    ret_code: i64,
    ret_msg: String,
    result: T,
}

impl<T> ApiResponse<T> {
    fn check(&self) -> Result<()> {
        if self.ret_code != 0 {
            return Err(Error::Provider(format!(
                "retCode {}: {}",
                self.ret_code, self.ret_msg
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct KlineResult {
    list: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct TickerResult {
    list: Vec<Ticker>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    last_price: String,
}
