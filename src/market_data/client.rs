// =============================================================================
// Exchange Client — public market-data REST / WebSocket adapter
// =============================================================================
//
// One client serves every provider. REST venues are queried with a shared
// reqwest client (10 s timeout); Deriv instruments are fetched over a one-shot
// WebSocket `ticks_history` request bounded by the same timeout. Raw payloads
// are handed to the normalizer; nothing venue-specific leaks past this file.
//
// API keys (CoinGecko demo key, CoinMarketCap pro key) are optional, sent as
// headers, and never logged.
// =============================================================================

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, instrument, warn};

use super::candle::Candle;
use super::normalize::normalize_candles;
use super::orderbook::{parse_depth, OrderBookMetrics, OrderBookPressure};
use super::rate_limit::{RateLimitSnapshot, RateLimitTracker};
use super::source::MarketDataSource;
use crate::catalog::{filter_listing, static_catalog};
use crate::config::ScannerConfig;
use crate::error::{FetchError, FetchResult};
use crate::provider::{self, candles_url, catalog_url, depth_url, DERIV_WS};
use crate::types::{ProviderId, Timeframe};

/// Binance request weights for the endpoints used here.
const WEIGHT_KLINES: u32 = 2;
const WEIGHT_EXCHANGE_INFO: u32 = 20;
const WEIGHT_DEPTH_100: u32 = 5;

/// Public market-data client for every supported provider.
#[derive(Clone)]
pub struct ExchangeClient {
    client: reqwest::Client,
    timeout: Duration,
    candle_limit: u32,
    catalog_cap: usize,
    coingecko_api_key: Option<String>,
    coinmarketcap_api_key: Option<String>,
    deriv_ws: String,
    rate_limits: std::sync::Arc<HashMap<ProviderId, RateLimitTracker>>,
}

impl ExchangeClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub fn new(config: &ScannerConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build reqwest client");

        let mut rate_limits = HashMap::new();
        rate_limits.insert(ProviderId::Binance, RateLimitTracker::binance());

        debug!(
            timeout_secs = config.request_timeout_secs,
            candle_limit = config.candle_limit,
            "ExchangeClient initialised"
        );

        Self {
            client,
            timeout,
            candle_limit: config.candle_limit,
            catalog_cap: config.catalog_cap,
            coingecko_api_key: config.coingecko_api_key.clone(),
            coinmarketcap_api_key: config.coinmarketcap_api_key.clone(),
            deriv_ws: DERIV_WS.to_string(),
            rate_limits: std::sync::Arc::new(rate_limits),
        }
    }

    /// Point Deriv requests at another WebSocket endpoint.
    pub fn with_deriv_endpoint(mut self, url: impl Into<String>) -> Self {
        self.deriv_ws = url.into();
        self
    }

    /// Current used weight for providers that report one.
    pub fn rate_limit(&self, provider: ProviderId) -> Option<RateLimitSnapshot> {
        self.rate_limits
            .get(&provider.data_backend())
            .map(|t| t.snapshot(Utc::now().timestamp_millis()))
    }

    // -------------------------------------------------------------------------
    // Transport helpers
    // -------------------------------------------------------------------------

    /// Per-venue auth headers (public endpoints only need these for the
    /// aggregators).
    fn headers_for(&self, provider: ProviderId) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let (name, key) = match provider {
            ProviderId::Coingecko => ("x-cg-demo-api-key", self.coingecko_api_key.as_deref()),
            ProviderId::Coinmarketcap => {
                ("X-CMC_PRO_API_KEY", self.coinmarketcap_api_key.as_deref())
            }
            _ => return headers,
        };
        if let Some(val) = key.and_then(|k| HeaderValue::from_str(k).ok()) {
            headers.insert(name, val);
        }
        headers
    }

    /// GET `url` and parse the body as JSON.
    async fn get_json(&self, provider: ProviderId, url: &str, weight: u32) -> FetchResult<Value> {
        let tracker = self.rate_limits.get(&provider);
        if let Some(t) = tracker {
            let now = Utc::now().timestamp_millis();
            if !t.can_send_request(weight, now) {
                return Err(FetchError::RateLimited {
                    used: t.used_weight(now),
                });
            }
        }

        let resp = self
            .client
            .get(url)
            .headers(self.headers_for(provider))
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        if let Some(t) = tracker {
            t.update_from_headers(resp.headers(), Utc::now().timestamp_millis());
        }

        let status = resp.status();
        if !status.is_success() {
            warn!(provider = %provider, status = status.as_u16(), "non-success response");
            return Err(FetchError::Status {
                endpoint: endpoint_path(url),
                status: status.as_u16(),
            });
        }

        resp.json::<Value>().await.map_err(|e| self.map_transport(e))
    }

    fn map_transport(&self, e: reqwest::Error) -> FetchError {
        match FetchError::from(e) {
            FetchError::Timeout(_) => FetchError::Timeout(self.timeout.as_secs()),
            other => other,
        }
    }

    /// One-shot Deriv `ticks_history` request. Resolves to the first reply that
    /// carries candles; a Deriv error reply or the timeout resolves to an error.
    async fn deriv_ticks_history(&self, symbol: &str, timeframe: Timeframe) -> FetchResult<Value> {
        let request = json!({
            "ticks_history": symbol,
            "adjust_start_time": 1,
            "count": self.candle_limit,
            "end": "latest",
            "granularity": timeframe.seconds(),
            "style": "candles",
        });

        let exchange = async {
            let (ws_stream, _response) = connect_async(self.deriv_ws.as_str())
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;
            let (mut write, mut read) = ws_stream.split();

            write
                .send(Message::Text(request.to_string()))
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            while let Some(msg) = read.next().await {
                let msg = msg.map_err(|e| FetchError::Transport(e.to_string()))?;
                let Message::Text(text) = msg else {
                    continue;
                };
                let reply: Value = serde_json::from_str(&text)
                    .map_err(|e| FetchError::Malformed(e.to_string()))?;

                if let Some(err) = reply.get("error") {
                    let _ = write.close().await;
                    return Err(FetchError::Upstream(
                        err["message"].as_str().unwrap_or("deriv error").to_string(),
                    ));
                }
                if reply.get("candles").is_some() {
                    let _ = write.close().await;
                    return Ok(reply);
                }
            }

            Err(FetchError::Transport(
                "deriv socket closed before replying".to_string(),
            ))
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| FetchError::Timeout(self.timeout.as_secs()))?
    }
}

#[async_trait]
impl MarketDataSource for ExchangeClient {
    #[instrument(skip(self), name = "client::fetch_candles")]
    async fn fetch_candles(
        &self,
        provider: ProviderId,
        symbol: &str,
        timeframe: Timeframe,
    ) -> FetchResult<Vec<Candle>> {
        let raw = if provider.is_deriv() {
            self.deriv_ticks_history(symbol, timeframe).await?
        } else {
            let url = candles_url(provider, symbol, timeframe, self.candle_limit).ok_or(
                FetchError::Unsupported {
                    provider,
                    timeframe,
                    what: "candles",
                },
            )?;
            self.get_json(provider.data_backend(), &url, WEIGHT_KLINES)
                .await?
        };

        let candles = normalize_candles(provider, &raw).ok_or_else(|| {
            FetchError::Malformed(format!("no candles in {provider} reply for {symbol}"))
        })?;
        debug!(%provider, symbol, %timeframe, count = candles.len(), "candles fetched");
        Ok(candles)
    }

    #[instrument(skip(self), name = "client::fetch_symbol_catalog")]
    async fn fetch_symbol_catalog(&self, provider: ProviderId) -> FetchResult<Vec<String>> {
        if let Some(symbols) = static_catalog(provider, self.catalog_cap) {
            return Ok(symbols);
        }

        let url = catalog_url(provider, self.catalog_cap).ok_or(FetchError::Unsupported {
            provider,
            timeframe: Timeframe::default(),
            what: "an instrument listing",
        })?;
        let raw = self.get_json(provider, &url, WEIGHT_EXCHANGE_INFO).await?;
        Ok(filter_listing(provider, &raw, self.catalog_cap))
    }

    #[instrument(skip(self), name = "client::fetch_order_book")]
    async fn fetch_order_book(
        &self,
        provider: ProviderId,
        symbol: &str,
    ) -> FetchResult<OrderBookPressure> {
        if !provider::descriptor(provider).has_order_book {
            return Ok(OrderBookPressure::Unavailable);
        }
        let Some(url) = depth_url(provider, symbol) else {
            return Ok(OrderBookPressure::Unavailable);
        };

        let raw = self.get_json(provider, &url, WEIGHT_DEPTH_100).await?;
        let (bids, asks) = parse_depth(provider, &raw)
            .ok_or_else(|| FetchError::Malformed(format!("no depth in {provider} reply")))?;
        let metrics = OrderBookMetrics::from_levels(&bids, &asks)
            .ok_or_else(|| FetchError::Malformed(format!("empty book for {symbol}")))?;
        Ok(OrderBookPressure::Available(metrics))
    }
}

impl std::fmt::Debug for ExchangeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeClient")
            .field("timeout", &self.timeout)
            .field("candle_limit", &self.candle_limit)
            .field("catalog_cap", &self.catalog_cap)
            .field("deriv_ws", &self.deriv_ws)
            .field("coingecko_api_key", &self.coingecko_api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "coinmarketcap_api_key",
                &self.coinmarketcap_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// URL path without host or query string, for error messages.
fn endpoint_path(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    match without_query.find("://") {
        Some(i) => {
            let rest = &without_query[i + 3..];
            rest.find('/').map_or_else(|| "/".to_string(), |j| rest[j..].to_string())
        }
        None => without_query.to_string(),
    }
}
