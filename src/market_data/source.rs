use async_trait::async_trait;

use super::candle::Candle;
use super::orderbook::OrderBookPressure;
use crate::error::FetchResult;
use crate::types::{ProviderId, Timeframe};

/// Provider-keyed market data access consumed by the scan orchestrator.
///
/// Implementations return normalized, oldest-first candles. The live
/// implementation is [`ExchangeClient`](super::client::ExchangeClient); tests
/// substitute in-memory sources.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Historical candles for `symbol` on `timeframe`.
    async fn fetch_candles(
        &self,
        provider: ProviderId,
        symbol: &str,
        timeframe: Timeframe,
    ) -> FetchResult<Vec<Candle>>;

    /// Scannable instrument identifiers for `provider`, already filtered and
    /// capped.
    async fn fetch_symbol_catalog(&self, provider: ProviderId) -> FetchResult<Vec<String>>;

    /// Depth-derived buyer / seller pressure for `symbol`.
    async fn fetch_order_book(
        &self,
        provider: ProviderId,
        symbol: &str,
    ) -> FetchResult<OrderBookPressure>;
}
