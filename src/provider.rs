// =============================================================================
// Provider Descriptors — static per-venue configuration
// =============================================================================
//
// Read-only table describing how each venue is scanned: display name, batch
// sizing, retry policy, interval naming and endpoint templates. Defined once at
// compile time and never mutated.
// =============================================================================

use std::time::Duration;

use crate::types::{ProviderId, Timeframe};

pub const BINANCE_API: &str = "https://api.binance.com";
pub const BYBIT_API: &str = "https://api.bybit.com";
pub const KUCOIN_API: &str = "https://api.kucoin.com";
pub const CRYPTOCOM_API: &str = "https://api.crypto.com/exchange/v1";
pub const COINGECKO_API: &str = "https://api.coingecko.com/api/v3";
pub const COINMARKETCAP_API: &str = "https://pro-api.coinmarketcap.com";
pub const DERIV_WS: &str = "wss://ws.derivws.com/websockets/v3?app_id=1089";

/// Static scan policy for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    pub name: &'static str,
    /// Symbols fetched concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches (zero for venues with generous limits).
    pub inter_batch_delay: Duration,
    /// Retry a short base-timeframe fetch once after `retry_backoff`.
    pub retry_short_fetch: bool,
    pub retry_backoff: Duration,
    /// Base-timeframe candles required before a record is produced.
    pub min_base_candles: usize,
    /// Whether the venue serves a real depth snapshot.
    pub has_order_book: bool,
}

const fn exchange(id: ProviderId, name: &'static str) -> ProviderDescriptor {
    ProviderDescriptor {
        id,
        name,
        batch_size: 5,
        inter_batch_delay: Duration::ZERO,
        retry_short_fetch: false,
        retry_backoff: Duration::ZERO,
        min_base_candles: 14,
        has_order_book: true,
    }
}

const fn deriv(id: ProviderId, name: &'static str) -> ProviderDescriptor {
    ProviderDescriptor {
        has_order_book: false,
        ..exchange(id, name)
    }
}

const fn quote_only(id: ProviderId, name: &'static str) -> ProviderDescriptor {
    ProviderDescriptor {
        id,
        name,
        batch_size: 3,
        inter_batch_delay: Duration::from_millis(300),
        retry_short_fetch: true,
        retry_backoff: Duration::from_millis(500),
        min_base_candles: 1,
        has_order_book: false,
    }
}

static DESCRIPTORS: [ProviderDescriptor; 14] = [
    exchange(ProviderId::Binance, "Binance"),
    exchange(ProviderId::Bybit, "Bybit"),
    exchange(ProviderId::Kucoin, "KuCoin"),
    exchange(ProviderId::Cryptocom, "Crypto.com"),
    ProviderDescriptor {
        has_order_book: false,
        ..exchange(ProviderId::Coingecko, "CoinGecko")
    },
    ProviderDescriptor {
        retry_short_fetch: false,
        ..quote_only(ProviderId::Coinmarketcap, "CoinMarketCap")
    },
    deriv(ProviderId::Deriv, "Deriv Synthetic"),
    deriv(ProviderId::DerivForex, "Deriv Forex"),
    deriv(ProviderId::DerivStocks, "Deriv Stocks"),
    deriv(ProviderId::DerivStockIndices, "Deriv Stock Indices"),
    deriv(ProviderId::DerivCommodity, "Deriv Commodity"),
    deriv(ProviderId::DerivEtfs, "Deriv ETFs"),
    quote_only(ProviderId::L1s, "L1S Pairs"),
    quote_only(ProviderId::Meme, "Meme Pairs"),
];

/// Look up the static descriptor for `id`.
pub fn descriptor(id: ProviderId) -> &'static ProviderDescriptor {
    DESCRIPTORS
        .iter()
        .find(|d| d.id == id)
        .unwrap_or(&DESCRIPTORS[0])
}

// =============================================================================
// Interval naming
// =============================================================================

/// Venue-specific interval parameter for `tf`.
///
/// `None` when the venue's candle endpoint is not interval-based
/// (CoinMarketCap quotes).
pub fn interval_param(provider: ProviderId, tf: Timeframe) -> Option<String> {
    use Timeframe::*;
    let p = provider.data_backend();
    let name = match p {
        ProviderId::Binance => tf.as_str().to_string(),
        ProviderId::Bybit => match tf {
            M1 => "1",
            M5 => "5",
            M15 => "15",
            M30 => "30",
            H1 => "60",
            H4 => "240",
            H12 => "720",
            D1 => "D",
        }
        .to_string(),
        ProviderId::Kucoin => match tf {
            M1 => "1min",
            M5 => "5min",
            M15 => "15min",
            M30 => "30min",
            H1 => "1hour",
            H4 => "4hour",
            H12 => "12hour",
            D1 => "1day",
        }
        .to_string(),
        ProviderId::Cryptocom => match tf {
            D1 => "1D".to_string(),
            other => other.as_str().to_string(),
        },
        // `market_chart` takes a day range; the venue picks the granularity.
        ProviderId::Coingecko => match tf {
            D1 => "100",
            H4 | H12 => "20",
            _ => "7",
        }
        .to_string(),
        ProviderId::Coinmarketcap => return None,
        _ if p.is_deriv() => tf.seconds().to_string(),
        _ => return None,
    };
    Some(name)
}

// =============================================================================
// Endpoint templates
// =============================================================================

/// REST URL for a candle request. Deriv is served over WebSocket and returns
/// `None` here.
pub fn candles_url(provider: ProviderId, symbol: &str, tf: Timeframe, limit: u32) -> Option<String> {
    let interval = interval_param(provider, tf);
    let url = match provider.data_backend() {
        ProviderId::Binance => format!(
            "{BINANCE_API}/api/v3/klines?symbol={symbol}&interval={}&limit={limit}",
            interval?
        ),
        ProviderId::Bybit => format!(
            "{BYBIT_API}/v5/market/kline?category=spot&symbol={symbol}&interval={}&limit={limit}",
            interval?
        ),
        ProviderId::Kucoin => format!(
            "{KUCOIN_API}/api/v1/market/candles?type={}&symbol={symbol}",
            interval?
        ),
        ProviderId::Cryptocom => format!(
            "{CRYPTOCOM_API}/public/get-candlestick?instrument_name={symbol}&timeframe={}",
            interval?
        ),
        ProviderId::Coingecko => format!(
            "{COINGECKO_API}/coins/{symbol}/market_chart?vs_currency=usd&days={}",
            interval?
        ),
        ProviderId::Coinmarketcap => format!(
            "{COINMARKETCAP_API}/v2/cryptocurrency/quotes/latest?slug={symbol}"
        ),
        _ => return None,
    };
    Some(url)
}

/// REST URL listing the venue's instruments. `None` for static catalogs.
pub fn catalog_url(provider: ProviderId, cap: usize) -> Option<String> {
    let url = match provider {
        ProviderId::Binance => format!("{BINANCE_API}/api/v3/exchangeInfo"),
        ProviderId::Bybit => format!("{BYBIT_API}/v5/market/instruments-info?category=spot"),
        ProviderId::Kucoin => format!("{KUCOIN_API}/api/v1/symbols"),
        ProviderId::Cryptocom => format!("{CRYPTOCOM_API}/public/get-instruments"),
        ProviderId::Coingecko => format!(
            "{COINGECKO_API}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={cap}&page=1"
        ),
        ProviderId::Coinmarketcap => format!(
            "{COINMARKETCAP_API}/v1/cryptocurrency/listings/latest?limit={cap}"
        ),
        _ => return None,
    };
    Some(url)
}

/// REST URL for a depth snapshot. `None` where the venue has no book.
pub fn depth_url(provider: ProviderId, symbol: &str) -> Option<String> {
    let url = match provider {
        ProviderId::Binance => format!("{BINANCE_API}/api/v3/depth?symbol={symbol}&limit=100"),
        ProviderId::Bybit => format!(
            "{BYBIT_API}/v5/market/orderbook?category=spot&symbol={symbol}&limit=50"
        ),
        ProviderId::Kucoin => format!(
            "{KUCOIN_API}/api/v1/market/orderbook/level2_100?symbol={symbol}"
        ),
        ProviderId::Cryptocom => format!(
            "{CRYPTOCOM_API}/public/get-book?instrument_name={symbol}&depth=50"
        ),
        _ => return None,
    };
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_provider_has_a_descriptor() {
        for id in ProviderId::ALL {
            let d = descriptor(id);
            assert_eq!(d.id, id);
            assert!(d.batch_size >= 3 && d.batch_size <= 10);
        }
    }

    #[test]
    fn quote_only_lists_are_throttled_and_retried() {
        let d = descriptor(ProviderId::Meme);
        assert_eq!(d.batch_size, 3);
        assert_eq!(d.inter_batch_delay, Duration::from_millis(300));
        assert!(d.retry_short_fetch);
        assert!(!descriptor(ProviderId::Binance).retry_short_fetch);
    }

    #[test]
    fn interval_names_follow_each_venue() {
        assert_eq!(interval_param(ProviderId::Bybit, Timeframe::H4).as_deref(), Some("240"));
        assert_eq!(interval_param(ProviderId::Bybit, Timeframe::D1).as_deref(), Some("D"));
        assert_eq!(interval_param(ProviderId::Kucoin, Timeframe::H1).as_deref(), Some("1hour"));
        assert_eq!(interval_param(ProviderId::Cryptocom, Timeframe::D1).as_deref(), Some("1D"));
        assert_eq!(interval_param(ProviderId::Coingecko, Timeframe::H4).as_deref(), Some("20"));
        assert_eq!(interval_param(ProviderId::DerivForex, Timeframe::H4).as_deref(), Some("14400"));
        assert_eq!(interval_param(ProviderId::Meme, Timeframe::H4), None);
    }

    #[test]
    fn candle_urls() {
        assert_eq!(
            candles_url(ProviderId::Binance, "BTCUSDT", Timeframe::M15, 100).unwrap(),
            "https://api.binance.com/api/v3/klines?symbol=BTCUSDT&interval=15m&limit=100"
        );
        assert!(candles_url(ProviderId::L1s, "btc", Timeframe::H4, 100)
            .unwrap()
            .ends_with("quotes/latest?slug=btc"));
        assert!(candles_url(ProviderId::Deriv, "R_10", Timeframe::H4, 100).is_none());
    }

    #[test]
    fn depth_only_for_real_books() {
        assert!(depth_url(ProviderId::Kucoin, "BTC-USDT").is_some());
        assert!(depth_url(ProviderId::Deriv, "R_10").is_none());
        assert!(catalog_url(ProviderId::DerivEtfs, 100).is_none());
    }
}
