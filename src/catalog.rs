// =============================================================================
// Symbol Catalog Resolver
// =============================================================================
//
// Produces the list of tradable instrument identifiers to scan for a provider:
//
//   Binance     exchangeInfo.symbols     status == "TRADING", ends with "USDT"
//   Bybit       result.list              status == "Trading", ends with "USDT"
//   KuCoin      data                     enableTrading,       ends with "-USDT"
//   Crypto.com  result.data              tradable,            ends with "_USDT"
//   CoinGecko   [ {id} ]                 top by market cap
//   CMC         data [ {slug} ]          latest listings
//   Deriv *     fixed tables
//   L1S / Meme  fixed pair lists, mapped to CoinMarketCap slugs
//
// Every catalog is truncated to `cap` entries to bound scan cost.
// =============================================================================

use serde_json::Value;
use tracing::{debug, warn};

use crate::types::ProviderId;

/// Default catalog cap.
pub const DEFAULT_CATALOG_CAP: usize = 100;

// =============================================================================
// Static catalogs
// =============================================================================

pub const DERIV_SYNTHETIC_INDICES: &[(&str, &str)] = &[
    ("R_10", "Volatility 10 Index"),
    ("R_25", "Volatility 25 Index"),
    ("R_50", "Volatility 50 Index"),
    ("R_75", "Volatility 75 Index"),
    ("R_100", "Volatility 100 Index"),
    ("1HZ10V", "Volatility 10 (1s) Index"),
    ("1HZ25V", "Volatility 25 (1s) Index"),
    ("1HZ50V", "Volatility 50 (1s) Index"),
    ("1HZ75V", "Volatility 75 (1s) Index"),
    ("1HZ100V", "Volatility 100 (1s) Index"),
    ("BOOM300N", "Boom 300 Index"),
    ("BOOM500", "Boom 500 Index"),
    ("BOOM1000", "Boom 1000 Index"),
    ("CRASH300N", "Crash 300 Index"),
    ("CRASH500", "Crash 500 Index"),
    ("CRASH1000", "Crash 1000 Index"),
    ("JD10", "Jump 10 Index"),
    ("JD25", "Jump 25 Index"),
    ("JD50", "Jump 50 Index"),
    ("JD75", "Jump 75 Index"),
    ("JD100", "Jump 100 Index"),
    ("stpRNG", "Step Index"),
    ("RDBEAR", "Bear Market Index"),
    ("RDBULL", "Bull Market Index"),
];

pub const DERIV_FOREX: &[(&str, &str)] = &[
    ("frxAUDCAD", "AUD/CAD"),
    ("frxAUDCHF", "AUD/CHF"),
    ("frxAUDJPY", "AUD/JPY"),
    ("frxAUDNZD", "AUD/NZD"),
    ("frxAUDUSD", "AUD/USD"),
    ("frxEURAUD", "EUR/AUD"),
    ("frxEURCAD", "EUR/CAD"),
    ("frxEURCHF", "EUR/CHF"),
    ("frxEURGBP", "EUR/GBP"),
    ("frxEURJPY", "EUR/JPY"),
    ("frxEURNZD", "EUR/NZD"),
    ("frxEURUSD", "EUR/USD"),
    ("frxGBPAUD", "GBP/AUD"),
    ("frxGBPCAD", "GBP/CAD"),
    ("frxGBPCHF", "GBP/CHF"),
    ("frxGBPJPY", "GBP/JPY"),
    ("frxGBPNZD", "GBP/NZD"),
    ("frxGBPUSD", "GBP/USD"),
    ("frxNZDJPY", "NZD/JPY"),
    ("frxNZDUSD", "NZD/USD"),
    ("frxUSDCAD", "USD/CAD"),
    ("frxUSDCHF", "USD/CHF"),
    ("frxUSDJPY", "USD/JPY"),
    ("frxUSDMXN", "USD/MXN"),
    ("frxUSDNOK", "USD/NOK"),
    ("frxUSDSEK", "USD/SEK"),
];

pub const DERIV_STOCKS: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc"),
    ("AMZN", "Amazon"),
    ("GOOGL", "Alphabet"),
    ("META", "Meta Platforms"),
    ("MSFT", "Microsoft"),
    ("NFLX", "Netflix"),
    ("NVDA", "NVIDIA"),
    ("TSLA", "Tesla"),
    ("BA", "Boeing"),
    ("DIS", "Walt Disney"),
    ("IBM", "IBM"),
    ("INTC", "Intel"),
    ("PFE", "Pfizer"),
    ("PYPL", "PayPal"),
    ("V", "Visa"),
];

pub const DERIV_STOCK_INDICES: &[(&str, &str)] = &[
    ("OTC_AS51", "Australia 200"),
    ("OTC_DJI", "Wall Street 30"),
    ("OTC_FCHI", "France 40"),
    ("OTC_FTSE", "UK 100"),
    ("OTC_GDAXI", "Germany 40"),
    ("OTC_HSI", "Hong Kong 50"),
    ("OTC_N225", "Japan 225"),
    ("OTC_NDX", "US Tech 100"),
    ("OTC_SPC", "US 500"),
    ("OTC_SSMI", "Swiss 20"),
];

pub const DERIV_COMMODITIES: &[(&str, &str)] = &[
    ("frxXAUUSD", "Gold/USD"),
    ("frxXAGUSD", "Silver/USD"),
    ("frxXPDUSD", "Palladium/USD"),
    ("frxXPTUSD", "Platinum/USD"),
    ("WLDOIL", "Oil/USD"),
];

pub const DERIV_ETFS: &[(&str, &str)] = &[
    ("SPY", "SPDR S&P 500 ETF"),
    ("QQQ", "Invesco QQQ Trust"),
    ("IWM", "iShares Russell 2000"),
    ("EEM", "iShares MSCI Emerging Markets"),
    ("GLD", "SPDR Gold Shares"),
    ("SLV", "iShares Silver Trust"),
    ("USO", "United States Oil Fund"),
    ("VXX", "iPath Series B S&P 500 VIX"),
];

pub const L1S_PAIRS: &[&str] = &[
    "BTC/USDT", "ETH/USDT", "XRP/USDT", "SOL/USDT", "XLM/USDT", "BNB/USDT", "DOGE/USDT",
];

pub const MEME_PAIRS: &[&str] = &[
    "PEPE/USDT", "SUI/USDT", "FARTCOIN/USDT", "PIEVERSE/USDT", "AVAX/USDT", "LINK/USDT",
    "ADA/USDT", "WLD/USDT", "LTC/USDT", "HYPE/USDT", "ENA/USDT", "H/USDT", "WIF/USDT",
    "NEAR/USDT", "BCH/USDT", "UNI/USDT", "GALA/USDT", "WLFI/USDT", "ASTER/USDT", "AAVE/USDT",
    "PENGU/USDT", "TRUMP/USDT", "MON/USDT", "DOT/USDT", "FIL/USDT", "ARB/USDT", "FET/USDT",
    "LDO/USDT", "PUMP/USDT", "ICP/USDT", "CRV/USDT", "SHIB/USDT", "TRX/USDT", "OP/USDT",
    "VIRTUAL/USDT", "RESOLV/USDT", "TON/USDT", "CFX/USDT", "APE/USDT", "PNUT/USDT",
    "ONDO/USDT", "HBAR/USDT", "EIGEN/USDT", "STRK/USDT", "PEOPLE/USDT", "ORDI/USDT",
    "TIA/USDT", "MOODENG/USDT", "TURBO/USDT", "SEI/USDT", "KAS/USDT", "ETHFI/USDT",
    "DYDX/USDT", "AR/USDT", "TRB/USDT", "POL/USDT", "ATOM/USDT", "IP/USDT", "SPX/USDT",
    "CAKE/USDT", "COAI/USDT", "CRO/USDT", "OM/USDT", "POPCAT/USDT", "SUSHI/USDT",
    "BOME/USDT", "SAND/USDT", "VINE/USDT", "LPT/USDT", "HUMA/USDT", "KAITO/USDT",
    "SOON/USDT", "BSV/USDT", "KAIA/USDT", "AXS/USDT", "GOAT/USDT", "THETA/USDT",
    "FLOCK/USDT", "WCT/USDT", "ANIME/USDT", "ZBCN/USDT", "SYRUP/USDT", "JCT/USDT",
    "SPK/USDT", "CETUS/USDT", "USUAL/USDT", "XPIN/USDT", "KERNEL/USDT", "TOSHI/USDT",
    "COOKIE/USDT",
];

/// (symbol, display name) table for a Deriv family.
fn deriv_table(provider: ProviderId) -> Option<&'static [(&'static str, &'static str)]> {
    match provider {
        ProviderId::Deriv => Some(DERIV_SYNTHETIC_INDICES),
        ProviderId::DerivForex => Some(DERIV_FOREX),
        ProviderId::DerivStocks => Some(DERIV_STOCKS),
        ProviderId::DerivStockIndices => Some(DERIV_STOCK_INDICES),
        ProviderId::DerivCommodity => Some(DERIV_COMMODITIES),
        ProviderId::DerivEtfs => Some(DERIV_ETFS),
        _ => None,
    }
}

/// Turn `"BTC/USDT"` into the CoinMarketCap slug `"btc"`.
fn pair_to_slug(pair: &str) -> String {
    pair.replace("/USDT", "").to_lowercase()
}

/// Catalog for providers whose instrument list is fixed. `None` for providers
/// that must be queried over the network.
pub fn static_catalog(provider: ProviderId, cap: usize) -> Option<Vec<String>> {
    let symbols: Vec<String> = if let Some(table) = deriv_table(provider) {
        table.iter().map(|(s, _)| s.to_string()).collect()
    } else {
        match provider {
            ProviderId::L1s => L1S_PAIRS.iter().map(|p| pair_to_slug(p)).collect(),
            ProviderId::Meme => MEME_PAIRS.iter().map(|p| pair_to_slug(p)).collect(),
            _ => return None,
        }
    };
    Some(symbols.into_iter().take(cap).collect())
}

// =============================================================================
// Listing filters
// =============================================================================

/// Filter a raw instrument listing from `provider` down to scannable symbols.
///
/// A payload in an unexpected shape yields an empty catalog.
pub fn filter_listing(provider: ProviderId, raw: &Value, cap: usize) -> Vec<String> {
    let entries = match provider {
        ProviderId::Binance => raw["symbols"].as_array(),
        ProviderId::Bybit => raw["result"]["list"].as_array(),
        ProviderId::Kucoin => raw["data"].as_array(),
        ProviderId::Cryptocom => raw["result"]["data"].as_array(),
        ProviderId::Coingecko => raw.as_array(),
        ProviderId::Coinmarketcap => raw["data"].as_array(),
        _ => None,
    };

    let Some(entries) = entries else {
        warn!(provider = %provider, "instrument listing has unexpected shape");
        return Vec::new();
    };

    let pick = |e: &Value| -> Option<String> {
        let symbol = e["symbol"].as_str();
        let picked = match provider {
            ProviderId::Binance => (e["status"].as_str() == Some("TRADING"))
                .then_some(symbol?)
                .filter(|s| s.ends_with("USDT")),
            ProviderId::Bybit => (e["status"].as_str() == Some("Trading"))
                .then_some(symbol?)
                .filter(|s| s.ends_with("USDT")),
            ProviderId::Kucoin => (e["enableTrading"].as_bool() == Some(true))
                .then_some(symbol?)
                .filter(|s| s.ends_with("-USDT")),
            ProviderId::Cryptocom => (e["tradable"].as_bool() == Some(true))
                .then_some(symbol?)
                .filter(|s| s.ends_with("_USDT")),
            ProviderId::Coingecko => e["id"].as_str(),
            ProviderId::Coinmarketcap => e["slug"].as_str(),
            _ => None,
        };
        picked.map(str::to_string)
    };

    let symbols: Vec<String> = entries.iter().filter_map(pick).take(cap).collect();
    debug!(provider = %provider, listed = entries.len(), kept = symbols.len(), "catalog filtered");
    symbols
}

// =============================================================================
// Display formatting
// =============================================================================

/// Human-facing symbol for a venue identifier, e.g. `BTCUSDT` => `BTC/USDT`.
pub fn display_symbol(provider: ProviderId, symbol: &str) -> String {
    if let Some(table) = deriv_table(provider) {
        return table
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| symbol.to_string());
    }

    match provider {
        ProviderId::Binance | ProviderId::Bybit => match symbol.strip_suffix("USDT") {
            Some(base) => format!("{base}/USDT"),
            None => symbol.to_string(),
        },
        ProviderId::Kucoin => symbol.replacen('-', "/", 1),
        ProviderId::Cryptocom => symbol.replacen('_', "/", 1),
        ProviderId::Coingecko | ProviderId::Coinmarketcap => {
            format!("{}/USD", symbol.to_uppercase())
        }
        ProviderId::L1s | ProviderId::Meme => format!("{}/USDT", symbol.to_uppercase()),
        _ => symbol.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn binance_listing_filters_status_and_quote() {
        let raw = json!({ "symbols": [
            { "symbol": "BTCUSDT", "status": "TRADING" },
            { "symbol": "ETHBTC", "status": "TRADING" },
            { "symbol": "LUNAUSDT", "status": "BREAK" },
            { "symbol": "SOLUSDT", "status": "TRADING" }
        ]});
        assert_eq!(filter_listing(ProviderId::Binance, &raw, 100), vec!["BTCUSDT", "SOLUSDT"]);
    }

    #[test]
    fn kucoin_and_cryptocom_use_separators() {
        let kucoin = json!({ "data": [
            { "symbol": "BTC-USDT", "enableTrading": true },
            { "symbol": "BTC-USDC", "enableTrading": true },
            { "symbol": "ETH-USDT", "enableTrading": false }
        ]});
        assert_eq!(filter_listing(ProviderId::Kucoin, &kucoin, 100), vec!["BTC-USDT"]);

        let cdc = json!({ "result": { "data": [
            { "symbol": "BTC_USDT", "tradable": true },
            { "symbol": "BTCUSD-PERP", "tradable": true }
        ]}});
        assert_eq!(filter_listing(ProviderId::Cryptocom, &cdc, 100), vec!["BTC_USDT"]);
    }

    #[test]
    fn listing_is_capped() {
        let entries: Vec<Value> = (0..250)
            .map(|i| json!({ "symbol": format!("C{i}USDT"), "status": "Trading" }))
            .collect();
        let raw = json!({ "result": { "list": entries } });
        let symbols = filter_listing(ProviderId::Bybit, &raw, DEFAULT_CATALOG_CAP);
        assert_eq!(symbols.len(), 100);
        assert_eq!(symbols[0], "C0USDT");
    }

    #[test]
    fn unexpected_shape_is_empty() {
        assert!(filter_listing(ProviderId::Binance, &json!({ "code": -1 }), 100).is_empty());
        assert!(filter_listing(ProviderId::Coingecko, &json!({ "status": "error" }), 100).is_empty());
    }

    #[test]
    fn aggregators_use_ids_and_slugs() {
        let cg = json!([{ "id": "bitcoin" }, { "id": "ethereum" }]);
        assert_eq!(filter_listing(ProviderId::Coingecko, &cg, 100), vec!["bitcoin", "ethereum"]);
        let cmc = json!({ "data": [{ "slug": "bitcoin", "symbol": "BTC" }] });
        assert_eq!(filter_listing(ProviderId::Coinmarketcap, &cmc, 100), vec!["bitcoin"]);
    }

    #[test]
    fn static_catalogs() {
        assert_eq!(static_catalog(ProviderId::Deriv, 100).unwrap().len(), 24);
        assert_eq!(static_catalog(ProviderId::L1s, 100).unwrap()[0], "btc");
        assert_eq!(static_catalog(ProviderId::Meme, 100).unwrap().len(), 90);
        assert_eq!(static_catalog(ProviderId::Meme, 10).unwrap().len(), 10);
        assert!(static_catalog(ProviderId::Binance, 100).is_none());
    }

    #[test]
    fn display_symbols() {
        assert_eq!(display_symbol(ProviderId::Binance, "BTCUSDT"), "BTC/USDT");
        assert_eq!(display_symbol(ProviderId::Kucoin, "BTC-USDT"), "BTC/USDT");
        assert_eq!(display_symbol(ProviderId::Cryptocom, "ETH_USDT"), "ETH/USDT");
        assert_eq!(display_symbol(ProviderId::Coingecko, "bitcoin"), "BITCOIN/USD");
        assert_eq!(display_symbol(ProviderId::Meme, "pepe"), "PEPE/USDT");
        assert_eq!(display_symbol(ProviderId::Deriv, "R_75"), "Volatility 75 Index");
        assert_eq!(display_symbol(ProviderId::DerivStocks, "ZZZ"), "ZZZ");
    }
}
