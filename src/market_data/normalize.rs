// =============================================================================
// Candle Normalizer — provider responses to oldest-first OHLCV
// =============================================================================
//
// Each venue answers a historical-data request in its own shape. The adapters
// below turn those payloads into a uniform `Vec<Candle>` ordered oldest-first.
//
//   Binance     [[openTime, "o", "h", "l", "c", "v", ...], ...]      oldest-first
//   Bybit       result.list [["t", "o", "h", "l", "c", "v", "turnover"]] newest-first
//   KuCoin      data [["t(s)", "o", "c", "h", "l", "v", "turnover"]]  newest-first
//   Crypto.com  result.data [{t, o, h, l, c, v}]                      oldest-first
//   CoinGecko   prices [[t, p]] + total_volumes [[t, v]]              oldest-first
//   CMC         data.{id}.quote.USD {price, volume_24h}               single quote
//   Deriv       candles [{epoch, open, high, low, close}]             no volume
//
// Numeric fields arrive as JSON strings or numbers depending on the venue; both
// are accepted. A malformed or empty payload yields `None` ("no data for this
// request"), never an error.
// =============================================================================

use anyhow::{Context, Result};
use chrono::DateTime;
use serde_json::Value;
use tracing::debug;

use super::candle::{is_chronological, Candle};
use crate::types::ProviderId;

/// Normalize a raw candle payload from `provider` into oldest-first candles.
///
/// `provider` is the venue that produced the payload (see
/// [`ProviderId::data_backend`]).
pub fn normalize_candles(provider: ProviderId, raw: &Value) -> Option<Vec<Candle>> {
    let parsed = match provider.data_backend() {
        ProviderId::Binance => parse_binance(raw),
        ProviderId::Bybit => parse_bybit(raw),
        ProviderId::Kucoin => parse_kucoin(raw),
        ProviderId::Cryptocom => parse_cryptocom(raw),
        ProviderId::Coingecko => parse_coingecko(raw),
        ProviderId::Coinmarketcap => parse_coinmarketcap_quote(raw),
        p if p.is_deriv() => parse_deriv(raw),
        _ => return None,
    };

    match parsed {
        Ok(mut candles) if !candles.is_empty() => {
            if !is_chronological(&candles) {
                candles.sort_by_key(|c| c.timestamp);
            }
            Some(candles)
        }
        Ok(_) => {
            debug!(provider = %provider, "candle payload was empty");
            None
        }
        Err(e) => {
            debug!(provider = %provider, error = %e, "malformed candle payload");
            None
        }
    }
}

// =============================================================================
// Per-venue adapters
// =============================================================================

fn parse_binance(raw: &Value) -> Result<Vec<Candle>> {
    let rows = raw.as_array().context("klines response is not an array")?;
    rows.iter()
        .map(|row| {
            let arr = row.as_array().context("kline entry is not an array")?;
            anyhow::ensure!(arr.len() >= 6, "kline entry has {} elements", arr.len());
            Ok(Candle::new(
                parse_i64(&arr[0], "openTime")?,
                parse_f64(&arr[1], "open")?,
                parse_f64(&arr[2], "high")?,
                parse_f64(&arr[3], "low")?,
                parse_f64(&arr[4], "close")?,
                parse_f64(&arr[5], "volume")?,
            ))
        })
        .collect()
}

fn parse_bybit(raw: &Value) -> Result<Vec<Candle>> {
    if let Some(code) = raw["retCode"].as_i64() {
        anyhow::ensure!(code == 0, "bybit retCode {code}: {}", raw["retMsg"]);
    }
    let rows = raw["result"]["list"]
        .as_array()
        .context("missing result.list")?;

    let mut candles = rows
        .iter()
        .map(|row| {
            let arr = row.as_array().context("bybit kline entry is not an array")?;
            anyhow::ensure!(arr.len() >= 7, "bybit kline entry has {} elements", arr.len());
            // Volume column is the quote-currency turnover.
            Ok(Candle::new(
                parse_i64(&arr[0], "startTime")?,
                parse_f64(&arr[1], "open")?,
                parse_f64(&arr[2], "high")?,
                parse_f64(&arr[3], "low")?,
                parse_f64(&arr[4], "close")?,
                parse_f64(&arr[6], "turnover")?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    candles.reverse();
    Ok(candles)
}

fn parse_kucoin(raw: &Value) -> Result<Vec<Candle>> {
    if let Some(code) = raw["code"].as_str() {
        anyhow::ensure!(code == "200000", "kucoin code {code}: {}", raw["msg"]);
    }
    let rows = raw["data"].as_array().context("missing data array")?;

    let mut candles = rows
        .iter()
        .map(|row| {
            let arr = row.as_array().context("kucoin candle entry is not an array")?;
            anyhow::ensure!(arr.len() >= 6, "kucoin candle entry has {} elements", arr.len());
            // Column order is time, open, close, high, low, volume.
            Ok(Candle::new(
                seconds_to_ms(parse_i64(&arr[0], "time")?, "time")?,
                parse_f64(&arr[1], "open")?,
                parse_f64(&arr[3], "high")?,
                parse_f64(&arr[4], "low")?,
                parse_f64(&arr[2], "close")?,
                parse_f64(&arr[5], "volume")?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    candles.reverse();
    Ok(candles)
}

fn parse_cryptocom(raw: &Value) -> Result<Vec<Candle>> {
    let rows = raw["result"]["data"]
        .as_array()
        .context("missing result.data")?;
    rows.iter()
        .map(|d| {
            Ok(Candle::new(
                parse_i64(&d["t"], "t")?,
                parse_f64(&d["o"], "o")?,
                parse_f64(&d["h"], "h")?,
                parse_f64(&d["l"], "l")?,
                parse_f64(&d["c"], "c")?,
                parse_f64(&d["v"], "v")?,
            ))
        })
        .collect()
}

/// CoinGecko `market_chart`: price points only, so open = high = low = close.
fn parse_coingecko(raw: &Value) -> Result<Vec<Candle>> {
    let prices = raw["prices"].as_array().context("missing prices")?;
    let volumes = raw["total_volumes"].as_array();

    prices
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let ts = parse_i64(&point[0], "prices[t]")?;
            let price = parse_f64(&point[1], "prices[p]")?;
            let volume = volumes
                .and_then(|v| v.get(i))
                .and_then(|v| v.get(1))
                .and_then(|v| parse_f64(v, "total_volumes[v]").ok());
            Ok(match volume {
                Some(v) => Candle::new(ts, price, price, price, price, v),
                None => Candle::without_volume(ts, price, price, price, price),
            })
        })
        .collect()
}

/// CoinMarketCap free tier: latest quote only, turned into a single candle.
fn parse_coinmarketcap_quote(raw: &Value) -> Result<Vec<Candle>> {
    let data = &raw["data"];
    let coin = match data {
        Value::Object(map) => map.values().next(),
        Value::Array(arr) => arr.first(),
        _ => None,
    }
    .context("missing data entry")?;
    // Symbol lookups return an array per key.
    let coin = coin.as_array().and_then(|a| a.first()).unwrap_or(coin);

    let usd = &coin["quote"]["USD"];
    let price = parse_f64(&usd["price"], "quote.USD.price")?;
    let ts = usd["last_updated"]
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0);

    let candle = match parse_f64(&usd["volume_24h"], "quote.USD.volume_24h") {
        Ok(v) => Candle::new(ts, price, price, price, price, v),
        Err(_) => Candle::without_volume(ts, price, price, price, price),
    };
    Ok(vec![candle])
}

/// Deriv `ticks_history` with `style: candles`. Deriv has no volume feed.
fn parse_deriv(raw: &Value) -> Result<Vec<Candle>> {
    if let Some(err) = raw.get("error") {
        anyhow::bail!("deriv error: {}", err["message"]);
    }
    let rows = raw["candles"].as_array().context("missing candles")?;
    rows.iter()
        .map(|c| {
            Ok(Candle::without_volume(
                seconds_to_ms(parse_i64(&c["epoch"], "epoch")?, "epoch")?,
                parse_f64(&c["open"], "open")?,
                parse_f64(&c["high"], "high")?,
                parse_f64(&c["low"], "low")?,
                parse_f64(&c["close"], "close")?,
            ))
        })
        .collect()
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Parse a JSON value that may be either a string or a number into `f64`.
pub(crate) fn parse_f64(val: &Value, name: &str) -> Result<f64> {
    let v = match val {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .with_context(|| format!("failed to parse {name} as f64: {s}"))?,
        Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("field {name} is not a valid f64"))?,
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    };
    anyhow::ensure!(v.is_finite(), "field {name} is not finite");
    Ok(v)
}

/// Venue epoch seconds to milliseconds; out-of-range values are malformed.
fn seconds_to_ms(secs: i64, name: &str) -> Result<i64> {
    secs.checked_mul(1000)
        .with_context(|| format!("field {name} timestamp out of range: {secs}"))
}

/// Parse an integer timestamp encoded as a number, a float, or a string.
fn parse_i64(val: &Value, name: &str) -> Result<i64> {
    match val {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .with_context(|| format!("field {name} is not an integer")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .with_context(|| format!("failed to parse {name} as i64: {s}")),
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    }
}
