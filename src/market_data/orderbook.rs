// =============================================================================
// Order Book Pressure — buyer / seller balance from a depth snapshot
// =============================================================================
//
// For one depth snapshot:
//   buyer%  = bid quantity / (bid + ask quantity) * 100
//   weight  = 50 + (side notional / total notional - 0.5) * 100
//
// Venues without a genuine depth feed report `Unavailable` instead of a
// fabricated book.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::normalize::parse_f64;
use crate::types::ProviderId;

/// One price level: (price, quantity).
pub type Level = (f64, f64);

/// Aggregated buyer / seller metrics for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookMetrics {
    pub buyer_percentage: f64,
    pub seller_percentage: f64,
    pub buyer_volume: f64,
    pub seller_volume: f64,
    pub buyer_amount: f64,
    pub seller_amount: f64,
    pub buyer_weight: f64,
    pub seller_weight: f64,
    pub total_bids: usize,
    pub total_asks: usize,
}

/// Result of an order-book request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OrderBookPressure {
    Available(OrderBookMetrics),
    /// The venue publishes no depth for this instrument.
    Unavailable,
}

impl OrderBookMetrics {
    /// Aggregate the given levels. `None` if either side is empty or the book
    /// carries no quantity.
    pub fn from_levels(bids: &[Level], asks: &[Level]) -> Option<Self> {
        if bids.is_empty() || asks.is_empty() {
            return None;
        }

        let buyer_volume: f64 = bids.iter().map(|(_, q)| q).sum();
        let seller_volume: f64 = asks.iter().map(|(_, q)| q).sum();
        let buyer_amount: f64 = bids.iter().map(|(p, q)| p * q).sum();
        let seller_amount: f64 = asks.iter().map(|(p, q)| p * q).sum();

        let total_volume = buyer_volume + seller_volume;
        let total_amount = buyer_amount + seller_amount;
        if total_volume <= 0.0 || total_amount <= 0.0 {
            return None;
        }

        Some(Self {
            buyer_percentage: buyer_volume / total_volume * 100.0,
            seller_percentage: seller_volume / total_volume * 100.0,
            buyer_volume,
            seller_volume,
            buyer_amount,
            seller_amount,
            buyer_weight: 50.0 + (buyer_amount / total_amount - 0.5) * 100.0,
            seller_weight: 50.0 + (seller_amount / total_amount - 0.5) * 100.0,
            total_bids: bids.len(),
            total_asks: asks.len(),
        })
    }
}

/// Parse a raw depth payload from `provider` into `(bids, asks)`.
///
/// Returns `None` for malformed payloads and for venues with no depth format.
pub fn parse_depth(provider: ProviderId, raw: &Value) -> Option<(Vec<Level>, Vec<Level>)> {
    let book = match provider.data_backend() {
        ProviderId::Binance => Some((&raw["bids"], &raw["asks"])),
        ProviderId::Bybit => Some((&raw["result"]["b"], &raw["result"]["a"])),
        ProviderId::Kucoin => Some((&raw["data"]["bids"], &raw["data"]["asks"])),
        ProviderId::Cryptocom => {
            let first = &raw["result"]["data"][0];
            Some((&first["bids"], &first["asks"]))
        }
        _ => None,
    }?;

    match (parse_levels(book.0), parse_levels(book.1)) {
        (Ok(bids), Ok(asks)) => Some((bids, asks)),
        (Err(e), _) | (_, Err(e)) => {
            debug!(provider = %provider, error = %e, "malformed depth payload");
            None
        }
    }
}

/// Parse `[[price, qty, ...], ...]` where numbers may be strings.
fn parse_levels(val: &Value) -> Result<Vec<Level>> {
    val.as_array()
        .context("depth side is not an array")?
        .iter()
        .map(|level| {
            let price = parse_f64(&level[0], "level price")?;
            let qty = parse_f64(&level[1], "level quantity")?;
            Ok((price, qty))
        })
        .collect()
}
