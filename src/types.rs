// =============================================================================
// Shared types used across the momentum scanner
// =============================================================================

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every exchange / data vendor the scanner knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Binance,
    Bybit,
    Kucoin,
    Cryptocom,
    Coingecko,
    Coinmarketcap,
    Deriv,
    DerivForex,
    DerivStocks,
    DerivStockIndices,
    DerivCommodity,
    DerivEtfs,
    L1s,
    Meme,
}

impl ProviderId {
    pub const ALL: [ProviderId; 14] = [
        Self::Binance,
        Self::Bybit,
        Self::Kucoin,
        Self::Cryptocom,
        Self::Coingecko,
        Self::Coinmarketcap,
        Self::Deriv,
        Self::DerivForex,
        Self::DerivStocks,
        Self::DerivStockIndices,
        Self::DerivCommodity,
        Self::DerivEtfs,
        Self::L1s,
        Self::Meme,
    ];

    /// Stable lowercase identifier (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::Bybit => "bybit",
            Self::Kucoin => "kucoin",
            Self::Cryptocom => "cryptocom",
            Self::Coingecko => "coingecko",
            Self::Coinmarketcap => "coinmarketcap",
            Self::Deriv => "deriv",
            Self::DerivForex => "derivforex",
            Self::DerivStocks => "derivstocks",
            Self::DerivStockIndices => "derivstockindices",
            Self::DerivCommodity => "derivcommodity",
            Self::DerivEtfs => "derivetfs",
            Self::L1s => "l1s",
            Self::Meme => "meme",
        }
    }

    /// True for every Deriv instrument family (served over the Deriv WebSocket).
    pub fn is_deriv(&self) -> bool {
        matches!(
            self,
            Self::Deriv
                | Self::DerivForex
                | Self::DerivStocks
                | Self::DerivStockIndices
                | Self::DerivCommodity
                | Self::DerivEtfs
        )
    }

    /// The provider whose endpoints actually serve this provider's data.
    ///
    /// The curated L1S and Meme lists are quoted through CoinMarketCap.
    pub fn data_backend(&self) -> ProviderId {
        match self {
            Self::L1s | Self::Meme => Self::Coinmarketcap,
            other => *other,
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| anyhow::anyhow!("unknown provider '{s}'"))
    }
}

/// Candle interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "1d")]
    D1,
}

/// Timeframes that get their own RSI column on every record.
pub const RSI_TIMEFRAMES: [Timeframe; 6] = [
    Timeframe::M5,
    Timeframe::M15,
    Timeframe::M30,
    Timeframe::H1,
    Timeframe::H4,
    Timeframe::D1,
];

/// Timeframes shown in the single-instrument detail table.
pub const PAIR_DETAIL_TIMEFRAMES: [Timeframe; 7] = [
    Timeframe::M1,
    Timeframe::M5,
    Timeframe::M15,
    Timeframe::M30,
    Timeframe::H4,
    Timeframe::H12,
    Timeframe::D1,
];

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::H12 => "12h",
            Self::D1 => "1d",
        }
    }

    /// Interval length in seconds.
    pub fn seconds(&self) -> u64 {
        match self {
            Self::M1 => 60,
            Self::M5 => 300,
            Self::M15 => 900,
            Self::M30 => 1_800,
            Self::H1 => 3_600,
            Self::H4 => 14_400,
            Self::H12 => 43_200,
            Self::D1 => 86_400,
        }
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::H4
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(Self::M1),
            "5m" => Ok(Self::M5),
            "15m" => Ok(Self::M15),
            "30m" => Ok(Self::M30),
            "1h" => Ok(Self::H1),
            "4h" => Ok(Self::H4),
            "12h" => Ok(Self::H12),
            "1d" => Ok(Self::D1),
            other => anyhow::bail!("unknown timeframe '{other}'"),
        }
    }
}

/// Ordering direction for the sort utilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

/// Classic oscillator zones used to colour RSI-like values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl std::fmt::Display for RsiZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "OVERBOUGHT"),
            Self::Oversold => write!(f, "OVERSOLD"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_roundtrips_through_str() {
        for p in ProviderId::ALL {
            assert_eq!(p.as_str().parse::<ProviderId>().unwrap(), p);
        }
        assert!("nasdaq".parse::<ProviderId>().is_err());
    }

    #[test]
    fn curated_lists_are_served_by_coinmarketcap() {
        assert_eq!(ProviderId::L1s.data_backend(), ProviderId::Coinmarketcap);
        assert_eq!(ProviderId::Meme.data_backend(), ProviderId::Coinmarketcap);
        assert_eq!(ProviderId::Binance.data_backend(), ProviderId::Binance);
    }

    #[test]
    fn timeframe_serde_uses_short_names() {
        let json = serde_json::to_string(&Timeframe::H4).unwrap();
        assert_eq!(json, "\"4h\"");
        let tf: Timeframe = serde_json::from_str("\"15m\"").unwrap();
        assert_eq!(tf, Timeframe::M15);
        assert_eq!("1d".parse::<Timeframe>().unwrap(), Timeframe::D1);
    }
}
