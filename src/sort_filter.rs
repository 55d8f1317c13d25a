// =============================================================================
// Sort / Filter — ordering and narrowing the scan result table
// =============================================================================
//
// Pure functions over `InstrumentRecord` collections. Sorting is stable. A
// missing reading sorts as the top of its field's range when ascending and as
// the bottom when descending, so blanks always sink to the end of the view.
// =============================================================================

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::scanner::InstrumentRecord;
use crate::types::{SortDirection, Timeframe, RSI_TIMEFRAMES};

/// Upper end of the oscillator scale shared by every indicator column.
const OSCILLATOR_MAX: f64 = 100.0;
const OSCILLATOR_MIN: f64 = 0.0;

/// Column a result table can be ordered or range-filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortKey {
    Symbol,
    Price,
    Volume,
    Rsi,
    StochRsi,
    Mfi,
    Rvi,
    /// RSI on a specific timeframe column.
    RsiAt(Timeframe),
    /// Mean of RSI, Stochastic RSI and MFI.
    Composite,
}

impl SortKey {
    /// Numeric value of this column on `record`. `Symbol` has none.
    pub fn value(&self, record: &InstrumentRecord) -> Option<f64> {
        let ind = &record.indicators;
        match self {
            Self::Symbol => None,
            Self::Price => Some(record.price),
            Self::Volume => record.volume,
            Self::Rsi => ind.rsi,
            Self::StochRsi => ind.stoch_rsi,
            Self::Mfi => ind.mfi,
            Self::Rvi => ind.rvi,
            Self::RsiAt(tf) => ind.rsi_at(*tf),
            Self::Composite => Some(ind.composite()),
        }
    }

    /// Value substituted for a missing reading when sorting in `direction`.
    pub fn missing_sentinel(&self, direction: SortDirection) -> f64 {
        let unbounded = matches!(self, Self::Price | Self::Volume);
        match (direction, unbounded) {
            (SortDirection::Asc, false) => OSCILLATOR_MAX,
            (SortDirection::Desc, false) => OSCILLATOR_MIN,
            (SortDirection::Asc, true) => f64::INFINITY,
            (SortDirection::Desc, true) => f64::NEG_INFINITY,
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Symbol => f.write_str("symbol"),
            Self::Price => f.write_str("price"),
            Self::Volume => f.write_str("volume"),
            Self::Rsi => f.write_str("rsi"),
            Self::StochRsi => f.write_str("stochrsi"),
            Self::Mfi => f.write_str("mfi"),
            Self::Rvi => f.write_str("rvi"),
            Self::RsiAt(tf) => write!(f, "rsi{tf}"),
            Self::Composite => f.write_str("composite"),
        }
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let key = match lower.as_str() {
            "symbol" => Self::Symbol,
            "price" => Self::Price,
            "volume" => Self::Volume,
            "rsi" => Self::Rsi,
            "stochrsi" | "stoch_rsi" => Self::StochRsi,
            "mfi" => Self::Mfi,
            "rvi" => Self::Rvi,
            "composite" | "avg" => Self::Composite,
            other => {
                let tf = other
                    .strip_prefix("rsi")
                    .and_then(|rest| rest.parse::<Timeframe>().ok())
                    .filter(|tf| RSI_TIMEFRAMES.contains(tf))
                    .ok_or_else(|| anyhow::anyhow!("unknown sort key '{s}'"))?;
                Self::RsiAt(tf)
            }
        };
        Ok(key)
    }
}

impl TryFrom<String> for SortKey {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.to_string()
    }
}

// =============================================================================
// Sorting
// =============================================================================

/// Stable sort of `records` by `key` in `direction`.
pub fn sort_records(
    mut records: Vec<InstrumentRecord>,
    key: SortKey,
    direction: SortDirection,
) -> Vec<InstrumentRecord> {
    if key == SortKey::Symbol {
        records.sort_by(|a, b| {
            let ord = a.symbol.to_lowercase().cmp(&b.symbol.to_lowercase());
            directed(ord, direction)
        });
        return records;
    }

    let sentinel = key.missing_sentinel(direction);
    records.sort_by(|a, b| {
        let va = key.value(a).unwrap_or(sentinel);
        let vb = key.value(b).unwrap_or(sentinel);
        directed(va.total_cmp(&vb), direction)
    });
    records
}

fn directed(ord: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

// =============================================================================
// Filtering
// =============================================================================

/// Inclusive numeric bounds on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub key: SortKey,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    /// Drop records with no reading on `key`; otherwise they pass through.
    #[serde(default)]
    pub require_value: bool,
}

impl RangeFilter {
    pub fn matches(&self, record: &InstrumentRecord) -> bool {
        let Some(v) = self.key.value(record) else {
            return !self.require_value;
        };
        self.min.map_or(true, |lo| v >= lo) && self.max.map_or(true, |hi| v <= hi)
    }
}

/// Predicate applied by [`filter_records`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordFilter {
    /// Case-insensitive substring of the display symbol. Empty matches all.
    Symbol(String),
    Range(RangeFilter),
}

impl RecordFilter {
    pub fn matches(&self, record: &InstrumentRecord) -> bool {
        match self {
            Self::Symbol(query) => symbol_matches(&record.symbol, query),
            Self::Range(range) => range.matches(record),
        }
    }
}

fn symbol_matches(symbol: &str, query: &str) -> bool {
    let query = query.trim();
    query.is_empty() || symbol.to_lowercase().contains(&query.to_lowercase())
}

/// Keep the records matching `filter`, preserving order.
pub fn filter_records(
    records: Vec<InstrumentRecord>,
    filter: &RecordFilter,
) -> Vec<InstrumentRecord> {
    records.into_iter().filter(|r| filter.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::VolumeKind;
    use crate::scanner::IndicatorSet;

    fn record(symbol: &str, rsi: Option<f64>, price: f64) -> InstrumentRecord {
        InstrumentRecord {
            symbol: symbol.to_string(),
            instrument: symbol.replace('/', ""),
            price,
            volume: None,
            volume_kind: VolumeKind::Unavailable,
            indicators: IndicatorSet {
                rsi,
                ..IndicatorSet::default()
            },
        }
    }

    fn symbols(records: &[InstrumentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.symbol.as_str()).collect()
    }

    fn sample() -> Vec<InstrumentRecord> {
        vec![
            record("BTC/USDT", Some(55.0), 60_000.0),
            record("ETH/USDT", None, 3_000.0),
            record("SOL/USDT", Some(25.0), 150.0),
            record("XRP/USDT", Some(55.0), 0.5),
            record("ADA/USDT", Some(80.0), 0.4),
        ]
    }

    #[test]
    fn ascending_puts_missing_last() {
        let sorted = sort_records(sample(), SortKey::Rsi, SortDirection::Asc);
        assert_eq!(
            symbols(&sorted),
            ["SOL/USDT", "BTC/USDT", "XRP/USDT", "ADA/USDT", "ETH/USDT"]
        );
    }

    #[test]
    fn descending_puts_missing_last() {
        let sorted = sort_records(sample(), SortKey::Rsi, SortDirection::Desc);
        assert_eq!(
            symbols(&sorted),
            ["ADA/USDT", "BTC/USDT", "XRP/USDT", "SOL/USDT", "ETH/USDT"]
        );
    }

    #[test]
    fn sort_is_stable_and_repeatable() {
        let once = sort_records(sample(), SortKey::Rsi, SortDirection::Desc);
        let twice = sort_records(once.clone(), SortKey::Rsi, SortDirection::Desc);
        assert_eq!(once, twice);

        // Equal keys keep their input order.
        let pos = |s: &str| once.iter().position(|r| r.symbol == s).unwrap();
        assert!(pos("BTC/USDT") < pos("XRP/USDT"));
    }

    #[test]
    fn missing_sentinels_per_field() {
        assert_eq!(SortKey::Mfi.missing_sentinel(SortDirection::Asc), 100.0);
        assert_eq!(SortKey::Mfi.missing_sentinel(SortDirection::Desc), 0.0);
        assert_eq!(SortKey::Volume.missing_sentinel(SortDirection::Asc), f64::INFINITY);
    }

    #[test]
    fn sorts_by_price_and_symbol() {
        let by_price = sort_records(sample(), SortKey::Price, SortDirection::Asc);
        assert_eq!(symbols(&by_price)[0], "ADA/USDT");
        let by_symbol = sort_records(sample(), SortKey::Symbol, SortDirection::Asc);
        assert_eq!(symbols(&by_symbol)[0], "ADA/USDT");
        assert_eq!(symbols(&by_symbol)[4], "XRP/USDT");
    }

    #[test]
    fn substring_filter_is_case_insensitive_and_idempotent() {
        let f = RecordFilter::Symbol("sol".into());
        let once = filter_records(sample(), &f);
        assert_eq!(symbols(&once), ["SOL/USDT"]);
        let twice = filter_records(once.clone(), &f);
        assert_eq!(once, twice);

        let all = filter_records(sample(), &RecordFilter::Symbol(String::new()));
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn range_filter_passes_missing_unless_required() {
        let mut range = RangeFilter {
            key: SortKey::Rsi,
            min: Some(30.0),
            max: Some(70.0),
            require_value: false,
        };
        let loose = filter_records(sample(), &RecordFilter::Range(range.clone()));
        assert_eq!(symbols(&loose), ["BTC/USDT", "ETH/USDT", "XRP/USDT"]);

        range.require_value = true;
        let strict = filter_records(sample(), &RecordFilter::Range(range));
        assert_eq!(symbols(&strict), ["BTC/USDT", "XRP/USDT"]);
    }

    #[test]
    fn sort_key_names() {
        assert_eq!("rsi1h".parse::<SortKey>().unwrap(), SortKey::RsiAt(Timeframe::H1));
        assert_eq!("StochRSI".parse::<SortKey>().unwrap(), SortKey::StochRsi);
        assert_eq!(SortKey::RsiAt(Timeframe::D1).to_string(), "rsi1d");
        assert!("rsi12h".parse::<SortKey>().is_err());
        assert!("macd".parse::<SortKey>().is_err());

        let json = serde_json::to_string(&SortKey::RsiAt(Timeframe::M15)).unwrap();
        assert_eq!(json, "\"rsi15m\"");
    }
}
