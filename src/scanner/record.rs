// =============================================================================
// Instrument Record — one scanned symbol and its indicator readings
// =============================================================================
//
// Built once per successful fetch and never mutated afterwards. A fresh scan
// replaces every record wholesale.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::IndicatorPeriods;
use crate::indicators::{
    calculate_mfi, calculate_rsi, calculate_rvi, calculate_stoch_rsi, composite_score, rsi_zone,
};
use crate::market_data::{Candle, CandleSeries, VolumeKind};
use crate::types::{RsiZone, Timeframe};

/// Indicator readings for one instrument. `None` means insufficient data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSet {
    pub rsi: Option<f64>,
    pub stoch_rsi: Option<f64>,
    pub mfi: Option<f64>,
    pub rvi: Option<f64>,
    /// RSI per timeframe column (`5m` .. `1d`).
    pub rsi_by_timeframe: BTreeMap<Timeframe, Option<f64>>,
}

impl IndicatorSet {
    /// Base-timeframe readings from `series`. MFI is skipped when any candle
    /// lacks venue-reported volume.
    pub fn from_series(series: &CandleSeries, periods: &IndicatorPeriods) -> Self {
        let mfi = if series.volume_reported {
            calculate_mfi(
                &series.highs,
                &series.lows,
                &series.closes,
                &series.volumes,
                periods.mfi,
            )
        } else {
            None
        };

        Self {
            rsi: calculate_rsi(&series.closes, periods.rsi),
            stoch_rsi: calculate_stoch_rsi(&series.closes, periods.stoch_rsi, periods.stoch),
            mfi,
            rvi: calculate_rvi(
                &series.opens,
                &series.highs,
                &series.lows,
                &series.closes,
                periods.rvi,
            ),
            rsi_by_timeframe: BTreeMap::new(),
        }
    }

    pub fn rsi_at(&self, timeframe: Timeframe) -> Option<f64> {
        self.rsi_by_timeframe.get(&timeframe).copied().flatten()
    }

    /// Mean of RSI, Stochastic RSI and MFI with missing values at 50.
    pub fn composite(&self) -> f64 {
        composite_score(self.rsi, self.stoch_rsi, self.mfi)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentRecord {
    /// Display-formatted symbol, e.g. `BTC/USDT`.
    pub symbol: String,
    /// Venue identifier used for follow-up requests (order book).
    pub instrument: String,
    /// Latest close.
    pub price: f64,
    /// Mean volume over the fetched window; `None` when the venue has no
    /// volume feed.
    pub volume: Option<f64>,
    pub volume_kind: VolumeKind,
    pub indicators: IndicatorSet,
}

impl InstrumentRecord {
    /// Build a record from base-timeframe candles plus the per-timeframe RSI
    /// column. Returns `None` for an empty candle slice.
    pub fn build(
        instrument: &str,
        display: String,
        base: &[Candle],
        periods: &IndicatorPeriods,
        rsi_by_timeframe: BTreeMap<Timeframe, Option<f64>>,
    ) -> Option<Self> {
        let series = CandleSeries::from_candles(base);
        let price = series.last_close()?;
        let volume = series.mean_volume();

        let mut indicators = IndicatorSet::from_series(&series, periods);
        indicators.rsi_by_timeframe = rsi_by_timeframe;

        Some(Self {
            symbol: display,
            instrument: instrument.to_string(),
            price,
            volume,
            volume_kind: if series.volume_reported {
                VolumeKind::Reported
            } else {
                VolumeKind::Unavailable
            },
            indicators,
        })
    }

    pub fn composite(&self) -> f64 {
        self.indicators.composite()
    }

    /// Zone of the base-timeframe RSI, if known.
    pub fn rsi_zone(&self) -> Option<RsiZone> {
        self.indicators.rsi.map(rsi_zone)
    }
}

// =============================================================================
// Single-instrument detail
// =============================================================================

/// Candles a detail row needs before any reading is shown.
pub const MIN_DETAIL_CANDLES: usize = 50;

/// One row of the per-timeframe detail table for a single instrument.
///
/// A row built from a failed or short fetch has every reading blank.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeDetail {
    pub timeframe: Timeframe,
    pub rsi: Option<f64>,
    pub stoch_rsi: Option<f64>,
    pub mfi: Option<f64>,
    /// Mean volume over the fetched window.
    pub volume: Option<f64>,
    /// Composite of the three oscillators; blank for an empty row.
    pub composite: Option<f64>,
}

impl TimeframeDetail {
    pub fn empty(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            rsi: None,
            stoch_rsi: None,
            mfi: None,
            volume: None,
            composite: None,
        }
    }

    pub fn from_candles(
        timeframe: Timeframe,
        candles: &[Candle],
        periods: &IndicatorPeriods,
    ) -> Self {
        if candles.len() < MIN_DETAIL_CANDLES {
            return Self::empty(timeframe);
        }

        let series = CandleSeries::from_candles(candles);
        let set = IndicatorSet::from_series(&series, periods);
        Self {
            timeframe,
            rsi: set.rsi,
            stoch_rsi: set.stoch_rsi,
            mfi: set.mfi,
            volume: series.mean_volume(),
            composite: Some(set.composite()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.composite.is_none()
    }
}
