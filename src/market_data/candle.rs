use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Whether a candle's volume came from the venue or is missing.
///
/// Venues without a volume feed (Deriv synthetic instruments, CoinGecko price
/// points) are tagged `Unavailable`; their `volume` field holds 0.0 and must
/// not be fed into volume-weighted indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeKind {
    Reported,
    Unavailable,
}

/// A single normalized OHLCV candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time, milliseconds since the UNIX epoch.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub volume_kind: VolumeKind,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            volume_kind: VolumeKind::Reported,
        }
    }

    /// Candle from a venue that publishes no volume.
    pub fn without_volume(timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: 0.0,
            volume_kind: VolumeKind::Unavailable,
        }
    }

    pub fn has_volume(&self) -> bool {
        self.volume_kind == VolumeKind::Reported
    }
}

// ---------------------------------------------------------------------------
// Column view
// ---------------------------------------------------------------------------

/// Column-oriented copy of a candle slice, the shape the indicator functions
/// take.
#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    pub opens: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,
    pub volumes: Vec<f64>,
    /// True only if every candle carries venue-reported volume.
    pub volume_reported: bool,
}

impl CandleSeries {
    pub fn from_candles(candles: &[Candle]) -> Self {
        let mut series = Self {
            opens: Vec::with_capacity(candles.len()),
            highs: Vec::with_capacity(candles.len()),
            lows: Vec::with_capacity(candles.len()),
            closes: Vec::with_capacity(candles.len()),
            volumes: Vec::with_capacity(candles.len()),
            volume_reported: !candles.is_empty() && candles.iter().all(Candle::has_volume),
        };
        for c in candles {
            series.opens.push(c.open);
            series.highs.push(c.high);
            series.lows.push(c.low);
            series.closes.push(c.close);
            series.volumes.push(c.volume);
        }
        series
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    /// Mean volume over the window, `None` if any candle lacks volume.
    pub fn mean_volume(&self) -> Option<f64> {
        if !self.volume_reported {
            return None;
        }
        Some(self.volumes.iter().sum::<f64>() / self.volumes.len() as f64)
    }
}

/// True when timestamps never decrease along the slice.
pub fn is_chronological(candles: &[Candle]) -> bool {
    candles.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: i64, close: f64, volume: f64) -> Candle {
        Candle::new(ts, close, close + 1.0, close - 1.0, close, volume)
    }

    #[test]
    fn series_splits_columns_in_order() {
        let candles = vec![sample(1, 10.0, 5.0), sample(2, 11.0, 7.0)];
        let s = CandleSeries::from_candles(&candles);
        assert_eq!(s.closes, vec![10.0, 11.0]);
        assert_eq!(s.highs, vec![11.0, 12.0]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.last_close(), Some(11.0));
        assert_eq!(s.mean_volume(), Some(6.0));
    }

    #[test]
    fn missing_volume_poisons_the_mean() {
        let candles = vec![
            sample(1, 10.0, 5.0),
            Candle::without_volume(2, 10.0, 11.0, 9.0, 10.5),
        ];
        let s = CandleSeries::from_candles(&candles);
        assert!(!s.volume_reported);
        assert_eq!(s.mean_volume(), None);
    }

    #[test]
    fn empty_series_has_no_volume() {
        let s = CandleSeries::from_candles(&[]);
        assert!(s.is_empty());
        assert_eq!(s.mean_volume(), None);
        assert_eq!(s.last_close(), None);
    }

    #[test]
    fn chronological_check() {
        assert!(is_chronological(&[sample(1, 1.0, 1.0), sample(1, 1.0, 1.0), sample(2, 1.0, 1.0)]));
        assert!(!is_chronological(&[sample(2, 1.0, 1.0), sample(1, 1.0, 1.0)]));
    }
}
