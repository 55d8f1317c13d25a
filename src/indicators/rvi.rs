// =============================================================================
// Relative Vigor Index (RVI)
// =============================================================================
//
// Compares where a bar closes relative to its open against the bar's full
// range. Both legs are smoothed with the symmetric (1, 2, 2, 1) / 6 weighting
// over the current bar and its three predecessors:
//
//   num_i = ((C-O)_i + 2(C-O)_{i-1} + 2(C-O)_{i-2} + (C-O)_{i-3}) / 6
//   den_i = ((H-L)_i + 2(H-L)_{i-1} + 2(H-L)_{i-2} + (H-L)_{i-3}) / 6
//
//   ratio = sum(num over last `period`) / sum(den over last `period`)
//
// The raw ratio lives in [-1, 1] for well-formed candles. It is rescaled to
// the oscillator convention shared with RSI/MFI:
//
//   RVI = clamp(50 + 50 * ratio, 0, 100)
//
// 0 is the bearish extreme, 100 the bullish extreme, 50 the midline. A zero
// denominator (no range at all in the window) reads 50.
// =============================================================================

pub const DEFAULT_RVI_PERIOD: usize = 10;

/// Bars consumed by the four-bar weighting before the first smoothed value.
const WEIGHT_LOOKBACK: usize = 3;

/// Latest RVI value on the 0..100 scale.
///
/// Returns `None` when `period == 0`, when the four series differ in length,
/// or when there are fewer than `period + 3` bars.
pub fn calculate_rvi(
    opens: &[f64],
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
) -> Option<f64> {
    let ratio = rvi_ratio(opens, highs, lows, closes, period)?;
    let scaled = (50.0 + 50.0 * ratio).clamp(0.0, 100.0);
    scaled.is_finite().then_some(scaled)
}

/// Unscaled RVI ratio (roughly -1..1), or 0 when the window has no range.
pub fn rvi_ratio(
    opens: &[f64],
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
) -> Option<f64> {
    let n = closes.len();
    if period == 0 || n < period + WEIGHT_LOOKBACK {
        return None;
    }
    if opens.len() != n || highs.len() != n || lows.len() != n {
        return None;
    }

    let weighted = |f: &dyn Fn(usize) -> f64, i: usize| {
        (f(i) + 2.0 * f(i - 1) + 2.0 * f(i - 2) + f(i - 3)) / 6.0
    };
    let body = |i: usize| closes[i] - opens[i];
    let range = |i: usize| highs[i] - lows[i];

    let (num, den) = ((n - period)..n).fold((0.0_f64, 0.0_f64), |(num, den), i| {
        (num + weighted(&body, i), den + weighted(&range, i))
    });

    if den == 0.0 {
        return Some(0.0);
    }

    let ratio = num / den;
    ratio.is_finite().then_some(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ohlc {
        opens: Vec<f64>,
        highs: Vec<f64>,
        lows: Vec<f64>,
        closes: Vec<f64>,
    }

    impl Ohlc {
        fn rvi(&self, period: usize) -> Option<f64> {
            calculate_rvi(&self.opens, &self.highs, &self.lows, &self.closes, period)
        }
    }

    /// Bars that open at the low and close at the high (or vice versa).
    fn marubozu(n: usize, bullish: bool) -> Ohlc {
        let lows: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        let highs: Vec<f64> = lows.iter().map(|l| l + 2.0).collect();
        let (opens, closes) = if bullish {
            (lows.clone(), highs.clone())
        } else {
            (highs.clone(), lows.clone())
        };
        Ohlc { opens, highs, lows, closes }
    }

    #[test]
    fn needs_period_plus_lookback_bars() {
        assert!(marubozu(12, true).rvi(10).is_none());
        assert!(marubozu(13, true).rvi(10).is_some());
    }

    #[test]
    fn zero_period_is_rejected() {
        assert!(marubozu(30, true).rvi(0).is_none());
    }

    #[test]
    fn full_bullish_bodies_hit_the_top() {
        let v = marubozu(30, true).rvi(10).unwrap();
        assert!((v - 100.0).abs() < 1e-12, "got {v}");
    }

    #[test]
    fn full_bearish_bodies_hit_the_bottom() {
        let v = marubozu(30, false).rvi(10).unwrap();
        assert!(v.abs() < 1e-12, "got {v}");
    }

    #[test]
    fn rangeless_window_is_midline() {
        let flat = Ohlc {
            opens: vec![5.0; 20],
            highs: vec![5.0; 20],
            lows: vec![5.0; 20],
            closes: vec![5.0; 20],
        };
        assert_eq!(flat.rvi(10), Some(50.0));
    }

    #[test]
    fn half_body_reads_75() {
        // Close-open is half of high-low on every bar => ratio 0.5.
        let n = 20;
        let ohlc = Ohlc {
            opens: vec![10.0; n],
            highs: vec![12.0; n],
            lows: vec![8.0; n],
            closes: vec![12.0; n],
        };
        let v = ohlc.rvi(10).unwrap();
        assert!((v - 75.0).abs() < 1e-12, "got {v}");
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let mut ohlc = marubozu(30, true);
        ohlc.opens.pop();
        assert!(ohlc.rvi(10).is_none());
    }
}
