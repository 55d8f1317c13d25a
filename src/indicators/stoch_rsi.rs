// =============================================================================
// Stochastic RSI
// =============================================================================
//
// Applies the stochastic formula to a rolling window of RSI readings:
//
//   StochRSI = (RSI_now - min(RSI window)) / (max(RSI window) - min(RSI window)) * 100
//
// The RSI readings come from one Wilder pass (`rsi_series`). Reading `k` of
// that pass is identical to recomputing RSI over `closes[..=rsi_period + k]`,
// so the O(n) pass yields the same values as the per-position recomputation.
// =============================================================================

use super::rsi::rsi_series;

pub const DEFAULT_STOCH_PERIOD: usize = 14;

/// Latest Stochastic RSI value in [0, 100].
///
/// Returns `None` unless `closes.len() >= rsi_period + stoch_period + 1`.
/// A constant RSI window (max == min) reads 50.
pub fn calculate_stoch_rsi(closes: &[f64], rsi_period: usize, stoch_period: usize) -> Option<f64> {
    if rsi_period == 0 || stoch_period == 0 || closes.len() < rsi_period + stoch_period + 1 {
        return None;
    }

    let series = rsi_series(closes, rsi_period);
    if series.len() < stoch_period {
        return None;
    }

    let window = &series[series.len() - stoch_period..];
    let current = *window.last()?;
    let (min, max) = window
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(mn, mx), &v| {
            (mn.min(v), mx.max(v))
        });

    if max == min {
        return Some(50.0);
    }

    let value = (current - min) / (max - min) * 100.0;
    value.is_finite().then_some(value)
}
