// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Seed average gain / average loss with the SMA of the first `period`
//          gains / losses.
// Step 3 — Apply Wilder's smoothing for every later delta:
//            avg_gain = (prev_avg_gain * (period - 1) + current_gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + current_loss) / period
// Step 4 — avg_loss == 0  => RSI = 100 (saturated, no division)
//          otherwise RS  = avg_gain / avg_loss, RSI = 100 - 100 / (1 + RS)
//
// Thresholds:  RSI > 70 => OVERBOUGHT,  RSI < 30 => OVERSOLD.
// =============================================================================

use crate::types::RsiZone;

/// Default RSI look-back.
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Compute the RSI value of `closes` (oldest first) at its last close.
///
/// Returns `None` when `period == 0`, when there are fewer than `period + 1`
/// closes, or when the arithmetic produces a non-finite value.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }
    let series = rsi_series(closes, period);
    // A truncated series ends before the last close.
    if series.len() != closes.len() - period {
        return None;
    }
    series.last().copied()
}

/// Compute the full RSI series for `closes` and `period`.
///
/// Element `k` of the result is the RSI of the prefix `closes[..=period + k]`,
/// i.e. exactly what [`calculate_rsi`] returns for that prefix: Wilder's
/// smoothing is strictly sequential, so stopping the pass early yields the
/// same value as recomputing the shorter input from scratch.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - `closes.len() < period + 1` => empty vec (need at least `period` deltas)
/// - Non-finite results truncate the series at that point.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period + 1 {
        return Vec::new();
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let (sum_gain, sum_loss) = deltas[..period]
        .iter()
        .fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            (g + d.max(0.0), l + (-d).max(0.0))
        });

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;

    let mut result = Vec::with_capacity(deltas.len() - period + 1);
    match rsi_from_averages(avg_gain, avg_loss) {
        Some(rsi) => result.push(rsi),
        None => return result,
    }

    for &delta in &deltas[period..] {
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        match rsi_from_averages(avg_gain, avg_loss) {
            Some(rsi) => result.push(rsi),
            None => break,
        }
    }

    result
}

/// Classify an oscillator reading on the 0..100 scale.
pub fn rsi_zone(value: f64) -> RsiZone {
    if value > 70.0 {
        RsiZone::Overbought
    } else if value < 30.0 {
        RsiZone::Oversold
    } else {
        RsiZone::Neutral
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// Zero average loss saturates at 100.0, including the flat-market case where
/// the average gain is zero as well.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    rsi.is_finite().then_some(rsi)
}
