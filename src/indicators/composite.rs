// =============================================================================
// Composite oscillator score
// =============================================================================
//
// Mean of RSI, Stochastic RSI and MFI on the shared 0..100 scale. A missing
// reading counts as the neutral midline (50) so that a symbol with partial
// data is pulled toward neutral instead of being dropped.

/// Neutral value substituted for a missing reading.
pub const NEUTRAL: f64 = 50.0;

pub fn composite_score(rsi: Option<f64>, stoch_rsi: Option<f64>, mfi: Option<f64>) -> f64 {
    let r = rsi.unwrap_or(NEUTRAL);
    let s = stoch_rsi.unwrap_or(NEUTRAL);
    let m = mfi.unwrap_or(NEUTRAL);
    (r + s + m) / 3.0
}
