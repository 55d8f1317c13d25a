// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free oscillators computed over oldest-first candle data.
// Every public function returns `Option<f64>`: `None` means "not enough data"
// and is an expected outcome, never an error.

pub mod composite;
pub mod mfi;
pub mod rsi;
pub mod rvi;
pub mod stoch_rsi;

pub use composite::composite_score;
pub use mfi::{calculate_mfi, DEFAULT_MFI_PERIOD};
pub use rsi::{calculate_rsi, rsi_series, rsi_zone, DEFAULT_RSI_PERIOD};
pub use rvi::{calculate_rvi, DEFAULT_RVI_PERIOD};
pub use stoch_rsi::{calculate_stoch_rsi, DEFAULT_STOCH_PERIOD};
