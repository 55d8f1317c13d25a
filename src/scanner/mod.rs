// =============================================================================
// Scanner Module
// =============================================================================
//
// Batched, generation-tagged scanning of a provider's instrument catalog:
// - InstrumentRecord / IndicatorSet built from normalized candles
// - ScanSession value handed to observers
// - Scanner orchestrating batches, retries and supersession
// - TimeframeDetail rows for the single-instrument view

pub mod orchestrator;
pub mod record;
pub mod session;

pub use orchestrator::{ScanPolicy, Scanner};
pub use record::{IndicatorSet, InstrumentRecord, TimeframeDetail};
pub use session::{ScanProgress, ScanSession};
