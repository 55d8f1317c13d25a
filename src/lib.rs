// =============================================================================
// Momentum Scanner — library root
// =============================================================================
//
// Scans a provider's instrument catalog and computes RSI, Stochastic RSI, MFI
// and RVI per symbol. A presentation layer drives `scanner::Scanner` and
// observes its `ScanSession` through a watch channel.
// =============================================================================

pub mod catalog;
pub mod config;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod provider;
pub mod scanner;
pub mod sort_filter;
pub mod types;

pub use config::ScannerConfig;
pub use error::{FetchError, FetchResult};
pub use scanner::{InstrumentRecord, ScanSession, Scanner};
pub use types::{ProviderId, Timeframe};
