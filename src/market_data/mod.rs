pub mod candle;
pub mod client;
pub mod normalize;
pub mod orderbook;
pub mod rate_limit;
pub mod source;

// Re-export the common types for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::{Candle, CandleSeries, VolumeKind};
pub use client::ExchangeClient;
pub use normalize::normalize_candles;
pub use orderbook::{OrderBookMetrics, OrderBookPressure};
pub use rate_limit::{RateLimitSnapshot, RateLimitTracker};
pub use source::MarketDataSource;
