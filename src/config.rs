// =============================================================================
// Scanner Configuration — JSON settings with environment overrides
// =============================================================================
//
// Every scan tunable lives here: default provider and timeframe, indicator
// periods, fetch sizing, optional batch-policy overrides and the default
// sort / search applied to the result table.
//
// Persistence uses an atomic tmp + rename pattern. All fields carry serde
// defaults so that adding new fields never breaks loading an older file.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::DEFAULT_CATALOG_CAP;
use crate::indicators::{
    DEFAULT_MFI_PERIOD, DEFAULT_RSI_PERIOD, DEFAULT_RVI_PERIOD, DEFAULT_STOCH_PERIOD,
};
use crate::sort_filter::SortKey;
use crate::types::{ProviderId, SortDirection, Timeframe};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_provider() -> ProviderId {
    ProviderId::Binance
}

fn default_rsi_period() -> usize {
    DEFAULT_RSI_PERIOD
}

fn default_stoch_period() -> usize {
    DEFAULT_STOCH_PERIOD
}

fn default_mfi_period() -> usize {
    DEFAULT_MFI_PERIOD
}

fn default_rvi_period() -> usize {
    DEFAULT_RVI_PERIOD
}

fn default_candle_limit() -> u32 {
    100
}

fn default_catalog_cap() -> usize {
    DEFAULT_CATALOG_CAP
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_sort_key() -> SortKey {
    SortKey::Composite
}

fn default_sort_direction() -> SortDirection {
    SortDirection::Asc
}

// =============================================================================
// IndicatorPeriods
// =============================================================================

/// Look-back periods for the base-timeframe indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPeriods {
    #[serde(default = "default_rsi_period")]
    pub rsi: usize,

    /// RSI period feeding the stochastic window.
    #[serde(default = "default_rsi_period")]
    pub stoch_rsi: usize,

    /// Width of the stochastic window over the RSI series.
    #[serde(default = "default_stoch_period")]
    pub stoch: usize,

    #[serde(default = "default_mfi_period")]
    pub mfi: usize,

    #[serde(default = "default_rvi_period")]
    pub rvi: usize,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        Self {
            rsi: default_rsi_period(),
            stoch_rsi: default_rsi_period(),
            stoch: default_stoch_period(),
            mfi: default_mfi_period(),
            rvi: default_rvi_period(),
        }
    }
}

// =============================================================================
// ScannerConfig
// =============================================================================

/// Top-level configuration for the scanner.
#[derive(Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    // --- Scan target ---------------------------------------------------------

    #[serde(default = "default_provider")]
    pub provider: ProviderId,

    #[serde(default)]
    pub timeframe: Timeframe,

    #[serde(default)]
    pub periods: IndicatorPeriods,

    // --- Fetch sizing --------------------------------------------------------

    /// Candles requested per fetch.
    #[serde(default = "default_candle_limit")]
    pub candle_limit: u32,

    /// Upper bound on the number of instruments scanned per provider.
    #[serde(default = "default_catalog_cap")]
    pub catalog_cap: usize,

    /// Transport timeout for REST requests and the Deriv WebSocket exchange.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Replaces the provider's batch size when set.
    #[serde(default)]
    pub batch_size_override: Option<usize>,

    /// Replaces the provider's inter-batch delay when set.
    #[serde(default)]
    pub inter_batch_delay_ms_override: Option<u64>,

    // --- Aggregator credentials ---------------------------------------------

    #[serde(default)]
    pub coingecko_api_key: Option<String>,

    #[serde(default)]
    pub coinmarketcap_api_key: Option<String>,

    // --- Presentation --------------------------------------------------------

    #[serde(default = "default_sort_key")]
    pub sort_key: SortKey,

    #[serde(default = "default_sort_direction")]
    pub sort_direction: SortDirection,

    /// Case-insensitive substring applied to display symbols.
    #[serde(default)]
    pub search: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            timeframe: Timeframe::default(),
            periods: IndicatorPeriods::default(),
            candle_limit: default_candle_limit(),
            catalog_cap: default_catalog_cap(),
            request_timeout_secs: default_request_timeout_secs(),
            batch_size_override: None,
            inter_batch_delay_ms_override: None,
            coingecko_api_key: None,
            coinmarketcap_api_key: None,
            sort_key: default_sort_key(),
            sort_direction: default_sort_direction(),
            search: String::new(),
        }
    }
}

impl ScannerConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scanner config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse scanner config from {}", path.display()))?;

        info!(
            path = %path.display(),
            provider = %config.provider,
            timeframe = %config.timeframe,
            "scanner config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise scanner config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "scanner config saved (atomic)");
        Ok(())
    }

    /// Apply overrides from a variable lookup (`std::env::var` in production).
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("SCANNER_PROVIDER") {
            match raw.parse() {
                Ok(p) => self.provider = p,
                Err(e) => warn!(error = %e, "ignoring SCANNER_PROVIDER"),
            }
        }
        if let Some(raw) = lookup("SCANNER_TIMEFRAME") {
            match raw.parse() {
                Ok(tf) => self.timeframe = tf,
                Err(e) => warn!(error = %e, "ignoring SCANNER_TIMEFRAME"),
            }
        }
        if let Some(raw) = lookup("SCANNER_SORT") {
            match raw.parse() {
                Ok(key) => self.sort_key = key,
                Err(e) => warn!(error = %e, "ignoring SCANNER_SORT"),
            }
        }
        if let Some(raw) = lookup("SCANNER_SORT_DIRECTION") {
            match raw.trim().to_lowercase().as_str() {
                "asc" => self.sort_direction = SortDirection::Asc,
                "desc" => self.sort_direction = SortDirection::Desc,
                other => warn!(value = other, "ignoring SCANNER_SORT_DIRECTION"),
            }
        }
        if let Some(query) = lookup("SCANNER_SEARCH") {
            self.search = query;
        }
        if let Some(key) = lookup("COINGECKO_API_KEY").filter(|k| !k.is_empty()) {
            self.coingecko_api_key = Some(key);
        }
        if let Some(key) = lookup("COINMARKETCAP_API_KEY").filter(|k| !k.is_empty()) {
            self.coinmarketcap_api_key = Some(key);
        }
    }
}

impl std::fmt::Debug for ScannerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerConfig")
            .field("provider", &self.provider)
            .field("timeframe", &self.timeframe)
            .field("periods", &self.periods)
            .field("candle_limit", &self.candle_limit)
            .field("catalog_cap", &self.catalog_cap)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("batch_size_override", &self.batch_size_override)
            .field("inter_batch_delay_ms_override", &self.inter_batch_delay_ms_override)
            .field("coingecko_api_key", &self.coingecko_api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "coinmarketcap_api_key",
                &self.coinmarketcap_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("sort_key", &self.sort_key)
            .field("sort_direction", &self.sort_direction)
            .field("search", &self.search)
            .finish()
    }
}
