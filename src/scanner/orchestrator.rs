// =============================================================================
// Scan Orchestrator — batched catalog scan with generation-based supersession
// =============================================================================
//
// A scan resolves the provider's catalog, then walks it in fixed-size batches.
// Symbols inside a batch are fetched concurrently (parallelism = batch size);
// the batch is awaited as a whole before its survivors are appended, so no two
// fetches ever touch shared state. Batches run strictly one after another,
// with an optional pause for rate-sensitive providers.
//
// Every `run_scan` call takes a new generation id. The session is only ever
// written by the newest generation: when a batch lands for a scan that has
// since been superseded, the batch is dropped and that scan stops.
//
// Failures never leave this file. A failed or short fetch is logged and the
// symbol is omitted; a failed catalog is an empty scan.
// =============================================================================

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::record::{InstrumentRecord, TimeframeDetail};
use super::session::ScanSession;
use crate::catalog::display_symbol;
use crate::config::ScannerConfig;
use crate::error::FetchResult;
use crate::indicators::calculate_rsi;
use crate::market_data::{Candle, MarketDataSource, OrderBookPressure};
use crate::provider::{self, interval_param};
use crate::types::{ProviderId, Timeframe, PAIR_DETAIL_TIMEFRAMES, RSI_TIMEFRAMES};

// =============================================================================
// ScanPolicy
// =============================================================================

/// Batch and retry behaviour for one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPolicy {
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
    pub retry_short_fetch: bool,
    pub retry_backoff: Duration,
    pub min_base_candles: usize,
}

impl ScanPolicy {
    /// Provider defaults with any configured overrides applied.
    pub fn for_provider(provider: ProviderId, config: &ScannerConfig) -> Self {
        let d = provider::descriptor(provider);
        Self {
            batch_size: config.batch_size_override.unwrap_or(d.batch_size).max(1),
            inter_batch_delay: config
                .inter_batch_delay_ms_override
                .map(Duration::from_millis)
                .unwrap_or(d.inter_batch_delay),
            retry_short_fetch: d.retry_short_fetch,
            retry_backoff: d.retry_backoff,
            min_base_candles: d.min_base_candles.max(1),
        }
    }
}

// =============================================================================
// Scanner
// =============================================================================

pub struct Scanner {
    source: Arc<dyn MarketDataSource>,
    config: ScannerConfig,
    /// Last generation handed out.
    generation: AtomicU64,
    session: RwLock<ScanSession>,
    session_tx: watch::Sender<ScanSession>,
}

impl Scanner {
    pub fn new(source: Arc<dyn MarketDataSource>, config: ScannerConfig) -> Self {
        let (session_tx, _rx) = watch::channel(ScanSession::idle());
        Self {
            source,
            config,
            generation: AtomicU64::new(0),
            session: RwLock::new(ScanSession::idle()),
            session_tx,
        }
    }

    /// Receiver that observes every committed session change.
    pub fn subscribe(&self) -> watch::Receiver<ScanSession> {
        self.session_tx.subscribe()
    }

    /// Snapshot of the most recent session.
    pub fn snapshot(&self) -> ScanSession {
        self.session.read().clone()
    }

    /// Depth-derived pressure for one scanned instrument.
    pub async fn order_book(
        &self,
        provider: ProviderId,
        instrument: &str,
    ) -> FetchResult<OrderBookPressure> {
        self.source.fetch_order_book(provider, instrument).await
    }

    /// Per-timeframe readings for one instrument, one row per entry of
    /// `PAIR_DETAIL_TIMEFRAMES` in order. Failed or short fetches yield blank
    /// rows; providers without interval candles are not queried at all.
    pub async fn pair_detail(
        &self,
        provider: ProviderId,
        instrument: &str,
    ) -> Vec<TimeframeDetail> {
        let periods = &self.config.periods;

        join_all(PAIR_DETAIL_TIMEFRAMES.into_iter().map(|tf| async move {
            if !has_interval_candles(provider, tf) {
                return TimeframeDetail::empty(tf);
            }
            match self.fetch_logged(provider, instrument, tf).await {
                Some(candles) => TimeframeDetail::from_candles(tf, &candles, periods),
                None => TimeframeDetail::empty(tf),
            }
        }))
        .await
    }

    /// Scan the whole catalog of `provider` on `timeframe`.
    ///
    /// Returns this scan's own final session. If a newer scan started in the
    /// meantime, the returned session holds whatever this scan had collected
    /// when it noticed, and none of it was published.
    pub async fn run_scan(&self, provider: ProviderId, timeframe: Timeframe) -> ScanSession {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let policy = ScanPolicy::for_provider(provider, &self.config);
        let mut session = ScanSession::start(generation, provider, timeframe);

        info!(
            %provider,
            %timeframe,
            generation,
            batch_size = policy.batch_size,
            "scan started"
        );

        if !self.commit(&session) {
            return self.superseded(session);
        }

        let symbols = match self.source.fetch_symbol_catalog(provider).await {
            Ok(symbols) => symbols,
            Err(e) => {
                warn!(%provider, error = %e, "catalog unavailable, scanning nothing");
                Vec::new()
            }
        };

        session.set_total(symbols.len());
        if !self.commit(&session) {
            return self.superseded(session);
        }

        let batch_count = symbols.len().div_ceil(policy.batch_size);
        for (index, batch) in symbols.chunks(policy.batch_size).enumerate() {
            let outcomes = join_all(
                batch
                    .iter()
                    .map(|symbol| self.scan_symbol(provider, symbol, timeframe, &policy)),
            )
            .await;
            let survivors: Vec<InstrumentRecord> = outcomes.into_iter().flatten().collect();

            debug!(
                generation,
                batch = index + 1,
                of = batch_count,
                kept = survivors.len(),
                requested = batch.len(),
                "batch landed"
            );

            session.append_batch(survivors, batch.len());
            if !self.commit(&session) {
                return self.superseded(session);
            }

            if index + 1 < batch_count && !policy.inter_batch_delay.is_zero() {
                tokio::time::sleep(policy.inter_batch_delay).await;
            }
        }

        session.finish();
        if !self.commit(&session) {
            return self.superseded(session);
        }

        info!(
            %provider,
            generation,
            records = session.results.len(),
            total = session.progress.total,
            "scan finished"
        );
        session
    }

    /// Publish `session` unless a newer generation already owns the state.
    fn commit(&self, session: &ScanSession) -> bool {
        let mut current = self.session.write();
        if current.generation > session.generation {
            return false;
        }
        *current = session.clone();
        self.session_tx.send_replace(session.clone());
        true
    }

    fn superseded(&self, mut session: ScanSession) -> ScanSession {
        info!(
            generation = session.generation,
            latest = self.generation.load(Ordering::SeqCst),
            "scan superseded, dropping late batch"
        );
        session.in_progress = false;
        session
    }

    // -------------------------------------------------------------------------
    // Per-symbol work
    // -------------------------------------------------------------------------

    async fn scan_symbol(
        &self,
        provider: ProviderId,
        symbol: &str,
        timeframe: Timeframe,
        policy: &ScanPolicy,
    ) -> Option<InstrumentRecord> {
        let base = self.fetch_base(provider, symbol, timeframe, policy).await?;
        let rsi_by_timeframe = self.rsi_columns(provider, symbol, timeframe, &base).await;

        InstrumentRecord::build(
            symbol,
            display_symbol(provider, symbol),
            &base,
            &self.config.periods,
            rsi_by_timeframe,
        )
    }

    /// Base-timeframe candles, retried once after the backoff for flaky
    /// providers. `None` means the symbol is skipped for this scan.
    async fn fetch_base(
        &self,
        provider: ProviderId,
        symbol: &str,
        timeframe: Timeframe,
        policy: &ScanPolicy,
    ) -> Option<Vec<Candle>> {
        let enough = |candles: &Vec<Candle>| candles.len() >= policy.min_base_candles;

        let first = self.fetch_logged(provider, symbol, timeframe).await;
        if first.as_ref().is_some_and(enough) {
            return first;
        }
        if !policy.retry_short_fetch {
            debug!(%provider, symbol, "insufficient candles, skipping");
            return None;
        }

        tokio::time::sleep(policy.retry_backoff).await;
        let second = self.fetch_logged(provider, symbol, timeframe).await;
        if second.as_ref().is_some_and(enough) {
            return second;
        }
        debug!(%provider, symbol, "insufficient candles after retry, skipping");
        None
    }

    async fn fetch_logged(
        &self,
        provider: ProviderId,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Option<Vec<Candle>> {
        match self.source.fetch_candles(provider, symbol, timeframe).await {
            Ok(candles) => Some(candles),
            Err(e) if e.is_transient() => {
                warn!(%provider, symbol, %timeframe, error = %e, "candle fetch failed");
                None
            }
            Err(e) => {
                debug!(%provider, symbol, %timeframe, error = %e, "no candles");
                None
            }
        }
    }

    /// RSI for every timeframe column. The base timeframe reuses `base`;
    /// providers without interval-based candles get blanks without a request.
    async fn rsi_columns(
        &self,
        provider: ProviderId,
        symbol: &str,
        timeframe: Timeframe,
        base: &[Candle],
    ) -> BTreeMap<Timeframe, Option<f64>> {
        let period = self.config.periods.rsi;
        let closes = |candles: &[Candle]| candles.iter().map(|c| c.close).collect::<Vec<f64>>();

        let columns = join_all(RSI_TIMEFRAMES.into_iter().map(|tf| {
            let base_closes = (tf == timeframe).then(|| closes(base));
            async move {
                if let Some(base_closes) = base_closes {
                    return (tf, calculate_rsi(&base_closes, period));
                }
                if !has_interval_candles(provider, tf) {
                    return (tf, None);
                }
                let rsi = self
                    .fetch_logged(provider, symbol, tf)
                    .await
                    .and_then(|candles| calculate_rsi(&closes(candles.as_slice()), period));
                (tf, rsi)
            }
        }))
        .await;

        columns.into_iter().collect()
    }
}

fn has_interval_candles(provider: ProviderId, timeframe: Timeframe) -> bool {
    provider.is_deriv() || interval_param(provider, timeframe).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::market_data::VolumeKind;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};

    /// In-memory source: every listed symbol has candles except those in
    /// `failing`; symbols in `flaky` fail on their first base request only.
    /// Timeframes in `short` return a 20-candle window.
    #[derive(Default)]
    struct MockSource {
        catalogs: HashMap<ProviderId, Vec<String>>,
        failing: HashSet<String>,
        flaky: HashSet<String>,
        short: HashSet<Timeframe>,
        latency: Duration,
        calls: Mutex<HashMap<(String, Timeframe), usize>>,
    }

    impl MockSource {
        fn with_catalog(provider: ProviderId, symbols: &[&str]) -> Self {
            let mut catalogs = HashMap::new();
            catalogs.insert(provider, symbols.iter().map(|s| s.to_string()).collect());
            Self {
                catalogs,
                ..Self::default()
            }
        }

        fn calls(&self, symbol: &str, tf: Timeframe) -> usize {
            self.calls
                .lock()
                .get(&(symbol.to_string(), tf))
                .copied()
                .unwrap_or(0)
        }
    }

    fn candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.7).sin() * 5.0;
                Candle::new(i as i64 * 60_000, c - 0.3, c + 1.0, c - 1.0, c, 50.0)
            })
            .collect()
    }

    #[async_trait]
    impl MarketDataSource for MockSource {
        async fn fetch_candles(
            &self,
            provider: ProviderId,
            symbol: &str,
            timeframe: Timeframe,
        ) -> FetchResult<Vec<Candle>> {
            let attempt = {
                let mut calls = self.calls.lock();
                let n = calls.entry((symbol.to_string(), timeframe)).or_insert(0);
                *n += 1;
                *n
            };
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if self.failing.contains(symbol) || (self.flaky.contains(symbol) && attempt == 1) {
                return Err(FetchError::Timeout(10));
            }
            if provider.data_backend() == ProviderId::Coinmarketcap {
                return Ok(vec![Candle::new(0, 2.0, 2.0, 2.0, 2.0, 1_000.0)]);
            }
            if self.short.contains(&timeframe) {
                return Ok(candles(20));
            }
            Ok(candles(60))
        }

        async fn fetch_symbol_catalog(&self, provider: ProviderId) -> FetchResult<Vec<String>> {
            self.catalogs
                .get(&provider)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    endpoint: "/catalog".into(),
                    status: 503,
                })
        }

        async fn fetch_order_book(
            &self,
            _provider: ProviderId,
            _symbol: &str,
        ) -> FetchResult<OrderBookPressure> {
            Ok(OrderBookPressure::Unavailable)
        }
    }

    fn scanner(source: MockSource) -> (Scanner, Arc<MockSource>) {
        let source = Arc::new(source);
        let scanner = Scanner::new(source.clone(), ScannerConfig::default());
        (scanner, source)
    }

    #[tokio::test]
    async fn empty_catalog_completes_with_nothing() {
        let (scanner, _) = scanner(MockSource::with_catalog(ProviderId::Binance, &[]));
        let session = scanner.run_scan(ProviderId::Binance, Timeframe::H4).await;

        assert!(session.results.is_empty());
        assert_eq!(session.progress.completed, 0);
        assert_eq!(session.progress.total, 0);
        assert!(!session.in_progress);
    }

    #[tokio::test]
    async fn catalog_failure_is_an_empty_scan() {
        let (scanner, _) = scanner(MockSource::default());
        let session = scanner.run_scan(ProviderId::Kucoin, Timeframe::H1).await;
        assert!(session.results.is_empty());
        assert_eq!(session.progress.total, 0);
        assert!(!scanner.snapshot().in_progress);
    }

    #[tokio::test]
    async fn partial_batch_failure_keeps_survivors() {
        let mut source = MockSource::with_catalog(
            ProviderId::Binance,
            &["AUSDT", "BUSDT", "CUSDT", "DUSDT", "EUSDT"],
        );
        source.failing = ["BUSDT", "DUSDT"].iter().map(|s| s.to_string()).collect();
        let (scanner, source) = scanner(source);

        let session = scanner.run_scan(ProviderId::Binance, Timeframe::H4).await;

        let symbols: Vec<&str> = session.results.iter().map(|r| r.instrument.as_str()).collect();
        assert_eq!(symbols, ["AUSDT", "CUSDT", "EUSDT"]);
        assert_eq!(session.progress.completed, 5);
        assert_eq!(session.progress.total, 5);
        assert_eq!(session.results[0].symbol, "A/USDT");
        // Binance is not retried.
        assert_eq!(source.calls("BUSDT", Timeframe::H4), 1);
    }

    #[tokio::test]
    async fn records_carry_every_rsi_column() {
        let (scanner, source) = scanner(MockSource::with_catalog(ProviderId::Bybit, &["BTCUSDT"]));
        let session = scanner.run_scan(ProviderId::Bybit, Timeframe::H4).await;

        let record = &session.results[0];
        assert_eq!(record.volume_kind, VolumeKind::Reported);
        assert_eq!(record.indicators.rsi_by_timeframe.len(), RSI_TIMEFRAMES.len());
        assert_eq!(record.indicators.rsi_at(Timeframe::H4), record.indicators.rsi);
        assert!(record.indicators.rsi_at(Timeframe::M5).is_some());
        // The base timeframe column reuses the base fetch.
        assert_eq!(source.calls("BTCUSDT", Timeframe::H4), 1);
        assert_eq!(source.calls("BTCUSDT", Timeframe::D1), 1);
    }

    #[tokio::test]
    async fn flaky_provider_retries_once() {
        let mut source = MockSource::with_catalog(ProviderId::L1s, &["btc", "eth"]);
        source.flaky = ["eth".to_string()].into_iter().collect();
        let (scanner, source) = scanner(source);

        let session = scanner.run_scan(ProviderId::L1s, Timeframe::H4).await;

        assert_eq!(session.results.len(), 2);
        assert_eq!(source.calls("eth", Timeframe::H4), 2);
        assert_eq!(source.calls("btc", Timeframe::H4), 1);
        // Quote-only: price known, oscillators blank, no per-timeframe requests.
        let eth = session.results.iter().find(|r| r.instrument == "eth").unwrap();
        assert_eq!(eth.symbol, "ETH/USDT");
        assert_eq!(eth.price, 2.0);
        assert_eq!(eth.indicators.rsi, None);
        assert_eq!(source.calls("eth", Timeframe::D1), 0);
    }

    #[tokio::test]
    async fn flaky_provider_gives_up_after_one_retry() {
        let mut source = MockSource::with_catalog(ProviderId::Meme, &["pepe"]);
        source.failing = ["pepe".to_string()].into_iter().collect();
        let (scanner, source) = scanner(source);

        let session = scanner.run_scan(ProviderId::Meme, Timeframe::H4).await;
        assert!(session.results.is_empty());
        assert_eq!(session.progress.completed, 1);
        assert_eq!(source.calls("pepe", Timeframe::H4), 2);
    }

    #[tokio::test]
    async fn progress_advances_per_batch_and_clamps() {
        let symbols: Vec<String> = (0..12).map(|i| format!("S{i}USDT")).collect();
        let refs: Vec<&str> = symbols.iter().map(String::as_str).collect();
        let (scanner, _) = scanner(MockSource::with_catalog(ProviderId::Binance, &refs));
        let rx = scanner.subscribe();

        let session = scanner.run_scan(ProviderId::Binance, Timeframe::H1).await;

        assert_eq!(session.progress.completed, 12);
        assert_eq!(session.results.len(), 12);
        let observed = rx.borrow().clone();
        assert_eq!(observed.generation, session.generation);
        assert!(!observed.in_progress);
        assert_eq!(observed.results.len(), 12);
    }

    #[tokio::test]
    async fn newer_scan_supersedes_older() {
        let mut source = MockSource::with_catalog(ProviderId::Binance, &["OLDUSDT"]);
        source
            .catalogs
            .insert(ProviderId::Bybit, vec!["NEWUSDT".to_string()]);
        source.latency = Duration::from_millis(80);
        let (scanner, _) = scanner(source);
        let scanner = Arc::new(scanner);

        let older = {
            let scanner = scanner.clone();
            tokio::spawn(async move { scanner.run_scan(ProviderId::Binance, Timeframe::H4).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let newer = scanner.run_scan(ProviderId::Bybit, Timeframe::H4).await;
        let older = older.await.unwrap();

        assert_eq!(older.generation, 1);
        assert_eq!(newer.generation, 2);
        assert!(!older.in_progress);

        let visible = scanner.snapshot();
        assert_eq!(visible.generation, 2);
        assert_eq!(visible.provider, Some(ProviderId::Bybit));
        let symbols: Vec<&str> = visible.results.iter().map(|r| r.instrument.as_str()).collect();
        assert_eq!(symbols, ["NEWUSDT"]);
    }

    #[tokio::test]
    async fn pair_detail_fills_every_timeframe_row() {
        let (scanner, source) = scanner(MockSource::default());
        let rows = scanner.pair_detail(ProviderId::Binance, "BTCUSDT").await;

        let tfs: Vec<Timeframe> = rows.iter().map(|r| r.timeframe).collect();
        assert_eq!(tfs, PAIR_DETAIL_TIMEFRAMES);
        for row in &rows {
            assert!(row.rsi.is_some(), "{}", row.timeframe);
            assert!(row.stoch_rsi.is_some(), "{}", row.timeframe);
            assert!(row.mfi.is_some(), "{}", row.timeframe);
            assert_eq!(row.volume, Some(50.0));
            assert!(row.composite.is_some());
        }
        assert_eq!(source.calls("BTCUSDT", Timeframe::M1), 1);
        assert_eq!(source.calls("BTCUSDT", Timeframe::H12), 1);
        assert_eq!(source.calls("BTCUSDT", Timeframe::H1), 0);
    }

    #[tokio::test]
    async fn pair_detail_blanks_failed_and_short_rows() {
        let mut source = MockSource::default();
        source.failing = ["DEADUSDT".to_string()].into_iter().collect();
        source.short = [Timeframe::M1, Timeframe::D1].into_iter().collect();
        let (scanner, _) = scanner(source);

        let failed = scanner.pair_detail(ProviderId::Bybit, "DEADUSDT").await;
        assert_eq!(failed.len(), PAIR_DETAIL_TIMEFRAMES.len());
        assert!(failed.iter().all(TimeframeDetail::is_empty));

        let rows = scanner.pair_detail(ProviderId::Bybit, "ETHUSDT").await;
        for row in &rows {
            let short = matches!(row.timeframe, Timeframe::M1 | Timeframe::D1);
            assert_eq!(row.is_empty(), short, "{}", row.timeframe);
            if short {
                assert_eq!(*row, TimeframeDetail::empty(row.timeframe));
            }
        }
    }

    #[tokio::test]
    async fn pair_detail_skips_quote_only_providers() {
        let (scanner, source) = scanner(MockSource::default());
        let rows = scanner.pair_detail(ProviderId::Coinmarketcap, "bitcoin").await;

        assert_eq!(rows.len(), PAIR_DETAIL_TIMEFRAMES.len());
        assert!(rows.iter().all(TimeframeDetail::is_empty));
        for tf in PAIR_DETAIL_TIMEFRAMES {
            assert_eq!(source.calls("bitcoin", tf), 0);
        }
    }

    #[test]
    fn policy_overrides() {
        let config = ScannerConfig {
            batch_size_override: Some(0),
            inter_batch_delay_ms_override: Some(50),
            ..ScannerConfig::default()
        };
        let p = ScanPolicy::for_provider(ProviderId::Binance, &config);
        assert_eq!(p.batch_size, 1);
        assert_eq!(p.inter_batch_delay, Duration::from_millis(50));

        let meme = ScanPolicy::for_provider(ProviderId::Meme, &ScannerConfig::default());
        assert_eq!(meme.batch_size, 3);
        assert!(meme.retry_short_fetch);
        assert_eq!(meme.min_base_candles, 1);
    }
}
