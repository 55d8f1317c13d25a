// =============================================================================
// Momentum Scanner — Main Entry Point
// =============================================================================
//
// Runs one scan of the configured provider and logs the sorted, filtered
// table. Provider, timeframe, sort and search come from scanner_config.json
// and may be overridden from the environment (SCANNER_*).
// =============================================================================

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use momentum_scanner::market_data::ExchangeClient;
use momentum_scanner::provider;
use momentum_scanner::sort_filter::{filter_records, sort_records, RecordFilter};
use momentum_scanner::{ScannerConfig, Scanner};

const CONFIG_PATH: &str = "scanner_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = ScannerConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        ScannerConfig::default()
    });
    config.apply_overrides(|key| std::env::var(key).ok());

    let provider = config.provider;
    let timeframe = config.timeframe;
    info!(
        provider = provider::descriptor(provider).name,
        %timeframe,
        sort = %config.sort_key,
        direction = %config.sort_direction,
        "Momentum scanner starting"
    );

    // ── 2. Build client & scanner ────────────────────────────────────────
    let client = Arc::new(ExchangeClient::new(&config));
    let scanner = Scanner::new(client.clone(), config.clone());

    // ── 3. Progress reporting ────────────────────────────────────────────
    let mut progress_rx = scanner.subscribe();
    let progress_task = tokio::spawn(async move {
        while progress_rx.changed().await.is_ok() {
            let session = progress_rx.borrow_and_update().clone();
            info!(
                completed = session.progress.completed,
                total = session.progress.total,
                records = session.results.len(),
                "scan progress"
            );
            if !session.in_progress && session.generation > 0 {
                break;
            }
        }
    });

    // ── 4. Scan ──────────────────────────────────────────────────────────
    let session = scanner.run_scan(provider, timeframe).await;
    let _ = progress_task.await;

    // ── 5. Present ───────────────────────────────────────────────────────
    let filtered = filter_records(session.results, &RecordFilter::Symbol(config.search.clone()));
    let table = sort_records(filtered, config.sort_key, config.sort_direction);

    if table.is_empty() {
        warn!(%provider, "no data available");
    }

    let fmt = |v: Option<f64>| v.map_or_else(|| "—".to_string(), |x| format!("{x:.2}"));
    for record in &table {
        let ind = &record.indicators;
        let per_tf: Vec<String> = ind
            .rsi_by_timeframe
            .iter()
            .map(|(tf, v)| format!("{tf}={}", fmt(*v)))
            .collect();
        info!(
            symbol = %record.symbol,
            price = record.price,
            volume = %fmt(record.volume),
            rsi = %fmt(ind.rsi),
            stoch_rsi = %fmt(ind.stoch_rsi),
            mfi = %fmt(ind.mfi),
            rvi = %fmt(ind.rvi),
            composite = %format!("{:.2}", record.composite()),
            rsi_by_tf = %per_tf.join(" "),
            "row"
        );
    }

    // ── 6. Detail for the top row ────────────────────────────────────────
    if let Some(top) = table.first() {
        for row in scanner.pair_detail(provider, &top.instrument).await {
            info!(
                symbol = %top.symbol,
                timeframe = %row.timeframe,
                rsi = %fmt(row.rsi),
                stoch_rsi = %fmt(row.stoch_rsi),
                mfi = %fmt(row.mfi),
                volume = %fmt(row.volume),
                composite = %fmt(row.composite),
                "detail"
            );
        }
    }

    if let Some(weight) = client.rate_limit(provider) {
        info!(
            used_weight = weight.used_weight,
            hard_limit = weight.hard_limit,
            "rate-limit usage"
        );
    }

    info!(
        rows = table.len(),
        total = session.progress.total,
        "scan complete"
    );
    Ok(())
}
