// =============================================================================
// Rate-Limit Tracker — reads venue weight headers to avoid 429s
// =============================================================================
//
// Venues such as Binance report the request weight used in the current minute
// on every response (`X-MBX-USED-WEIGHT-1M`). The tracker records the latest
// value with atomics so concurrent fetches in a batch can consult it
// lock-free. A recorded weight only counts for the minute it was observed in;
// a new minute starts from zero without a reset timer.
// =============================================================================

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Thread-safe used-weight tracker for a single venue.
pub struct RateLimitTracker {
    header: &'static str,
    hard_limit: u32,
    warn_threshold: u32,
    used_weight: AtomicU32,
    /// Minute (epoch ms / 60 000) in which `used_weight` was observed.
    observed_minute: AtomicI64,
}

/// Serialisable snapshot of the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub header: String,
    pub used_weight: u32,
    pub hard_limit: u32,
}

impl RateLimitTracker {
    pub fn new(header: &'static str, hard_limit: u32, warn_threshold: u32) -> Self {
        Self {
            header,
            hard_limit,
            warn_threshold,
            used_weight: AtomicU32::new(0),
            observed_minute: AtomicI64::new(0),
        }
    }

    /// Binance spot: 1200 weight per minute, hard-capped at 1000.
    pub fn binance() -> Self {
        Self::new("X-MBX-USED-WEIGHT-1M", 1000, 800)
    }

    /// Record the used weight reported in `headers`, observed at `now_ms`.
    pub fn update_from_headers(&self, headers: &reqwest::header::HeaderMap, now_ms: i64) {
        let Some(weight) = headers
            .get(self.header)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u32>().ok())
        else {
            return;
        };
        self.record(weight, now_ms);
    }

    /// Record a used-weight reading directly.
    pub fn record(&self, weight: u32, now_ms: i64) {
        self.observed_minute
            .store(now_ms.div_euclid(60_000), Ordering::Relaxed);
        let prev = self.used_weight.swap(weight, Ordering::Relaxed);

        if weight >= self.warn_threshold && prev < self.warn_threshold {
            warn!(
                used_weight = weight,
                hard_limit = self.hard_limit,
                "rate-limit weight crossed warning threshold"
            );
        }
        debug!(header = self.header, used_weight = weight, "rate-limit weight updated");
    }

    /// Weight used in the minute containing `now_ms`.
    pub fn used_weight(&self, now_ms: i64) -> u32 {
        if self.observed_minute.load(Ordering::Relaxed) != now_ms.div_euclid(60_000) {
            return 0;
        }
        self.used_weight.load(Ordering::Relaxed)
    }

    /// `true` if spending `weight` more stays within the hard limit.
    pub fn can_send_request(&self, weight: u32, now_ms: i64) -> bool {
        let current = self.used_weight(now_ms);
        let allowed = current.saturating_add(weight) <= self.hard_limit;
        if !allowed {
            warn!(
                current_weight = current,
                requested_weight = weight,
                hard_limit = self.hard_limit,
                "request blocked — would exceed rate-limit"
            );
        }
        allowed
    }

    pub fn snapshot(&self, now_ms: i64) -> RateLimitSnapshot {
        RateLimitSnapshot {
            header: self.header.to_string(),
            used_weight: self.used_weight(now_ms),
            hard_limit: self.hard_limit,
        }
    }
}

impl std::fmt::Debug for RateLimitTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitTracker")
            .field("header", &self.header)
            .field("used_weight", &self.used_weight.load(Ordering::Relaxed))
            .field("hard_limit", &self.hard_limit)
            .finish()
    }
}
