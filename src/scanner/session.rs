use chrono::{DateTime, Utc};
use serde::Serialize;

use super::record::InstrumentRecord;
use crate::types::{ProviderId, Timeframe};

/// Symbols processed so far out of the catalog size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    pub completed: usize,
    pub total: usize,
}

/// State of one scan: `Idle -> Running -> Idle`.
///
/// Owned by the orchestrator and handed to observers as a value; a newer scan
/// (higher `generation`) replaces it wholesale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSession {
    pub generation: u64,
    pub provider: Option<ProviderId>,
    pub timeframe: Timeframe,
    pub results: Vec<InstrumentRecord>,
    pub progress: ScanProgress,
    pub in_progress: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScanSession {
    /// The state before any scan has run.
    pub fn idle() -> Self {
        Self {
            generation: 0,
            provider: None,
            timeframe: Timeframe::default(),
            results: Vec::new(),
            progress: ScanProgress::default(),
            in_progress: false,
            started_at: None,
            finished_at: None,
        }
    }

    /// Fresh running session with no results and an unknown total.
    pub fn start(generation: u64, provider: ProviderId, timeframe: Timeframe) -> Self {
        Self {
            generation,
            provider: Some(provider),
            timeframe,
            results: Vec::new(),
            progress: ScanProgress::default(),
            in_progress: true,
            started_at: Some(Utc::now()),
            finished_at: None,
        }
    }

    pub fn set_total(&mut self, total: usize) {
        self.progress = ScanProgress {
            completed: 0,
            total,
        };
    }

    /// Append a batch's survivors and advance progress by the batch size,
    /// clamped to the total.
    pub fn append_batch(&mut self, survivors: Vec<InstrumentRecord>, batch_len: usize) {
        self.results.extend(survivors);
        self.progress.completed = (self.progress.completed + batch_len).min(self.progress.total);
    }

    pub fn finish(&mut self) {
        self.in_progress = false;
        self.finished_at = Some(Utc::now());
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped_to_total() {
        let mut s = ScanSession::start(1, ProviderId::Binance, Timeframe::H1);
        s.set_total(7);
        s.append_batch(Vec::new(), 5);
        assert_eq!(s.progress.completed, 5);
        s.append_batch(Vec::new(), 5);
        assert_eq!(s.progress, ScanProgress { completed: 7, total: 7 });
    }

    #[test]
    fn lifecycle_flags() {
        let idle = ScanSession::idle();
        assert!(!idle.in_progress);
        assert!(idle.provider.is_none());

        let mut s = ScanSession::start(3, ProviderId::Meme, Timeframe::D1);
        assert!(s.in_progress);
        assert!(s.started_at.is_some());
        s.finish();
        assert!(!s.in_progress);
        assert!(s.finished_at.is_some());
    }
}
