// =============================================================================
// Fetch error taxonomy
// =============================================================================
//
// Every failure the network adapter can produce for a single request. The scan
// orchestrator never propagates these: each one is logged and converted into
// "no record for this symbol".

use thiserror::Error;

use crate::types::{ProviderId, Timeframe};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("HTTP {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request timed out after {0} s")]
    Timeout(u64),

    #[error("rate-limit ceiling reached (used weight {used})")]
    RateLimited { used: u32 },

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("{provider} does not serve {what} for {timeframe}")]
    Unsupported {
        provider: ProviderId,
        timeframe: Timeframe,
        what: &'static str,
    },
}

impl FetchError {
    /// Failures that are worth one more attempt after a short backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::RateLimited { .. }
        )
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(0)
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
