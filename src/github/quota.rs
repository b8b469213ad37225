use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Upstream GitHub API quota, tracked from response headers
#[derive(Clone)]
pub struct ApiQuota {
    state: Arc<RwLock<QuotaState>>,
}

#[derive(Debug, Clone)]
struct QuotaState {
    /// Total rate limit
    limit: u32,

    /// Remaining requests
    remaining: u32,

    /// Unix timestamp when rate limit resets
    reset_at: i64,
}

impl ApiQuota {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(QuotaState {
                limit: 60, // Default for unauthenticated requests
                remaining: 60,
                reset_at: Utc::now().timestamp() + 3600,
            })),
        }
    }

    /// Update quota from GitHub API response headers
    pub async fn update_from_headers(&self, headers: &reqwest::header::HeaderMap) {
        fn header<T: std::str::FromStr>(headers: &reqwest::header::HeaderMap, name: &str) -> Option<T> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
        }

        let mut state = self.state.write().await;

        if let Some(limit) = header(headers, "x-ratelimit-limit") {
            state.limit = limit;
        }

        if let Some(remaining) = header(headers, "x-ratelimit-remaining") {
            state.remaining = remaining;
        }

        if let Some(reset) = header(headers, "x-ratelimit-reset") {
            state.reset_at = reset;
        }

        debug!(
            "GitHub quota updated: {}/{} (resets at {})",
            state.remaining, state.limit, state.reset_at
        );
    }

    /// Fail fast when the quota is exhausted instead of waiting for the reset
    pub async fn ensure_available(&self) -> Result<()> {
        let state = self.state.read().await;
        let now = Utc::now().timestamp();

        if state.remaining == 0 && now < state.reset_at {
            warn!(
                "GitHub quota exhausted ({}/{}), resets in {}s",
                state.remaining,
                state.limit,
                state.reset_at - now
            );
            return Err(Error::UpstreamApi(format!(
                "GitHub API quota exhausted until {}",
                Self::reset_time(state.reset_at)
            )));
        }

        Ok(())
    }

    fn reset_time(reset_at: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(reset_at, 0).unwrap_or_else(Utc::now)
    }
}

impl Default for ApiQuota {
    fn default() -> Self {
        Self::new()
    }
}
