//! In-memory sliding-window rate limiter keyed by client IP.
use crate::config::RateLimit;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Tracked identifiers above which stale entries are dropped on the next check.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests: limit.max_requests,
            window: limit.window,
        }
    }

    /// Records a request for `identifier` and reports whether it is allowed.
    pub async fn check(&self, identifier: &str) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.write().await;

        if requests.len() > PRUNE_THRESHOLD {
            Self::prune(&mut requests, now, self.window);
        }

        let history = requests.entry(identifier.to_string()).or_default();
        history.retain(|&timestamp| now.duration_since(timestamp) < self.window);

        if history.len() < self.max_requests {
            history.push(now);
            true
        } else {
            false
        }
    }

    fn prune(requests: &mut HashMap<String, Vec<Instant>>, now: Instant, window: Duration) {
        let before = requests.len();
        requests.retain(|_, history| {
            history.retain(|&timestamp| now.duration_since(timestamp) < window);
            !history.is_empty()
        });
        tracing::debug!(
            "Rate limiter pruned {} of {} identifiers",
            before - requests.len(),
            before
        );
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.requests.read().await.len()
    }
}
