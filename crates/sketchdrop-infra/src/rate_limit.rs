use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Process-wide sliding-window rate limiter.
///
/// Keeps the timestamps of recent requests in an ordered window. Admission
/// appends the current instant, prunes entries older than the retention
/// period, then checks the window size against the limit, so the just-added
/// timestamp always counts toward the limit. Constructed once at startup and
/// shared by every request handler; the internal mutex serializes concurrent
/// admission checks so the limit cannot be transiently exceeded.
pub struct SlidingWindowLimiter {
    window: Mutex<VecDeque<Instant>>,
    limit: usize,
    period: Duration,
}

impl SlidingWindowLimiter {
    pub fn new(limit: usize, period: Duration) -> Self {
        Self {
            window: Mutex::new(VecDeque::new()),
            limit,
            period,
        }
    }

    /// Admit or reject a request arriving now. Purely a boolean gate; a
    /// limit of 0 rejects all traffic, a period of 0 admits all traffic.
    pub async fn admit(&self) -> bool {
        self.admit_at(Instant::now()).await
    }

    /// Admission check against an explicit clock reading.
    pub async fn admit_at(&self, now: Instant) -> bool {
        let mut window = self.window.lock().await;

        window.push_back(now);
        while let Some(&oldest) = window.front() {
            if oldest + self.period <= now {
                window.pop_front();
            } else {
                break;
            }
        }

        let admitted = window.len() <= self.limit;
        if !admitted {
            tracing::warn!(
                window_len = window.len(),
                limit = self.limit,
                "Request dropped: rate limit exceeded"
            );
        }
        admitted
    }
}
