//! Token-bucket rate limiter gating every outbound tracker write.
//!
//! `acquire()` never rejects; it resolves once a token is available,
//! backing off with a timed sleep when the bucket is empty. Token count
//! is kept as a float so partial refills carry forward across calls.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

struct State {
    tokens: f64,
    last_refill: Instant,
}

pub struct RateLimiter {
    per_second: f64,
    burst: f64,
    state: Mutex<State>,
}

impl RateLimiter {
    pub fn new(per_second: f64, burst: u32) -> Self {
        Self {
            per_second,
            burst: burst as f64,
            state: Mutex::new(State {
                tokens: burst as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Refill from elapsed time, then either take a token (returning
    /// `None`) or report how long the caller must sleep before retrying.
    fn refill_and_try_take(&self) -> Option<Duration> {
        let mut state = self.state.lock();
        let now = Instant::now();
        let elapsed_ms = now.duration_since(state.last_refill).as_secs_f64() * 1000.0;
        state.tokens = (state.tokens + elapsed_ms * self.per_second / 1000.0).min(self.burst);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            None
        } else {
            let wait_ms = ((1.0 - state.tokens) / (self.per_second / 1000.0)).ceil();
            Some(Duration::from_millis(wait_ms.max(0.0) as u64))
        }
    }

    /// Resolve once a token is available. Never rejects; a waiter that
    /// races with others simply recomputes its wait after sleeping.
    pub async fn acquire(&self) {
        loop {
            match self.refill_and_try_take() {
                None => return,
                Some(wait) => tokio::time::sleep(wait).await,
            }
        }
    }
}
