//! Async gate in front of every Discogs call.

use std::time::Instant;

use reqwest::header::HeaderMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::rate_limit::{RateLimitConfig, RateWindow, ServerBudget, WindowState};

/// Rate limit response headers.
pub mod headers {
    /// Calls allowed per window.
    pub const LIMIT: &str = "x-discogs-ratelimit";
    /// Calls used in the current window.
    pub const USED: &str = "x-discogs-ratelimit-used";
    /// Calls left in the current window.
    pub const REMAINING: &str = "x-discogs-ratelimit-remaining";
}

impl ServerBudget {
    /// Read the `X-Discogs-Ratelimit*` headers of a response.
    ///
    /// Missing or unparsable headers are reported as `None`.
    pub fn from_headers(map: &HeaderMap) -> Self {
        let read = |name: &str| {
            map.get(name)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u32>().ok())
        };
        Self {
            limit: read(headers::LIMIT),
            used: read(headers::USED),
            remaining: read(headers::REMAINING),
        }
    }
}

/// Blocking rate limiter shared by all calls of one session.
///
/// [`before_call`](Self::before_call) suspends the caller until the window
/// allows another request; [`record`](Self::record) feeds back what the server
/// reported.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    window: Mutex<RateWindow>,
}

impl RateLimiter {
    /// Create a new limiter with a full budget.
    pub fn new(config: RateLimitConfig) -> Self {
        let window = RateWindow::new(&config);
        Self {
            config,
            window: Mutex::new(window),
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Wait until one call may be issued, then reserve it.
    pub async fn before_call(&self) {
        if !self.config.enabled {
            return;
        }

        loop {
            let mut window = self.window.lock().await;
            match window.try_acquire(Instant::now()) {
                Ok(()) => return,
                Err(wait_time) => {
                    let state = window.state();
                    drop(window);
                    match state {
                        WindowState::CooldownAfter429 { .. } => {
                            debug!(wait_ms = wait_time.as_millis() as u64, "Cooling down after 429")
                        }
                        _ => debug!(
                            wait_ms = wait_time.as_millis() as u64,
                            "Rate limit budget exhausted, waiting for the window to reset"
                        ),
                    }
                    tokio::time::sleep(wait_time).await;
                }
            }
        }
    }

    /// Apply the rate limit values reported on a response.
    pub async fn record(&self, budget: &ServerBudget) {
        if !self.config.enabled {
            return;
        }
        let mut window = self.window.lock().await;
        window.record(Instant::now(), budget);
        debug!(
            remaining = window.remaining(Instant::now()),
            reported = !budget.is_empty(),
            "Rate limit budget updated"
        );
    }

    /// The server answered 429 even though the budget allowed the call.
    pub async fn throttled(&self) {
        warn!(
            cooldown_secs = self.config.throttle_cooldown.as_secs_f64(),
            "Throttled by Discogs, cooling down"
        );
        if !self.config.enabled {
            tokio::time::sleep(self.config.throttle_cooldown).await;
            return;
        }
        self.window.lock().await.throttled(Instant::now());
    }

    /// Remaining budget right now.
    pub async fn remaining(&self) -> u32 {
        self.window.lock().await.remaining(Instant::now())
    }
}
