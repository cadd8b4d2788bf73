//! Sliding-window request budget.
//!
//! [`RateWindow`] is the bookkeeping half of the rate limiter. It never sleeps
//! and never reads the clock itself: every operation takes the current
//! [`Instant`], which keeps the state machine deterministic under a simulated
//! clock.
//!
//! # Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use discogs_xlsx::rate_limit::{RateLimitConfig, RateWindow, ServerBudget};
//!
//! let mut window = RateWindow::new(&RateLimitConfig::default());
//! let now = Instant::now();
//!
//! assert!(window.try_acquire(now).is_ok());
//! window.record(now, &ServerBudget::from_remaining(0));
//!
//! // The server says the budget is gone: wait for the window to roll over.
//! let wait = window.try_acquire(now).unwrap_err();
//! assert!(wait > Duration::from_secs(60));
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::rate_limit::RateLimitConfig;

/// Where the limiter currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Calls may be issued while the remaining budget is above zero.
    HasBudget,
    /// Budget exhausted; no call before `until`.
    Waiting {
        /// End of the wait, including the safety margin
        until: Instant,
    },
    /// The server answered 429; no call before `until`.
    CooldownAfter429 {
        /// End of the cooldown
        until: Instant,
    },
}

/// Rate limit values reported by the server on a response.
///
/// Discogs sends `X-Discogs-Ratelimit`, `X-Discogs-Ratelimit-Used` and
/// `X-Discogs-Ratelimit-Remaining`. Any of them may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerBudget {
    /// Calls allowed per window
    pub limit: Option<u32>,
    /// Calls used in the current window
    pub used: Option<u32>,
    /// Calls left in the current window
    pub remaining: Option<u32>,
}

impl ServerBudget {
    /// A budget carrying only the remaining count.
    pub fn from_remaining(remaining: u32) -> Self {
        Self {
            remaining: Some(remaining),
            ..Self::default()
        }
    }

    /// Whether the server reported nothing at all.
    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.used.is_none() && self.remaining.is_none()
    }

    /// Remaining calls, derived from `limit - used` when not reported directly.
    pub fn remaining(&self) -> Option<u32> {
        self.remaining
            .or_else(|| Some(self.limit?.saturating_sub(self.used?)))
    }
}

/// Sliding-window budget with server-authoritative corrections.
///
/// Local accounting keeps the instants of the calls issued during the last
/// window. When the server reports a remaining count it replaces the local
/// estimate until the next wait completes.
#[derive(Debug)]
pub struct RateWindow {
    state: WindowState,
    /// Instants of calls issued within the last window, oldest first
    calls: VecDeque<Instant>,
    /// Last remaining count reported by the server
    reported_remaining: Option<u32>,
    max_calls: u32,
    window: Duration,
    safety_margin: Duration,
    cooldown: Duration,
}

impl RateWindow {
    /// Create a window with a full budget.
    pub fn new(config: &RateLimitConfig) -> Self {
        let max_calls = config.max_calls_per_window.max(1);
        Self {
            state: WindowState::HasBudget,
            calls: VecDeque::with_capacity(max_calls as usize),
            reported_remaining: None,
            max_calls,
            window: config.window,
            safety_margin: config.safety_margin,
            cooldown: config.throttle_cooldown,
        }
    }

    /// Current state.
    pub fn state(&self) -> WindowState {
        self.state
    }

    /// Calls allowed per window.
    pub fn max_calls(&self) -> u32 {
        self.max_calls
    }

    /// Calls issued inside the window ending at `now`.
    pub fn calls_in_window(&self, now: Instant) -> usize {
        self.calls
            .iter()
            .filter(|ts| now.saturating_duration_since(**ts) < self.window)
            .count()
    }

    /// Remaining budget at `now`.
    pub fn remaining(&self, now: Instant) -> u32 {
        self.reported_remaining
            .unwrap_or_else(|| self.max_calls.saturating_sub(self.calls_in_window(now) as u32))
    }

    /// When the oldest call in the window expires and frees a slot.
    pub fn resets_at(&self, now: Instant) -> Instant {
        self.calls
            .iter()
            .find(|ts| now.saturating_duration_since(**ts) < self.window)
            .map_or(now + self.window, |oldest| *oldest + self.window)
    }

    /// Try to reserve a call at `now`.
    ///
    /// Returns `Ok(())` if the call may be issued, or `Err(wait_time)` if the
    /// caller must wait first.
    pub fn try_acquire(&mut self, now: Instant) -> Result<(), Duration> {
        match self.state {
            WindowState::Waiting { until } | WindowState::CooldownAfter429 { until } => {
                if now < until {
                    return Err(until - now);
                }
                self.refill(now);
            }
            WindowState::HasBudget => self.cleanup_old(now),
        }

        if self.remaining(now) == 0 {
            // cleanup_old leaves only calls with ts + window > now, so this is in the future
            let until = self.resets_at(now) + self.safety_margin;
            self.state = WindowState::Waiting { until };
            return Err(until - now);
        }

        self.calls.push_back(now);
        Ok(())
    }

    /// Apply the values the server reported on the latest response.
    pub fn record(&mut self, _now: Instant, budget: &ServerBudget) {
        if let Some(limit) = budget.limit.filter(|limit| *limit > 0) {
            self.max_calls = limit;
        }

        self.reported_remaining = match budget.remaining() {
            Some(remaining) => Some(remaining),
            // The issued call is already in `calls`, so a purely local estimate
            // is decremented implicitly.
            None => self.reported_remaining.map(|r| r.saturating_sub(1)),
        };
    }

    /// The server answered 429: hold every call until the cooldown ends.
    pub fn throttled(&mut self, now: Instant) {
        self.reported_remaining = Some(0);
        self.state = WindowState::CooldownAfter429 {
            until: now + self.cooldown,
        };
    }

    fn refill(&mut self, now: Instant) {
        self.state = WindowState::HasBudget;
        self.reported_remaining = None;
        self.cleanup_old(now);
    }

    /// Remove calls that are outside the window.
    fn cleanup_old(&mut self, now: Instant) {
        let window = self.window;
        while self
            .calls
            .front()
            .is_some_and(|ts| now.saturating_duration_since(*ts) >= window)
        {
            self.calls.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_calls: u32) -> RateLimitConfig {
        RateLimitConfig {
            max_calls_per_window: max_calls,
            window: Duration::from_secs(60),
            safety_margin: Duration::from_secs(1),
            throttle_cooldown: Duration::from_secs(60),
            enabled: true,
        }
    }

    /// Largest number of `issued` calls falling in any window of `window` length.
    fn max_calls_in_any_window(issued: &[Instant], window: Duration) -> usize {
        issued
            .iter()
            .enumerate()
            .map(|(i, start)| {
                issued[i..]
                    .iter()
                    .take_while(|ts| ts.duration_since(*start) < window)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_initial_state_has_full_budget() {
        let window = RateWindow::new(&config(60));
        let now = Instant::now();
        assert_eq!(window.state(), WindowState::HasBudget);
        assert_eq!(window.remaining(now), 60);
    }

    #[test]
    fn test_local_accounting_blocks_after_max_calls() {
        let mut window = RateWindow::new(&config(3));
        let now = Instant::now();

        for _ in 0..3 {
            assert!(window.try_acquire(now).is_ok());
            window.record(now, &ServerBudget::default());
        }
        let wait = window.try_acquire(now).unwrap_err();
        assert_eq!(wait, Duration::from_secs(61));
        assert!(matches!(window.state(), WindowState::Waiting { .. }));

        let later = now + wait;
        assert!(window.try_acquire(later).is_ok());
        assert_eq!(window.state(), WindowState::HasBudget);
    }

    #[test]
    fn test_server_remaining_overrides_local_budget() {
        let mut window = RateWindow::new(&config(60));
        let now = Instant::now();

        assert!(window.try_acquire(now).is_ok());
        window.record(now, &ServerBudget::from_remaining(0));
        assert_eq!(window.remaining(now), 0);
        assert!(window.try_acquire(now).is_err());
    }

    #[test]
    fn test_remaining_derived_from_limit_and_used() {
        let budget = ServerBudget {
            limit: Some(60),
            used: Some(58),
            remaining: None,
        };
        assert_eq!(budget.remaining(), Some(2));
        assert!(ServerBudget::default().remaining().is_none());
        assert!(ServerBudget::default().is_empty());
    }

    #[test]
    fn test_reported_limit_replaces_configured_maximum() {
        let mut window = RateWindow::new(&config(60));
        let now = Instant::now();
        window.try_acquire(now).ok();
        window.record(
            now,
            &ServerBudget {
                limit: Some(25),
                used: None,
                remaining: None,
            },
        );
        assert_eq!(window.max_calls(), 25);
        assert_eq!(window.remaining(now), 24);
    }

    #[test]
    fn test_missing_headers_decrement_last_reported_value() {
        let mut window = RateWindow::new(&config(60));
        let now = Instant::now();
        window.try_acquire(now).ok();
        window.record(now, &ServerBudget::from_remaining(10));
        window.try_acquire(now).ok();
        window.record(now, &ServerBudget::default());
        assert_eq!(window.remaining(now), 9);
    }

    #[test]
    fn test_cooldown_after_429() {
        let mut window = RateWindow::new(&config(60));
        let now = Instant::now();
        window.try_acquire(now).ok();
        window.throttled(now);

        assert!(matches!(
            window.state(),
            WindowState::CooldownAfter429 { .. }
        ));
        let wait = window.try_acquire(now + Duration::from_secs(20)).unwrap_err();
        assert_eq!(wait, Duration::from_secs(40));

        assert!(window.try_acquire(now + Duration::from_secs(60)).is_ok());
        assert_eq!(window.state(), WindowState::HasBudget);
    }

    #[test]
    fn test_never_exceeds_budget_with_exhausting_server() {
        let max_calls = 5;
        let window_len = Duration::from_secs(60);
        let mut window = RateWindow::new(&config(max_calls));
        let mut now = Instant::now();
        let mut server_log: Vec<Instant> = Vec::new();
        let mut issued = Vec::new();

        // Irregular spacing between calls, including bursts.
        let spacing = [0u64, 0, 7, 13, 1, 0, 29, 3];
        let mut step = 0;

        while issued.len() < 60 {
            match window.try_acquire(now) {
                Ok(()) => {
                    issued.push(now);
                    server_log.push(now);
                    let used = server_log
                        .iter()
                        .filter(|ts| now.duration_since(**ts) < window_len)
                        .count() as u32;
                    window.record(
                        now,
                        &ServerBudget {
                            limit: Some(max_calls),
                            used: Some(used),
                            remaining: Some(max_calls.saturating_sub(used)),
                        },
                    );
                    now += Duration::from_secs(spacing[step % spacing.len()]);
                    step += 1;
                }
                Err(wait) => {
                    assert!(wait > Duration::ZERO);
                    now += wait;
                }
            }
        }

        assert!(max_calls_in_any_window(&issued, window_len) <= max_calls as usize);
    }

    #[test]
    fn test_never_exceeds_budget_without_server_headers() {
        let max_calls = 4;
        let window_len = Duration::from_secs(60);
        let mut window = RateWindow::new(&config(max_calls));
        let mut now = Instant::now();
        let mut issued = Vec::new();
        let spacing = [0u64, 59, 0, 2, 31];
        let mut step = 0;

        while issued.len() < 40 {
            match window.try_acquire(now) {
                Ok(()) => {
                    issued.push(now);
                    window.record(now, &ServerBudget::default());
                    now += Duration::from_secs(spacing[step % spacing.len()]);
                    step += 1;
                }
                Err(wait) => now += wait,
            }
        }

        assert!(max_calls_in_any_window(&issued, window_len) <= max_calls as usize);
    }
}
