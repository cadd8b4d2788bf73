//! Rate limiting for the Discogs API.
//!
//! Discogs allows 60 authenticated requests per minute, counted over a moving
//! window, and reports the current budget on every response through the
//! `X-Discogs-Ratelimit*` headers. This module keeps every call of a session
//! inside that budget.
//!
//! ## States
//!
//! - **HasBudget**: calls go through immediately
//! - **Waiting**: the budget is exhausted; the next call waits for the window
//!   to roll over (plus a safety margin)
//! - **CooldownAfter429**: the server throttled us anyway; the next call waits
//!   out a fixed cooldown
//!
//! Server-reported values always win over local accounting.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use discogs_xlsx::rate_limit::{RateLimitConfig, RateLimiter};
//!
//! let limiter = RateLimiter::new(RateLimitConfig {
//!     throttle_cooldown: Duration::from_secs(30),
//!     ..RateLimitConfig::default()
//! });
//! assert!(limiter.config().enabled);
//! ```

mod limiter;
mod window;

pub use limiter::{RateLimiter, headers};
pub use window::{RateWindow, ServerBudget, WindowState};

use std::time::Duration;

use crate::error::DiscogsError;

/// Rate limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Calls allowed inside one window.
    pub max_calls_per_window: u32,
    /// Length of the window.
    pub window: Duration,
    /// Extra time waited past the computed reset.
    pub safety_margin: Duration,
    /// Wait after a 429 before retrying the same request.
    pub throttle_cooldown: Duration,
    /// Whether to enable rate limiting.
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls_per_window: limits::AUTHENTICATED_CALLS_PER_WINDOW,
            window: limits::WINDOW,
            safety_margin: limits::SAFETY_MARGIN,
            throttle_cooldown: limits::WINDOW,
            enabled: true,
        }
    }
}

impl RateLimitConfig {
    /// Check that the configuration can make progress.
    pub fn validate(&self) -> Result<(), DiscogsError> {
        if self.max_calls_per_window == 0 {
            return Err(DiscogsError::InvalidConfig(
                "max calls per window must be at least 1".to_string(),
            ));
        }
        if self.window.is_zero() {
            return Err(DiscogsError::InvalidConfig(
                "rate limit window must be longer than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Discogs rate limit constants.
pub mod limits {
    use std::time::Duration;

    /// Requests per window with a token.
    pub const AUTHENTICATED_CALLS_PER_WINDOW: u32 = 60;
    /// Length of the moving window.
    pub const WINDOW: Duration = Duration::from_secs(60);
    /// Margin added to computed waits.
    pub const SAFETY_MARGIN: Duration = Duration::from_secs(1);
}
