use std::sync::{Arc, Mutex};

use chrono::Utc;
use reqwest::Response;
use tokio::time::{sleep, Duration};

/// Safety margin added on top of the reported reset time before retrying.
pub const RESET_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Tracks the account-wide API quota from `x-ratelimit-*` response headers.
///
/// The state is shared so that every request made through the same client
/// observes the same quota, which is account-wide on the GitHub side.
pub struct RateLimiter {
    state: Arc<Mutex<RateLimitState>>,
    margin: Duration,
}

struct RateLimitState {
    remaining: u32,
    reset_at: Option<u64>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RateLimitState {
                remaining: 5000,
                reset_at: None,
            })),
            margin: RESET_MARGIN,
        }
    }

    /// Overrides the reset margin. Tests use a zero margin to keep the
    /// backoff path fast.
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// Blocks the current task while the quota is exhausted and the reset
    /// time is known. Only this task is suspended; independent work keeps
    /// running.
    pub async fn wait(&self) {
        let backoff = {
            let state = self.state.lock().unwrap();
            match state.reset_at {
                Some(reset) if state.remaining == 0 && reset > now_unix() => {
                    Some(self.backoff_from(reset))
                }
                _ => None,
            }
        };

        if let Some(backoff) = backoff {
            tracing::info!("Rate limit exhausted, waiting {:?}", backoff);
            sleep(backoff).await;
        }
    }

    /// Time to sleep before retrying after a rate-limit signal carrying the
    /// given reset timestamp: until the reset, plus the safety margin.
    pub fn backoff_from(&self, reset: u64) -> Duration {
        Duration::from_secs(reset.saturating_sub(now_unix())) + self.margin
    }

    pub fn update_from_response(&self, response: &Response) {
        let remaining = header_u64(response, "x-ratelimit-remaining");
        let reset = header_u64(response, "x-ratelimit-reset");

        if let Some(remaining) = remaining {
            let mut state = self.state.lock().unwrap();
            state.remaining = remaining as u32;
            if let Some(reset) = reset {
                state.reset_at = Some(reset);
            }
        }
    }

    /// Detects GitHub's rate-limit signal: a 403 or 429 status with the
    /// remaining quota reported as zero. Returns the reset timestamp.
    pub fn rate_limit_signal(response: &Response) -> Option<u64> {
        let status = response.status();
        if status != reqwest::StatusCode::FORBIDDEN
            && status != reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            return None;
        }
        if header_u64(response, "x-ratelimit-remaining") != Some(0) {
            return None;
        }
        Some(header_u64(response, "x-ratelimit-reset").unwrap_or_else(now_unix))
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn now_unix() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

fn header_u64(response: &Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_includes_margin() {
        let limiter = RateLimiter::new().with_margin(Duration::from_secs(300));
        let reset = now_unix() + 60;
        let backoff = limiter.backoff_from(reset);
        // 60s to reset plus the 5 minute margin, allowing for clock skew
        assert!(backoff >= Duration::from_secs(359));
        assert!(backoff <= Duration::from_secs(361));
    }

    #[test]
    fn test_backoff_past_reset_is_just_the_margin() {
        let limiter = RateLimiter::new().with_margin(Duration::ZERO);
        assert_eq!(limiter.backoff_from(0), Duration::ZERO);
    }
}
