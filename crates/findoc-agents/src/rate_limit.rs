use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Sliding-window cap on calls: at most `max_calls` acquisitions per `window`.
///
/// `max_calls == 0` disables the cap.
pub struct RateLimiter {
    max_calls: u32,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: u32, window: Duration) -> Self {
        Self {
            max_calls,
            window,
            calls: Mutex::new(VecDeque::with_capacity(max_calls as usize)),
        }
    }

    pub fn per_minute(max_calls: u32) -> Self {
        Self::new(max_calls, Duration::from_secs(60))
    }

    pub fn max_calls(&self) -> u32 {
        self.max_calls
    }

    /// Wait until a call slot is free, then claim it.
    pub async fn acquire(&self) {
        if self.max_calls == 0 {
            return;
        }

        loop {
            let wait = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                while let Some(oldest) = calls.front() {
                    if now.duration_since(*oldest) >= self.window {
                        calls.pop_front();
                    } else {
                        break;
                    }
                }

                if calls.len() < self.max_calls as usize {
                    calls.push_back(now);
                    return;
                }

                match calls.front() {
                    Some(oldest) => self.window - now.duration_since(*oldest),
                    None => Duration::ZERO,
                }
            };

            debug!(wait_ms = wait.as_millis() as u64, "Rate cap reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }
}
