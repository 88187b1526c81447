//! Fixed-window request throttling for polite fetching.
//!
//! A single [`RateLimiter`] is shared by every adapter in a run, so the
//! configured requests-per-minute budget applies across all sources. The
//! time source and the sleep primitive are injected so tests can drive the
//! window without waiting on a real clock.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Length of one rate-limit window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Monotonic time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Async sleep primitive.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug)]
struct Window {
    start: Instant,
    count: u32,
    sleeps: u64,
}

/// Allows at most `rpm` acquisitions per 60-second window.
///
/// When the budget is spent, [`acquire`](Self::acquire) sleeps for the rest
/// of the window (never less) and then opens a fresh one.
#[derive(Debug)]
pub struct RateLimiter<C = SystemClock, S = TokioSleeper> {
    rpm: u32,
    clock: C,
    sleeper: S,
    window: Mutex<Window>,
}

impl<C: Clock, S: Sleeper> RateLimiter<C, S> {
    /// `rpm` values below 1 are treated as 1.
    pub fn new(rpm: u32, clock: C, sleeper: S) -> Self {
        let start = clock.now();
        Self {
            rpm: rpm.max(1),
            clock,
            sleeper,
            window: Mutex::new(Window {
                start,
                count: 0,
                sleeps: 0,
            }),
        }
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    fn lock(&self) -> MutexGuard<'_, Window> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait until a request may be sent. Returns how long it slept, if at all.
    pub async fn acquire(&self) -> Option<Duration> {
        let wait = {
            let mut window = self.lock();
            let now = self.clock.now();
            let mut elapsed = now.saturating_duration_since(window.start);
            if elapsed >= WINDOW {
                window.start = now;
                window.count = 0;
                elapsed = Duration::ZERO;
            }
            if window.count < self.rpm {
                window.count += 1;
                return None;
            }
            WINDOW.saturating_sub(elapsed)
        };

        // Lock is released while sleeping.
        if !wait.is_zero() {
            tracing::debug!(
                sleep_ms = %wait.as_millis(),
                rpm = self.rpm,
                "Rate limit reached, sleeping"
            );
            self.sleeper.sleep(wait).await;
        }

        let mut window = self.lock();
        window.start = self.clock.now();
        window.count = 1;
        if wait.is_zero() {
            None
        } else {
            window.sleeps += 1;
            Some(wait)
        }
    }

    /// Number of sleeps since the last call, resetting the counter.
    pub fn take_sleeps(&self) -> u64 {
        std::mem::take(&mut self.lock().sleeps)
    }
}
