//! One-shot playback timer
//!
//! Wraps a tokio [`Sleep`] so the playback loop can arm a single
//! deadline, wait for it alongside the signal channel, and re-arm it
//! for the next beep or gap. An unarmed timer never fires.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{sleep, Instant, Sleep};
use tracing::trace;

/// A timer that fires once per arming
pub struct OneShotTimer {
    sleep: Pin<Box<Sleep>>,
    armed: bool,
}

impl OneShotTimer {
    /// Create an unarmed timer
    pub fn new() -> Self {
        Self {
            sleep: Box::pin(sleep(Duration::ZERO)),
            armed: false,
        }
    }

    /// Arm the timer to fire once, `timeout` from now
    ///
    /// Arming an already armed timer replaces the pending deadline.
    pub fn arm(&mut self, timeout: Duration) {
        trace!(timeout_ms = timeout.as_millis() as u64, "timer armed");
        self.sleep.as_mut().reset(Instant::now() + timeout);
        self.armed = true;
    }

    /// True if a deadline is pending
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Wait until the armed deadline passes, then disarm
    ///
    /// While unarmed this pends forever, so it can sit in a `select!`
    /// arm without a guard condition.
    pub async fn expired(&mut self) {
        if !self.armed {
            pending::<()>().await;
        }
        self.sleep.as_mut().await;
        self.armed = false;
    }
}

impl Default for OneShotTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, task};

    #[tokio::test(start_paused = true)]
    async fn test_arm_and_expire() {
        let mut timer = OneShotTimer::new();
        let start = Instant::now();

        timer.arm(Duration::from_millis(200));
        assert!(timer.is_armed());

        timer.expired().await;
        assert_eq!(Instant::now() - start, Duration::from_millis(200));
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_deadline() {
        let mut timer = OneShotTimer::new();
        let start = Instant::now();

        timer.arm(Duration::from_secs(10));
        timer.arm(Duration::from_millis(100));

        timer.expired().await;
        assert_eq!(Instant::now() - start, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_per_arming() {
        let mut timer = OneShotTimer::new();

        timer.arm(Duration::from_millis(50));
        timer.expired().await;
        assert!(!timer.is_armed());

        timer.arm(Duration::from_millis(75));
        timer.expired().await;
        assert!(!timer.is_armed());
    }

    #[tokio::test]
    async fn test_unarmed_timer_never_fires() {
        let mut timer = OneShotTimer::new();
        let mut fut = task::spawn(timer.expired());
        assert_pending!(fut.poll());
    }
}
