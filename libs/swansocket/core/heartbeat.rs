//! Keepalive scheduling
//!
//! # Architecture
//!
//! The keepalive is a single-shot deadline owned by the session driver, not a
//! free-running ticker:
//!
//! ```text
//! open ──arm──> [deadline] ──expires──> send "2probe" (disarmed)
//!                   ^                           │
//!                   └────arm──── pong "3..." <──┘
//! ```
//!
//! Arming replaces any pending deadline, so there is never more than one
//! probe pending. Closing the session disarms it. Because the deadline lives
//! inside the driver's `select!` loop, a disarmed deadline can never fire on
//! a dead transport.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default spacing between keepalive probes
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_millis(2000);

/// Single pending keepalive probe
#[derive(Debug)]
pub struct Keepalive {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Keepalive {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedule the next probe one interval from now, replacing any pending one
    pub fn arm(&mut self) {
        if self.deadline.is_some() {
            debug!("Rescheduling pending keepalive probe");
        }
        self.deadline = Some(Instant::now() + self.interval);
    }

    /// Cancel the pending probe, if any
    pub fn disarm(&mut self) {
        if self.deadline.take().is_some() {
            debug!("Keepalive probe canceled");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Wait for the pending deadline
    ///
    /// Never completes when disarmed. The caller disarms after expiry; the
    /// next probe is only scheduled by the next keepalive signal.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_arm_sets_single_deadline() {
        let mut keepalive = Keepalive::new(Duration::from_millis(2000));
        assert!(!keepalive.is_armed());
        assert_eq!(keepalive.interval(), Duration::from_millis(2000));

        let before = Instant::now();
        keepalive.arm();
        assert_eq!(keepalive.deadline(), Some(before + Duration::from_millis(2000)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_deadline() {
        let mut keepalive = Keepalive::new(Duration::from_millis(2000));
        keepalive.arm();
        let first = keepalive.deadline().unwrap();

        tokio::time::advance(Duration::from_millis(500)).await;
        keepalive.arm();
        let second = keepalive.deadline().unwrap();

        assert_eq!(second - first, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_waits_for_interval() {
        let mut keepalive = Keepalive::new(Duration::from_millis(100));
        keepalive.arm();

        let start = Instant::now();
        keepalive.expired().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_never_expires() {
        let mut keepalive = Keepalive::new(Duration::from_millis(100));
        keepalive.arm();
        keepalive.disarm();

        let result =
            tokio::time::timeout(Duration::from_secs(10), keepalive.expired()).await;
        assert!(result.is_err());
    }
}
