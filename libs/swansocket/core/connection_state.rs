//! Lock-free session state and counters
//!
//! The session state is a single `AtomicU8`, so `emit` and `close` can check
//! it from any task while the driver owns every other transition.
//!
//! ```text
//! Connecting ──(transport open)──> Open ──(close / fatal error)──> Closed
//!      └──────────(transport error / close)──────────────────────────┘
//! ```

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Lifecycle state of a session
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Connecting = 0,
    Open = 1,
    Closed = 2,
}

impl SessionState {
    #[inline]
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Connecting,
            1 => SessionState::Open,
            _ => SessionState::Closed,
        }
    }
}

/// Atomic wrapper around [`SessionState`]
#[derive(Debug)]
pub struct AtomicSessionState {
    inner: AtomicU8,
}

impl AtomicSessionState {
    pub fn new(state: SessionState) -> Self {
        Self {
            inner: AtomicU8::new(state as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.inner.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: SessionState) {
        self.inner.store(state as u8, Ordering::Release);
    }

    /// Move from `current` to `new` only if the state is still `current`
    ///
    /// Returns the state observed before the attempt on failure.
    #[inline]
    pub fn compare_exchange(
        &self,
        current: SessionState,
        new: SessionState,
    ) -> Result<SessionState, SessionState> {
        self.inner
            .compare_exchange(current as u8, new as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(SessionState::from_u8)
            .map_err(SessionState::from_u8)
    }

    #[inline]
    pub fn is_connecting(&self) -> bool {
        self.get() == SessionState::Connecting
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.get() == SessionState::Open
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.get() == SessionState::Closed
    }
}

/// Frame counters
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    frames_sent: AtomicU64,
    frames_received: AtomicU64,
    probes_sent: AtomicU64,
    keepalives_received: AtomicU64,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_probes(&self) {
        self.probes_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_keepalives(&self) {
        self.keepalives_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    pub fn probes_sent(&self) -> u64 {
        self.probes_sent.load(Ordering::Relaxed)
    }

    pub fn keepalives_received(&self) -> u64 {
        self.keepalives_received.load(Ordering::Relaxed)
    }
}
