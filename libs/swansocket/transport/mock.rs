//! In-memory transport
//!
//! Records what the session does to it and lets a test play the server
//! side by injecting signals through a [`MockHandle`].

use crate::traits::*;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct MockState {
    opened_url: Option<String>,
    signals: Option<SignalSender>,
    sent: Vec<String>,
    close_calls: usize,
    fail_open: Option<String>,
    fail_send: Option<String>,
}

/// Transport that never touches the network
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    auto_open: bool,
    confirm_close: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            auto_open: false,
            confirm_close: true,
        }
    }

    /// Report `Open` as soon as the session opens the transport
    pub fn with_auto_open(mut self) -> Self {
        self.auto_open = true;
        self
    }

    /// Leave `close()` unconfirmed until the test calls [`MockHandle::close`]
    pub fn without_close_confirmation(mut self) -> Self {
        self.confirm_close = false;
        self
    }

    /// Make `open()` itself fail
    pub fn failing_open(self, reason: impl Into<String>) -> Self {
        self.state.lock().fail_open = Some(reason.into());
        self
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn open(&mut self, url: &str, signals: SignalSender) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(reason) = state.fail_open.clone() {
            return Err(SocketError::Transport(reason));
        }
        state.opened_url = Some(url.to_string());
        if self.auto_open {
            let _ = signals.send(TransportSignal::Open);
        }
        state.signals = Some(signals);
        Ok(())
    }

    fn send(&mut self, frame: &str) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(reason) = state.fail_send.clone() {
            return Err(SocketError::Transport(reason));
        }
        state.sent.push(frame.to_string());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.close_calls += 1;
        if self.confirm_close {
            if let Some(signals) = &state.signals {
                let _ = signals.send(TransportSignal::Close);
            }
        }
        Ok(())
    }
}

/// Test-side view of a [`MockTransport`]
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    /// URL passed to `open`, if the transport was opened
    pub fn opened_url(&self) -> Option<String> {
        self.state.lock().opened_url.clone()
    }

    /// Frames sent so far
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().sent.clone()
    }

    /// Drain the frames sent so far
    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().sent)
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().close_calls
    }

    /// Make every following `send` fail
    pub fn fail_sends(&self, reason: impl Into<String>) {
        self.state.lock().fail_send = Some(reason.into());
    }

    pub fn open(&self) {
        self.signal(TransportSignal::Open);
    }

    /// Deliver an inbound frame
    pub fn deliver(&self, frame: impl Into<String>) {
        self.signal(TransportSignal::Message(frame.into()));
    }

    pub fn error(&self, reason: impl Into<String>) {
        self.signal(TransportSignal::Error(reason.into()));
    }

    pub fn close(&self) {
        self.signal(TransportSignal::Close);
    }

    fn signal(&self, signal: TransportSignal) {
        if let Some(signals) = &self.state.lock().signals {
            let _ = signals.send(signal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_open_and_sends() {
        let mut transport = MockTransport::new().with_auto_open();
        let handle = transport.handle();
        let (tx, mut rx) = signal_channel();

        transport.open("ws://mock", tx).unwrap();
        transport.send("2probe").unwrap();

        assert_eq!(handle.opened_url().as_deref(), Some("ws://mock"));
        assert_eq!(handle.sent(), vec!["2probe".to_string()]);
        assert_eq!(rx.recv().await, Some(TransportSignal::Open));
    }

    #[tokio::test]
    async fn test_close_confirms_by_default() {
        let mut transport = MockTransport::new();
        let handle = transport.handle();
        let (tx, mut rx) = signal_channel();

        transport.open("ws://mock", tx).unwrap();
        transport.close().unwrap();

        assert_eq!(handle.close_calls(), 1);
        assert_eq!(rx.recv().await, Some(TransportSignal::Close));
    }

    #[test]
    fn test_failing_open() {
        let mut transport = MockTransport::new().failing_open("refused");
        let (tx, _rx) = signal_channel();
        assert_eq!(
            transport.open("ws://mock", tx),
            Err(SocketError::Transport("refused".to_string()))
        );
    }
}
