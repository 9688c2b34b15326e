use crate::codec::{self, Inbound};
use crate::connection_state::{AtomicMetrics, AtomicSessionState, SessionState};
use crate::heartbeat::Keepalive;
use crate::registry::{self, EventRegistry};
use crate::traits::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Message attached to the `error` event when the server drops an open session
pub const CLOSED_BY_SERVER: &str = "The websocket was closed by server";

/// Invoked once when the session opens
pub type SuccessCallback = Box<dyn FnOnce() + Send>;

/// Invoked once when the session fails to open
pub type FailCallback = Box<dyn FnOnce(&SocketError) + Send>;

/// Lifecycle notifications published next to the listener registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The transport opened
    Connected,
    /// The session closed
    Disconnected,
    /// A connection failure or an error event
    Error(String),
}

/// Frame counters snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub probes_sent: u64,
    pub keepalives_received: u64,
    pub state: SessionState,
}

#[derive(Debug)]
enum Command {
    /// Close the transport and report once the transport confirms
    Close(oneshot::Sender<Result<()>>),
}

/// State shared between the session handle and its driver task
struct Shared {
    url: String,
    state: AtomicSessionState,
    registry: EventRegistry,
    metrics: AtomicMetrics,
    transport: Mutex<Box<dyn Transport>>,
    event_tx: Sender<SessionEvent>,
}

impl Shared {
    fn send(&self, frame: &str) -> Result<()> {
        self.transport.lock().send(frame)?;
        self.metrics.increment_sent();
        Ok(())
    }

    fn close_transport(&self) -> Result<()> {
        self.transport.lock().close()
    }

    fn publish(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Everything `connect` hands over to the driver
struct Startup {
    command_rx: mpsc::UnboundedReceiver<Command>,
    ping_interval: Duration,
    on_success: Option<SuccessCallback>,
    on_fail: Option<FailCallback>,
}

/// One logical socket.io connection
///
/// A session owns one transport, one listener registry and one keepalive
/// timer. It is built in the `Connecting` state so listeners can be
/// registered before [`connect`](Self::connect) opens the transport. It is
/// never reused: once `Closed`, build a new session.
///
/// # Example
/// ```ignore
/// let session = swansocket::builder()
///     .url("wss://game.example.com")
///     .param("token", token)
///     .transport(TungsteniteTransport::new())
///     .build();
///
/// session
///     .on("connect", |_| info!("connected"))
///     .on("hello", |args| info!("hello {:?}", args));
///
/// session.connect().await?;
/// session.emit("leave", &[json!({ "name": "A" })])?;
/// session.close().await?;
/// ```
pub struct SocketSession {
    shared: Arc<Shared>,
    command_tx: mpsc::UnboundedSender<Command>,
    startup: Mutex<Option<Startup>>,
    driver: Mutex<Option<tokio::task::JoinHandle<Result<()>>>>,
    event_rx: Receiver<SessionEvent>,
}

impl SocketSession {
    /// Called by the builder's `build()` method
    pub(crate) fn new(
        url: String,
        transport: Box<dyn Transport>,
        ping_interval: Duration,
        on_success: Option<SuccessCallback>,
        on_fail: Option<FailCallback>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = unbounded();

        let shared = Arc::new(Shared {
            url,
            state: AtomicSessionState::new(SessionState::Connecting),
            registry: EventRegistry::new(),
            metrics: AtomicMetrics::new(),
            transport: Mutex::new(transport),
            event_tx,
        });

        Self {
            shared,
            command_tx,
            startup: Mutex::new(Some(Startup {
                command_rx,
                ping_interval,
                on_success,
                on_fail,
            })),
            driver: Mutex::new(None),
            event_rx,
        }
    }

    /// Open the transport and wait until the session is open
    ///
    /// Resolves once the transport reports open; fails with
    /// [`SocketError::ConnectionFailed`] when the transport errors or closes
    /// first. Must be called from within a Tokio runtime, and only once.
    pub async fn connect(&self) -> Result<()> {
        let startup = self.startup.lock().take().ok_or_else(|| {
            SocketError::InvalidState("connect called more than once".to_string())
        })?;

        let (signal_tx, signal_rx) = signal_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        info!("Connecting to {}", self.shared.url);
        let opened = self.shared.transport.lock().open(&self.shared.url, signal_tx);
        if let Err(e) = opened {
            let err = SocketError::ConnectionFailed(e.to_string());
            error!("Failed to open transport: {}", err);
            self.shared.state.set(SessionState::Closed);
            self.shared.publish(SessionEvent::Error(err.to_string()));
            if let Some(on_fail) = startup.on_fail {
                on_fail(&err);
            }
            return Err(err);
        }

        let driver = Driver {
            shared: Arc::clone(&self.shared),
            keepalive: Keepalive::new(startup.ping_interval),
            readiness: Some(Readiness {
                tx: ready_tx,
                on_success: startup.on_success,
                on_fail: startup.on_fail,
            }),
            close_waiters: Vec::new(),
        };
        let handle = tokio::spawn(driver.run(signal_rx, startup.command_rx));
        *self.driver.lock() = Some(handle);

        ready_rx.await.unwrap_or_else(|_| {
            Err(SocketError::ConnectionClosed(
                "session ended before opening".to_string(),
            ))
        })
    }

    /// Register a listener for `event`
    ///
    /// Listeners for the same event accumulate and run in registration order.
    pub fn on<F>(&self, event: impl Into<String>, listener: F) -> &Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.shared.registry.on(event, listener);
        self
    }

    /// Send `[event, ...args]` as an EVENT frame
    ///
    /// Fire-and-forget: nothing waits for an acknowledgement.
    pub fn emit(&self, event: &str, args: &[Value]) -> Result<()> {
        if !self.shared.state.is_open() {
            return Err(SocketError::NotConnected);
        }
        let frame = codec::encode_event(event, args)?;
        debug!("Emitting '{}'", event);
        self.shared.send(&frame)
    }

    /// Send a single serializable payload as `[event, data]`
    pub fn emit_with<T: Serialize>(&self, event: &str, data: &T) -> Result<()> {
        let value = serde_json::to_value(data)?;
        self.emit(event, &[value])
    }

    /// Close an open session
    ///
    /// Resolves when the transport confirms the close. Fails with
    /// [`SocketError::NotConnected`] without touching the transport when the
    /// session is not open.
    pub async fn close(&self) -> Result<()> {
        if self
            .shared
            .state
            .compare_exchange(SessionState::Open, SessionState::Closed)
            .is_err()
        {
            return Err(SocketError::NotConnected);
        }

        info!("Closing session");
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(Command::Close(tx))
            .map_err(|e| SocketError::ChannelSend(e.to_string()))?;

        rx.await.unwrap_or_else(|_| {
            Err(SocketError::ConnectionClosed(
                "session ended before close was confirmed".to_string(),
            ))
        })
    }

    /// Wait for the driver task to finish
    ///
    /// Returns the fault that ended the session, e.g. an `error` event
    /// nobody listened to. Returns `Ok(())` if the session was never
    /// connected or ended cleanly.
    pub async fn join(&self) -> Result<()> {
        let handle = self.driver.lock().take();
        match handle {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                Err(SocketError::InvalidState(format!("session driver failed: {}", e)))
            }),
            None => Ok(()),
        }
    }

    /// The connection URL including query parameters
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.shared.state.get()
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.shared.state.is_open()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.shared.registry.listener_count(event)
    }

    pub fn metrics(&self) -> Metrics {
        let metrics = &self.shared.metrics;
        Metrics {
            frames_sent: metrics.frames_sent(),
            frames_received: metrics.frames_received(),
            probes_sent: metrics.probes_sent(),
            keepalives_received: metrics.keepalives_received(),
            state: self.shared.state.get(),
        }
    }

    /// Try to receive a lifecycle event (non-blocking)
    pub fn try_recv_event(&self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive a lifecycle event (blocking)
    pub fn recv_event(&self) -> std::result::Result<SessionEvent, crossbeam_channel::RecvError> {
        self.event_rx.recv()
    }
}

/// Settles the `connect` future exactly once
struct Readiness {
    tx: oneshot::Sender<Result<()>>,
    on_success: Option<SuccessCallback>,
    on_fail: Option<FailCallback>,
}

impl Readiness {
    fn resolve(self) {
        let _ = self.tx.send(Ok(()));
        if let Some(on_success) = self.on_success {
            on_success();
        }
    }

    fn reject(self, err: SocketError) {
        if let Some(on_fail) = self.on_fail {
            on_fail(&err);
        }
        let _ = self.tx.send(Err(err));
    }
}

/// Whether the driver keeps running after a step
enum Flow {
    Continue,
    Stop,
}

/// Serializes transport signals, keepalive expiry and close commands
struct Driver {
    shared: Arc<Shared>,
    keepalive: Keepalive,
    readiness: Option<Readiness>,
    close_waiters: Vec<oneshot::Sender<Result<()>>>,
}

impl Driver {
    async fn run(
        mut self,
        mut signals: SignalReceiver,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) -> Result<()> {
        let result = loop {
            let step = tokio::select! {
                signal = signals.recv() => match signal {
                    Some(TransportSignal::Open) => self.on_open(),
                    Some(TransportSignal::Message(frame)) => self.on_message(&frame),
                    Some(TransportSignal::Error(err)) => self.on_error(err),
                    Some(TransportSignal::Close) => self.on_close(),
                    None => {
                        debug!("Transport dropped its signal channel");
                        self.on_close()
                    }
                },

                command = commands.recv() => match command {
                    Some(Command::Close(waiter)) => self.on_close_command(waiter),
                    None => self.on_session_dropped(),
                },

                _ = self.keepalive.expired(), if self.keepalive.is_armed() => self.on_keepalive_expired(),
            };

            match step {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => break Ok(()),
                Err(e) => break Err(self.fail(e)),
            }
        };

        self.keepalive.disarm();

        // Close requests that raced with the end of the session
        commands.close();
        while let Ok(Command::Close(waiter)) = commands.try_recv() {
            self.close_waiters.push(waiter);
        }
        for waiter in self.close_waiters.drain(..) {
            let _ = waiter.send(Ok(()));
        }

        debug!("Session driver exiting");
        result
    }

    fn on_open(&mut self) -> Result<Flow> {
        if self
            .shared
            .state
            .compare_exchange(SessionState::Connecting, SessionState::Open)
            .is_err()
        {
            warn!("Ignoring open signal in state {:?}", self.shared.state.get());
            return Ok(Flow::Continue);
        }

        info!("Connected to {}", self.shared.url);
        self.keepalive.arm();
        self.shared.publish(SessionEvent::Connected);
        self.shared.registry.trigger(registry::CONNECT, &[])?;

        if let Some(readiness) = self.readiness.take() {
            readiness.resolve();
        }
        Ok(Flow::Continue)
    }

    fn on_message(&mut self, frame: &str) -> Result<Flow> {
        self.shared.metrics.increment_received();

        let packet = match codec::decode(frame) {
            Ok(packet) => packet,
            Err(e) => {
                debug!("Dropping frame: {}", e);
                return Ok(Flow::Continue);
            }
        };

        match packet.classify() {
            Inbound::Keepalive => {
                self.shared.metrics.increment_keepalives();
                if self.shared.state.is_open() {
                    self.keepalive.arm();
                }
            }
            Inbound::Event { name, args } => {
                debug!("Dispatching '{}' with {} args", name, args.len());
                if !self.shared.registry.trigger(&name, &args)? {
                    debug!("No listener for '{}'", name);
                }
            }
            Inbound::Ignored(reason) => {
                debug!("Ignoring frame: {}", reason);
            }
        }
        Ok(Flow::Continue)
    }

    fn on_error(&mut self, err: String) -> Result<Flow> {
        match self.shared.state.get() {
            SessionState::Connecting => {
                error!("Connection failed: {}", err);
                self.shared.state.set(SessionState::Closed);
                let err = SocketError::ConnectionFailed(err);
                self.shared.publish(SessionEvent::Error(err.to_string()));
                if let Some(readiness) = self.readiness.take() {
                    readiness.reject(err.clone());
                }
                Err(err)
            }
            SessionState::Open => {
                warn!("Transport error: {}", err);
                self.shared.publish(SessionEvent::Error(err.clone()));
                self.shared
                    .registry
                    .trigger(registry::ERROR, &[Value::String(err)])?;
                Ok(Flow::Continue)
            }
            SessionState::Closed => {
                debug!("Ignoring transport error after close: {}", err);
                Ok(Flow::Continue)
            }
        }
    }

    fn on_close(&mut self) -> Result<Flow> {
        self.keepalive.disarm();

        // The most recent transition wins: a close requested by `close()` has
        // already moved the state to Closed.
        match self.shared.state.get() {
            SessionState::Open => {
                warn!("{}", CLOSED_BY_SERVER);
                self.shared.state.set(SessionState::Closed);
                self.shared.publish(SessionEvent::Error(CLOSED_BY_SERVER.to_string()));
                self.shared.publish(SessionEvent::Disconnected);
                self.shared
                    .registry
                    .trigger(registry::ERROR, &[Value::String(CLOSED_BY_SERVER.to_string())])?;
            }
            SessionState::Connecting => {
                warn!("Transport closed before the session opened");
                self.shared.state.set(SessionState::Closed);
                self.shared.publish(SessionEvent::Disconnected);
                self.shared.registry.trigger(registry::DISCONNECT, &[])?;
                if let Some(readiness) = self.readiness.take() {
                    readiness.reject(SocketError::ConnectionFailed(
                        "transport closed before open".to_string(),
                    ));
                }
            }
            SessionState::Closed => {
                info!("Session closed");
                self.shared.publish(SessionEvent::Disconnected);
                self.shared.registry.trigger(registry::DISCONNECT, &[])?;
            }
        }
        Ok(Flow::Stop)
    }

    fn on_close_command(&mut self, waiter: oneshot::Sender<Result<()>>) -> Result<Flow> {
        self.keepalive.disarm();
        match self.shared.close_transport() {
            Ok(()) => {
                self.close_waiters.push(waiter);
                Ok(Flow::Continue)
            }
            Err(e) => {
                error!("Failed to close transport: {}", e);
                let _ = waiter.send(Err(e));
                Ok(Flow::Stop)
            }
        }
    }

    fn on_session_dropped(&mut self) -> Result<Flow> {
        debug!("Session handle dropped");
        let previous = self.shared.state.get();
        self.shared.state.set(SessionState::Closed);
        if previous == SessionState::Open {
            if let Err(e) = self.shared.close_transport() {
                warn!("Failed to close transport: {}", e);
            }
        }
        Ok(Flow::Stop)
    }

    fn on_keepalive_expired(&mut self) -> Result<Flow> {
        self.keepalive.disarm();
        if !self.shared.state.is_open() {
            return Ok(Flow::Continue);
        }

        debug!("Sending keepalive probe");
        match self.shared.send(&codec::ping_probe()) {
            Ok(()) => {
                self.shared.metrics.increment_probes();
                Ok(Flow::Continue)
            }
            Err(e) => self.on_error(e.to_string()),
        }
    }

    /// Tear the session down after a fault and hand the fault back
    fn fail(&mut self, err: SocketError) -> SocketError {
        error!("Session failed: {}", err);
        let previous = self.shared.state.get();
        self.shared.state.set(SessionState::Closed);
        self.keepalive.disarm();

        if previous == SessionState::Open {
            if let Err(e) = self.shared.close_transport() {
                warn!("Failed to close transport: {}", e);
            }
        }

        if let SocketError::UnhandledError(_) = err {
            self.shared.publish(SessionEvent::Error(err.to_string()));
        }

        if let Some(readiness) = self.readiness.take() {
            readiness.reject(err.clone());
        }
        err
    }
}
