pub mod states;

use crate::config::{build_url, SessionConfig};
use crate::heartbeat::DEFAULT_PING_INTERVAL;
use crate::session::{FailCallback, SocketSession, SuccessCallback};
use crate::traits::*;
use states::*;
use std::time::Duration;
use tracing::warn;

/// Type-state builder for [`SocketSession`]
///
/// The URL and the transport are required; `build()` is only available once
/// both are set. Everything else is optional.
///
/// # Example
/// ```ignore
/// let session = swansocket::builder()
///     .url("wss://game.example.com")
///     .param("token", "abc")
///     .ping_interval(Duration::from_secs(5))
///     .on_fail(|e| error!("could not connect: {}", e))
///     .transport(TungsteniteTransport::new())
///     .build();
/// ```
pub struct SessionBuilder<U, T>
where
    U: UrlState,
    T: TransportState,
{
    url: U,
    transport: T,
    params: Vec<(String, String)>,
    ping_interval: Duration,
    on_success: Option<SuccessCallback>,
    on_fail: Option<FailCallback>,
}

impl SessionBuilder<NoUrl, NoTransport> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            url: NoUrl,
            transport: NoTransport,
            params: Vec::new(),
            ping_interval: DEFAULT_PING_INTERVAL,
            on_success: None,
            on_fail: None,
        }
    }

    /// Start from a loaded configuration: URL, extra params and ping interval
    pub fn from_config(config: &SessionConfig) -> SessionBuilder<HasUrl, NoTransport> {
        Self::new()
            .url(config.url.clone())
            .params(config.params.iter().map(|(k, v)| (k.clone(), v.clone())))
            .ping_interval(config.ping_interval())
    }
}

impl Default for SessionBuilder<NoUrl, NoTransport> {
    fn default() -> Self {
        Self::new()
    }
}

// URL setting
impl<T> SessionBuilder<NoUrl, T>
where
    T: TransportState,
{
    pub fn url(self, url: impl Into<String>) -> SessionBuilder<HasUrl, T> {
        SessionBuilder {
            url: HasUrl(url.into()),
            transport: self.transport,
            params: self.params,
            ping_interval: self.ping_interval,
            on_success: self.on_success,
            on_fail: self.on_fail,
        }
    }
}

// Transport setting
impl<U> SessionBuilder<U, NoTransport>
where
    U: UrlState,
{
    pub fn transport(self, transport: impl Transport) -> SessionBuilder<U, HasTransport> {
        SessionBuilder {
            url: self.url,
            transport: HasTransport(Box::new(transport)),
            params: self.params,
            ping_interval: self.ping_interval,
            on_success: self.on_success,
            on_fail: self.on_fail,
        }
    }
}

// Optional configuration methods
impl<U, T> SessionBuilder<U, T>
where
    U: UrlState,
    T: TransportState,
{
    /// Add one extra query parameter; a later value for the same key wins
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        for (key, value) in params {
            self = self.param(key, value);
        }
        self
    }

    /// Spacing between keepalive probes (default 2s)
    ///
    /// A zero interval is ignored, so the previous (by default 2s) value stays.
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            warn!("Ignoring zero ping interval, keeping {:?}", self.ping_interval);
            return self;
        }
        self.ping_interval = interval;
        self
    }

    /// Invoked once when the session opens
    pub fn on_success(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Invoked once when the session fails to open
    pub fn on_fail(mut self, callback: impl FnOnce(&SocketError) + Send + 'static) -> Self {
        self.on_fail = Some(Box::new(callback));
        self
    }
}

// Build method - only available when all required fields are set
impl SessionBuilder<HasUrl, HasTransport> {
    /// The URL the session will connect to
    pub fn connection_url(&self) -> String {
        build_url(&self.url.0, &self.params)
    }

    /// Build the session in the `Connecting` state without touching the transport
    pub fn build(self) -> SocketSession {
        let url = self.connection_url();
        SocketSession::new(
            url,
            self.transport.0,
            self.ping_interval,
            self.on_success,
            self.on_fail,
        )
    }
}
