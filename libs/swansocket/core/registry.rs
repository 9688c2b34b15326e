//! Event listener registry
//!
//! Maps an event name to an ordered list of listeners. Registering a second
//! listener for a name appends; triggering a name invokes every listener in
//! registration order.
//!
//! The `error` event is special: triggering it with nobody listening is a
//! fault, returned as [`SocketError::UnhandledError`] instead of being
//! dropped.

use crate::error::{Result, SocketError};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Reserved event names
pub const CONNECT: &str = "connect";
pub const DISCONNECT: &str = "disconnect";
pub const ERROR: &str = "error";

const UNSPECIFIED_ERROR: &str = "Uncaught, unspecified \"error\" event.";

/// A registered event listener
pub type Listener = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Event name to ordered listeners
#[derive(Default)]
pub struct EventRegistry {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener for `event`
    pub fn on<F>(&self, event: impl Into<String>, listener: F)
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        let event = event.into();
        debug!("Registering listener for '{}'", event);
        self.listeners
            .write()
            .entry(event)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Invoke every listener for `event` with `args`
    ///
    /// Returns `Ok(false)` when nobody listens. Listeners run outside the
    /// lock, so a listener may register further listeners.
    pub fn trigger(&self, event: &str, args: &[Value]) -> Result<bool> {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .get(event)
            .map(|list| list.to_vec())
            .unwrap_or_default();

        if listeners.is_empty() {
            if event == ERROR {
                let message = args
                    .first()
                    .and_then(Value::as_str)
                    .unwrap_or(UNSPECIFIED_ERROR);
                return Err(SocketError::UnhandledError(message.to_string()));
            }
            return Ok(false);
        }

        for listener in &listeners {
            listener(args);
        }
        Ok(true)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map(Vec::len).unwrap_or(0)
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        self.listener_count(event) > 0
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.read();
        let mut map = f.debug_map();
        for (event, list) in listeners.iter() {
            map.entry(event, &list.len());
        }
        map.finish()
    }
}
