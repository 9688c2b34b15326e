/// Type-state markers for the session builder
///
/// These types track which required parts have been set, so `build()` only
/// exists once both a URL and a transport are present. The "has" markers
/// carry the value itself, so building never has to unwrap.

use crate::traits::Transport;

/// Marker trait for URL state
pub trait UrlState {}

/// URL has not been set
pub struct NoUrl;
impl UrlState for NoUrl {}

/// URL has been set
pub struct HasUrl(pub(crate) String);
impl UrlState for HasUrl {}

/// Marker trait for transport state
pub trait TransportState {}

/// Transport has not been set
pub struct NoTransport;
impl TransportState for NoTransport {}

/// Transport has been set
pub struct HasTransport(pub(crate) Box<dyn Transport>);
impl TransportState for HasTransport {}
